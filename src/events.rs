//! Budget-filtered event listing.

use crate::conversion::CurrencyService;
use crate::core::event::filter_affordable;
use crate::core::{DateWindow, Event, ServiceResult};
use crate::paging::PagedEventFetcher;
use chrono::NaiveDate;
use futures::future::{self, BoxFuture, FutureExt, TryFutureExt};
use futures::stream::TryStreamExt;
use rust_decimal::Decimal;
use tracing::{error, info};

#[derive(Clone)]
pub struct EventService {
    currency: CurrencyService,
    fetcher: PagedEventFetcher,
}

impl EventService {
    pub fn new(currency: CurrencyService, fetcher: PagedEventFetcher) -> Self {
        Self { currency, fetcher }
    }

    /// Converts the budget and loads all events concurrently on the task pool,
    /// then keeps the events the budget covers.
    pub async fn fetch_affordable_events(
        &self,
        budget: Decimal,
        currency: &str,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> ServiceResult<Vec<Event>> {
        let window = DateWindow::starting_today(date_from, date_to);
        let converted = self.currency.convert_to_base_async(currency, budget);
        let events = self.fetcher.fetch_all_paged(window);

        // An early error drops the other future, which aborts its pooled task.
        let (converted, events) = tokio::try_join!(converted, events)?;
        Ok(select_affordable(converted, events))
    }

    /// Same result as [`Self::fetch_affordable_events`], computed on the polling
    /// task. Nothing is requested until the returned future is polled.
    pub fn fetch_affordable_events_reactive(
        &self,
        budget: Decimal,
        currency: &str,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> BoxFuture<'static, ServiceResult<Vec<Event>>> {
        let window = DateWindow::starting_today(date_from, date_to);
        let converted = self.currency.convert_to_base_reactive(currency, budget);
        let events = self.fetcher.fetch_all_paged_stream(window).try_concat();

        future::try_join(converted, events)
            .map_ok(|(converted, events)| select_affordable(converted, events))
            .inspect_err(|e| error!("Failed to fetch affordable events: {}", e))
            .boxed()
    }
}

fn select_affordable(converted_budget: Decimal, events: Vec<Event>) -> Vec<Event> {
    info!("BUDGET: {} RUB", converted_budget);
    info!("EVENTS: {} fetched", events.len());
    filter_affordable(events, converted_budget)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::tests::{StaticReference, catalog};
    use crate::core::ServiceError;
    use crate::paging::ConcurrencyLimiter;
    use crate::paging::tests::{FakeEvents, event, test_pool};
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::time::Duration;

    fn service(reference: StaticReference, pages: Vec<Vec<Event>>) -> EventService {
        let pool = test_pool();
        let currency = CurrencyService::new(Arc::new(reference), Arc::clone(&pool));
        let fetcher = PagedEventFetcher::new(
            Arc::new(FakeEvents::new(pages)),
            ConcurrencyLimiter::new(3),
            100,
            pool,
        );
        EventService::new(currency, fetcher)
    }

    fn ids(events: &[Event]) -> Vec<i64> {
        events.iter().map(|e| e.id).collect()
    }

    #[test_log::test(tokio::test)]
    async fn test_budget_keeps_only_free_event() {
        let service = service(
            StaticReference::fixture(),
            vec![vec![event(1, "", true), event(2, "1500 RUB", false)]],
        );

        let events = service
            .fetch_affordable_events(dec!(1000), "RUB", None, None)
            .await
            .unwrap();
        assert_eq!(ids(&events), vec![1]);
    }

    #[test_log::test(tokio::test)]
    async fn test_larger_budget_keeps_both() {
        let service = service(
            StaticReference::fixture(),
            vec![vec![event(1, "", true), event(2, "1500 RUB", false)]],
        );

        let events = service
            .fetch_affordable_events(dec!(2000), "RUB", None, None)
            .await
            .unwrap();
        assert_eq!(ids(&events), vec![1, 2]);
    }

    #[test_log::test(tokio::test)]
    async fn test_both_variants_return_same_events() {
        let pages = vec![
            vec![
                event(1, "500", false),
                event(2, "2500", false),
                event(3, "", true),
            ],
            vec![event(4, "от 1000 до 2000 рублей", false), event(5, "", false)],
        ];
        let service = service(StaticReference::fixture(), pages);

        let pooled = service
            .fetch_affordable_events(dec!(20), "USD", None, None)
            .await
            .unwrap();
        let reactive = service
            .fetch_affordable_events_reactive(dec!(20), "USD", None, None)
            .await
            .unwrap();

        assert_eq!(ids(&pooled), vec![1, 3, 4]);
        assert_eq!(pooled, reactive);
    }

    #[test_log::test(tokio::test)]
    async fn test_conversion_error_wins() {
        let service = service(
            StaticReference::new(Some(catalog()), None),
            vec![vec![event(1, "", true)]],
        );
        let unavailable = Err(ServiceError::Unavailable("exchange rates".to_string()));

        let pooled = service
            .fetch_affordable_events(dec!(100), "USD", None, None)
            .await;
        let reactive = service
            .fetch_affordable_events_reactive(dec!(100), "USD", None, None)
            .await;

        assert_eq!(pooled, unavailable);
        assert_eq!(reactive, unavailable);
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_conversion_stops_paging() {
        let pool = test_pool();
        let pages: Vec<usize> = vec![1; 50];
        let source = Arc::new(
            FakeEvents::with_sizes(&pages).with_delay(Duration::from_millis(20)),
        );
        let currency = CurrencyService::new(
            Arc::new(StaticReference::fixture()),
            Arc::clone(&pool),
        );
        let fetcher = PagedEventFetcher::new(
            source.clone(),
            ConcurrencyLimiter::new(3),
            100,
            Arc::clone(&pool),
        );
        let service = EventService::new(currency, fetcher);

        let result = service
            .fetch_affordable_events(dec!(100), "CNY", None, None)
            .await;
        assert_eq!(result, Err(ServiceError::InvalidCode("CNY".to_string())));

        // Unaborted paging would have reached page 8 or so by now
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(source.calls() <= 2, "paging kept running: {} calls", source.calls());
        assert_eq!(pool.available_slots(), 4 + 16);
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_currency_is_rejected() {
        let service = service(StaticReference::fixture(), vec![]);

        let result = service
            .fetch_affordable_events_reactive(dec!(100), "CNY", None, None)
            .await;
        assert_eq!(result, Err(ServiceError::InvalidCode("CNY".to_string())));
    }

    #[test_log::test(tokio::test)]
    async fn test_no_events() {
        let service = service(StaticReference::fixture(), vec![]);

        let events = service
            .fetch_affordable_events(dec!(100), "EUR", None, None)
            .await
            .unwrap();
        assert!(events.is_empty());
    }
}
