//! Page-by-page retrieval of the events collection under a shared request limit.

use crate::core::{DateWindow, Event, EventsPageProvider, PageQuery, ServiceError, ServiceResult};
use crate::executor::TaskPool;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, instrument, warn};

/// Bounded number of in-flight upstream requests, shared by every fetch.
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    permits: Arc<Semaphore>,
}

impl ConcurrencyLimiter {
    pub fn new(max_concurrent_requests: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
        }
    }

    /// Waits for a free slot. The slot is returned when the permit is dropped.
    pub async fn acquire(&self) -> ServiceResult<OwnedSemaphorePermit> {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| {
                error!("Interrupted while waiting for a request permit");
                ServiceError::InterruptedWait
            })
    }

    /// Wakes all waiters with an error; later acquisitions fail as well.
    #[cfg(test)]
    pub(crate) fn close(&self) {
        self.permits.close();
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

#[derive(Clone)]
pub struct PagedEventFetcher {
    source: Arc<dyn EventsPageProvider>,
    limiter: ConcurrencyLimiter,
    page_size: u32,
    pool: Arc<TaskPool>,
}

impl PagedEventFetcher {
    pub fn new(
        source: Arc<dyn EventsPageProvider>,
        limiter: ConcurrencyLimiter,
        page_size: u32,
        pool: Arc<TaskPool>,
    ) -> Self {
        Self {
            source,
            limiter,
            page_size,
            pool,
        }
    }

    /// Collects every page on the task pool.
    pub fn fetch_all_paged(
        &self,
        window: DateWindow,
    ) -> BoxFuture<'static, ServiceResult<Vec<Event>>> {
        self.pool
            .submit(self.fetch_all_paged_stream(window).try_concat())
    }

    /// Lazily yields pages starting from page 1 until the first empty one.
    pub fn fetch_all_paged_stream(
        &self,
        window: DateWindow,
    ) -> BoxStream<'static, ServiceResult<Vec<Event>>> {
        let source = Arc::clone(&self.source);
        let limiter = self.limiter.clone();
        let page_size = self.page_size;

        stream::try_unfold(Some(1u32), move |next| {
            let source = Arc::clone(&source);
            let limiter = limiter.clone();
            async move {
                let Some(page) = next else {
                    return Ok::<_, ServiceError>(None);
                };
                let query = PageQuery {
                    window,
                    page,
                    page_size,
                };
                let events = fetch_page(source.as_ref(), &limiter, &query).await?;
                if events.is_empty() {
                    debug!(page, "Empty page, stopping");
                    return Ok(None);
                }
                Ok(Some((events, page.checked_add(1))))
            }
        })
        .boxed()
    }
}

#[instrument(name = "EventsPage", skip(source, limiter, query), fields(page = query.page))]
async fn fetch_page(
    source: &dyn EventsPageProvider,
    limiter: &ConcurrencyLimiter,
    query: &PageQuery,
) -> ServiceResult<Vec<Event>> {
    let _permit = limiter.acquire().await?;
    match source.fetch_page(query).await {
        Ok(page) => {
            debug!("Fetched {} events", page.results.len());
            Ok(page.results)
        }
        Err(e) => {
            warn!("Failed to fetch events page, treating it as empty: {:#}", e);
            Ok(Vec::new())
        }
    }
}
