use super::ui;
use crate::core::Event;
use crate::events::EventService;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

pub struct EventsRequest {
    pub budget: Decimal,
    pub currency: String,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub reactive: bool,
}

pub async fn run(service: &EventService, request: EventsRequest) -> Result<()> {
    let pb = ui::new_spinner("Fetching events");
    let result = if request.reactive {
        service
            .fetch_affordable_events_reactive(
                request.budget,
                &request.currency,
                request.date_from,
                request.date_to,
            )
            .await
    } else {
        service
            .fetch_affordable_events(
                request.budget,
                &request.currency,
                request.date_from,
                request.date_to,
            )
            .await
    };
    pb.finish_and_clear();

    let events = result.with_context(|| {
        format!(
            "Failed to fetch events for a budget of {} {}",
            request.budget, request.currency
        )
    })?;

    let title = format!(
        "Affordable events for {} {}",
        request.budget.normalize(),
        request.currency
    );
    println!("\n{}", ui::style_text(&title, ui::StyleType::Title));

    if events.is_empty() {
        println!(
            "{}",
            ui::style_text("No affordable events found.", ui::StyleType::Subtle)
        );
        return Ok(());
    }

    println!("{}", events_table(&events));
    println!(
        "{} {}",
        ui::style_text("Total:", ui::StyleType::TotalLabel),
        ui::style_text(&events.len().to_string(), ui::StyleType::TotalValue)
    );
    Ok(())
}

fn events_table(events: &[Event]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Title"),
        ui::header_cell("Price"),
        ui::header_cell("Free"),
        ui::header_cell("Starts"),
    ]);

    for event in events {
        table.add_row(vec![
            Cell::new(event.id),
            Cell::new(&event.title),
            Cell::new(&event.price),
            ui::flag_cell(event.is_free),
            ui::format_optional_cell(first_start(event), |start| start),
        ]);
    }
    table
}

fn first_start(event: &Event) -> Option<String> {
    event
        .dates
        .iter()
        .find_map(|range| range.start)
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|start| start.format("%Y-%m-%d %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DateRange;

    fn event(id: i64, price: &str, is_free: bool, start: Option<i64>) -> Event {
        Event {
            id,
            title: format!("event {id}"),
            price: price.to_string(),
            is_free,
            dates: vec![DateRange { start, end: None }],
        }
    }

    #[test]
    fn test_first_start_formats_utc() {
        assert_eq!(
            first_start(&event(1, "", true, Some(1736496000))),
            Some("2025-01-10 08:00".to_string())
        );
        assert_eq!(first_start(&event(1, "", true, None)), None);
    }

    #[test]
    fn test_events_table() {
        let rendered = events_table(&[
            event(7, "от 500 рублей", false, Some(1736496000)),
            event(8, "", true, None),
        ])
        .to_string();

        for expected in ["event 7", "от 500 рублей", "2025-01-10 08:00", "event 8", "N/A"] {
            assert!(rendered.contains(expected), "missing {expected}");
        }
    }
}
