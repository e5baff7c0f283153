//! Event catalog abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

const DEFAULT_WINDOW_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: String,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dates: Vec<DateRange>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Event {
    /// Cost is the last integer found in the price text, e.g. 500 for "300–500 руб".
    pub fn cost(&self) -> Option<Decimal> {
        last_integer_token(&self.price)
    }

    pub fn is_affordable(&self, budget: Decimal) -> bool {
        if self.is_free {
            return true;
        }
        self.cost().is_some_and(|cost| cost <= budget)
    }
}

fn last_integer_token(text: &str) -> Option<Decimal> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|token| !token.is_empty())
        .last()
        .and_then(|token| Decimal::from_str(token).ok())
}

/// Keeps affordable events, preserving their order.
pub fn filter_affordable(events: Vec<Event>, budget: Decimal) -> Vec<Event> {
    events
        .into_iter()
        .filter(|event| event.is_affordable(budget))
        .collect()
}

/// Date range the events are requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// Missing bounds default to `today` and `today + 7 days`.
    pub fn resolve(from: Option<NaiveDate>, to: Option<NaiveDate>, today: NaiveDate) -> Self {
        let week_ahead = today
            .checked_add_days(Days::new(DEFAULT_WINDOW_DAYS))
            .unwrap_or(today);
        Self {
            from: from.unwrap_or(today),
            to: to.unwrap_or(week_ahead),
        }
    }

    pub fn starting_today(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self::resolve(from, to, chrono::Local::now().date_naive())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub window: DateWindow,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsPage {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub results: Vec<Event>,
}

#[async_trait]
pub trait EventsPageProvider: Send + Sync {
    async fn fetch_page(&self, query: &PageQuery) -> Result<EventsPage>;
}
