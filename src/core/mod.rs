//! Core business logic abstractions

pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod currency;
pub mod error;
pub mod event;
pub mod log;

// Re-export main types for cleaner imports
pub use currency::{
    BASE_CURRENCY, CurrencyCatalog, CurrencyCatalogEntry, CurrencyEntry, ExchangeRateTable,
    ReferenceDataProvider,
};
pub use error::{ServiceError, ServiceResult};
pub use event::{DateRange, DateWindow, Event, EventsPage, EventsPageProvider, PageQuery};
