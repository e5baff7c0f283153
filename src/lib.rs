pub mod cli;
pub mod conversion;
pub mod core;
pub mod events;
pub mod executor;
pub mod paging;
pub mod providers;

use crate::conversion::CurrencyService;
use crate::core::config::AppConfig;
use crate::events::EventService;
use crate::executor::TaskPool;
use crate::paging::{ConcurrencyLimiter, PagedEventFetcher};
use crate::providers::{CbrProvider, KudaGoProvider};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Rate {
        code: String,
    },
    Rates,
    Convert {
        from: String,
        to: String,
        amount: Decimal,
    },
    Events {
        budget: Decimal,
        currency: String,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
        reactive: bool,
    },
}

/// Providers and services wired from one configuration.
pub struct App {
    pub reference: Arc<CbrProvider>,
    pub currency: CurrencyService,
    pub events: EventService,
}

impl App {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let pool = Arc::new(
            TaskPool::new(&config.executor).context("Failed to start the task pool")?,
        );
        let reference = Arc::new(
            CbrProvider::new(&config.providers.cbr, &config.circuit_breaker)
                .context("Failed to create the CBR client")?,
        );
        let kudago = &config.providers.kudago;
        let source = Arc::new(
            KudaGoProvider::new(kudago).context("Failed to create the KudaGo client")?,
        );

        let currency = CurrencyService::new(reference.clone(), Arc::clone(&pool));
        let fetcher = PagedEventFetcher::new(
            source,
            ConcurrencyLimiter::new(kudago.max_concurrent_requests),
            kudago.page_size,
            pool,
        );
        let events = EventService::new(currency.clone(), fetcher);

        Ok(Self {
            reference,
            currency,
            events,
        })
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("eventfx starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let app = App::from_config(&config)?;
    app.reference.warm_up().await;

    match command {
        AppCommand::Rate { code } => cli::rate::run(&app.currency, &code).await,
        AppCommand::Rates => cli::rates::run(app.reference.as_ref()).await,
        AppCommand::Convert { from, to, amount } => {
            cli::convert::run(&app.currency, &from, &to, amount).await
        }
        AppCommand::Events {
            budget,
            currency,
            date_from,
            date_to,
            reactive,
        } => {
            let request = cli::events::EventsRequest {
                budget,
                currency,
                date_from,
                date_to,
                reactive,
            };
            cli::events::run(&app.events, request).await
        }
    }
}
