use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::core::cache::SnapshotCache;
use crate::core::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::core::config::CbrProviderConfig;
use crate::core::{
    CurrencyCatalog, CurrencyCatalogEntry, CurrencyEntry, ExchangeRateTable,
    ReferenceDataProvider, ServiceError, ServiceResult,
};

const CATALOG: &str = "currency catalog";
const RATES: &str = "exchange rates";

/// Reference dataset served by the CBR feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    CurrencyCatalog,
    ExchangeRates,
}

// Central Bank of Russia gateway for the currency catalog and daily rates
pub struct CbrProvider {
    client: reqwest::Client,
    config: CbrProviderConfig,
    catalog_cache: SnapshotCache<CurrencyCatalog>,
    rates_cache: SnapshotCache<ExchangeRateTable>,
    catalog_breaker: CircuitBreaker,
    rates_breaker: CircuitBreaker,
}

impl CbrProvider {
    pub fn new(config: &CbrProviderConfig, breaker: &CircuitBreakerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("eventfx/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            catalog_cache: SnapshotCache::new(CATALOG),
            rates_cache: SnapshotCache::new(RATES),
            catalog_breaker: CircuitBreaker::new(CATALOG, breaker),
            rates_breaker: CircuitBreaker::new(RATES, breaker),
        })
    }

    pub fn circuit_state(&self, dataset: Dataset) -> CircuitState {
        match dataset {
            Dataset::CurrencyCatalog => self.catalog_breaker.state(),
            Dataset::ExchangeRates => self.rates_breaker.state(),
        }
    }

    /// Drops both cached snapshots so the next read goes upstream.
    pub async fn invalidate(&self) {
        self.catalog_cache.invalidate().await;
        self.rates_cache.invalidate().await;
    }

    /// Reloads both datasets from upstream.
    pub async fn refresh(&self) -> ServiceResult<()> {
        self.invalidate().await;
        let catalog = self.currency_catalog().await?;
        let rates = self.exchange_rates().await?;
        info!(
            currencies = catalog.len(),
            rates = rates.len(),
            "Reference data refreshed"
        );
        Ok(())
    }

    /// Loads both datasets ahead of the first request. Never fails.
    pub async fn warm_up(&self) {
        match self.currency_catalog().await {
            Ok(catalog) => info!("Loaded {} currencies", catalog.len()),
            Err(_) => warn!("Currency data has not been loaded"),
        }
        match self.exchange_rates().await {
            Ok(rates) => info!("Loaded {} rates", rates.len()),
            Err(_) => warn!("Exchange rate data has not been loaded"),
        }
    }

    async fn get_xml(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!("Requesting reference data from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} URL: {}", response.status(), url));
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))
    }

    async fn fetch_catalog(&self) -> Result<CurrencyCatalog> {
        let body = self.get_xml(&self.config.catalog_path).await?;
        parse_catalog(&body)
    }

    async fn fetch_rates(&self) -> Result<ExchangeRateTable> {
        let body = self.get_xml(&self.config.daily_path).await?;
        parse_rates(&body)
    }
}

/// Runs `fetch` behind `breaker`, turning any failure into `Unavailable`.
async fn guarded<T, Fut>(breaker: &CircuitBreaker, dataset: &str, fetch: Fut) -> ServiceResult<T>
where
    Fut: Future<Output = Result<T>>,
{
    if !breaker.allow_request() {
        warn!(dataset, "Circuit open, skipping upstream call");
        return Err(ServiceError::Unavailable(dataset.to_string()));
    }

    match fetch.await {
        Ok(value) => {
            breaker.record_success();
            Ok(value)
        }
        Err(e) => {
            breaker.record_failure();
            error!("Circuit breaker fallback for {}. Error: {:#}", dataset, e);
            Err(ServiceError::Unavailable(dataset.to_string()))
        }
    }
}

#[async_trait]
impl ReferenceDataProvider for CbrProvider {
    #[instrument(name = "CbrCatalogFetch", skip(self))]
    async fn currency_catalog(&self) -> ServiceResult<Arc<CurrencyCatalog>> {
        if let Some(cached) = self.catalog_cache.get().await {
            return Ok(cached);
        }

        let catalog = guarded(&self.catalog_breaker, CATALOG, self.fetch_catalog()).await?;
        Ok(self.catalog_cache.put(catalog).await)
    }

    #[instrument(name = "CbrRatesFetch", skip(self))]
    async fn exchange_rates(&self) -> ServiceResult<Arc<ExchangeRateTable>> {
        if let Some(cached) = self.rates_cache.get().await {
            return Ok(cached);
        }

        let rates = guarded(&self.rates_breaker, RATES, self.fetch_rates()).await?;
        Ok(self.rates_cache.put(rates).await)
    }
}

#[derive(Debug, Deserialize)]
struct ValCurs {
    #[serde(rename = "@Date", default)]
    date: Option<String>,
    #[serde(rename = "Valute", default)]
    valutes: Vec<Valute>,
}

#[derive(Debug, Deserialize)]
struct Valute {
    #[serde(rename = "CharCode")]
    char_code: String,
    #[serde(rename = "Nominal")]
    nominal: u32,
    #[serde(rename = "Value")]
    value: String,
    #[serde(rename = "VunitRate", default)]
    vunit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Valuta {
    #[serde(rename = "Item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "EngName", default)]
    eng_name: String,
    #[serde(rename = "ISO_Char_Code", default)]
    iso_char_code: Option<String>,
}

// The feed writes decimals with a comma separator
fn parse_decimal(text: &str) -> Result<Decimal> {
    let normalized = text.trim().replace(',', ".");
    Decimal::from_str(&normalized).with_context(|| format!("Invalid decimal value: '{text}'"))
}

fn parse_rates(xml: &str) -> Result<ExchangeRateTable> {
    let val_curs: ValCurs =
        quick_xml::de::from_str(xml).context("Failed to parse exchange rates XML")?;

    let date = val_curs
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%d.%m.%Y").ok());

    if val_curs.valutes.is_empty() {
        return Err(anyhow!("No exchange rates found in response"));
    }

    let mut entries = Vec::with_capacity(val_curs.valutes.len());
    for valute in val_curs.valutes {
        let code = valute.char_code.trim().to_string();
        let rate = match parse_decimal(&valute.value) {
            Ok(rate) => rate,
            Err(e) => {
                warn!(code = %code, "Skipping exchange rate: {:#}", e);
                continue;
            }
        };
        if rate <= Decimal::ZERO || valute.nominal == 0 {
            warn!(code = %code, "Skipping non-positive exchange rate");
            continue;
        }
        let mut entry = CurrencyEntry::new(code, rate, valute.nominal);
        match valute.vunit_rate.as_deref().map(parse_decimal) {
            Some(Ok(unit_rate)) if unit_rate > Decimal::ZERO => {
                entry = entry.with_unit_rate(unit_rate);
            }
            Some(Err(e)) => {
                warn!(code = %entry.code, "Ignoring unit rate, using rate / nominal: {:#}", e);
            }
            _ => {}
        }
        entries.push(entry);
    }

    if entries.is_empty() {
        return Err(anyhow!("No valid exchange rates found in response"));
    }

    Ok(ExchangeRateTable::new(date, entries))
}

fn parse_catalog(xml: &str) -> Result<CurrencyCatalog> {
    let valuta: Valuta =
        quick_xml::de::from_str(xml).context("Failed to parse currency catalog XML")?;

    if valuta.items.is_empty() {
        return Err(anyhow!("No currencies found in response"));
    }

    let entries = valuta
        .items
        .into_iter()
        .filter_map(|item| {
            let code = item.iso_char_code.as_deref().map(str::trim).unwrap_or("");
            if code.is_empty() {
                return None;
            }
            let name = if item.name.trim().is_empty() {
                item.eng_name.trim().to_string()
            } else {
                item.name.trim().to_string()
            };
            Some(CurrencyCatalogEntry {
                code: code.to_string(),
                name,
            })
        })
        .collect();

    Ok(CurrencyCatalog::new(entries))
}
