//! Currency validation and conversion against the reference datasets.

use crate::core::{
    BASE_CURRENCY, CurrencyCatalog, ExchangeRateTable, ReferenceDataProvider, ServiceError,
    ServiceResult,
};
use crate::executor::TaskPool;
use futures::FutureExt;
use futures::future::BoxFuture;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use tracing::debug;

/// Fractional digits kept in every conversion result.
pub const CONVERSION_SCALE: u32 = 4;

/// Converts `amount` from one currency to another using already loaded snapshots.
///
/// Both codes must be in the catalog and both must be rated; the result is
/// rounded half away from zero to [`CONVERSION_SCALE`] digits.
pub fn convert_with(
    catalog: &CurrencyCatalog,
    rates: &ExchangeRateTable,
    from: &str,
    to: &str,
    amount: Decimal,
) -> ServiceResult<Decimal> {
    ensure_known(catalog, from)?;
    ensure_known(catalog, to)?;
    let rate_from = unit_rate(rates, from)?;
    let rate_to = unit_rate(rates, to)?;

    let converted = amount
        .checked_mul(rate_from)
        .and_then(|value| value.checked_div(rate_to))
        .ok_or_else(|| ServiceError::AmountOutOfRange(amount.to_string()))?;

    Ok(converted.round_dp_with_strategy(CONVERSION_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

fn ensure_known(catalog: &CurrencyCatalog, code: &str) -> ServiceResult<()> {
    if catalog.contains(code) {
        Ok(())
    } else {
        Err(ServiceError::InvalidCode(code.to_string()))
    }
}

fn unit_rate(rates: &ExchangeRateTable, code: &str) -> ServiceResult<Decimal> {
    rates
        .unit_rate(code)
        .filter(|rate| rate.is_sign_positive() && !rate.is_zero())
        .ok_or_else(|| ServiceError::CurrencyNotFound(code.to_string()))
}

async fn convert_via(
    reference: &dyn ReferenceDataProvider,
    from: &str,
    to: &str,
    amount: Decimal,
) -> ServiceResult<Decimal> {
    let catalog = reference.currency_catalog().await?;
    let rates = reference.exchange_rates().await?;
    let converted = convert_with(&catalog, &rates, from, to, amount)?;
    debug!(%amount, from, to, %converted, "Converted amount");
    Ok(converted)
}

#[derive(Clone)]
pub struct CurrencyService {
    reference: Arc<dyn ReferenceDataProvider>,
    pool: Arc<TaskPool>,
}

impl CurrencyService {
    pub fn new(reference: Arc<dyn ReferenceDataProvider>, pool: Arc<TaskPool>) -> Self {
        Self { reference, pool }
    }

    /// Fails with `InvalidCode` unless the catalog lists `code`.
    pub async fn validate(&self, code: &str) -> ServiceResult<()> {
        let catalog = self.reference.currency_catalog().await?;
        ensure_known(&catalog, code)
    }

    /// Per-unit rate of `code` in the base currency. Only the rate table is consulted.
    pub async fn get_rate(&self, code: &str) -> ServiceResult<Decimal> {
        let rates = self.reference.exchange_rates().await?;
        unit_rate(&rates, code)
    }

    pub async fn convert(&self, from: &str, to: &str, amount: Decimal) -> ServiceResult<Decimal> {
        convert_via(self.reference.as_ref(), from, to, amount).await
    }

    /// Converts into the base currency on the task pool. Work starts immediately.
    pub fn convert_to_base_async(
        &self,
        code: &str,
        amount: Decimal,
    ) -> BoxFuture<'static, ServiceResult<Decimal>> {
        let reference = Arc::clone(&self.reference);
        let code = code.to_string();
        self.pool.submit(async move {
            convert_via(reference.as_ref(), &code, BASE_CURRENCY, amount).await
        })
    }

    /// Converts into the base currency on whichever task polls the returned
    /// future. Nothing happens until it is polled.
    pub fn convert_to_base_reactive(
        &self,
        code: &str,
        amount: Decimal,
    ) -> BoxFuture<'static, ServiceResult<Decimal>> {
        let reference = Arc::clone(&self.reference);
        let code = code.to_string();
        async move { convert_via(reference.as_ref(), &code, BASE_CURRENCY, amount).await }.boxed()
    }
}
