//! Currency reference data and conversion abstractions

use super::error::ServiceResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Currency every rate is expressed in. The upstream feed omits it from its own tables.
pub const BASE_CURRENCY: &str = "RUB";
pub const BASE_CURRENCY_NAME: &str = "Российский рубль";

/// One row of the exchange-rate table. `rate` is the price of `nominal` units
/// in the base currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyEntry {
    pub code: String,
    pub rate: Decimal,
    pub nominal: u32,
    pub unit_rate: Decimal,
}

impl CurrencyEntry {
    pub fn new(code: impl Into<String>, rate: Decimal, nominal: u32) -> Self {
        let unit_rate = if nominal > 1 {
            rate / Decimal::from(nominal)
        } else {
            rate
        };
        Self {
            code: code.into(),
            rate,
            nominal: nominal.max(1),
            unit_rate,
        }
    }

    pub fn with_unit_rate(mut self, unit_rate: Decimal) -> Self {
        self.unit_rate = unit_rate;
        self
    }

    fn base() -> Self {
        Self::new(BASE_CURRENCY, Decimal::ONE, 1)
    }
}

/// One row of the known currencies list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyCatalogEntry {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRateTable {
    pub date: Option<NaiveDate>,
    entries: Vec<CurrencyEntry>,
}

impl ExchangeRateTable {
    /// Builds the table and appends the base currency row. Later duplicates
    /// of a code are dropped.
    pub fn new(date: Option<NaiveDate>, entries: Vec<CurrencyEntry>) -> Self {
        let mut unique: Vec<CurrencyEntry> = Vec::with_capacity(entries.len() + 1);
        for entry in entries.into_iter().chain(std::iter::once(CurrencyEntry::base())) {
            if !unique.iter().any(|e| e.code == entry.code) {
                unique.push(entry);
            }
        }
        Self {
            date,
            entries: unique,
        }
    }

    pub fn entries(&self) -> &[CurrencyEntry] {
        &self.entries
    }

    pub fn find(&self, code: &str) -> Option<&CurrencyEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    pub fn unit_rate(&self, code: &str) -> Option<Decimal> {
        self.find(code).map(|e| e.unit_rate)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyCatalog {
    entries: Vec<CurrencyCatalogEntry>,
}

impl CurrencyCatalog {
    pub fn new(entries: Vec<CurrencyCatalogEntry>) -> Self {
        let mut unique: Vec<CurrencyCatalogEntry> = Vec::with_capacity(entries.len() + 1);
        let base = CurrencyCatalogEntry {
            code: BASE_CURRENCY.to_string(),
            name: BASE_CURRENCY_NAME.to_string(),
        };
        for entry in entries.into_iter().chain(std::iter::once(base)) {
            if !unique.iter().any(|e| e.code == entry.code) {
                unique.push(entry);
            }
        }
        Self { entries: unique }
    }

    pub fn entries(&self) -> &[CurrencyCatalogEntry] {
        &self.entries
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.iter().any(|e| e.code == code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source of the two reference datasets. Implementations absorb transport
/// failures and report them as `ServiceError::Unavailable`.
#[async_trait]
pub trait ReferenceDataProvider: Send + Sync {
    async fn currency_catalog(&self) -> ServiceResult<Arc<CurrencyCatalog>>;
    async fn exchange_rates(&self) -> ServiceResult<Arc<ExchangeRateTable>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_table_appends_base_currency() {
        let table = ExchangeRateTable::new(None, vec![CurrencyEntry::new("USD", dec!(90.5), 1)]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.unit_rate("RUB"), Some(Decimal::ONE));
        assert_eq!(table.entries().last().unwrap().code, "RUB");
    }

    #[test]
    fn test_unit_rate_divides_by_nominal() {
        let entry = CurrencyEntry::new("JPY", dec!(61.5), 100);
        assert_eq!(entry.unit_rate, dec!(0.615));
    }

    #[test]
    fn test_duplicate_codes_are_dropped() {
        let table = ExchangeRateTable::new(
            None,
            vec![
                CurrencyEntry::new("USD", dec!(90), 1),
                CurrencyEntry::new("USD", dec!(91), 1),
            ],
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.unit_rate("USD"), Some(dec!(90)));
    }

    #[test]
    fn test_catalog_contains_base_currency() {
        let catalog = CurrencyCatalog::new(vec![CurrencyCatalogEntry {
            code: "EUR".to_string(),
            name: "Euro".to_string(),
        }]);
        assert!(catalog.contains("EUR"));
        assert!(catalog.contains("RUB"));
        assert!(!catalog.contains("eur"));
    }
}
