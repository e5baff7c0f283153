//! Terminal front end: argument checks and output rendering per command.

pub mod convert;
pub mod events;
pub mod rate;
pub mod rates;
pub mod setup;
pub mod ui;

use rust_decimal::Decimal;
use std::str::FromStr;

/// Accepts exactly three ASCII upper-case letters, e.g. `USD`.
pub fn parse_currency_code(value: &str) -> Result<String, String> {
    if value.len() == 3 && value.bytes().all(|b| b.is_ascii_uppercase()) {
        Ok(value.to_string())
    } else {
        Err(format!(
            "'{value}' is not a currency code, expected three upper-case letters"
        ))
    }
}

/// Accepts a strictly positive decimal amount.
pub fn parse_positive_amount(value: &str) -> Result<Decimal, String> {
    let amount = Decimal::from_str(value.trim()).map_err(|e| format!("'{value}': {e}"))?;
    if amount <= Decimal::ZERO {
        return Err(format!("'{value}' must be greater than zero"));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_code_format() {
        assert_eq!(parse_currency_code("USD"), Ok("USD".to_string()));
        assert!(parse_currency_code("usd").is_err());
        assert!(parse_currency_code("US").is_err());
        assert!(parse_currency_code("USDT").is_err());
        assert!(parse_currency_code("U$D").is_err());
        assert!(parse_currency_code("ÜSD").is_err());
    }

    #[test]
    fn test_positive_amount() {
        assert_eq!(parse_positive_amount("1000"), Ok(dec!(1000)));
        assert_eq!(parse_positive_amount("0.01"), Ok(dec!(0.01)));
        assert!(parse_positive_amount("0").is_err());
        assert!(parse_positive_amount("-5").is_err());
        assert!(parse_positive_amount("ten").is_err());
    }
}
