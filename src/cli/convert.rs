use crate::conversion::CurrencyService;
use anyhow::{Context, Result};
use rust_decimal::Decimal;

pub async fn run(service: &CurrencyService, from: &str, to: &str, amount: Decimal) -> Result<()> {
    let converted = service
        .convert(from, to, amount)
        .await
        .with_context(|| format!("Failed to convert {from} to {to}"))?;
    println!("{}", format_conversion(from, to, amount, converted));
    Ok(())
}

fn format_conversion(from: &str, to: &str, amount: Decimal, converted: Decimal) -> String {
    format!(
        "{} {from} = {} {to}",
        amount.normalize(),
        converted.normalize()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_conversion() {
        assert_eq!(
            format_conversion("USD", "EUR", dec!(3), dec!(2.8436)),
            "3 USD = 2.8436 EUR"
        );
        assert_eq!(
            format_conversion("USD", "RUB", dec!(10.00), dec!(1000.0000)),
            "10 USD = 1000 RUB"
        );
    }
}
