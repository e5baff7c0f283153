use crate::conversion::CurrencyService;
use crate::core::BASE_CURRENCY;
use anyhow::{Context, Result};
use rust_decimal::Decimal;

pub async fn run(service: &CurrencyService, code: &str) -> Result<()> {
    let rate = service
        .get_rate(code)
        .await
        .with_context(|| format!("Failed to get rate for {code}"))?;
    println!("{}", format_rate(code, rate));
    Ok(())
}

fn format_rate(code: &str, rate: Decimal) -> String {
    format!("1 {code} = {} {BASE_CURRENCY}", rate.normalize())
}
