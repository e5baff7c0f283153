use super::ui;
use crate::core::{BASE_CURRENCY, ExchangeRateTable, ReferenceDataProvider};
use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

pub async fn run(reference: &dyn ReferenceDataProvider) -> Result<()> {
    let rates = reference
        .exchange_rates()
        .await
        .context("Failed to load exchange rates")?;

    let title = match rates.date {
        Some(date) => format!("Exchange rates on {}", date.format("%d.%m.%Y")),
        None => "Exchange rates".to_string(),
    };
    println!("\n{}", ui::style_text(&title, ui::StyleType::Title));
    println!("{}", rates_table(&rates));
    println!(
        "{}",
        ui::style_text(
            &format!("{} currencies, quoted in {BASE_CURRENCY}", rates.len()),
            ui::StyleType::Subtle
        )
    );
    Ok(())
}

fn rates_table(rates: &ExchangeRateTable) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Nominal"),
        ui::header_cell("Rate"),
        ui::header_cell("Per unit"),
    ]);

    for entry in rates.entries() {
        table.add_row(vec![
            Cell::new(&entry.code),
            Cell::new(entry.nominal),
            ui::amount_cell(entry.rate),
            ui::amount_cell(entry.unit_rate),
        ]);
    }
    table
}
