use super::ui;
use crate::core::{RateCache, RateTable};
use anyhow::{Context, Result};
use comfy_table::Cell;

impl RateTable {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Code"),
            ui::header_cell("Currency"),
            ui::header_cell("Rubles per unit"),
        ]);
        for (code, currency) in self.iter() {
            table.add_row(vec![
                Cell::new(code),
                Cell::new(&currency.name),
                ui::amount_cell(currency.rate, 4),
            ]);
        }

        let mut output = format!(
            "{}\n\n",
            ui::style_text(
                &format!("Bank of Russia rates on {}", self.date().format("%d.%m.%Y")),
                ui::StyleType::Title
            )
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("{} currencies", self.len()),
                ui::StyleType::Subtle
            )
        ));
        output
    }
}

pub async fn run(cache: &RateCache, refresh: bool) -> Result<()> {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let cached = cache.get_table(refresh).await;
    pb.finish_and_clear();

    let table = cached.context("Could not get the Bank of Russia exchange rates")?;
    println!("{}", table.display_as_table());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_display_rate_table() {
        let rates = RateTable::new(
            NaiveDate::from_ymd_opt(2025, 10, 18).unwrap(),
            [
                ("USD", 81.0, "Доллар США"),
                ("KZT", 0.1507, "Казахстанских тенге"),
            ],
        );

        let table = rates.display_as_table();
        let output = console::strip_ansi_codes(&table);
        assert!(output.contains("Bank of Russia rates on 18.10.2025"));
        assert!(output.contains("Доллар США"));
        assert!(output.contains("81.0000"));
        assert!(output.contains("0.1507"));
        assert!(output.contains("3 currencies"));

        let kzt = output.find("KZT").unwrap();
        let rub = output.find("RUB").unwrap();
        let usd = output.find("USD").unwrap();
        assert!(kzt < rub && rub < usd);
    }
}
