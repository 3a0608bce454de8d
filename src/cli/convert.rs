use super::ui;
use crate::core::{ConversionEngine, ConversionError, ConversionResult};
use anyhow::Result;
use comfy_table::Cell;
use tracing::warn;

/// Converts `text`, retrying once with a forced refresh when rates could not
/// be obtained.
pub async fn convert_with_retry(
    engine: &ConversionEngine,
    text: &str,
    refresh: bool,
) -> Result<ConversionResult, ConversionError> {
    match engine.convert(text, refresh).await {
        Err(ConversionError::RatesUnavailable(err)) if !refresh => {
            warn!(error = %err, "Rates unavailable, retrying with forced refresh");
            engine.convert(text, true).await
        }
        other => other,
    }
}

/// Turns a conversion failure into a message for the user.
pub fn describe_error(err: &ConversionError) -> String {
    match err {
        ConversionError::MissingAmount => {
            "Could not read the amount. Use the format <amount> <currency>, for example: 100 usd"
                .to_string()
        }
        ConversionError::MissingCurrency => {
            "No currency given. Use the format <amount> <currency>, for example: 100 usd, 2500 руб, 100 kzt"
                .to_string()
        }
        ConversionError::RatesUnavailable(_) => {
            "Could not get the Bank of Russia exchange rates. Try again a bit later.".to_string()
        }
        ConversionError::UnknownCurrency(phrase) => format!(
            "Unknown currency «{phrase}». Try an ISO code (USD, KZT, THB) or a name such as рубль, доллар, тенге, бат."
        ),
        ConversionError::CurrencyNotQuoted(code) => {
            format!("Currency {code} is not in the Bank of Russia rate list.")
        }
        ConversionError::IncompleteRates(code) => {
            format!("The Bank of Russia rate for {code} is unavailable.")
        }
    }
}

impl ConversionResult {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Currency"), ui::header_cell("Amount")]);
        for converted in &self.conversions {
            table.add_row(vec![
                Cell::new(&converted.code),
                ui::amount_cell(converted.amount, 2),
            ]);
        }

        let mut output = format!(
            "{}\n",
            ui::style_text(
                &format!("Bank of Russia rates on {}", self.date.format("%d.%m.%Y")),
                ui::StyleType::Title
            )
        );
        output.push_str(&format!(
            "\n{} =\n",
            ui::style_text(
                &format!("{} {}", ui::format_amount(self.amount, 2), self.code),
                ui::StyleType::Value
            )
        ));
        output.push_str(&table.to_string());
        output
    }
}

pub async fn run(engine: &ConversionEngine, text: &str, refresh: bool, json: bool) -> Result<()> {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let result = convert_with_retry(engine, text, refresh).await;
    pb.finish_and_clear();

    match result {
        Ok(result) if json => println!("{}", serde_json::to_string_pretty(&result)?),
        Ok(result) => println!("{}", result.display_as_table()),
        Err(err) => {
            let message = describe_error(&err);
            return Err(anyhow::Error::new(err).context(message));
        }
    }
    Ok(())
}
