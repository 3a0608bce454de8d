//! Splitting free-form input into an amount and a currency phrase

use crate::core::error::ConversionError;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInput {
    pub amount: f64,
    /// Currency words as typed, joined by single spaces.
    pub currency: String,
}

/// Extracts `<amount> <currency words...>` from user text.
///
/// A comma is accepted as the decimal separator. Thousands separators are not.
pub fn extract(text: &str) -> Result<ParsedInput, ConversionError> {
    let cleaned = text.replace(',', ".");
    let mut parts = cleaned.split_whitespace();

    let amount = parts
        .next()
        .and_then(|token| token.parse::<f64>().ok())
        .filter(|amount| amount.is_finite())
        .ok_or(ConversionError::MissingAmount)?;

    let currency = parts.collect::<Vec<_>>().join(" ");
    if currency.is_empty() {
        return Err(ConversionError::MissingCurrency);
    }

    Ok(ParsedInput { amount, currency })
}
