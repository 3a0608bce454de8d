//! Conversion of a free-form amount into the configured target currencies

use crate::core::cache::RateCache;
use crate::core::error::ConversionError;
use crate::core::extract::extract;
use crate::core::rates::RateTable;
use crate::core::resolver::resolve;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedAmount {
    pub code: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub code: String,
    pub amount: f64,
    pub date: NaiveDate,
    /// One entry per target currency, in configured order.
    pub conversions: Vec<ConvertedAmount>,
}

impl ConversionResult {
    pub fn amount_in(&self, code: &str) -> Option<f64> {
        self.conversions
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.amount)
    }
}

pub struct ConversionEngine {
    cache: Arc<RateCache>,
    targets: Vec<String>,
}

impl ConversionEngine {
    pub fn new(cache: Arc<RateCache>, targets: Vec<String>) -> Self {
        Self { cache, targets }
    }

    /// Converts text such as `"100 usd"` into every target currency.
    #[instrument(skip(self))]
    pub async fn convert(
        &self,
        text: &str,
        force_refresh: bool,
    ) -> Result<ConversionResult, ConversionError> {
        let input = extract(text)?;
        let table = self
            .cache
            .get_table(force_refresh)
            .await
            .map_err(ConversionError::RatesUnavailable)?;
        let code = resolve(&input.currency, &table)
            .ok_or_else(|| ConversionError::UnknownCurrency(input.currency.clone()))?;
        debug!(amount = input.amount, %code, "Converting");

        let conversions = convert_amount(input.amount, &code, &table, &self.targets)?;
        Ok(ConversionResult {
            code,
            amount: input.amount,
            date: table.date(),
            conversions,
        })
    }
}

/// Converts `amount` of `code` into each of `targets` through the base currency.
pub fn convert_amount(
    amount: f64,
    code: &str,
    table: &RateTable,
    targets: &[String],
) -> Result<Vec<ConvertedAmount>, ConversionError> {
    let rate = table
        .rate(code)
        .ok_or_else(|| ConversionError::CurrencyNotQuoted(code.to_string()))?;

    let target_rates = targets
        .iter()
        .map(|target| match table.rate(target) {
            Some(r) if r != 0.0 => Ok((target, r)),
            _ => Err(ConversionError::IncompleteRates(target.clone())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let amount_in_base = amount * rate;
    Ok(target_rates
        .into_iter()
        .map(|(target, target_rate)| ConvertedAmount {
            code: target.clone(),
            amount: amount_in_base / target_rate,
        })
        .collect())
}
