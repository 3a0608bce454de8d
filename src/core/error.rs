//! Typed failures returned by the rate engine

use thiserror::Error;

/// Failures while obtaining the rate table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    #[error("failed to fetch rates from {url}: {reason}")]
    Network { url: String, reason: String },
    #[error("malformed rate feed: {0}")]
    Format(String),
}

/// Failures of a single conversion request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("could not read an amount from the input")]
    MissingAmount,
    #[error("no currency given after the amount")]
    MissingCurrency,
    #[error("exchange rates are unavailable: {0}")]
    RatesUnavailable(#[source] RateError),
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),
    #[error("currency {0} is not quoted in the rate table")]
    CurrencyNotQuoted(String),
    #[error("rate table has no usable rate for {0}")]
    IncompleteRates(String),
}
