//! Rate table and feed source abstractions

use crate::core::error::RateError;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const BASE_CURRENCY: &str = "RUB";
pub const BASE_CURRENCY_NAME: &str = "Российский рубль";

#[derive(Debug, Clone, PartialEq)]
pub struct Currency {
    /// Rubles per one unit of the currency.
    pub rate: f64,
    pub name: String,
}

/// Immutable snapshot of one published rate table.
///
/// Entries are kept sorted by code, which is also the order used when
/// matching display names.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    date: NaiveDate,
    currencies: BTreeMap<String, Currency>,
}

impl RateTable {
    /// Builds a table from `(code, rate, name)` entries. The base currency is
    /// always present at rate 1.0, replacing any entry with the same code.
    pub fn new<I, C, N>(date: NaiveDate, entries: I) -> Self
    where
        I: IntoIterator<Item = (C, f64, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let mut currencies: BTreeMap<String, Currency> = entries
            .into_iter()
            .map(|(code, rate, name)| {
                (
                    code.into().to_uppercase(),
                    Currency {
                        rate,
                        name: name.into(),
                    },
                )
            })
            .collect();
        currencies.insert(
            BASE_CURRENCY.to_string(),
            Currency {
                rate: 1.0,
                name: BASE_CURRENCY_NAME.to_string(),
            },
        );
        Self { date, currencies }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.currencies.get(code).map(|c| c.rate)
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.currencies.get(code).map(|c| c.name.as_str())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.currencies.contains_key(code)
    }

    /// Iterates currencies in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Currency)> {
        self.currencies.iter().map(|(code, c)| (code.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }
}

/// Fetches the raw rate feed. Implementations do no parsing or caching.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, RateError>;
}
