//! Resolution of user-typed currency references to canonical codes

use crate::core::rates::RateTable;
use tracing::debug;

/// Common words and abbreviations, including inflected forms, mapped to codes.
const ALIASES: &[(&str, &str)] = &[
    // Russian ruble
    ("rub", "RUB"),
    ("rur", "RUB"),
    ("руб", "RUB"),
    ("рубль", "RUB"),
    ("рубля", "RUB"),
    ("рубли", "RUB"),
    ("рублей", "RUB"),
    ("россия", "RUB"),
    ("рф", "RUB"),
    ("russia", "RUB"),
    // US dollar
    ("usd", "USD"),
    ("доллар", "USD"),
    ("доллара", "USD"),
    ("доллары", "USD"),
    ("долларов", "USD"),
    ("бакс", "USD"),
    ("бакса", "USD"),
    ("баксы", "USD"),
    ("баксов", "USD"),
    ("сша", "USD"),
    ("usa", "USD"),
    ("america", "USD"),
    ("америка", "USD"),
    // Kazakhstani tenge
    ("kzt", "KZT"),
    ("тенге", "KZT"),
    ("казахстан", "KZT"),
    ("казахстанский", "KZT"),
    ("казахстана", "KZT"),
    // Thai baht
    ("thb", "THB"),
    ("бат", "THB"),
    ("бата", "THB"),
    ("баты", "THB"),
    ("батов", "THB"),
    ("тайланд", "THB"),
    ("таиланд", "THB"),
    ("тайский", "THB"),
    ("thailand", "THB"),
    // Euro
    ("eur", "EUR"),
    ("евро", "EUR"),
    ("euro", "EUR"),
    // Chinese yuan
    ("cny", "CNY"),
    ("юань", "CNY"),
    ("юаня", "CNY"),
    ("юани", "CNY"),
    ("юаней", "CNY"),
    ("китай", "CNY"),
    ("yuan", "CNY"),
];

/// Lowercases and folds `ё` into `е` so both spellings match.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase().replace('ё', "е")
}

fn alias(token: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, code)| *code)
}

/// Maps a currency phrase to a canonical code.
///
/// Tries, in order: the alias table per token, a table code per token, then
/// the whole phrase as a substring of a display name (codes in ascending
/// order). Alias hits are returned even if the table does not quote them.
pub fn resolve(raw: &str, table: &RateTable) -> Option<String> {
    let normalized = normalize(raw);
    if normalized.is_empty() {
        return None;
    }
    let tokenized = normalized.replace([',', '.'], " ");
    let tokens: Vec<&str> = tokenized.split_whitespace().collect();

    if let Some(code) = tokens.iter().find_map(|token| alias(token)) {
        debug!(%raw, code, "Resolved currency by alias");
        return Some(code.to_string());
    }

    if let Some(code) = tokens
        .iter()
        .map(|token| token.to_uppercase())
        .find(|code| table.contains(code))
    {
        debug!(%raw, %code, "Resolved currency by code");
        return Some(code);
    }

    let found = table
        .iter()
        .find(|(_, currency)| normalize(&currency.name).contains(&normalized))
        .map(|(code, _)| code.to_string());
    if let Some(code) = &found {
        debug!(%raw, %code, "Resolved currency by name");
    }
    found
}
