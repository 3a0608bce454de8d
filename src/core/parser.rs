//! Decoding of the Bank of Russia daily XML feed into a [`RateTable`]

use crate::core::error::RateError;
use crate::core::rates::RateTable;
use chrono::NaiveDate;
use encoding_rs::{Encoding, UTF_8};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;
use std::borrow::Cow;
use tracing::{debug, warn};

const DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Deserialize)]
struct ValCurs {
    #[serde(rename = "@Date")]
    date: Option<String>,
    #[serde(rename = "Valute", default)]
    valutes: Vec<Valute>,
}

#[derive(Debug, Deserialize)]
struct Valute {
    #[serde(rename = "CharCode")]
    char_code: Option<String>,
    #[serde(rename = "Nominal")]
    nominal: Option<String>,
    #[serde(rename = "Value")]
    value: Option<String>,
    #[serde(rename = "Name")]
    name: Option<String>,
}

/// Parses raw feed bytes into a rate table.
///
/// Individual malformed records are skipped and logged. The whole feed fails
/// only when it is not well-formed XML or lacks a valid publication date.
pub fn parse(raw: &[u8]) -> Result<RateTable, RateError> {
    let text = decode(raw);
    let doc: ValCurs = quick_xml::de::from_str(&text)
        .map_err(|e| RateError::Format(format!("invalid XML: {e}")))?;

    let date_str = doc
        .date
        .ok_or_else(|| RateError::Format("missing Date attribute".to_string()))?;
    let date = NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT)
        .map_err(|e| RateError::Format(format!("invalid Date attribute {date_str:?}: {e}")))?;

    let entries: Vec<(String, f64, String)> =
        doc.valutes.into_iter().filter_map(parse_record).collect();
    debug!(count = entries.len(), %date, "Parsed rate feed");

    Ok(RateTable::new(date, entries))
}

fn parse_record(valute: Valute) -> Option<(String, f64, String)> {
    let code = valute
        .char_code
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_uppercase();
    if code.is_empty() {
        warn!("Skipping record without CharCode");
        return None;
    }

    let nominal = match valute.nominal.as_deref().map(str::trim) {
        None => 1,
        Some(n) => match n.parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => {
                warn!("Skipping {}: bad nominal {:?}", code, n);
                return None;
            }
        },
    };

    let Some(value_str) = valute.value.as_deref() else {
        warn!("Skipping {}: missing value", code);
        return None;
    };
    let value = match value_str.trim().replace(',', ".").parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            warn!("Skipping {}: bad value {:?}", code, value_str);
            return None;
        }
    };

    let rate = value / f64::from(nominal);
    if !rate.is_finite() || rate <= 0.0 {
        warn!("Skipping {}: non-positive rate {}", code, rate);
        return None;
    }

    let name = valute
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| code.clone());

    Some((code, rate, name))
}

/// Decodes the feed using the encoding named in its XML declaration, falling
/// back to UTF-8. A byte order mark takes precedence over both.
fn decode(raw: &[u8]) -> Cow<'_, str> {
    let encoding = declared_encoding(raw).unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(raw);
    if had_errors {
        warn!("Feed contained invalid {} sequences", used.name());
    }
    text
}

fn declared_encoding(raw: &[u8]) -> Option<&'static Encoding> {
    let mut reader = Reader::from_reader(raw);
    loop {
        match reader.read_event().ok()? {
            // BOM or whitespace ahead of the declaration
            Event::Text(_) => continue,
            Event::Decl(decl) => {
                let label = decl.encoding()?.ok()?;
                return Encoding::for_label(&label);
            }
            _ => return None,
        }
    }
}
