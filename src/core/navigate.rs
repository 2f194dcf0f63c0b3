//! Safe navigation over FHIR JSON documents
//!
//! FHIR payloads are deeply nested and almost every link is optional. Paths
//! are written as dotted keys with `[n]` array indices:
//!
//! ```
//! use fhir_ingest::core::navigate::{navigate, str_at};
//! use serde_json::json;
//!
//! let resource = json!({"type": {"coding": [{"code": "pharmacy"}]}});
//! assert_eq!(str_at(&resource, "type.coding[0].code"), Some("pharmacy"));
//! assert!(navigate(&resource, "type.coding[1].code").is_none());
//! assert!(navigate(&resource, "performer[0].actor").is_none());
//! ```
//!
//! Navigation stops at the first missing link, wrong-typed node or JSON
//! `null`, returning `None`.

use chrono::NaiveDate;
use serde_json::Value;

/// Follows `path` through `value`
pub fn navigate<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let (key, indices) = split_segment(segment)?;
        if !key.is_empty() {
            current = current.as_object()?.get(key)?;
        }
        for index in indices {
            current = current.as_array()?.get(index)?;
        }
    }
    (!current.is_null()).then_some(current)
}

/// Splits `coding[0][1]` into `("coding", [0, 1])`
fn split_segment(segment: &str) -> Option<(&str, Vec<usize>)> {
    let Some(open) = segment.find('[') else {
        return Some((segment, Vec::new()));
    };

    let key = &segment[..open];
    let mut indices = Vec::new();
    let mut rest = &segment[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let close = stripped.find(']')?;
        indices.push(stripped[..close].trim().parse().ok()?);
        rest = &stripped[close + 1..];
    }
    // Trailing garbage after the last index makes the path unusable
    rest.is_empty().then_some((key, indices))
}

/// String at `path`; empty strings count as absent
pub fn str_at<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    navigate(value, path)?
        .as_str()
        .filter(|s| !s.trim().is_empty())
}

/// Owned string at `path`
pub fn string_at(value: &Value, path: &str) -> Option<String> {
    str_at(value, path).map(str::to_string)
}

/// Number at `path`, accepting JSON numbers and numeric strings
pub fn number_at(value: &Value, path: &str) -> Option<f64> {
    as_number(navigate(value, path)?)
}

/// Interprets a JSON node as a finite number
pub fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Calendar date of a FHIR `date`/`dateTime` string at `path`
pub fn date_at(value: &Value, path: &str) -> Option<NaiveDate> {
    date_portion(str_at(value, path)?)
}

/// Parses the date portion of a FHIR `date` or `dateTime`
///
/// Everything from the first time separator (`T` or a space) on is discarded.
/// Partial dates (`2024`, `2024-05`) and malformed text yield `None`.
pub fn date_portion(text: &str) -> Option<NaiveDate> {
    let date = text
        .trim()
        .split(['T', ' '])
        .next()
        .filter(|d| !d.is_empty())?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// First element of the array at `path` whose field `key` equals `expected`
pub fn find_in<'a>(value: &'a Value, path: &str, key: &str, expected: &str) -> Option<&'a Value> {
    navigate(value, path)?
        .as_array()?
        .iter()
        .find(|item| str_at(item, key) == Some(expected))
}
