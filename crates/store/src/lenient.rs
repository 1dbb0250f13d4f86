//! Forgiving field decoders for records written by hand or by older versions.
//!
//! Use together with `#[serde(default)]` so that absent fields decode as the empty
//! string or zero:
//!
//! ```
//! #[derive(serde::Deserialize)]
//! struct Row {
//!     #[serde(default, deserialize_with = "clinic_store::lenient::string")]
//!     age: String,
//!     #[serde(default, deserialize_with = "clinic_store::lenient::count")]
//!     stock: u32,
//! }
//!
//! let row: Row = serde_json::from_str(r#"{"age": 34, "stock": "7"}"#).unwrap();
//! assert_eq!(row.age, "34");
//! assert_eq!(row.stock, 7);
//! ```

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decodes any scalar as text; `null` becomes the empty string.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Decodes a non-negative count from a number or numeric string.
///
/// Negative values clamp to zero, fractional values truncate, and anything unparseable
/// decodes as zero.
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(raw.clamp(0.0, u32::MAX as f64) as u32)
}

/// Decodes a decimal amount from a number or numeric string; anything else is zero.
pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Decodes an optional comma-joined list.
///
/// Strings pass through, arrays of scalars are joined with `,`, and `null`, empty strings
/// and empty arrays decode as `None`.
pub fn joined<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    };
    Ok(Some(text).filter(|t| !t.trim().is_empty()))
}
