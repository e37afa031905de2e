//! Decoders for loosely typed fields.
//!
//! Documents are written by several clients, and scalar fields show up as
//! text, numbers or `null` depending on who wrote them last.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Text that may be stored as a number or `null`. `null` reads as empty.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected text, found {}", other))),
    }
}

/// Text when present as a string, `None` for anything else.
pub(crate) fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// A flag where `null` means unset.
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "text")]
        name: String,
        #[serde(default, deserialize_with = "optional_text")]
        date: Option<String>,
        #[serde(default, deserialize_with = "flag")]
        on: bool,
    }

    #[test]
    fn test_text_accepts_numbers_and_null() {
        let p: Fields = serde_json::from_value(json!({"name": 5000, "on": null})).unwrap();
        assert_eq!(p.name, "5000");
        assert!(!p.on);

        let p: Fields = serde_json::from_value(json!({"name": null, "on": true})).unwrap();
        assert_eq!(p.name, "");
        assert!(p.on);

        assert!(serde_json::from_value::<Fields>(json!({"name": {"a": 1}})).is_err());
    }

    #[test]
    fn test_optional_text_ignores_other_types() {
        let p: Fields = serde_json::from_value(json!({"date": {"_seconds": 1}})).unwrap();
        assert_eq!(p.date, None);

        let p: Fields = serde_json::from_value(json!({"date": "2023-01-01"})).unwrap();
        assert_eq!(p.date.as_deref(), Some("2023-01-01"));
    }
}
