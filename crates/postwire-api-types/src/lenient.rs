//! Tolerant field decoders used at the decode boundary.
//!
//! Each decoder accepts whatever the backend sent and degrades to the field's
//! default instead of failing the enclosing entity.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// RFC 3339 timestamps; anything unparsable becomes `None`.
pub mod timestamp {
    use super::*;

    pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => {
                let text = ts.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<Value> = Option::deserialize(deserializer)?;
        Ok(raw
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|text| OffsetDateTime::parse(text, &Rfc3339).ok()))
    }
}

/// Numeric references that may arrive as numbers or numeric strings.
pub mod id {
    use super::*;

    pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(id) => serializer.serialize_some(id),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<Value> = Option::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(super::as_id))
    }
}

/// Sequences of entities; non-arrays become empty and undecodable items are dropped.
pub fn seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Booleans that may arrive as `true`/`"true"`/`1`; anything else is `false`.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Bool(value)) => value,
        Some(Value::String(text)) => text.eq_ignore_ascii_case("true"),
        Some(Value::Number(number)) => number.as_u64() == Some(1),
        _ => false,
    })
}

/// Counts that may arrive as a number, a numeric string or `null`; anything else is zero.
pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(as_id).unwrap_or(0))
}

/// Read an id from a JSON number or a numeric string.
pub fn as_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, with = "timestamp")]
        at: Option<OffsetDateTime>,
        #[serde(default, with = "id")]
        post: Option<u64>,
        #[serde(default, deserialize_with = "flag")]
        approved: bool,
        #[serde(default, deserialize_with = "seq")]
        numbers: Vec<u32>,
    }

    #[test]
    fn malformed_fields_degrade_to_defaults() {
        let sample: Sample = serde_json::from_value(json!({
            "at": "yesterday",
            "post": "not-a-number",
            "approved": "nope",
            "numbers": {"oops": 1}
        }))
        .expect("sample decodes");

        assert!(sample.at.is_none());
        assert!(sample.post.is_none());
        assert!(!sample.approved);
        assert!(sample.numbers.is_empty());
    }

    #[test]
    fn well_formed_fields_decode() {
        let sample: Sample = serde_json::from_value(json!({
            "at": "2024-03-01T10:15:00.123456Z",
            "post": "42",
            "approved": true,
            "numbers": [1, "two", 3]
        }))
        .expect("sample decodes");

        assert_eq!(sample.at.map(|at| at.year()), Some(2024));
        assert_eq!(sample.post, Some(42));
        assert!(sample.approved);
        assert_eq!(sample.numbers, vec![1, 3]);
    }
}
