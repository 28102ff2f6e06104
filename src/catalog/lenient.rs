//! Tolerant deserializers for the optional fields of corpus records.
//!
//! A value of an unexpected JSON type is converted rather than rejected, so a
//! record with `"title": 1984` or `"overall": "5"` still loads. A value that
//! cannot be converted reads as absent and takes the field's default.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize optional text. Non-string values keep their JSON rendering.
pub fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(value.and_then(text))
}

/// Deserialize an optional float from a number or a numeric string.
pub fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Deserialize optional epoch seconds. Fractional values are truncated.
pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    })
}

/// Deserialize a list of category paths, flattened. Scalars inside a path are
/// rendered as text; anything that is not an array of arrays is ignored.
pub fn deserialize_category_paths<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    let Some(Value::Array(paths)) = value else {
        return Ok(Vec::new());
    };
    Ok(paths
        .into_iter()
        .filter_map(|path| match path {
            Value::Array(names) => Some(names),
            _ => None,
        })
        .flatten()
        .filter_map(text)
        .collect())
}

fn text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Record {
        #[serde(default, deserialize_with = "deserialize_optional_text")]
        text: Option<String>,
        #[serde(default, deserialize_with = "deserialize_optional_f64")]
        float: Option<f64>,
        #[serde(default, deserialize_with = "deserialize_optional_i64")]
        seconds: Option<i64>,
        #[serde(default, deserialize_with = "deserialize_category_paths")]
        paths: Vec<String>,
    }

    fn parse(json: &str) -> Record {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_missing_and_null_fields_are_absent() {
        let record = parse(r#"{"text":null,"float":null}"#);
        assert_eq!(record.text, None);
        assert_eq!(record.float, None);
        assert_eq!(record.seconds, None);
        assert!(record.paths.is_empty());
    }

    #[test]
    fn test_scalars_of_other_types_are_converted() {
        let record = parse(r#"{"text":1984,"float":"4.5","seconds":"1400000000","paths":[["A",7]]}"#);
        assert_eq!(record.text.as_deref(), Some("1984"));
        assert_eq!(record.float, Some(4.5));
        assert_eq!(record.seconds, Some(1_400_000_000));
        assert_eq!(record.paths, ["A", "7"]);

        let record = parse(r#"{"text":true,"seconds":12.9}"#);
        assert_eq!(record.text.as_deref(), Some("true"));
        assert_eq!(record.seconds, Some(12));
    }

    #[test]
    fn test_unconvertible_values_are_absent() {
        let record = parse(r#"{"float":"five","seconds":[1],"paths":"Books"}"#);
        assert_eq!(record.float, None);
        assert_eq!(record.seconds, None);
        assert!(record.paths.is_empty());
    }
}
