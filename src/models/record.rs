//! Record model representing one entry of the VIP catalog.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::fields;

/// A single catalog entry
///
/// Field names and value types are controlled by the dataset. Only a handful
/// of well-known fields (see [`fields`]) carry meaning for search, filtering
/// and display; everything else is passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Create a record from an already parsed JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Raw value of a field, if the key is present (it may still be `null`)
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Whether the key is present on the record
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// All keys present on the record
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of keys present on the record
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no keys at all
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Stringified value of a field; absent and `null` become `""`
    pub fn text(&self, field: &str) -> String {
        self.fields.get(field).map(stringify).unwrap_or_default()
    }

    /// Normalized identifier (trimmed `PubMed_ID`)
    pub fn identifier(&self) -> String {
        normalize_identifier(&self.text(fields::PUBMED_ID))
    }

    /// Publication year as an integer.
    ///
    /// Absent or unparsable years are reported as `0`, so a record without a
    /// year never satisfies a range whose lower bound is positive.
    pub fn year(&self) -> i64 {
        parse_year(&self.text(fields::YEAR)).unwrap_or(0)
    }

    /// Title, or a placeholder for untitled records
    pub fn display_title(&self) -> String {
        let title = self.text(fields::TITLE);
        if title.trim().is_empty() {
            "(no title)".to_string()
        } else {
            title
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Normalize an identifier for exact comparison
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_string()
}

/// Render a JSON value the way it is compared and displayed.
///
/// Integral numbers drop a trailing `.0` so that `2020` and `2020.0` compare
/// equal to the string `"2020"`.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                        format!("{}", f as i64)
                    }
                    _ => n.to_string(),
                }
            }
        }
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Parse a year string, accepting integers and finite floats
fn parse_year(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(year) = trimmed.parse::<i64>() {
        return Some(year);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_stringify_values() {
        assert_eq!(stringify(&json!(null)), "");
        assert_eq!(stringify(&json!("abc")), "abc");
        assert_eq!(stringify(&json!(1)), "1");
        assert_eq!(stringify(&json!(2020.0)), "2020");
        assert_eq!(stringify(&json!(0.5)), "0.5");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!(["a", 1])), r#"["a",1]"#);
    }

    #[test]
    fn test_identifier_is_trimmed() {
        let r = record(json!({"PubMed_ID": "  12345 "}));
        assert_eq!(r.identifier(), "12345");

        let r = record(json!({"PubMed_ID": 12345}));
        assert_eq!(r.identifier(), "12345");

        let r = record(json!({"Title": "no id"}));
        assert_eq!(r.identifier(), "");
    }

    #[test]
    fn test_year_parsing() {
        assert_eq!(record(json!({"Year": 2020})).year(), 2020);
        assert_eq!(record(json!({"Year": " 2019 "})).year(), 2019);
        assert_eq!(record(json!({"Year": 2018.0})).year(), 2018);
        assert_eq!(record(json!({"Year": "unknown"})).year(), 0);
        assert_eq!(record(json!({"Year": null})).year(), 0);
        assert_eq!(record(json!({})).year(), 0);
    }

    #[test]
    fn test_text_for_absent_field() {
        let r = record(json!({"Title": null}));
        assert_eq!(r.text("Title"), "");
        assert_eq!(r.text("Missing"), "");
        assert!(r.contains("Title"));
        assert!(!r.contains("Missing"));
    }

    #[test]
    fn test_display_title_placeholder() {
        assert_eq!(record(json!({"Title": "  "})).display_title(), "(no title)");
        assert_eq!(record(json!({"Title": "CADD"})).display_title(), "CADD");
    }
}
