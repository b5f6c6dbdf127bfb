//! Ordered, classified projection of a single record for display.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::models::fields::DETAIL_PRIORITY_FIELDS;
use crate::models::{stringify, Record};

static URL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn url_pattern() -> &'static Regex {
    URL_PATTERN.get_or_init(|| Regex::new(r"(?i)^https?://").expect("URL pattern is valid"))
}

/// How a value should be displayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayValue {
    /// Missing or blank value
    Blank,
    /// HTTP(S) URL; the raw string is both target and label
    Link { href: String, label: String },
    /// Anything else
    Text { text: String },
}

impl DisplayValue {
    /// Classify a raw field value
    pub fn classify(value: Option<&Value>) -> Self {
        let text = match value {
            None | Some(Value::Null) => return DisplayValue::Blank,
            Some(value) => stringify(value),
        };

        if text.trim().is_empty() {
            DisplayValue::Blank
        } else if url_pattern().is_match(&text) {
            DisplayValue::Link {
                href: text.clone(),
                label: text,
            }
        } else {
            DisplayValue::Text { text }
        }
    }

    /// Plain-text rendering used by terminal output
    pub fn display_text(&self) -> &str {
        match self {
            DisplayValue::Blank => "(blank)",
            DisplayValue::Link { label, .. } => label,
            DisplayValue::Text { text } => text,
        }
    }
}

/// One key/value row of the detail view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailEntry {
    pub key: String,
    pub value: DisplayValue,
}

/// Produces the detail view of a record
#[derive(Debug, Clone, Copy, Default)]
pub struct DetailFormatter;

impl DetailFormatter {
    /// Priority fields first (in their fixed order, when present), then the
    /// remaining keys alphabetically. Each key appears exactly once.
    pub fn project(record: &Record) -> Vec<DetailEntry> {
        let mut rest: Vec<&str> = record
            .keys()
            .filter(|key| !DETAIL_PRIORITY_FIELDS.contains(key))
            .collect();
        rest.sort_by(|a, b| alphabetical(a, b));

        let mut ordered: Vec<&str> = DETAIL_PRIORITY_FIELDS
            .iter()
            .copied()
            .filter(|key| record.contains(key))
            .collect();
        ordered.extend(rest);

        ordered
            .into_iter()
            .map(|key| DetailEntry {
                key: key.to_string(),
                value: DisplayValue::classify(record.get(key)),
            })
            .collect()
    }
}

fn alphabetical(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
