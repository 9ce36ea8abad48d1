//! The loosely-typed row returned by every list endpoint.
//!
//! Articles and social posts share no fixed schema: one source sends
//! `published_date`, another `created_time`; links live under a dozen
//! different keys.  `Record` keeps the raw JSON object and offers defensive
//! accessors so that rendering never fails on a missing or oddly-typed field.
//!
//! ## Truthiness
//!
//! A field counts as *present* only when it holds a non-empty string, a
//! non-zero number or `true`.  `null`, `""`, `0` and `false` are treated as
//! absent and the caller substitutes its placeholder.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys that may carry the publication timestamp of a news article.
pub const ARTICLE_DATE_FIELDS: &[&str] = &["published_date", "date"];

/// Keys that may carry the creation timestamp of any record, articles first.
pub const ANY_DATE_FIELDS: &[&str] = &["published_date", "date", "created_at", "created_time"];

/// Keys that may carry the link to the original publication, in priority order.
pub const LINK_FIELDS: &[&str] = &[
    "link",
    "telegram_link",
    "israil_link",
    "url",
    "original_url",
    "lenta_link",
    "rbc_link",
    "gazeta_link",
    "kommersant_link",
    "tsn_link",
    "unian_link",
    "rt_link",
    "cnn_link",
    "aljazeera_link",
    "reuters_link",
    "france24_link",
    "dw_link",
    "euronews_link",
];

/// One article or social-media post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The field rendered as display text, or `None` when absent or falsy.
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).and_then(truthy_text)
    }

    /// First present field out of `fields`.
    pub fn first_text(&self, fields: &[&str]) -> Option<String> {
        fields.iter().find_map(|f| self.text(f))
    }

    /// Numeric value of a field.  Numeric strings are accepted too.
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Link to the original publication, skipping blank values.
    pub fn link(&self) -> Option<String> {
        LINK_FIELDS
            .iter()
            .filter_map(|f| self.text(f))
            .find(|l| !l.trim().is_empty())
    }

    /// Timestamp under any of the known date keys.
    pub fn date(&self) -> Option<String> {
        self.first_text(ANY_DATE_FIELDS)
    }
}

fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(false) => None,
        Value::Bool(true) => Some("true".into()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
