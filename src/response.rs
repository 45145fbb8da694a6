//! Summarisation endpoint responses.
//!
//! Inference endpoints disagree on the response shape: some return a bare
//! string, most return a list with one object, a few return the object
//! directly. Each shape is a variant so extraction is a plain match.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Fields that may carry the summary, in order of preference.
pub const TEXT_FIELDS: [&str; 3] = ["summary_text", "generated_text", "text"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SummaryResponse {
    Text(String),
    List(Vec<Value>),
    Object(Map<String, Value>),
    /// Valid JSON of any other shape; never yields text
    Other(Value),
}

impl SummaryResponse {
    /// The summary text, if the response exposes one.
    pub fn extract(&self) -> Option<&str> {
        match self {
            SummaryResponse::Text(text) => Some(text),
            SummaryResponse::List(items) => items.first().and_then(text_of_item),
            SummaryResponse::Object(fields) => text_field(fields),
            SummaryResponse::Other(_) => None,
        }
    }
}

impl From<Value> for SummaryResponse {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => SummaryResponse::Text(text),
            Value::Array(items) => SummaryResponse::List(items),
            Value::Object(fields) => SummaryResponse::Object(fields),
            other => SummaryResponse::Other(other),
        }
    }
}

fn text_of_item(item: &Value) -> Option<&str> {
    match item {
        Value::String(text) => Some(text),
        Value::Object(fields) => text_field(fields),
        _ => None,
    }
}

fn text_field(fields: &Map<String, Value>) -> Option<&str> {
    TEXT_FIELDS
        .iter()
        .find_map(|key| fields.get(*key).and_then(Value::as_str))
}
