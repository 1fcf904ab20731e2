use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ImportError;
use crate::models::Snippet;

/// Literal tag identifying an export document.
pub const EXPORT_TYPE: &str = "console-rules-snippets";
pub const EXPORT_VERSION: u32 = 1;

/// Export file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    /// ISO-8601 with millisecond precision.
    pub exported_at: String,
    pub count: usize,
    pub snippets: Vec<Snippet>,
}

impl ExportData {
    pub fn new(snippets: &[Snippet], exported_at: DateTime<Utc>) -> Self {
        Self {
            kind: EXPORT_TYPE.to_string(),
            version: EXPORT_VERSION,
            exported_at: iso_timestamp(exported_at),
            count: snippets.len(),
            snippets: snippets.to_vec(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `console-rules-snippets-<timestamp>.json`, with `:` and `.` of the timestamp
/// replaced so the name is safe on every filesystem.
pub fn export_file_name(at: DateTime<Utc>) -> String {
    let stamp = iso_timestamp(at).replace([':', '.'], "-");
    format!("{EXPORT_TYPE}-{stamp}.json")
}

/// Shape of an import payload, decided before any record is inspected.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportPayload {
    /// A bare array of snippet-like records.
    Bare(Vec<Value>),
    /// An object carrying the records under `snippets`, such as an export document.
    Document(Vec<Value>),
}

impl ImportPayload {
    pub fn classify(value: Value) -> Result<Self, ImportError> {
        match value {
            Value::Array(items) => Ok(ImportPayload::Bare(items)),
            Value::Object(mut map) => match map.remove("snippets") {
                Some(Value::Array(items)) => Ok(ImportPayload::Document(items)),
                _ => Err(ImportError::InvalidFormat(
                    "object has no `snippets` array".to_string(),
                )),
            },
            other => Err(ImportError::InvalidFormat(format!(
                "expected an array or an object, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn parse(text: &str) -> Result<Self, ImportError> {
        let value: Value = serde_json::from_str(text)?;
        Self::classify(value)
    }

    pub fn into_items(self) -> Vec<Value> {
        match self {
            ImportPayload::Bare(items) | ImportPayload::Document(items) => items,
        }
    }
}

/// Fields recovered from one import record, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRecord {
    pub name: String,
    pub code: String,
    pub updated_at: i64,
}

/// Keeps records exposing a string `code`; everything else about the record is coerced.
pub fn clean_record(item: &Value, untitled: &str, now: i64) -> Option<CleanedRecord> {
    let record = item.as_object()?;
    let code = record.get("code")?.as_str()?.to_string();

    let name = record
        .get("name")
        .and_then(coerce_name)
        .unwrap_or_else(|| untitled.to_string());

    let updated_at = record
        .get("updatedAt")
        .and_then(coerce_timestamp)
        .unwrap_or(now);

    Some(CleanedRecord {
        name,
        code,
        updated_at,
    })
}

fn coerce_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn coerce_timestamp(value: &Value) -> Option<i64> {
    let millis = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if millis.is_finite() && millis > 0.0 && millis <= i64::MAX as f64 {
        Some(millis as i64)
    } else {
        None
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
