//! Readers for the legacy JSON backup format.
//!
//! Each backup file holds an array of documents exported from the old
//! content store. Ids appear as plain strings or `{"$oid": ...}`, timestamps
//! as RFC 3339 strings, epoch millis or `{"$date": ...}`, and references as
//! `{"$ref", "$id"}` pairs.

use crate::error::{AppError, Result};
use crate::models::{Collection, DocumentRef};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// A reference as written in a backup; `$id` may itself be `{"$oid": ...}`
#[derive(Debug, Deserialize)]
struct TaggedRef {
    #[serde(rename = "$ref")]
    collection: Collection,
    #[serde(rename = "$id")]
    id: Value,
}

/// One raw document from a backup file
#[derive(Debug, Clone)]
pub struct LegacyDocument(Value);

impl LegacyDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The document's `_id`, normalized to a string
    pub fn legacy_id(&self) -> Option<String> {
        self.0.get("_id").and_then(id_of)
    }

    /// First non-blank string among `keys`
    pub fn string(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match self.0.get(*key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Object(map) => map
                .get("$numberDouble")
                .or_else(|| map.get("$numberInt"))
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
            _ => None,
        }
    }

    pub fn i32(&self, key: &str) -> Option<i32> {
        self.f64(key).map(|v| v.round() as i32)
    }

    /// Missing or null reads as `false`
    pub fn bool(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.0.get(key).and_then(timestamp_of)
    }

    /// A calendar date stored as `YYYY-MM-DD` or as a full timestamp
    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        let value = self.0.get(key)?;
        if let Some(s) = value.as_str() {
            if let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
                return Some(date);
            }
        }
        timestamp_of(value).map(|ts| ts.date_naive())
    }

    /// Image location stored either as a URL string or as an object with a `url`
    pub fn image_url(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| match self.0.get(*key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(map) => map
                .get("url")
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
            _ => None,
        })
    }

    /// References held in an array field, in order, as legacy ids.
    ///
    /// Bare ids are taken to point into `expected`. Tagged references into
    /// any other collection are dropped.
    pub fn refs(&self, key: &str, expected: Collection) -> Vec<DocumentRef> {
        let Some(items) = self.0.get(key).and_then(Value::as_array) else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| {
                let reference = reference_of(item, expected)?;
                if reference.collection != expected {
                    tracing::warn!(
                        field = key,
                        reference = %reference,
                        expected = %expected,
                        "Dropping reference into an unexpected collection"
                    );
                    return None;
                }
                Some(reference)
            })
            .collect()
    }

    /// Documents embedded whole in an array field
    pub fn embedded(&self, key: &str) -> Vec<LegacyDocument> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.get("name").is_some())
                    .cloned()
                    .map(LegacyDocument)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Extract an id from a string, number or `{"$oid"}` value
fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("$oid").and_then(id_of),
        _ => None,
    }
}

fn reference_of(value: &Value, default: Collection) -> Option<DocumentRef> {
    if value.get("$ref").is_none() {
        return id_of(value).map(|id| DocumentRef::new(default, id));
    }
    match serde_json::from_value::<TaggedRef>(value.clone()) {
        Ok(tagged) => id_of(&tagged.id).map(|id| DocumentRef::new(tagged.collection, id)),
        Err(e) => {
            tracing::warn!(error = %e, "Dropping malformed reference");
            None
        }
    }
}

fn timestamp_of(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        Value::Object(map) => map
            .get("$date")
            .or_else(|| map.get("$numberLong"))
            .and_then(|inner| match inner {
                Value::String(s) => match s.parse::<i64>() {
                    Ok(millis) => Utc.timestamp_millis_opt(millis).single(),
                    Err(_) => timestamp_of(inner),
                },
                other => timestamp_of(other),
            }),
        _ => None,
    }
}

/// Read one backup file. A missing file yields no documents.
pub async fn read_backup_file(path: &Path) -> Result<Vec<LegacyDocument>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Backup file not found, skipping");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_str::<Value>(&raw)? {
        Value::Array(items) => {
            tracing::info!(path = %path.display(), count = items.len(), "Read backup file");
            Ok(items.into_iter().map(LegacyDocument).collect())
        }
        _ => Err(AppError::Validation(format!(
            "Backup file {} must contain a JSON array",
            path.display()
        ))),
    }
}
