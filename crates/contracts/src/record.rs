//! Record - the unit flowing through the pipeline
//!
//! A record is an insertion-ordered map of field name to value. The tokenizer
//! fills it with text values, the normalizer adds the canonical timestamp and
//! the enricher may graft nested maps onto it.

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::Serialize;

/// Default name of the canonical timestamp field
pub const DEFAULT_TIMESTAMP_FIELD: &str = "@timestamp";

/// A single field value
///
/// Serialized untagged, so a record becomes a plain JSON object on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Raw text as tokenized from the source line
    Text(String),
    /// Timezone-aware timestamp (RFC 3339 on the wire)
    Timestamp(DateTime<FixedOffset>),
    /// Nested mapping, created by dotted-path enrichment
    Nested(Record),
    /// Any other JSON literal (numbers, booleans, arrays, null)
    Literal(serde_json::Value),
}

impl FieldValue {
    /// Borrow as text, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as timestamp, if this is a timestamp value
    pub fn as_timestamp(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Self::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Borrow as nested record, if this is a nested value
    pub fn as_nested(&self) -> Option<&Record> {
        match self {
            Self::Nested(r) => Some(r),
            _ => None,
        }
    }

    /// Render scalar values as a plain string (used for document ids)
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Timestamp(ts) => Some(ts.to_rfc3339()),
            Self::Literal(serde_json::Value::String(s)) => Some(s.clone()),
            Self::Literal(serde_json::Value::Number(n)) => Some(n.to_string()),
            Self::Literal(serde_json::Value::Bool(b)) => Some(b.to_string()),
            Self::Nested(_) | Self::Literal(_) => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Record> for FieldValue {
    fn from(value: Record) -> Self {
        Self::Nested(value)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Object(map) => Self::Nested(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            ),
            other => Self::Literal(other),
        }
    }
}

/// Insertion-ordered field map
///
/// Keys are unique; re-inserting an existing key replaces the value in place
/// and keeps the original position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record with room for `capacity` fields
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Get a field as text
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(FieldValue::as_text)
    }

    /// Get a field as timestamp
    pub fn get_timestamp(&self, key: &str) -> Option<&DateTime<FixedOffset>> {
        self.fields.get(key).and_then(FieldValue::as_timestamp)
    }

    /// Insert or overwrite a field, returning the previous value
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(key.into(), value.into())
    }

    /// Remove a field, preserving the order of the remaining ones
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.shift_remove(key)
    }

    /// Get the nested record stored under `key`, creating it if absent
    ///
    /// A non-nested value already stored under `key` is replaced by an empty
    /// nested record.
    pub fn nested_mut(&mut self, key: &str) -> &mut Record {
        let slot = self
            .fields
            .entry(key.to_string())
            .or_insert_with(|| FieldValue::Nested(Record::new()));
        into_nested(slot)
    }

    /// Iterate fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate field names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

fn into_nested(slot: &mut FieldValue) -> &mut Record {
    if let FieldValue::Nested(record) = slot {
        return record;
    }
    *slot = FieldValue::Nested(Record::new());
    into_nested(slot)
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_insert_keeps_first_position() {
        let mut record = Record::new();
        record.insert("a", "1");
        record.insert("b", "2");
        record.insert("a", "3");

        let keys: Vec<_> = record.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(record.get_text("a"), Some("3"));
    }

    #[test]
    fn test_nested_mut_replaces_scalar() {
        let mut record = Record::new();
        record.insert("a", "scalar");
        record.nested_mut("a").insert("b", "x");

        let nested = record.get("a").and_then(FieldValue::as_nested).unwrap();
        assert_eq!(nested.get_text("b"), Some("x"));
    }

    #[test]
    fn test_nested_mut_keeps_existing_nested() {
        let mut record = Record::new();
        record.nested_mut("observer").insert("name", "fw01");
        record.nested_mut("observer").insert("site", "dc1");

        let nested = record.get("observer").and_then(FieldValue::as_nested).unwrap();
        assert_eq!(nested.get_text("name"), Some("fw01"));
        assert_eq!(nested.get_text("site"), Some("dc1"));
    }

    #[test]
    fn test_serialize_plain_object() {
        let ts = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .unwrap();
        let mut record = Record::new();
        record.insert("srcip", "10.0.0.1");
        record.insert("@timestamp", ts);
        record.nested_mut("event").insert("count", serde_json::json!(1));

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"srcip":"10.0.0.1","@timestamp":"2024-01-02T03:04:05+02:00","event":{"count":1}}"#
        );
    }

    #[test]
    fn test_from_json_object_becomes_nested() {
        let value = FieldValue::from(serde_json::json!({"site": "prague", "rack": 4}));
        let nested = value.as_nested().unwrap();
        assert_eq!(nested.get_text("site"), Some("prague"));
        assert_eq!(
            nested.get("rack"),
            Some(&FieldValue::Literal(serde_json::json!(4)))
        );
    }

    #[test]
    fn test_scalar_string() {
        assert_eq!(
            FieldValue::from("abc").to_scalar_string(),
            Some("abc".to_string())
        );
        assert_eq!(
            FieldValue::Literal(serde_json::json!(42)).to_scalar_string(),
            Some("42".to_string())
        );
        assert_eq!(FieldValue::Nested(Record::new()).to_scalar_string(), None);
    }
}
