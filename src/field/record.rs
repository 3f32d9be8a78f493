// 📦 Field results - value + timestamp, keyed by field label
//
// Serialized shape:
//   { "<label>": { "value": 0.5, "timestamp": "2011-01-03T00:00:00" } }

use chrono::NaiveDateTime;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::temporal::format_timestamp;

/// Raw output of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldValue {
    pub value: f64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: NaiveDateTime,
}

impl FieldValue {
    pub fn new(value: f64, timestamp: NaiveDateTime) -> Self {
        FieldValue { value, timestamp }
    }
}

fn serialize_timestamp<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

/// A field's structured output
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    pub label: String,
    pub value: FieldValue,
}

impl FieldRecord {
    pub fn new(label: impl Into<String>, value: FieldValue) -> Self {
        FieldRecord {
            label: label.into(),
            value,
        }
    }

    /// Same shape as the `Serialize` impl, as a JSON tree
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for FieldRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.label, &self.value)?;
        map.end()
    }
}
