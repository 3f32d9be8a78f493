// 📈 TimedValue - one measurement of one attribute for one subject

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Attribute, Subject};
use crate::temporal::{parse_timestamp, TimestampError};

/// A timestamped numeric measurement.
///
/// Many may exist per (subject, attribute) across time; picking one is the
/// lookup's job, not the field's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedValue {
    pub subject: Subject,
    pub attribute: Attribute,
    pub timestamp: NaiveDateTime,
    pub value: f64,

    /// Qualifier published alongside the value (e.g., "provisional")
    #[serde(default)]
    pub caveat: Option<String>,
}

impl TimedValue {
    pub fn new(subject: Subject, attribute: Attribute, timestamp: NaiveDateTime, value: f64) -> Self {
        TimedValue {
            subject,
            attribute,
            timestamp,
            value,
            caveat: None,
        }
    }

    /// Builder: attach a value caveat
    pub fn with_caveat(mut self, caveat: impl Into<String>) -> Self {
        self.caveat = Some(caveat.into());
        self
    }

    /// Build from a textual timestamp in any notation `parse_timestamp` accepts
    pub fn parse(
        subject: Subject,
        attribute: Attribute,
        timestamp: &str,
        value: f64,
    ) -> Result<Self, TimestampError> {
        Ok(TimedValue::new(subject, attribute, parse_timestamp(timestamp)?, value))
    }
}
