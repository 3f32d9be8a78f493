// 🔎 Value Lookup - the seam between fields and stored measurements
//
// Fields never reach for a global store; the lookup is handed to every
// evaluation. Returning at most one value per (subject, matcher) is the
// lookup's contract: when several measurements match, the latest wins.

use thiserror::Error;

use crate::entities::{Subject, TimedValue};
use crate::matcher::AttributeMatcher;
use crate::temporal::TimestampError;

/// Failures inside a lookup collaborator (never produced by fields themselves)
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Corrupt stored timestamp: {0}")]
    Timestamp(#[from] TimestampError),

    #[error("Value store lock poisoned")]
    Poisoned,
}

pub trait ValueLookup {
    /// Find the single applicable timed value for `subject`, or None
    fn resolve(&self, subject: &Subject, matcher: &AttributeMatcher) -> Result<Option<TimedValue>, LookupError>;
}

impl<T: ValueLookup + ?Sized> ValueLookup for &T {
    fn resolve(&self, subject: &Subject, matcher: &AttributeMatcher) -> Result<Option<TimedValue>, LookupError> {
        (**self).resolve(subject, matcher)
    }
}

// ============================================================================
// IN-MEMORY LOOKUP
// ============================================================================

/// Append-only list of measurements.
///
/// Good enough for tests and for embedding a handful of values without SQLite.
#[derive(Debug, Clone, Default)]
pub struct InMemoryValues {
    values: Vec<TimedValue>,
}

impl InMemoryValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: TimedValue) {
        self.values.push(value);
    }

    /// Builder: add a value
    pub fn with(mut self, value: TimedValue) -> Self {
        self.insert(value);
        self
    }
}

impl ValueLookup for InMemoryValues {
    fn resolve(&self, subject: &Subject, matcher: &AttributeMatcher) -> Result<Option<TimedValue>, LookupError> {
        // max_by_key keeps the last of equal maxima, so later inserts win ties
        Ok(self
            .values
            .iter()
            .filter(|tv| tv.subject.key() == subject.key())
            .filter(|tv| matcher.matches(&tv.attribute))
            .filter(|tv| matcher.accepts_caveat(tv.caveat.as_deref()))
            .max_by_key(|tv| tv.timestamp)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Attribute, Provider, SubjectType};

    fn fixture() -> (Subject, Attribute) {
        let provider = Provider::new("default_provider_label", "Default");
        let subject = Subject::new(SubjectType::new("default_provider_label", "lsoa"), "E01000001");
        (subject, Attribute::new(&provider, "attr1_label"))
    }

    #[test]
    fn test_resolve_picks_latest() {
        let (subject, attribute) = fixture();
        let values = InMemoryValues::new()
            .with(TimedValue::parse(subject.clone(), attribute.clone(), "2011-01-03", 3.0).unwrap())
            .with(TimedValue::parse(subject.clone(), attribute.clone(), "2012", 12.0).unwrap())
            .with(TimedValue::parse(subject.clone(), attribute.clone(), "2011-06", 6.0).unwrap());

        let matcher = AttributeMatcher::new("default_provider_label", "attr1_label", None);
        let found = values.resolve(&subject, &matcher).unwrap().unwrap();

        assert_eq!(found.value, 12.0);
    }

    #[test]
    fn test_resolve_tie_goes_to_last_insert() {
        let (subject, attribute) = fixture();
        let values = InMemoryValues::new()
            .with(TimedValue::parse(subject.clone(), attribute.clone(), "2011-01-03", 1.0).unwrap())
            .with(TimedValue::parse(subject.clone(), attribute.clone(), "2011-01-03", 2.0).unwrap());

        let matcher = AttributeMatcher::new("default_provider_label", "attr1_label", None);

        assert_eq!(values.resolve(&subject, &matcher).unwrap().unwrap().value, 2.0);
    }

    #[test]
    fn test_resolve_ignores_subject_name() {
        let (subject, attribute) = fixture();
        let values = InMemoryValues::new()
            .with(TimedValue::parse(subject.clone(), attribute, "2011", 4.0).unwrap());

        let matcher = AttributeMatcher::new("default_provider_label", "attr1_label", None);
        let named = subject.clone().with_name("City of London 001A");

        assert_eq!(values.resolve(&subject, &matcher).unwrap().unwrap().value, 4.0);
        assert_eq!(values.resolve(&named, &matcher).unwrap().unwrap().value, 4.0);
    }

    #[test]
    fn test_resolve_respects_subject_and_caveat() {
        let (subject, attribute) = fixture();
        let other = Subject::new(subject.subject_type.clone(), "E01000002");
        let values = InMemoryValues::new()
            .with(TimedValue::parse(other, attribute.clone(), "2011", 5.0).unwrap())
            .with(TimedValue::parse(subject.clone(), attribute, "2011", 7.0).unwrap().with_caveat("final"));

        let any = AttributeMatcher::new("default_provider_label", "attr1_label", None);
        let provisional = AttributeMatcher::new(
            "default_provider_label",
            "attr1_label",
            Some(vec!["provisional".to_string()]),
        );

        assert_eq!(values.resolve(&subject, &any).unwrap().unwrap().value, 7.0);
        assert!(values.resolve(&subject, &provisional).unwrap().is_none());
    }
}
