// 🧮 Fields - named computations over a subject's timed values
//
// A field holds only configuration (matchers, sub-fields) and is evaluated
// against any number of subjects. The lookup is passed in on every call;
// nothing is cached between calls.

pub mod arithmetic;
pub mod error;
pub mod fraction_of_total;
pub mod latest_value;
pub mod record;
pub mod spec;
pub mod sum;

use std::fmt;
use tracing::{debug, warn};

use crate::entities::{Subject, TimedValue};
use crate::lookup::ValueLookup;
use crate::matcher::AttributeMatcher;

pub use arithmetic::{ArithmeticField, Operation};
pub use error::IncomputableFieldError;
pub use fraction_of_total::FractionOfTotalField;
pub use latest_value::LatestValueField;
pub use record::{FieldRecord, FieldValue};
pub use spec::FieldSpec;
pub use sum::SumField;

// ============================================================================
// EVALUATION MODE
// ============================================================================

/// Optional flag passed through every evaluation.
///
/// It never changes the arithmetic or the set of failures. Lenient mode
/// only lowers the log level used when data is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvaluationMode {
    #[default]
    Unspecified,
    Strict,
    Lenient,
}

impl EvaluationMode {
    pub fn is_lenient(self) -> bool {
        self == EvaluationMode::Lenient
    }
}

impl From<Option<bool>> for EvaluationMode {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            None => EvaluationMode::Unspecified,
            Some(false) => EvaluationMode::Strict,
            Some(true) => EvaluationMode::Lenient,
        }
    }
}

impl From<bool> for EvaluationMode {
    fn from(flag: bool) -> Self {
        Some(flag).into()
    }
}

// ============================================================================
// FIELD CONTRACT
// ============================================================================

pub trait Field: Send + Sync + fmt::Debug {
    fn label(&self) -> &str;

    /// Compute the raw value and its representative timestamp
    fn evaluate(
        &self,
        subject: &Subject,
        lookup: &dyn ValueLookup,
        mode: EvaluationMode,
    ) -> Result<FieldValue, IncomputableFieldError>;

    /// The value rendered as a decimal string (e.g., "0.5")
    fn value_for_subject(
        &self,
        subject: &Subject,
        lookup: &dyn ValueLookup,
        mode: EvaluationMode,
    ) -> Result<String, IncomputableFieldError> {
        Ok(self.evaluate(subject, lookup, mode)?.value.to_string())
    }

    /// `{ label: { value, timestamp } }`
    fn json_value_for_subject(
        &self,
        subject: &Subject,
        lookup: &dyn ValueLookup,
        mode: EvaluationMode,
    ) -> Result<FieldRecord, IncomputableFieldError> {
        let value = self.evaluate(subject, lookup, mode)?;
        Ok(FieldRecord::new(self.label(), value))
    }
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Resolve one matcher, folding collaborator failures into the field error
pub(crate) fn resolve_matcher(
    subject: &Subject,
    lookup: &dyn ValueLookup,
    matcher: &AttributeMatcher,
) -> Result<Option<TimedValue>, IncomputableFieldError> {
    lookup
        .resolve(subject, matcher)
        .map_err(|e| IncomputableFieldError::Lookup {
            attribute: matcher.label.clone(),
            message: e.to_string(),
        })
}

pub(crate) fn log_missing(field: &str, subject: &Subject, missing: &[String], mode: EvaluationMode) {
    let attributes = missing.join(", ");
    if mode.is_lenient() {
        debug!(field, subject = %subject, attributes = %attributes, "Missing timed values");
    } else {
        warn!(field, subject = %subject, attributes = %attributes, "Missing timed values");
    }
}
