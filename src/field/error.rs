//! The one error kind every field reports.
//!
//! Callers only ever see `IncomputableFieldError`; the variant picks the
//! message. Lookup failures are folded in at the field boundary so nothing
//! else escapes an evaluation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IncomputableFieldError {
    /// Requested attributes with no value for the subject, in configured order
    #[error("No TimedValue found for attributes {}", .0.join(", "))]
    MissingValues(Vec<String>),

    #[error("Cannot divide by zero")]
    DivideByZero,

    #[error("Field {field} produced a non-finite value: {value}")]
    NonFinite { field: String, value: f64 },

    #[error("Field {field} is missing configuration: {detail}")]
    MissingConfiguration { field: String, detail: String },

    #[error("Lookup failed for attribute {attribute}: {message}")]
    Lookup { attribute: String, message: String },
}

impl IncomputableFieldError {
    pub fn missing(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::MissingValues(labels.into_iter().map(Into::into).collect())
    }

    /// Pass `value` through if it is a finite number, fail otherwise
    pub fn check_finite(field: &str, value: f64) -> Result<f64, Self> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Self::NonFinite {
                field: field.to_string(),
                value,
            })
        }
    }

    pub fn misconfigured(field: &str, detail: impl Into<String>) -> Self {
        Self::MissingConfiguration {
            field: field.to_string(),
            detail: detail.into(),
        }
    }
}
