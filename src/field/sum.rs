// ➕ Sum - adds up sub-fields
// Fail-fast: the first child that cannot be computed fails the sum.
// Timestamp is the latest among the children.

use super::{EvaluationMode, Field, FieldValue, IncomputableFieldError};
use crate::entities::Subject;
use crate::lookup::ValueLookup;

#[derive(Debug)]
pub struct SumField {
    label: String,
    fields: Vec<Box<dyn Field>>,
}

impl SumField {
    pub fn new(label: impl Into<String>, fields: Vec<Box<dyn Field>>) -> Self {
        SumField {
            label: label.into(),
            fields,
        }
    }
}

impl Field for SumField {
    fn label(&self) -> &str {
        &self.label
    }

    fn evaluate(
        &self,
        subject: &Subject,
        lookup: &dyn ValueLookup,
        mode: EvaluationMode,
    ) -> Result<FieldValue, IncomputableFieldError> {
        let mut total = 0.0;
        let mut latest = None;

        for field in &self.fields {
            let child = field.evaluate(subject, lookup, mode)?;
            total += child.value;
            latest = latest.max(Some(child.timestamp));
        }

        let timestamp =
            latest.ok_or_else(|| IncomputableFieldError::misconfigured(&self.label, "no fields to sum"))?;
        let total = IncomputableFieldError::check_finite(&self.label, total)?;
        Ok(FieldValue::new(total, timestamp))
    }
}
