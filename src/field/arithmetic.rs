// Arithmetic - one binary operation over two sub-fields
// Timestamp is the later of the two operands.

use serde::{Deserialize, Serialize};

use super::{EvaluationMode, Field, FieldValue, IncomputableFieldError};
use crate::entities::Subject;
use crate::lookup::ValueLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operation {
    pub fn apply(self, left: f64, right: f64) -> Result<f64, IncomputableFieldError> {
        match self {
            Operation::Add => Ok(left + right),
            Operation::Sub => Ok(left - right),
            Operation::Mul => Ok(left * right),
            Operation::Div if right == 0.0 => Err(IncomputableFieldError::DivideByZero),
            Operation::Div => Ok(left / right),
        }
    }
}

#[derive(Debug)]
pub struct ArithmeticField {
    label: String,
    operation: Operation,
    left: Box<dyn Field>,
    right: Box<dyn Field>,
}

impl ArithmeticField {
    pub fn new(label: impl Into<String>, operation: Operation, left: Box<dyn Field>, right: Box<dyn Field>) -> Self {
        ArithmeticField {
            label: label.into(),
            operation,
            left,
            right,
        }
    }
}

impl Field for ArithmeticField {
    fn label(&self) -> &str {
        &self.label
    }

    fn evaluate(
        &self,
        subject: &Subject,
        lookup: &dyn ValueLookup,
        mode: EvaluationMode,
    ) -> Result<FieldValue, IncomputableFieldError> {
        let left = self.left.evaluate(subject, lookup, mode)?;
        let right = self.right.evaluate(subject, lookup, mode)?;

        let value = self.operation.apply(left.value, right.value)?;
        let value = IncomputableFieldError::check_finite(&self.label, value)?;
        Ok(FieldValue::new(value, left.timestamp.max(right.timestamp)))
    }
}
