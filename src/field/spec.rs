// 📋 Field Specifications - fields as data
// Deserialized from the engine config and turned into live fields.

use serde::{Deserialize, Serialize};

use super::{ArithmeticField, Field, FractionOfTotalField, LatestValueField, Operation, SumField};
use crate::matcher::AttributeMatcher;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldSpec {
    FractionOfTotal {
        label: String,
        #[serde(default)]
        dividends: Vec<AttributeMatcher>,
        #[serde(default)]
        divisor: Option<AttributeMatcher>,
    },
    LatestValue {
        label: String,
        attribute: AttributeMatcher,
    },
    Sum {
        label: String,
        fields: Vec<FieldSpec>,
    },
    Arithmetic {
        label: String,
        operation: Operation,
        left: Box<FieldSpec>,
        right: Box<FieldSpec>,
    },
}

impl FieldSpec {
    pub fn label(&self) -> &str {
        match self {
            FieldSpec::FractionOfTotal { label, .. }
            | FieldSpec::LatestValue { label, .. }
            | FieldSpec::Sum { label, .. }
            | FieldSpec::Arithmetic { label, .. } => label,
        }
    }

    pub fn build(&self) -> Box<dyn Field> {
        match self {
            FieldSpec::FractionOfTotal { label, dividends, divisor } => Box::new(FractionOfTotalField::new(
                label.clone(),
                dividends.clone(),
                divisor.clone(),
            )),
            FieldSpec::LatestValue { label, attribute } => {
                Box::new(LatestValueField::new(label.clone(), attribute.clone()))
            }
            FieldSpec::Sum { label, fields } => {
                Box::new(SumField::new(label.clone(), fields.iter().map(FieldSpec::build).collect()))
            }
            FieldSpec::Arithmetic { label, operation, left, right } => Box::new(ArithmeticField::new(
                label.clone(),
                *operation,
                left.build(),
                right.build(),
            )),
        }
    }
}
