// Latest Value - pass one matched measurement straight through

use super::{log_missing, resolve_matcher, EvaluationMode, Field, FieldValue, IncomputableFieldError};
use crate::entities::Subject;
use crate::lookup::ValueLookup;
use crate::matcher::AttributeMatcher;

#[derive(Debug, Clone)]
pub struct LatestValueField {
    label: String,
    attribute: AttributeMatcher,
}

impl LatestValueField {
    pub fn new(label: impl Into<String>, attribute: AttributeMatcher) -> Self {
        LatestValueField {
            label: label.into(),
            attribute,
        }
    }
}

impl Field for LatestValueField {
    fn label(&self) -> &str {
        &self.label
    }

    fn evaluate(
        &self,
        subject: &Subject,
        lookup: &dyn ValueLookup,
        mode: EvaluationMode,
    ) -> Result<FieldValue, IncomputableFieldError> {
        match resolve_matcher(subject, lookup, &self.attribute)? {
            Some(tv) => Ok(FieldValue::new(tv.value, tv.timestamp)),
            None => {
                let missing = vec![self.attribute.label.clone()];
                log_missing(&self.label, subject, &missing, mode);
                Err(IncomputableFieldError::MissingValues(missing))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Attribute, Provider, SubjectType, TimedValue};
    use crate::lookup::InMemoryValues;

    #[test]
    fn test_passes_latest_value_through() {
        let subject = Subject::new(SubjectType::new("p", "lsoa"), "E01000001");
        let attribute = Attribute::new(&Provider::new("p", "P"), "population");
        let values = InMemoryValues::new()
            .with(TimedValue::parse(subject.clone(), attribute.clone(), "2010", 1500.0).unwrap())
            .with(TimedValue::parse(subject.clone(), attribute, "2011", 1600.0).unwrap());

        let field = LatestValueField::new("population", AttributeMatcher::new("p", "population", None));
        let record = field
            .json_value_for_subject(&subject, &values, EvaluationMode::Unspecified)
            .unwrap();

        assert_eq!(
            record.to_json().unwrap(),
            serde_json::json!({"population": {"value": 1600.0, "timestamp": "2011-12-31T23:59:59"}})
        );
        assert_eq!(field.value_for_subject(&subject, &values, EvaluationMode::Strict).unwrap(), "1600");
    }

    #[test]
    fn test_missing_value() {
        let subject = Subject::new(SubjectType::new("p", "lsoa"), "E01000001");
        let field = LatestValueField::new("population", AttributeMatcher::new("p", "population", None));

        let err = field
            .evaluate(&subject, &InMemoryValues::new(), EvaluationMode::Lenient)
            .unwrap_err();

        assert_eq!(err.to_string(), "No TimedValue found for attributes population");
    }
}
