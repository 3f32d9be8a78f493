// ➗ Fraction of Total - sum(dividends) / divisor
//
// Every dividend and the divisor must resolve. The reported timestamp is the
// timestamp of the FIRST configured dividend, not the min or max over all
// matched measurements; downstream consumers rely on that ordering.

use super::{log_missing, resolve_matcher, EvaluationMode, Field, FieldValue, IncomputableFieldError};
use crate::entities::Subject;
use crate::lookup::ValueLookup;
use crate::matcher::AttributeMatcher;

/// Construction never validates; an absent divisor or an empty dividend list
/// surfaces as a failure when the field is evaluated.
#[derive(Debug, Clone)]
pub struct FractionOfTotalField {
    label: String,
    dividends: Vec<AttributeMatcher>,
    divisor: Option<AttributeMatcher>,
}

impl FractionOfTotalField {
    pub fn new(
        label: impl Into<String>,
        dividends: Vec<AttributeMatcher>,
        divisor: Option<AttributeMatcher>,
    ) -> Self {
        FractionOfTotalField {
            label: label.into(),
            dividends,
            divisor,
        }
    }
}

impl Field for FractionOfTotalField {
    fn label(&self) -> &str {
        &self.label
    }

    fn evaluate(
        &self,
        subject: &Subject,
        lookup: &dyn ValueLookup,
        mode: EvaluationMode,
    ) -> Result<FieldValue, IncomputableFieldError> {
        // 1. Dividends, all of them, in configured order
        let mut found = Vec::with_capacity(self.dividends.len());
        let mut missing = Vec::new();
        for matcher in &self.dividends {
            match resolve_matcher(subject, lookup, matcher)? {
                Some(tv) => found.push(tv),
                None => missing.push(matcher.label.clone()),
            }
        }

        // Lenient mode does not tolerate missing dividends either
        if !missing.is_empty() {
            log_missing(&self.label, subject, &missing, mode);
            return Err(IncomputableFieldError::MissingValues(missing));
        }

        let first = found
            .first()
            .ok_or_else(|| IncomputableFieldError::misconfigured(&self.label, "no dividend attributes"))?;

        // 2. Divisor
        let divisor_matcher = self
            .divisor
            .as_ref()
            .ok_or_else(|| IncomputableFieldError::misconfigured(&self.label, "no divisor attribute"))?;

        let divisor = match resolve_matcher(subject, lookup, divisor_matcher)? {
            Some(tv) => tv,
            None => {
                let missing = vec![divisor_matcher.label.clone()];
                log_missing(&self.label, subject, &missing, mode);
                return Err(IncomputableFieldError::MissingValues(missing));
            }
        };

        if divisor.value == 0.0 {
            return Err(IncomputableFieldError::DivideByZero);
        }

        // 3-5. Combine; overflow must not reach the output as a non-number
        let total: f64 = found.iter().map(|tv| tv.value).sum();
        let value = IncomputableFieldError::check_finite(&self.label, total / divisor.value)?;
        Ok(FieldValue::new(value, first.timestamp))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Attribute, Provider, SubjectType, TimedValue};
    use crate::lookup::InMemoryValues;
    use crate::store::SqliteStore;
    use crate::temporal::parse_timestamp;
    use proptest::prelude::*;
    use serde_json::json;

    const PROVIDER: &str = "default_provider_label";

    fn subject() -> Subject {
        Subject::new(SubjectType::new(PROVIDER, "lsoa"), "E01000001")
    }

    fn attribute(label: &str) -> Attribute {
        Attribute::new(&Provider::new(PROVIDER, "Default Provider"), label)
    }

    fn matcher(label: &str) -> AttributeMatcher {
        AttributeMatcher::new(PROVIDER, label, None)
    }

    fn timed(label: &str, timestamp: &str, value: f64) -> TimedValue {
        TimedValue::parse(subject(), attribute(label), timestamp, value).unwrap()
    }

    fn make_field() -> FractionOfTotalField {
        FractionOfTotalField::new(
            "aLabel",
            vec![matcher("attr1_label"), matcher("attr2_label")],
            Some(matcher("attr3_label")),
        )
    }

    fn store_with(values: &[TimedValue]) -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_timed_values(values).unwrap();
        store
    }

    fn full_store() -> SqliteStore {
        store_with(&[
            timed("attr1_label", "2011-01-03T00:00", 100.0),
            timed("attr2_label", "2011-01-02T00:00", 100.0),
            timed("attr3_label", "2011-01-01T00:00", 400.0),
        ])
    }

    #[test]
    fn test_value_for_subject() {
        let store = full_store();
        let value = make_field()
            .value_for_subject(&subject(), &store, EvaluationMode::Lenient)
            .unwrap();

        assert_eq!(value, "0.5");
    }

    #[test]
    fn test_json_value_for_subject() {
        let store = full_store();
        let record = make_field()
            .json_value_for_subject(&subject(), &store, EvaluationMode::Lenient)
            .unwrap();

        assert_eq!(
            record.to_json().unwrap(),
            json!({"aLabel": {"value": 0.5, "timestamp": "2011-01-03T00:00:00"}})
        );
    }

    #[test]
    fn test_timestamp_follows_first_dividend_not_latest() {
        let store = store_with(&[
            timed("attr1_label", "2011-01-02T00:00", 100.0),
            timed("attr2_label", "2011-01-03T00:00", 100.0),
            timed("attr3_label", "2011-01-04T00:00", 400.0),
        ]);
        let value = make_field()
            .evaluate(&subject(), &store, EvaluationMode::Strict)
            .unwrap();

        assert_eq!(value.timestamp, parse_timestamp("2011-01-02").unwrap());
    }

    #[test]
    fn test_partially_absent_dividend_value() {
        let store = store_with(&[
            timed("attr1_label", "2011-01-03T00:00", 100.0),
            timed("attr3_label", "2011-01-01T00:00", 400.0),
        ]);
        let err = make_field()
            .json_value_for_subject(&subject(), &store, EvaluationMode::Lenient)
            .unwrap_err();

        assert_eq!(err.to_string(), "No TimedValue found for attributes attr2_label");
    }

    #[test]
    fn test_fully_absent_dividend_value() {
        let store = store_with(&[timed("attr3_label", "2011-01-01T00:00", 400.0)]);
        let err = make_field()
            .json_value_for_subject(&subject(), &store, EvaluationMode::Strict)
            .unwrap_err();

        assert_eq!(
            err,
            IncomputableFieldError::missing(["attr1_label", "attr2_label"])
        );
        assert_eq!(
            err.to_string(),
            "No TimedValue found for attributes attr1_label, attr2_label"
        );
    }

    #[test]
    fn test_absent_divisor_value() {
        let store = store_with(&[
            timed("attr1_label", "2011-01-03T00:00", 100.0),
            timed("attr2_label", "2011-01-02T00:00", 100.0),
        ]);
        let err = make_field()
            .json_value_for_subject(&subject(), &store, EvaluationMode::Unspecified)
            .unwrap_err();

        assert_eq!(err.to_string(), "No TimedValue found for attributes attr3_label");
    }

    #[test]
    fn test_zero_divisor_value() {
        let store = store_with(&[
            timed("attr1_label", "2011-01-03T00:00", 100.0),
            timed("attr2_label", "2011-01-02T00:00", 100.0),
            timed("attr3_label", "2011-01-01T00:00", 0.0),
        ]);
        let err = make_field()
            .json_value_for_subject(&subject(), &store, EvaluationMode::Lenient)
            .unwrap_err();

        assert_eq!(err, IncomputableFieldError::DivideByZero);
        assert_eq!(err.to_string(), "Cannot divide by zero");
    }

    #[test]
    fn test_get_label() {
        let field = FractionOfTotalField::new("aLabel", Vec::new(), None);
        assert_eq!(field.label(), "aLabel");
    }

    #[test]
    fn test_unconfigured_field_fails_on_evaluation() {
        let store = full_store();

        let no_divisor = FractionOfTotalField::new("aLabel", vec![matcher("attr1_label")], None);
        let err = no_divisor
            .evaluate(&subject(), &store, EvaluationMode::Strict)
            .unwrap_err();
        assert!(matches!(err, IncomputableFieldError::MissingConfiguration { .. }));

        let no_dividends = FractionOfTotalField::new("aLabel", Vec::new(), Some(matcher("attr3_label")));
        let err = no_dividends
            .evaluate(&subject(), &store, EvaluationMode::Strict)
            .unwrap_err();
        assert!(matches!(err, IncomputableFieldError::MissingConfiguration { .. }));
    }

    #[test]
    fn test_overflowing_sum_is_incomputable() {
        let values = InMemoryValues::new()
            .with(timed("attr1_label", "2011", 1e308))
            .with(timed("attr2_label", "2011", 1e308))
            .with(timed("attr3_label", "2011", 0.5));

        let err = make_field()
            .json_value_for_subject(&subject(), &values, EvaluationMode::Strict)
            .unwrap_err();

        assert!(matches!(err, IncomputableFieldError::NonFinite { ref field, .. } if field == "aLabel"));
    }

    #[test]
    fn test_repeated_evaluation_is_identical() {
        let store = full_store();
        let field = make_field();

        let first = field.json_value_for_subject(&subject(), &store, EvaluationMode::Strict).unwrap();
        let second = field.json_value_for_subject(&subject(), &store, EvaluationMode::Strict).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_field_shared_across_threads() {
        let store = full_store();
        let field = make_field();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| field.value_for_subject(&subject(), &store, EvaluationMode::Strict)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().unwrap(), "0.5");
            }
        });
    }

    proptest! {
        #[test]
        fn test_value_is_sum_over_divisor(
            dividends in proptest::collection::vec(-1.0e6f64..1.0e6, 1..5),
            divisor in prop_oneof![-1.0e6f64..-1.0e-3, 1.0e-3f64..1.0e6],
        ) {
            let mut values = InMemoryValues::new();
            let mut matchers = Vec::new();
            for (i, value) in dividends.iter().enumerate() {
                let label = format!("dividend_{}", i);
                values.insert(timed(&label, "2011-01-01", *value));
                matchers.push(matcher(&label));
            }
            values.insert(timed("divisor", "2011-01-01", divisor));

            let field = FractionOfTotalField::new("ratio", matchers, Some(matcher("divisor")));
            let result = field.evaluate(&subject(), &values, EvaluationMode::Strict).unwrap();

            prop_assert_eq!(result.value, dividends.iter().sum::<f64>() / divisor);
        }
    }
}
