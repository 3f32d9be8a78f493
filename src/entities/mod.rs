// Entity Models
// The persisted vocabulary the field engine reads from:
// - Provider / Attribute: what is measured, and by whom
// - SubjectType / Subject: what the measurement is about
// - TimedValue: one measurement at one point in time

pub mod attribute;
pub mod subject;
pub mod timed_value;

pub use attribute::{Attribute, Provider};
pub use subject::{Subject, SubjectType};
pub use timed_value::TimedValue;
