// Subject Fields - Core Library
// Derived indicators ("fields") computed per subject from stored timed values.
// Exposes all modules for use in the CLI and in tests.

pub mod config;
pub mod entities;
pub mod field;
pub mod lookup;
pub mod matcher;
pub mod store;
pub mod temporal;

// Re-export commonly used types
pub use config::EngineConfig;
pub use entities::{Attribute, Provider, Subject, SubjectType, TimedValue};
pub use field::{
    ArithmeticField, EvaluationMode, Field, FieldRecord, FieldSpec, FieldValue,
    FractionOfTotalField, IncomputableFieldError, LatestValueField, Operation, SumField,
};
pub use lookup::{InMemoryValues, LookupError, ValueLookup};
pub use matcher::AttributeMatcher;
pub use store::{
    count_timed_values, find_subject, insert_attribute, insert_provider, insert_subject,
    insert_timed_values, load_csv, setup_database, SqliteStore,
};
pub use temporal::{format_timestamp, parse_timestamp, TimestampError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
