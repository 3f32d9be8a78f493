// 🗺️ Subject - the entity indicators are computed for
// Usually a geography (an LSOA, a borough). Identified by subject type + code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SubjectType - a family of subjects from one provider (e.g., "lsoa")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectType {
    pub provider: String,
    pub label: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl SubjectType {
    pub fn new(provider: impl Into<String>, label: impl Into<String>) -> Self {
        SubjectType {
            provider: provider.into(),
            label: label.into(),
            name: None,
        }
    }
}

/// Subject - owns zero or more timed values
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    pub subject_type: SubjectType,

    /// Code, unique within the subject type (e.g., "E01000001")
    pub label: String,

    #[serde(default)]
    pub name: Option<String>,
}

impl Subject {
    pub fn new(subject_type: SubjectType, label: impl Into<String>) -> Self {
        Subject {
            subject_type,
            label: label.into(),
            name: None,
        }
    }

    /// Builder: add display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Identity key: (subject type provider, subject type label, code).
    /// Display names are not part of identity.
    pub fn key(&self) -> (&str, &str, &str) {
        (
            self.subject_type.provider.as_str(),
            self.subject_type.label.as_str(),
            self.label.as_str(),
        )
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subject_type.label, self.label)
    }
}
