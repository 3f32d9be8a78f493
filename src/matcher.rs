// 🎯 Attribute Matcher - which stored attribute a field reads
//
// Selects by provider label + attribute label. An optional list of value
// caveats narrows the match further; None means unconstrained.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::Attribute;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeMatcher {
    pub provider: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl AttributeMatcher {
    pub fn new(provider: impl Into<String>, label: impl Into<String>, values: Option<Vec<String>>) -> Self {
        AttributeMatcher {
            provider: provider.into(),
            label: label.into(),
            values,
        }
    }

    /// Does this matcher select the given attribute?
    pub fn matches(&self, attribute: &Attribute) -> bool {
        attribute.provider == self.provider && attribute.label == self.label
    }

    /// Does a stored value caveat satisfy the optional constraint?
    pub fn accepts_caveat(&self, caveat: Option<&str>) -> bool {
        match (&self.values, caveat) {
            (None, _) => true,
            (Some(allowed), Some(caveat)) => allowed.iter().any(|v| v == caveat),
            (Some(_), None) => false,
        }
    }
}

impl fmt::Display for AttributeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.label)
    }
}
