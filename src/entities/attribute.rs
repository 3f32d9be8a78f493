// 🏷️ Provider + Attribute
// Attribute identity is (provider label, attribute label).
// Once created an attribute never changes; it is the join key for lookups.

use serde::{Deserialize, Serialize};

// ============================================================================
// PROVIDER
// ============================================================================

/// Provider - the organisation a dataset comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provider {
    /// Stable identifier (e.g., "uk.gov.ons")
    pub label: String,

    /// Human-readable name
    pub name: String,
}

impl Provider {
    pub fn new(label: impl Into<String>, name: impl Into<String>) -> Self {
        Provider {
            label: label.into(),
            name: name.into(),
        }
    }
}

// ============================================================================
// ATTRIBUTE
// ============================================================================

/// Attribute - a named, provider-scoped measurable quantity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    /// Label of the owning provider
    pub provider: String,

    /// Attribute label, unique within the provider
    pub label: String,

    /// What does this attribute measure?
    #[serde(default)]
    pub description: Option<String>,
}

impl Attribute {
    pub fn new(provider: &Provider, label: impl Into<String>) -> Self {
        Attribute {
            provider: provider.label.clone(),
            label: label.into(),
            description: None,
        }
    }

    /// Builder: add description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Identity key: (provider label, attribute label)
    pub fn key(&self) -> (&str, &str) {
        (self.provider.as_str(), self.label.as_str())
    }
}
