// ⚙️ Engine Configuration - loaded from a JSON file
// Every key is optional; missing keys fall back to the defaults below.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::field::FieldSpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// SQLite database holding subjects and timed values
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// tracing EnvFilter directive; RUST_LOG takes precedence
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Subject type used when the CLI is not told otherwise
    #[serde(default = "default_subject_type")]
    pub default_subject_type: String,

    /// Provider assumed for imported rows that name none
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Fields evaluated by `subject-fields evaluate`
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

fn default_database() -> PathBuf {
    PathBuf::from("subject-fields.db")
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_subject_type() -> String {
    "lsoa".to_string()
}

fn default_provider() -> String {
    "default_provider_label".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            database: default_database(),
            log_filter: default_log_filter(),
            default_subject_type: default_subject_type(),
            default_provider: default_provider(),
            fields: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }
}
