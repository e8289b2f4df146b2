//! Load-time policies.
//!
//! Options can be built in code or read from a small TOML file:
//!
//! ```toml
//! duplicates = "allow-identical"
//! validation = "strict"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TableError, TableResult};

/// What to do when a key shows up more than once.
///
/// Rows that repeat a key with different values are always rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Keep the first of several rows carrying identical values.
    #[default]
    AllowIdentical,
    /// Any repeated key fails the load.
    Reject,
}

/// What to do with rows that break `ci_lower <= ci_peak <= ci_upper` or have
/// a non-positive wavelength.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationPolicy {
    /// Fail the load.
    #[default]
    Strict,
    /// Log a warning and keep the row.
    Warn,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadOptions {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
    #[serde(default)]
    pub validation: ValidationPolicy,
}

impl LoadOptions {
    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn with_validation(mut self, policy: ValidationPolicy) -> Self {
        self.validation = policy;
        self
    }

    /// Parse options from TOML text. Missing keys fall back to the defaults.
    pub fn from_toml_str(s: &str) -> TableResult<Self> {
        toml::from_str(s).map_err(|e| TableError::Config(e.to_string()))
    }

    /// Read options from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> TableResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TableError::io(path, e))?;
        Self::from_toml_str(&content)
    }
}
