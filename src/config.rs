//! Configuration handling for estrim.
//!
//! The configuration file is JSON. Every section and field is optional:
//!
//! ```json
//! {
//!   "mangle": { "reserved": ["exports", "require"], "seed": 7 },
//!   "output": { "compact": true }
//! }
//! ```
//!
//! Command-line flags override file values.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use estrim_core::{TreeError, TreeResult};

use crate::mangle::MangleOptions;

/// estrim configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EstrimConfig {
    /// Mangler settings
    #[serde(default)]
    pub mangle: MangleOptions,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Emit single-line JSON
    #[serde(default)]
    pub compact: bool,
}

impl EstrimConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> TreeResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| TreeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration text
    pub fn parse(content: &str) -> TreeResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| TreeError::config(format!("failed to parse config file: {}", e)))
    }

    /// Load `path` if given, else the defaults
    pub fn load_or_default(path: Option<&Path>) -> TreeResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides: extra reserved names are appended, a
    /// seed replaces the configured one.
    pub fn with_mangle_overrides(mut self, reserved: &[String], seed: Option<u64>) -> Self {
        self.mangle.reserved.extend(reserved.iter().cloned());
        if let Some(seed) = seed {
            self.mangle.seed = seed;
        }
        self
    }
}
