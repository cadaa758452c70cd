//! Recovery configuration, loaded from the `[recovery]` table of a TOML
//! file or built in code.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Knobs for the default error strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecoveryConfig {
    /// Re-raise every reported error instead of continuing (default: false)
    pub halt_on_error: bool,

    /// Try dropping one extraneous token before giving up on a match (default: true)
    pub single_token_deletion: bool,

    /// Try conjuring a missing token before giving up on a match (default: true)
    pub single_token_insertion: bool,

    /// Conjure missing tokens even when the lookahead is EOF (default: true)
    pub report_missing_at_eof: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        RecoveryConfig {
            halt_on_error: false,
            single_token_deletion: true,
            single_token_insertion: true,
            report_missing_at_eof: true,
        }
    }
}

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid recovery configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    recovery: RecoveryConfig,
}

impl RecoveryConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config that re-raises the first error (no recovery).
    pub fn halting() -> Self {
        Self {
            halt_on_error: true,
            ..Self::default()
        }
    }

    /// Parse the `[recovery]` table of a TOML document. Other tables are ignored.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(source)?;
        Ok(file.recovery)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}
