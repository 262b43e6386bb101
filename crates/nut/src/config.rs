//! Session configuration
//!
//! Settings can be built in code or loaded from a TOML file:
//!
//! ```toml
//! initial_stack_size = 2048
//! max_call_depth = 128
//! default_label = "game.nut"
//! ```
//!
//! Every field is optional; an absent field uses its default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default initial capacity of the value stack
pub const DEFAULT_STACK_SIZE: usize = 1024;
/// Smallest accepted initial stack capacity
pub const MIN_STACK_SIZE: usize = 16;
/// Default limit on nested calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = acorn::DEFAULT_MAX_CALL_DEPTH;
/// Label used for scripts run without an explicit name
pub const DEFAULT_LABEL: &str = "<script>";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Runtime settings of a [`crate::Session`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_stack_size: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_call_depth: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_label: Option<String>,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_stack_size(&self) -> usize {
        self.initial_stack_size.unwrap_or(DEFAULT_STACK_SIZE)
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth.unwrap_or(DEFAULT_MAX_CALL_DEPTH)
    }

    pub fn default_label(&self) -> &str {
        self.default_label.as_deref().unwrap_or(DEFAULT_LABEL)
    }

    pub fn with_initial_stack_size(mut self, size: usize) -> Self {
        self.initial_stack_size = Some(size);
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = Some(depth);
        self
    }

    pub fn with_default_label(mut self, label: impl Into<String>) -> Self {
        self.default_label = Some(label.into());
        self
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: PathBuf::from("<string>"),
            error: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(size) = self.initial_stack_size {
            if size < MIN_STACK_SIZE {
                return Err(ConfigError::InvalidValue {
                    field: "initial_stack_size".to_string(),
                    reason: format!("must be at least {}, got {}", MIN_STACK_SIZE, size),
                });
            }
        }

        if self.max_call_depth == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_call_depth".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if let Some(label) = &self.default_label {
            if label.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "default_label".to_string(),
                    reason: "label cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Overlay `other`; fields set in `other` win
    pub fn merge(&mut self, other: &SessionConfig) {
        if other.initial_stack_size.is_some() {
            self.initial_stack_size = other.initial_stack_size;
        }
        if other.max_call_depth.is_some() {
            self.max_call_depth = other.max_call_depth;
        }
        if other.default_label.is_some() {
            self.default_label = other.default_label.clone();
        }
    }
}
