#![forbid(unsafe_code)]

//! Sync configuration as data.
//!
//! [`SheetSyncConfig`] collects the knobs of the URL synchronizer so hosts
//! can ship them in a TOML or JSON file instead of recompiling.
//!
//! ```toml
//! # sheets.toml
//! query_key = "sheet"
//! restore = "full-stack"
//! history = "replace"
//! max_restore_depth = 4
//! ```
//!
//! ```rust,ignore
//! let config = SheetSyncConfig::from_toml_file("sheets.toml")?.validated()?;
//! ```
//!
//! # Defaults
//!
//! `SheetSyncConfig::default()` restores only the active sheet and pushes a
//! history entry per mutation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::is_key_fragment;
use crate::error::ConfigError;
use crate::navigator::HistoryMethod;

/// How much of the stack is mirrored into the URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestorePolicy {
    /// Only the active sheet survives a reload.
    #[default]
    ActiveOnly,
    /// Every level, bottom to top, up to `max_restore_depth`.
    FullStack,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSyncConfig {
    /// Query key holding the active sheet's slug.
    pub query_key: String,
    pub restore: RestorePolicy,
    pub history: HistoryMethod,
    /// Most levels written to or read from the URL, active sheet included.
    pub max_restore_depth: usize,
}

impl Default for SheetSyncConfig {
    fn default() -> Self {
        Self {
            query_key: "sheet".to_owned(),
            restore: RestorePolicy::default(),
            history: HistoryMethod::default(),
            max_restore_depth: 8,
        }
    }
}

impl SheetSyncConfig {
    #[must_use]
    pub fn with_query_key(mut self, key: impl Into<String>) -> Self {
        self.query_key = key.into();
        self
    }

    #[must_use]
    pub fn with_restore(mut self, restore: RestorePolicy) -> Self {
        self.restore = restore;
        self
    }

    #[must_use]
    pub fn with_history(mut self, history: HistoryMethod) -> Self {
        self.history = history;
        self
    }

    #[must_use]
    pub fn with_max_restore_depth(mut self, depth: usize) -> Self {
        self.max_restore_depth = depth;
        self
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !is_key_fragment(&self.query_key) {
            errors.push(format!(
                "query_key must be a non-empty URL-safe key fragment, got {:?}",
                self.query_key
            ));
        }

        if self.max_restore_depth == 0 {
            errors.push("max_restore_depth must be > 0".into());
        }

        errors
    }

    /// `self` if [`validate`](Self::validate) reports nothing.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Key listing the lower levels in full-stack mode.
    pub(crate) fn stack_key(&self) -> String {
        format!("{}.stack", self.query_key)
    }
}
