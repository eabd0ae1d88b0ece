#![forbid(unsafe_code)]

//! Error types for sheet descriptors and sync configuration.
//!
//! Only programming errors surface here: an `open_*` call missing a field
//! its kind requires, or a config file that fails to load. Malformed URLs
//! never produce a [`SheetError`] at the public boundary; the decoder drops
//! the offending level and keeps going.

use thiserror::Error;

use crate::descriptor::SheetKind;

pub type Result<T> = std::result::Result<T, SheetError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetError {
    #[error("invalid {kind} sheet: {reason}")]
    InvalidDescriptor {
        kind: SheetKind,
        reason: &'static str,
    },

    #[error("invalid slug {slug:?}: {reason}")]
    InvalidSlug { slug: String, reason: &'static str },

    #[error("invalid entity id: {reason}")]
    InvalidEntityId { reason: &'static str },

    #[error("invalid custom content key {key:?}")]
    InvalidContentKey { key: String },

    #[error("sheet level is missing its kind")]
    MissingKind,

    #[error("unknown sheet kind: {0}")]
    UnknownKind(String),

    #[error("unknown sheet mode: {0}")]
    UnknownMode(String),

    #[error("unknown sheet size: {0}")]
    UnknownSize(String),
}

impl SheetError {
    #[must_use]
    pub(crate) fn invalid(kind: SheetKind, reason: &'static str) -> Self {
        Self::InvalidDescriptor { kind, reason }
    }
}

/// Failure to load or validate a [`SheetSyncConfig`](crate::SheetSyncConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config-files")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid sheet sync config: {}", .0.join("; "))]
    Invalid(Vec<String>),
}
