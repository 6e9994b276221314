//! Error types for AlertView operations.
//!
//! [`AlertViewError`] covers the failures that happen outside the transport:
//! configuration loading, log setup, terminal handling. Transport failures
//! have their own type in `alertview-client` because callers recover from
//! them at the cache boundary instead of propagating them.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`AlertViewError`].
pub type Result<T> = std::result::Result<T, AlertViewError>;

/// Error type for non-transport AlertView operations.
#[derive(Debug, Error)]
pub enum AlertViewError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file not found
    #[error("Configuration not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file is invalid YAML
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // TUI Errors
    // =========================================================================
    /// Terminal initialization failed
    #[error("Terminal initialization failed: {message}")]
    TerminalInit { message: String },

    /// Async runtime could not be started
    #[error("Failed to start async runtime: {message}")]
    Runtime { message: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error (bug in AlertView)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AlertViewError {
    /// Create a ConfigNotFound error
    pub fn config_not_found(path: impl Into<PathBuf>, source: Option<std::io::Error>) -> Self {
        Self::ConfigNotFound {
            path: path.into(),
            source,
        }
    }

    /// Create a ConfigValidation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. } | Self::ConfigInvalid { .. } | Self::ConfigValidation { .. }
        )
    }

    /// Returns actionable guidance for the user
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound { .. } => {
                Some("Create ~/.alertview/config.yaml or pass --config <path>")
            }
            Self::ConfigInvalid { .. } => Some("Check the YAML syntax of the configuration file"),
            Self::ConfigValidation { .. } => {
                Some("Set server.base_url to an http(s) URL and poll.interval_secs to at least 1")
            }
            Self::TerminalInit { .. } => Some("Try running in a different terminal"),
            _ => None,
        }
    }
}
