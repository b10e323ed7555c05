//! # Design
//!
//! - One taxonomy for every request the client makes.
//! - Keep display strings constant; carry status and server detail as fields.
//! - Profile decode failures never leave the `profile` module.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failure of a client operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// A required field was missing or inconsistent; nothing was sent.
    #[error("validation failed")]
    Validation {
        /// Message shown next to the offending field.
        message: String,
    },
    /// The backend answered 401.
    #[error("authentication rejected")]
    Authentication {
        /// Server-provided detail, when present.
        message: Option<String>,
    },
    /// The backend answered with another non-2xx status.
    #[error("request failed")]
    Request {
        /// HTTP status code.
        status: u16,
        /// Server-provided detail, when present.
        message: Option<String>,
    },
    /// No usable response arrived (connect/timeout error or unreadable body).
    #[error("network failure")]
    Network {
        /// Transport-level detail for logs.
        detail: String,
    },
    /// The credential could not be persisted.
    #[error("credential storage failed")]
    Storage {
        /// Storage-level detail for logs.
        detail: String,
    },
}

impl ClientError {
    /// Build a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Build a network error.
    pub fn network(detail: impl Into<String>) -> Self {
        Self::Network {
            detail: detail.into(),
        }
    }

    /// Whether this failure must end the session.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Text safe to show to the user, if the error carries any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Validation { message } => Some(message.as_str()),
            Self::Authentication { message } | Self::Request { message, .. } => {
                message.as_deref()
            }
            Self::Network { .. } | Self::Storage { .. } => None,
        }
    }

    /// User-facing message, falling back to `fallback` when the error has no detail.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }
}

impl From<StoreError> for ClientError {
    fn from(error: StoreError) -> Self {
        Self::Storage {
            detail: error.to_string(),
        }
    }
}

/// Failure of a credential store write.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("credential file operation failed: {operation} {path}")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source I/O error.
        source: io::Error,
    },
    /// Browser storage rejected the operation.
    #[error("browser storage unavailable: {operation}")]
    Unavailable {
        /// Operation identifier.
        operation: &'static str,
        /// Detail reported by the storage backend.
        detail: String,
    },
}

/// Invalid client configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A setting held a value that could not be used.
    #[error("invalid configuration value for {name}: {reason}")]
    InvalidValue {
        /// Setting name (environment variable or flag).
        name: &'static str,
        /// Rejected value.
        value: String,
        /// Why the value was rejected.
        reason: &'static str,
    },
}
