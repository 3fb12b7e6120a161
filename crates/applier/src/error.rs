//! Error types for the applier crate.

use thiserror::Error;

/// Result type alias for seeker and recovery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Seeker and recovery error types.
///
/// Every variant raised during recovery is fatal: the caller must not fall
/// back to an assumed position.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required configuration key is absent.
    #[error("configuration required: {key}")]
    MissingConfiguration { key: String },

    /// A configuration value could not be used.
    #[error("invalid configuration '{key}': {reason}")]
    InvalidConfiguration { key: String, reason: String },

    /// Could not open a connection to the downstream log.
    #[error("connection to downstream log failed: {reason}")]
    Connection { reason: String },

    /// A downstream log operation failed.
    #[error("downstream log operation '{operation}' failed: {reason}")]
    Log { operation: String, reason: String },

    /// A tail record had no key.
    #[error("record {topic}/{partition}@{offset} has no key")]
    MissingKey {
        topic: String,
        partition: i32,
        offset: i64,
    },

    /// A tail record key could not be decoded into a header.
    #[error("record {topic}/{partition}@{offset} key is not a valid header: {reason}")]
    Deserialization {
        topic: String,
        partition: i32,
        offset: i64,
        reason: String,
    },

    /// Kafka support is not compiled in.
    #[error("feature '{feature}' is not enabled")]
    FeatureDisabled { feature: String },
}

impl Error {
    /// Create a missing configuration error.
    pub fn missing_configuration(key: impl Into<String>) -> Self {
        Self::MissingConfiguration { key: key.into() }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::Connection {
            reason: reason.into(),
        }
    }

    /// Create a log operation error.
    pub fn log(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Log {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error was raised before any I/O took place.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingConfiguration { .. } | Self::InvalidConfiguration { .. }
        )
    }
}
