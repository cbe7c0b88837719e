//! Error types and result aliases for shelf.
//!
//! This module defines the shared error types used across all shelf components.
//! Errors are structured for programmatic handling and include context for
//! debugging.

use std::fmt;

/// The result type used throughout shelf.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in shelf-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {message}")]
    InvalidId {
        /// Description of what made the identifier invalid.
        message: String,
    },

    /// A storage operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// Whether retrying the operation may succeed.
        retryable: bool,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A blob or resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a retryable storage error with the given message.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            retryable: true,
            source: None,
        }
    }

    /// Creates a non-retryable storage error with the given message.
    #[must_use]
    pub fn storage_permanent(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            retryable: false,
            source: None,
        }
    }

    /// Creates a storage error from an I/O failure, classifying retryability
    /// from the error kind.
    #[must_use]
    pub fn storage_io(message: impl Into<String>, source: std::io::Error) -> Self {
        let retryable = !matches!(
            source.kind(),
            std::io::ErrorKind::PermissionDenied
                | std::io::ErrorKind::InvalidInput
                | std::io::ErrorKind::Unsupported
        );
        Self::Storage {
            message: message.into(),
            retryable,
            source: Some(Box::new(source)),
        }
    }

    /// Creates a not-found error for a blob key or resource.
    #[must_use]
    pub fn not_found(what: impl fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    /// Returns whether this error is a transient storage failure worth
    /// retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { retryable: true, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_carry_retryability() {
        assert!(Error::storage("flaky network").is_retryable());
        assert!(!Error::storage_permanent("denied").is_retryable());
        assert!(!Error::not_found("blob").is_retryable());
    }

    #[test]
    fn io_errors_classify_by_kind() {
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert!(!Error::storage_io("write failed", denied).is_retryable());

        let timeout = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow disk");
        assert!(Error::storage_io("write failed", timeout).is_retryable());
    }
}
