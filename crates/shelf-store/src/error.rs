//! Error types for collection store operations.

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during collection store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed or missing required input. Never retried.
    #[error("validation error on '{field}': {message}")]
    Validation {
        /// The offending input field.
        field: &'static str,
        /// Description of what made the input invalid.
        message: String,
    },

    /// A document name collides with an existing or in-batch entry.
    #[error("document '{document}' already exists in collection '{collection}'")]
    Conflict {
        /// The target collection.
        collection: String,
        /// The colliding document name.
        document: String,
    },

    /// The target collection does not exist.
    #[error("collection not found: {collection}")]
    CollectionNotFound {
        /// The unknown collection id.
        collection: String,
    },

    /// The target document does not exist within the collection.
    #[error("document '{document}' not found in collection '{collection}'")]
    DocumentNotFound {
        /// The collection that was searched.
        collection: String,
        /// The unknown document name.
        document: String,
    },

    /// Underlying blob I/O failed after bounded retries.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// The per-collection lock could not be acquired within the wait budget.
    #[error("collection '{collection}' is busy (waited {waited_ms}ms)")]
    Busy {
        /// The contended collection id.
        collection: String,
        /// How long the caller waited before giving up.
        waited_ms: u64,
    },

    /// An internal invariant was violated.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StoreError {
    /// Creates a validation error for the given field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Wraps a core identifier error as a validation error on a field.
    #[must_use]
    pub fn invalid_field(field: &'static str, source: &shelf_core::Error) -> Self {
        Self::Validation {
            field,
            message: source.to_string(),
        }
    }

    /// Wraps a core storage error, preserving its message.
    #[must_use]
    pub fn from_storage(source: &shelf_core::Error) -> Self {
        match source {
            shelf_core::Error::Internal { message } => Self::Internal {
                message: message.clone(),
            },
            other => Self::Storage {
                message: other.to_string(),
            },
        }
    }
}
