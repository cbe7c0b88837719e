//! Collection and document identifier primitives.
//!
//! Collection ids are client-supplied (`local_doc_id` on the wire) and name
//! one knowledge-base unit; document names are derived from uploaded file
//! names. Both end up as storage path segments, so both are validated to be
//! path-safe before anything touches the blob repository.
//!
//! # Example
//!
//! ```rust
//! use shelf_core::collection::CollectionId;
//!
//! let collection = CollectionId::new("sess1").unwrap();
//! assert_eq!(collection.as_str(), "sess1");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Maximum byte length of a collection id.
pub const MAX_COLLECTION_ID_LEN: usize = 128;

/// Maximum byte length of a document name.
pub const MAX_DOCUMENT_NAME_LEN: usize = 255;

/// A unique identifier for a document collection.
///
/// Collection ids must be:
/// - Non-empty, at most 128 bytes
/// - Free of path separators, `..`, and control characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    /// Creates a new collection id after validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty, too long, or not path-safe.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_segment("collection id", &id, MAX_COLLECTION_ID_LEN)?;
        Ok(Self(id))
    }

    /// Returns the collection id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CollectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A document name, unique within its owning collection.
///
/// Derived from the uploaded file's original name. Matching is exact and
/// case-sensitive. The same path-safety rules as [`CollectionId`] apply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentName(String);

impl DocumentName {
    /// Creates a new document name after validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, too long, or not path-safe.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_segment("document name", &name, MAX_DOCUMENT_NAME_LEN)?;
        Ok(Self(name))
    }

    /// Returns the document name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for DocumentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validates a string for use as a single storage path segment.
fn validate_segment(what: &str, value: &str, max_len: usize) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidId {
            message: format!("{what} cannot be empty"),
        });
    }

    if value.len() > max_len {
        return Err(Error::InvalidId {
            message: format!("{what} exceeds {max_len} bytes"),
        });
    }

    if value == "." || value == ".." {
        return Err(Error::InvalidId {
            message: format!("{what} '{value}' is a reserved path segment"),
        });
    }

    if value.chars().any(|c| c == '/' || c == '\\' || c.is_control()) {
        return Err(Error::InvalidId {
            message: format!(
                "{what} '{value}' contains path separators or control characters"
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_collection_ids() {
        assert!(CollectionId::new("sess1").is_ok());
        assert!(CollectionId::new("kb-2024.q3").is_ok());
        assert!(CollectionId::new("Unterlagen für HR").is_ok());
    }

    #[test]
    fn invalid_collection_ids() {
        assert!(CollectionId::new("").is_err());
        assert!(CollectionId::new("a/b").is_err());
        assert!(CollectionId::new("a\\b").is_err());
        assert!(CollectionId::new("..").is_err());
        assert!(CollectionId::new("with\ncontrol").is_err());
        assert!(CollectionId::new("x".repeat(MAX_COLLECTION_ID_LEN + 1)).is_err());
    }

    #[test]
    fn valid_document_names() {
        assert!(DocumentName::new("report.pdf").is_ok());
        assert!(DocumentName::new("工伤保险办事指引.docx").is_ok());
        assert!(DocumentName::new("notes (final).txt").is_ok());
    }

    #[test]
    fn invalid_document_names() {
        assert!(DocumentName::new("").is_err());
        assert!(DocumentName::new(".").is_err());
        assert!(DocumentName::new("../escape.txt").is_err());
        assert!(DocumentName::new("dir/file.txt").is_err());
    }

    #[test]
    fn names_are_case_sensitive() {
        let a = DocumentName::new("Report.pdf").unwrap();
        let b = DocumentName::new("report.pdf").unwrap();
        assert_ne!(a, b);
    }
}
