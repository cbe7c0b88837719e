//! Typed storage keys for blob addressing.
//!
//! A [`BlobKey`] encodes the storage path for a document's content. Callers
//! never build path strings by hand; keys can only be constructed from
//! validated identifiers, so malformed paths cannot reach a backend.
//!
//! # Path Format
//!
//! - Document content: `collections/{collection_id}/{doc_name}`
//! - Collection prefix: `collections/{collection_id}/`
//!
//! # Example
//!
//! ```rust
//! use shelf_core::collection::{CollectionId, DocumentName};
//! use shelf_core::keys::BlobKey;
//!
//! let collection = CollectionId::new("sess1").unwrap();
//! let name = DocumentName::new("a.txt").unwrap();
//! let key = BlobKey::document(&collection, &name);
//! assert_eq!(key.as_ref(), "collections/sess1/a.txt");
//! ```

use crate::collection::{CollectionId, DocumentName};

/// A typed key addressing one document's content in the blob repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobKey(String);

impl BlobKey {
    /// Creates the key for a document's content.
    #[must_use]
    pub fn document(collection: &CollectionId, name: &DocumentName) -> Self {
        Self(format!(
            "collections/{}/{}",
            collection.as_str(),
            name.as_str()
        ))
    }

    /// Creates the prefix under which a collection's blobs live.
    ///
    /// Useful for backends that support prefix cleanup or listing.
    #[must_use]
    pub fn collection_prefix(collection: &CollectionId) -> Self {
        Self(format!("collections/{}/", collection.as_str()))
    }

    /// Returns the underlying path string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BlobKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
