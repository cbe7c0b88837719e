//! Document metadata records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use shelf_core::DocumentName;

/// Metadata for one stored document within a collection.
///
/// Owned exclusively by its collection; the content itself lives in the blob
/// repository under the matching [`shelf_core::BlobKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Document name, unique within the owning collection.
    pub name: DocumentName,
    /// Content size in bytes.
    pub size_bytes: u64,
    /// SHA-256 of the content, lowercase hex.
    pub checksum: String,
    /// When the document was committed to the catalog.
    pub created_at: DateTime<Utc>,
}

impl DocumentRef {
    /// Builds a ref for the given content, computing size and checksum.
    #[must_use]
    pub fn from_content(name: DocumentName, content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let checksum = format!("{:x}", hasher.finalize());

        Self {
            name,
            size_bytes: content.len() as u64,
            checksum,
            created_at: Utc::now(),
        }
    }
}
