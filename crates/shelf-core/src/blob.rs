//! Blob repository abstraction for document content storage.
//!
//! This module defines the byte-storage contract the collection store depends
//! on. The catalog is the authority on what exists; the blob repository only
//! holds content, addressed by [`BlobKey`]. Backends must provide atomic
//! per-key put/delete — no additional locking is required from callers.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};
use crate::keys::BlobKey;

/// Byte-storage contract for document content.
///
/// All backends (memory, filesystem) implement this trait. Keys are opaque
/// paths produced by [`BlobKey`]; backends interpret them as hierarchical
/// paths but callers never see that detail.
#[async_trait]
pub trait BlobRepository: Send + Sync + 'static {
    /// Writes the full content for a key, replacing any existing value.
    async fn put(&self, key: &BlobKey, data: Bytes) -> Result<()>;

    /// Reads the full content for a key.
    ///
    /// Returns `Error::NotFound` if no blob exists at the key.
    async fn get(&self, key: &BlobKey) -> Result<Bytes>;

    /// Deletes the blob at a key.
    ///
    /// Succeeds even if the blob doesn't exist (idempotent).
    async fn delete(&self, key: &BlobKey) -> Result<()>;

    /// Returns whether a blob exists at the key.
    async fn exists(&self, key: &BlobKey) -> Result<bool>;
}

/// In-memory blob repository for testing and debug deployments.
///
/// Thread-safe via `RwLock`. Not suitable for production.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    blobs: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryRepository {
    /// Creates a new empty memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored blobs.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read_blobs()?.len())
    }

    /// Returns whether the repository holds no blobs.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read_blobs()?.is_empty())
    }

    fn read_blobs(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Bytes>>> {
        self.blobs.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })
    }

    fn write_blobs(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Bytes>>> {
        self.blobs.write().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })
    }
}

#[async_trait]
impl BlobRepository for MemoryRepository {
    async fn put(&self, key: &BlobKey, data: Bytes) -> Result<()> {
        self.write_blobs()?.insert(key.path().to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &BlobKey) -> Result<Bytes> {
        self.read_blobs()?
            .get(key.path())
            .cloned()
            .ok_or_else(|| Error::not_found(format!("blob not found: {key}")))
    }

    async fn delete(&self, key: &BlobKey) -> Result<()> {
        self.write_blobs()?.remove(key.path());
        Ok(())
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool> {
        Ok(self.read_blobs()?.contains_key(key.path()))
    }
}
