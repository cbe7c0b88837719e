//! Local-filesystem blob repository.
//!
//! Stores each blob as a regular file under a configured root directory,
//! using the key's path verbatim: `{root}/collections/{id}/{name}`. Writes go
//! through a temporary sibling file followed by a rename, so readers never
//! observe a truncated blob and a crashed write leaves only a stray temp file.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use ulid::Ulid;

use crate::blob::BlobRepository;
use crate::error::{Error, Result};
use crate::keys::BlobKey;

/// Blob repository backed by the local filesystem.
#[derive(Debug, Clone)]
pub struct FsRepository {
    root: PathBuf,
}

impl FsRepository {
    /// Creates a repository rooted at the given directory.
    ///
    /// The directory is created on first write; it does not need to exist yet.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory of this repository.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &BlobKey) -> PathBuf {
        self.root.join(key.path())
    }
}

#[async_trait]
impl BlobRepository for FsRepository {
    async fn put(&self, key: &BlobKey, data: Bytes) -> Result<()> {
        let path = self.blob_path(key);
        let parent = path.parent().ok_or_else(|| Error::Internal {
            message: format!("blob key has no parent directory: {key}"),
        })?;

        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::storage_io(format!("create directory for {key}"), e))?;

        let tmp = parent.join(format!(".tmp-{}", Ulid::new()));
        tokio::fs::write(&tmp, &data)
            .await
            .map_err(|e| Error::storage_io(format!("write temp file for {key}"), e))?;

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            // Leave no stray temp file behind on a failed publish.
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::storage_io(format!("publish blob {key}"), e));
        }

        Ok(())
    }

    async fn get(&self, key: &BlobKey) -> Result<Bytes> {
        match tokio::fs::read(self.blob_path(key)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found(format!("blob not found: {key}")))
            }
            Err(e) => Err(Error::storage_io(format!("read blob {key}"), e)),
        }
    }

    async fn delete(&self, key: &BlobKey) -> Result<()> {
        match tokio::fs::remove_file(self.blob_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage_io(format!("delete blob {key}"), e)),
        }
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool> {
        match tokio::fs::metadata(self.blob_path(key)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage_io(format!("stat blob {key}"), e)),
        }
    }
}
