//! The collection store: upload, list, and delete over catalog + blobs.
//!
//! Every mutation follows the same shape: validate against the current
//! catalog snapshot, perform blob I/O while holding the collection's
//! exclusive lock, then commit a replacement snapshot. Blob writes happen
//! strictly before the catalog commit, so a listed name always has a
//! retrievable blob; a failed batch rolls its blobs back and leaves the
//! catalog untouched.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::Instrument;

use shelf_core::observability::store_span;
use shelf_core::{BlobKey, BlobRepository, CollectionId, DocumentName};

use crate::catalog::{Catalog, CollectionSnapshot};
use crate::document::DocumentRef;
use crate::error::{Result, StoreError};
use crate::lock::{LockTable, DEFAULT_LOCK_WAIT};
use crate::metrics;
use crate::retry::{retry_storage, DEFAULT_STORAGE_ATTEMPTS};

/// Tuning knobs for a [`CollectionStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How long a mutation may wait for the collection lock.
    pub lock_wait: Duration,
    /// Maximum attempts per blob operation (1 = no retries).
    pub storage_attempts: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            lock_wait: DEFAULT_LOCK_WAIT,
            storage_attempts: DEFAULT_STORAGE_ATTEMPTS,
        }
    }
}

/// One file within an upload batch.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original file name; becomes the document name.
    pub name: String,
    /// File content.
    pub content: Bytes,
}

/// Result of a committed upload batch.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Collection version after the commit.
    pub version: u64,
    /// All document names now in the collection, in insertion order.
    pub documents: Vec<String>,
}

/// Point-in-time listing of one collection.
#[derive(Debug, Clone)]
pub struct CollectionListing {
    /// The collection id.
    pub collection_id: String,
    /// Collection version (0 for an unknown collection).
    pub version: u64,
    /// Documents in insertion order.
    pub documents: Vec<DocumentRef>,
}

/// Result of a committed delete.
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    /// Names removed by this operation.
    pub removed: Vec<String>,
    /// Names remaining in the collection (empty after a whole-collection
    /// delete).
    pub remaining: Vec<String>,
    /// Collection version after a document-level delete; `None` when the
    /// collection itself was removed.
    pub version: Option<u64>,
}

/// The public-facing core: composes the catalog and the blob repository
/// under per-collection coordination.
pub struct CollectionStore {
    blobs: Arc<dyn BlobRepository>,
    catalog: Catalog,
    locks: LockTable,
    storage_attempts: u32,
}

impl std::fmt::Debug for CollectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionStore")
            .field("blobs", &"<BlobRepository>")
            .field("storage_attempts", &self.storage_attempts)
            .finish_non_exhaustive()
    }
}

impl CollectionStore {
    /// Creates a store over the given blob repository with default options.
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobRepository>) -> Self {
        Self::with_options(blobs, StoreOptions::default())
    }

    /// Creates a store with explicit tuning options.
    #[must_use]
    pub fn with_options(blobs: Arc<dyn BlobRepository>, options: StoreOptions) -> Self {
        Self {
            blobs,
            catalog: Catalog::new(),
            locks: LockTable::new(options.lock_wait),
            storage_attempts: options.storage_attempts.max(1),
        }
    }

    /// Uploads a batch of files into a collection, creating the collection
    /// on first use.
    ///
    /// The batch is all-or-nothing at the catalog level: names are validated
    /// against the current snapshot before any blob write; the catalog
    /// commits (bumping `version` by exactly one) only after every blob write
    /// succeeded. A mid-batch failure rolls already-written blobs back.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Validation`] for an empty id, empty batch, or
    ///   malformed file name
    /// - [`StoreError::Conflict`] when a name already exists in the
    ///   collection or repeats within the batch
    /// - [`StoreError::Storage`] when a blob write fails after retries
    /// - [`StoreError::Busy`] when the collection lock wait budget elapses
    pub async fn upload(&self, collection_id: &str, files: Vec<UploadFile>) -> Result<UploadOutcome> {
        let collection = CollectionId::new(collection_id)
            .map_err(|e| StoreError::invalid_field("local_doc_id", &e))?;

        if files.is_empty() {
            return Err(StoreError::validation(
                "files",
                "at least one file is required",
            ));
        }

        let mut batch: Vec<(DocumentName, Bytes)> = Vec::with_capacity(files.len());
        for file in files {
            let name = DocumentName::new(file.name)
                .map_err(|e| StoreError::invalid_field("files", &e))?;
            if batch.iter().any(|(existing, _)| existing == &name) {
                metrics::record_upload_conflict(collection.as_str());
                return Err(StoreError::Conflict {
                    collection: collection.as_str().to_string(),
                    document: name.as_str().to_string(),
                });
            }
            batch.push((name, file.content));
        }

        let span = store_span("upload", collection.as_str());
        self.upload_batch(&collection, batch).instrument(span).await
    }

    async fn upload_batch(
        &self,
        collection: &CollectionId,
        batch: Vec<(DocumentName, Bytes)>,
    ) -> Result<UploadOutcome> {
        let _guard = self.locks.acquire(collection).await?;

        let current = self
            .catalog
            .snapshot(collection)?
            .unwrap_or_else(|| Arc::new(CollectionSnapshot::default()));

        for (name, _) in &batch {
            if current.contains(name) {
                metrics::record_upload_conflict(collection.as_str());
                return Err(StoreError::Conflict {
                    collection: collection.as_str().to_string(),
                    document: name.as_str().to_string(),
                });
            }
        }

        // Catalog validation passed; write blobs one by one. Nothing is
        // client-visible until the commit below.
        let mut written: Vec<BlobKey> = Vec::with_capacity(batch.len());
        for (name, content) in &batch {
            let key = BlobKey::document(collection, name);
            let result = retry_storage("put", self.storage_attempts, || {
                self.blobs.put(&key, content.clone())
            })
            .await;

            if let Err(e) = result {
                self.rollback_blobs(collection, &written).await;
                tracing::warn!(
                    collection = %collection,
                    document = %name,
                    error = %e,
                    "upload batch aborted, blobs rolled back"
                );
                return Err(StoreError::from_storage(&e));
            }
            written.push(key);
        }

        let mut documents = current.documents.clone();
        for (name, content) in &batch {
            documents.push(DocumentRef::from_content(name.clone(), content));
        }
        let next = CollectionSnapshot {
            version: current.version + 1,
            documents,
        };
        let version = next.version;
        let names = next.document_names();
        self.catalog.commit(collection, next)?;

        metrics::record_upload_batch(batch.len() as u64);
        tracing::info!(
            collection = %collection,
            version = version,
            batch_size = batch.len(),
            "upload batch committed"
        );

        Ok(UploadOutcome {
            version,
            documents: names,
        })
    }

    /// Lists one collection's documents from a consistent snapshot.
    ///
    /// An unknown collection id yields an empty listing (version 0), not an
    /// error. Never blocks behind mutations or other reads.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for a malformed id.
    pub fn list(&self, collection_id: &str) -> Result<CollectionListing> {
        let collection = CollectionId::new(collection_id)
            .map_err(|e| StoreError::invalid_field("local_doc_id", &e))?;

        let snapshot = self.catalog.snapshot(&collection)?;
        Ok(match snapshot {
            Some(snap) => CollectionListing {
                collection_id: collection.as_str().to_string(),
                version: snap.version,
                documents: snap.documents.clone(),
            },
            None => CollectionListing {
                collection_id: collection.as_str().to_string(),
                version: 0,
                documents: Vec::new(),
            },
        })
    }

    /// Lists every known collection, ordered by collection id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] only if the catalog lock is poisoned.
    pub fn list_all(&self) -> Result<Vec<CollectionListing>> {
        Ok(self
            .catalog
            .snapshot_all()?
            .into_iter()
            .map(|(id, snap)| CollectionListing {
                collection_id: id.as_str().to_string(),
                version: snap.version,
                documents: snap.documents.clone(),
            })
            .collect())
    }

    /// Deletes a whole collection, or a single document when `doc_name` is
    /// given.
    ///
    /// The catalog commit happens first; blob deletion is attempted
    /// afterwards and a failure there does not fail the operation — the
    /// orphaned blob is logged for out-of-band reconciliation. The catalog is
    /// the authority on what exists.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Validation`] for malformed inputs
    /// - [`StoreError::CollectionNotFound`] /
    ///   [`StoreError::DocumentNotFound`] when the target is unknown
    /// - [`StoreError::Busy`] when the collection lock wait budget elapses
    pub async fn delete(
        &self,
        collection_id: &str,
        doc_name: Option<&str>,
    ) -> Result<DeleteOutcome> {
        let collection = CollectionId::new(collection_id)
            .map_err(|e| StoreError::invalid_field("local_doc_id", &e))?;
        let span = store_span("delete", collection.as_str());

        match doc_name {
            None => self.delete_collection(&collection).instrument(span).await,
            Some(name) => {
                let name = DocumentName::new(name)
                    .map_err(|e| StoreError::invalid_field("doc_name", &e))?;
                self.delete_document(&collection, &name)
                    .instrument(span)
                    .await
            }
        }
    }

    async fn delete_collection(&self, collection: &CollectionId) -> Result<DeleteOutcome> {
        let _guard = self.locks.acquire(collection).await?;

        let removed = self
            .catalog
            .remove(collection)?
            .ok_or_else(|| StoreError::CollectionNotFound {
                collection: collection.as_str().to_string(),
            })?;

        let names = removed.document_names();
        for doc in &removed.documents {
            let key = BlobKey::document(collection, &doc.name);
            self.delete_blob_or_orphan(&key).await;
        }

        metrics::record_collection_deleted();
        metrics::record_documents_deleted(names.len() as u64);
        tracing::info!(
            collection = %collection,
            documents = names.len(),
            "collection deleted"
        );

        Ok(DeleteOutcome {
            removed: names,
            remaining: Vec::new(),
            version: None,
        })
    }

    async fn delete_document(
        &self,
        collection: &CollectionId,
        name: &DocumentName,
    ) -> Result<DeleteOutcome> {
        let _guard = self.locks.acquire(collection).await?;

        let current = self
            .catalog
            .snapshot(collection)?
            .ok_or_else(|| StoreError::CollectionNotFound {
                collection: collection.as_str().to_string(),
            })?;

        if !current.contains(name) {
            return Err(StoreError::DocumentNotFound {
                collection: collection.as_str().to_string(),
                document: name.as_str().to_string(),
            });
        }

        let documents: Vec<DocumentRef> = current
            .documents
            .iter()
            .filter(|d| &d.name != name)
            .cloned()
            .collect();
        let next = CollectionSnapshot {
            version: current.version + 1,
            documents,
        };
        let version = next.version;
        let remaining = next.document_names();
        self.catalog.commit(collection, next)?;

        let key = BlobKey::document(collection, name);
        self.delete_blob_or_orphan(&key).await;

        metrics::record_documents_deleted(1);
        tracing::info!(
            collection = %collection,
            document = %name,
            version = version,
            "document deleted"
        );

        Ok(DeleteOutcome {
            removed: vec![name.as_str().to_string()],
            remaining,
            version: Some(version),
        })
    }

    /// Rolls back blobs written by a failed batch. Best-effort: a blob that
    /// cannot be deleted is logged as orphaned.
    async fn rollback_blobs(&self, collection: &CollectionId, written: &[BlobKey]) {
        for key in written {
            if let Err(e) = self.blobs.delete(key).await {
                metrics::record_orphaned_blob();
                tracing::warn!(
                    collection = %collection,
                    blob = %key,
                    error = %e,
                    "rollback could not delete blob, orphan left for reconciliation"
                );
            }
        }
    }

    /// Deletes one blob after a catalog commit. Failures are tolerated: the
    /// catalog decides what exists, the orphan is logged for reconciliation.
    async fn delete_blob_or_orphan(&self, key: &BlobKey) {
        if let Err(e) = self.blobs.delete(key).await {
            metrics::record_orphaned_blob();
            tracing::warn!(
                blob = %key,
                error = %e,
                "blob deletion failed after catalog commit, orphan left for reconciliation"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::MemoryRepository;

    fn store() -> CollectionStore {
        CollectionStore::new(Arc::new(MemoryRepository::new()))
    }

    fn file(name: &str, content: &str) -> UploadFile {
        UploadFile {
            name: name.to_string(),
            content: Bytes::from(content.to_string()),
        }
    }

    #[tokio::test]
    async fn upload_then_list_preserves_order() {
        let store = store();

        let outcome = store
            .upload("sess1", vec![file("a.txt", "aa"), file("b.txt", "bb")])
            .await
            .expect("upload should succeed");
        assert_eq!(outcome.version, 1);
        assert_eq!(outcome.documents, vec!["a.txt", "b.txt"]);

        let listing = store.list("sess1").unwrap();
        assert_eq!(listing.version, 1);
        let names: Vec<_> = listing
            .documents
            .iter()
            .map(|d| d.name.as_str().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn duplicate_upload_conflicts_and_leaves_state_intact() {
        let store = store();
        store
            .upload("sess1", vec![file("a.txt", "aa"), file("b.txt", "bb")])
            .await
            .unwrap();

        let result = store.upload("sess1", vec![file("a.txt", "again")]).await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));

        let listing = store.list("sess1").unwrap();
        assert_eq!(listing.version, 1, "failed upload must not bump version");
        let names: Vec<_> = listing
            .documents
            .iter()
            .map(|d| d.name.as_str().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn in_batch_duplicate_names_conflict() {
        let store = store();
        let result = store
            .upload("sess1", vec![file("a.txt", "one"), file("a.txt", "two")])
            .await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert_eq!(store.list("sess1").unwrap().version, 0);
    }

    #[tokio::test]
    async fn empty_inputs_are_validation_errors() {
        let store = store();

        let empty_id = store.upload("", vec![file("a.txt", "aa")]).await;
        assert!(matches!(empty_id, Err(StoreError::Validation { field: "local_doc_id", .. })));

        let empty_batch = store.upload("sess1", vec![]).await;
        assert!(matches!(empty_batch, Err(StoreError::Validation { field: "files", .. })));
    }

    #[tokio::test]
    async fn listing_unknown_collection_is_empty_not_error() {
        let store = store();
        let listing = store.list("never-seen").unwrap();
        assert_eq!(listing.version, 0);
        assert!(listing.documents.is_empty());
    }

    #[tokio::test]
    async fn document_delete_keeps_collection_alive() {
        let store = store();
        store
            .upload("sess1", vec![file("a.txt", "aa"), file("b.txt", "bb")])
            .await
            .unwrap();

        let outcome = store.delete("sess1", Some("a.txt")).await.unwrap();
        assert_eq!(outcome.removed, vec!["a.txt"]);
        assert_eq!(outcome.remaining, vec!["b.txt"]);
        assert_eq!(outcome.version, Some(2));

        // Emptying a collection via document deletes leaves it existing.
        store.delete("sess1", Some("b.txt")).await.unwrap();
        let listing = store.list("sess1").unwrap();
        assert_eq!(listing.version, 3);
        assert!(listing.documents.is_empty());
    }

    #[tokio::test]
    async fn whole_collection_delete_then_second_delete_is_not_found() {
        let store = store();
        store
            .upload("sess1", vec![file("a.txt", "aa")])
            .await
            .unwrap();

        let outcome = store.delete("sess1", None).await.unwrap();
        assert_eq!(outcome.removed, vec!["a.txt"]);
        assert!(outcome.remaining.is_empty());

        assert!(store.list("sess1").unwrap().documents.is_empty());

        let second = store.delete("sess1", None).await;
        assert!(matches!(second, Err(StoreError::CollectionNotFound { .. })));
    }

    #[tokio::test]
    async fn deleting_unknown_document_is_not_found() {
        let store = store();
        store
            .upload("sess1", vec![file("a.txt", "aa")])
            .await
            .unwrap();

        let result = store.delete("sess1", Some("missing.txt")).await;
        assert!(matches!(result, Err(StoreError::DocumentNotFound { .. })));
    }

    #[tokio::test]
    async fn blobs_are_removed_with_their_documents() {
        let repo = Arc::new(MemoryRepository::new());
        let store = CollectionStore::new(Arc::clone(&repo) as Arc<dyn BlobRepository>);

        store
            .upload("sess1", vec![file("a.txt", "aa"), file("b.txt", "bb")])
            .await
            .unwrap();
        assert_eq!(repo.len().unwrap(), 2);

        store.delete("sess1", Some("a.txt")).await.unwrap();
        assert_eq!(repo.len().unwrap(), 1);

        store.delete("sess1", None).await.unwrap();
        assert!(repo.is_empty().unwrap());
    }

    #[tokio::test]
    async fn version_counts_mutations_not_batch_size() {
        let store = store();

        store
            .upload(
                "sess1",
                vec![file("a.txt", "a"), file("b.txt", "b"), file("c.txt", "c")],
            )
            .await
            .unwrap();
        assert_eq!(store.list("sess1").unwrap().version, 1);

        store.upload("sess1", vec![file("d.txt", "d")]).await.unwrap();
        assert_eq!(store.list("sess1").unwrap().version, 2);

        store.delete("sess1", Some("d.txt")).await.unwrap();
        assert_eq!(store.list("sess1").unwrap().version, 3);
    }

    #[tokio::test]
    async fn list_all_spans_collections() {
        let store = store();
        store.upload("beta", vec![file("b.txt", "b")]).await.unwrap();
        store.upload("alpha", vec![file("a.txt", "a")]).await.unwrap();

        let all = store.list_all().unwrap();
        let ids: Vec<_> = all.iter().map(|l| l.collection_id.clone()).collect();
        assert_eq!(ids, vec!["alpha", "beta"]);
    }
}
