//! Collection store metrics.
//!
//! Counters for store operations, complementing the structured logging
//! already in place.

use metrics::{counter, describe_counter};

/// Committed upload batches counter.
pub const UPLOAD_BATCHES: &str = "shelf_upload_batches_total";

/// Committed uploaded documents counter.
pub const UPLOAD_DOCUMENTS: &str = "shelf_upload_documents_total";

/// Upload name-conflict counter.
pub const UPLOAD_CONFLICTS: &str = "shelf_upload_conflicts_total";

/// Deleted documents counter (document-level and whole-collection).
pub const DOCUMENTS_DELETED: &str = "shelf_documents_deleted_total";

/// Deleted collections counter.
pub const COLLECTIONS_DELETED: &str = "shelf_collections_deleted_total";

/// Transient storage retry counter.
pub const STORAGE_RETRIES: &str = "shelf_storage_retries_total";

/// Orphaned blob counter (blob deletion failed after a catalog commit).
pub const ORPHANED_BLOBS: &str = "shelf_orphaned_blobs_total";

/// Registers all store metric descriptions.
///
/// Call this once at application startup after initializing the metrics
/// recorder.
pub fn register_metrics() {
    describe_counter!(UPLOAD_BATCHES, "Total committed upload batches");
    describe_counter!(UPLOAD_DOCUMENTS, "Total documents committed via upload");
    describe_counter!(UPLOAD_CONFLICTS, "Total uploads rejected for name conflicts");
    describe_counter!(DOCUMENTS_DELETED, "Total documents deleted");
    describe_counter!(COLLECTIONS_DELETED, "Total collections deleted");
    describe_counter!(STORAGE_RETRIES, "Total transient storage retry attempts");
    describe_counter!(
        ORPHANED_BLOBS,
        "Total blobs orphaned by failed deletes, pending reconciliation"
    );
}

/// Records a committed upload batch of `documents` files.
pub fn record_upload_batch(documents: u64) {
    counter!(UPLOAD_BATCHES).increment(1);
    counter!(UPLOAD_DOCUMENTS).increment(documents);
}

/// Records an upload rejected for a name conflict.
pub fn record_upload_conflict(collection: &str) {
    counter!(UPLOAD_CONFLICTS, "collection" => collection.to_string()).increment(1);
}

/// Records deleted documents.
pub fn record_documents_deleted(count: u64) {
    counter!(DOCUMENTS_DELETED).increment(count);
}

/// Records a whole-collection delete.
pub fn record_collection_deleted() {
    counter!(COLLECTIONS_DELETED).increment(1);
}

/// Records a transient storage retry attempt.
pub fn record_storage_retry(operation: &'static str) {
    counter!(STORAGE_RETRIES, "operation" => operation).increment(1);
}

/// Records a blob left behind by a failed post-commit deletion.
pub fn record_orphaned_blob() {
    counter!(ORPHANED_BLOBS).increment(1);
}
