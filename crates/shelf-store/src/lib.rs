//! # shelf-store
//!
//! The document collection store for shelf.
//!
//! This crate implements the core the HTTP surface exposes:
//!
//! - **Catalog**: the authoritative index of collections and their ordered
//!   documents, read through copy-on-write snapshots
//! - **Collection Store**: upload / list / delete with all-or-nothing batch
//!   semantics and per-collection exclusive locking
//! - **Retry**: bounded retries for transient blob-storage failures
//!
//! ## Consistency Model
//!
//! Blob writes happen strictly before the catalog commit, so a name listed
//! in the catalog always has a retrievable blob. Mutations of one collection
//! serialize on an exclusive lock; reads never take that lock and observe a
//! consistent point-in-time snapshot. Each committed mutation bumps the
//! collection's `version` by exactly one.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shelf_core::MemoryRepository;
//! use shelf_store::{CollectionStore, UploadFile};
//!
//! let store = CollectionStore::new(Arc::new(MemoryRepository::new()));
//! let outcome = store.upload("sess1", vec![UploadFile {
//!     name: "a.txt".into(),
//!     content: "hello".into(),
//! }]).await?;
//! assert_eq!(outcome.documents, vec!["a.txt"]);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod document;
pub mod error;
pub mod lock;
pub mod metrics;
pub mod retry;
pub mod store;

// Re-export main types at crate root
pub use catalog::{Catalog, CollectionSnapshot};
pub use document::DocumentRef;
pub use error::{Result, StoreError};
pub use lock::{CollectionGuard, LockTable};
pub use store::{
    CollectionListing, CollectionStore, DeleteOutcome, StoreOptions, UploadFile, UploadOutcome,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::document::DocumentRef;
    pub use crate::error::StoreError;
    pub use crate::store::{
        CollectionListing, CollectionStore, DeleteOutcome, StoreOptions, UploadFile, UploadOutcome,
    };
}
