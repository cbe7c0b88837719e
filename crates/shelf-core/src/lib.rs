//! # shelf-core
//!
//! Core abstractions for the shelf document collection store.
//!
//! This crate provides the foundational types used across all shelf components:
//!
//! - **Identifiers**: Validated collection and document name newtypes
//! - **Blob Keys**: Typed storage keys for blob addressing
//! - **Blob Repository**: Abstract byte-storage contract with memory and
//!   filesystem backends
//! - **Error Types**: Shared error definitions and result types
//! - **Observability**: Structured logging bootstrap
//!
//! ## Crate Boundary
//!
//! `shelf-core` is the **only** crate allowed to define shared primitives.
//! The catalog and HTTP layers build on the contracts defined here.
//!
//! ## Example
//!
//! ```rust
//! use shelf_core::prelude::*;
//!
//! let collection = CollectionId::new("sess1").unwrap();
//! let name = DocumentName::new("report.pdf").unwrap();
//! let key = BlobKey::document(&collection, &name);
//! assert_eq!(key.as_ref(), "collections/sess1/report.pdf");
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod blob;
pub mod collection;
pub mod error;
pub mod fs;
pub mod keys;
pub mod observability;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use shelf_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::blob::{BlobRepository, MemoryRepository};
    pub use crate::collection::{CollectionId, DocumentName};
    pub use crate::error::{Error, Result};
    pub use crate::fs::FsRepository;
    pub use crate::keys::BlobKey;
}

// Re-export key types at crate root for ergonomics
pub use blob::{BlobRepository, MemoryRepository};
pub use collection::{CollectionId, DocumentName};
pub use error::{Error, Result};
pub use fs::FsRepository;
pub use keys::BlobKey;
pub use observability::{init_logging, LogFormat};
