//! # shelf-api
//!
//! HTTP composition layer for the shelf document collection store.
//!
//! This crate provides the API surface for shelf, handling:
//!
//! - **Routing**: HTTP endpoint configuration
//! - **Service Wiring**: Composition of the collection store over a blob
//!   repository
//! - **Observability**: Tracing, request ids, and health checks
//!
//! ## Design Principles
//!
//! This crate is a **thin composition layer** with no domain policy.
//! All business logic lives in `shelf-store`.
//!
//! ## Endpoints
//!
//! ```text
//! GET    /healthz              - Health check
//! GET    /readyz               - Readiness check
//! POST   /collections/upload   - Upload a batch of files into a collection
//! GET    /collections/list     - List one collection or all collections
//! DELETE /collections/delete   - Delete a collection or one document
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use shelf_api::config::Config;
//! use shelf_api::server::Server;
//!
//! let server = Server::new(Config::from_env()?);
//! server.serve().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod context;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod server;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::context::RequestContext;
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::server::Server;
}
