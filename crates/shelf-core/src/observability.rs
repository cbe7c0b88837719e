//! Observability infrastructure for shelf.
//!
//! Structured logging with consistent spans across components. This module
//! provides initialization helpers and span constructors so every store
//! operation logs the same fields.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `shelf_store=debug`)
///
/// # Example
///
/// ```rust
/// use shelf_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for collection store operations with standard fields.
///
/// # Example
///
/// ```rust
/// use shelf_core::observability::store_span;
///
/// let span = store_span("upload", "sess1");
/// let _guard = span.enter();
/// // ... do store operation
/// ```
#[must_use]
pub fn store_span(operation: &str, collection: &str) -> Span {
    tracing::info_span!(
        "collection_store",
        op = operation,
        collection = collection,
    )
}
