//! `shelf-api` binary entrypoint.
//!
//! Loads configuration from environment variables and starts the HTTP server.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use std::sync::Arc;

use anyhow::Result;

use shelf_api::config::Config;
use shelf_api::server::Server;
use shelf_core::observability::{init_logging, LogFormat};
use shelf_core::{BlobRepository, FsRepository, MemoryRepository};

fn choose_log_format(config: &Config) -> LogFormat {
    if config.debug {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    init_logging(choose_log_format(&config));

    let blobs: Arc<dyn BlobRepository> = if let Some(root) = config.storage_root.as_deref() {
        tracing::info!(root = %root.display(), "Using filesystem blob repository");
        Arc::new(FsRepository::new(root))
    } else {
        if !config.debug {
            anyhow::bail!("SHELF_STORAGE_ROOT is required when SHELF_DEBUG=false");
        }
        tracing::warn!("SHELF_STORAGE_ROOT not set; using in-memory blob repository (debug only)");
        Arc::new(MemoryRepository::new())
    };

    let server = Server::with_blob_repository(config, blobs);
    server.serve().await?;
    Ok(())
}
