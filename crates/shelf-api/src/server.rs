//! API server implementation.
//!
//! Provides health, ready, and collection endpoints for the shelf store.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use shelf_core::{BlobKey, BlobRepository, CollectionId, DocumentName, MemoryRepository, Result};

use crate::config::{Config, CorsConfig};
use shelf_store::CollectionStore;

// ============================================================================
// Health and Ready Responses
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ReadyResponse {
    /// Service readiness status.
    pub ready: bool,
    /// Optional message about readiness state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Blob repository behind the store (also probed by readiness).
    blobs: Arc<dyn BlobRepository>,
    /// The collection store.
    store: Arc<CollectionStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("blobs", &"<BlobRepository>")
            .field("store", &"<CollectionStore>")
            .finish()
    }
}

impl AppState {
    /// Creates new application state over the given blob repository.
    #[must_use]
    pub fn new(config: Config, blobs: Arc<dyn BlobRepository>) -> Self {
        let store = Arc::new(CollectionStore::with_options(
            Arc::clone(&blobs),
            config.store_options(),
        ));
        Self {
            config,
            blobs,
            store,
        }
    }

    /// Creates new application state with in-memory storage (for testing).
    #[must_use]
    pub fn with_memory_storage(config: Config) -> Self {
        Self::new(config, Arc::new(MemoryRepository::new()))
    }

    /// Returns the collection store.
    #[must_use]
    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    /// Returns the blob repository.
    #[must_use]
    pub fn blob_repository(&self) -> Arc<dyn BlobRepository> {
        Arc::clone(&self.blobs)
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Health check endpoint handler.
///
/// Returns 200 OK if the service is alive. This is a shallow check
/// that doesn't verify dependencies.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness check endpoint handler.
///
/// Returns 200 OK if the service is ready to accept requests. An `exists`
/// probe on a reserved key is sufficient to validate the storage path without
/// writing anything.
async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let probe = match ready_probe_key() {
        Ok(key) => key,
        Err(e) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    ready: false,
                    message: Some(format!("probe key construction failed: {e}")),
                }),
            );
        }
    };
    match state.blobs.exists(&probe).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                message: None,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                ready: false,
                message: Some(format!("storage check failed: {e}")),
            }),
        ),
    }
}

fn ready_probe_key() -> Result<BlobKey> {
    let collection = CollectionId::new("__shelf")?;
    let name = DocumentName::new("ready-check")?;
    Ok(BlobKey::document(&collection, &name))
}

// ============================================================================
// Server
// ============================================================================

/// The shelf API server.
pub struct Server {
    config: Config,
    blobs: Arc<dyn BlobRepository>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("blobs", &"<BlobRepository>")
            .finish()
    }
}

impl Server {
    /// Creates a new server with the given configuration.
    ///
    /// Defaults to in-memory storage; use [`Server::with_blob_repository`]
    /// for production.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            blobs: Arc::new(MemoryRepository::new()),
        }
    }

    /// Creates a new server with an explicit blob repository.
    #[must_use]
    pub fn with_blob_repository(config: Config, blobs: Arc<dyn BlobRepository>) -> Self {
        Self { config, blobs }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates the router with all routes and middleware.
    fn create_router(&self) -> Router {
        let state = Arc::new(AppState::new(
            self.config.clone(),
            Arc::clone(&self.blobs),
        ));

        let cors = Self::build_cors_layer(&self.config.cors);

        Router::new()
            // Health and ready endpoints
            .route("/healthz", get(health))
            .route("/readyz", get(ready))
            // Collection routes
            .merge(crate::routes::collection_routes())
            // Middleware (order matters): body limit innermost, then CORS,
            // then trace outermost for timing.
            .layer(DefaultBodyLimit::max(self.config.max_upload_bytes))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            // Shared state
            .with_state(state)
    }

    /// Creates a router for in-process testing, bypassing the listener.
    #[must_use]
    pub fn test_router(&self) -> Router {
        self.create_router()
    }

    fn build_cors_layer(cors_config: &CorsConfig) -> CorsLayer {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::DELETE])
            .allow_headers([
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::HeaderName::from_static("x-request-id"),
            ])
            .expose_headers([
                header::CONTENT_TYPE,
                header::HeaderName::from_static("x-request-id"),
                header::RETRY_AFTER,
            ])
            .max_age(Duration::from_secs(cors_config.max_age_seconds));

        Self::apply_cors_allowed_origins(cors, cors_config)
    }

    fn apply_cors_allowed_origins(cors: CorsLayer, cors_config: &CorsConfig) -> CorsLayer {
        if cors_config.allowed_origins.is_empty() {
            return cors;
        }

        let any_origin = cors_config.allowed_origins.len() == 1
            && cors_config
                .allowed_origins
                .first()
                .is_some_and(|origin| origin == "*");
        if any_origin {
            return cors.allow_origin(Any);
        }

        if cors_config
            .allowed_origins
            .iter()
            .any(|origin| origin == "*")
        {
            tracing::error!(
                origins = ?cors_config.allowed_origins,
                "Invalid CORS config: '*' must be the only allowed origin"
            );
            return cors;
        }

        let allowed: Vec<HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::error!(
                        origin = %origin,
                        "Invalid CORS origin; expected a valid HeaderValue"
                    );
                    None
                }
            })
            .collect();

        if allowed.is_empty() {
            tracing::warn!("All configured CORS origins were invalid; disabling CORS");
            cors
        } else {
            tracing::info!(origins = ?cors_config.allowed_origins, "CORS configured");
            cors.allow_origin(AllowOrigin::list(allowed))
        }
    }

    /// Starts the server and blocks until shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind to the configured port.
    pub async fn serve(&self) -> Result<()> {
        shelf_store::metrics::register_metrics();

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let router = self.create_router();

        tracing::info!(
            http_port = self.config.http_port,
            "Starting shelf API server"
        );

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            shelf_core::Error::Internal {
                message: format!("failed to bind to {addr}: {e}"),
            }
        })?;

        axum::serve(listener, router)
            .await
            .map_err(|e| shelf_core::Error::Internal {
                message: format!("server error: {e}"),
            })?;

        Ok(())
    }
}
