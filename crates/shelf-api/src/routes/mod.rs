//! HTTP route handlers.

pub mod collections;

use std::sync::Arc;

use axum::Router;

use crate::server::AppState;

/// `/collections/*` routes.
pub fn collection_routes() -> Router<Arc<AppState>> {
    collections::routes()
}
