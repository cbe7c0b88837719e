//! Collection API routes.
//!
//! Provides upload, list, and delete over named document collections.
//!
//! ## Routes
//!
//! - `POST   /collections/upload` - Upload a batch of files into a collection
//! - `GET    /collections/list`   - List one collection or all collections
//! - `DELETE /collections/delete` - Delete a collection or one document

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use shelf_store::{CollectionListing, DocumentRef, UploadFile};

use crate::context::RequestContext;
use crate::error::{ApiError, ApiErrorBody};
use crate::server::AppState;

/// Multipart form for uploads (documentation schema).
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// Target collection id.
    pub local_doc_id: String,
    /// One or more file parts.
    #[schema(value_type = Vec<String>, format = Binary)]
    pub files: Vec<String>,
}

/// Response for a committed upload batch.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct UploadResponse {
    /// Target collection id.
    pub local_doc_id: String,
    /// Collection version after the commit.
    pub version: u64,
    /// All document names now in the collection, in insertion order.
    pub documents: Vec<String>,
}

/// One document within a listing.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct DocumentInfo {
    /// Document name.
    pub name: String,
    /// Content size in bytes.
    pub size_bytes: u64,
    /// SHA-256 of the content, lowercase hex.
    pub checksum: String,
    /// Commit timestamp (ISO 8601).
    pub created_at: String,
}

impl From<&DocumentRef> for DocumentInfo {
    fn from(doc: &DocumentRef) -> Self {
        Self {
            name: doc.name.as_str().to_string(),
            size_bytes: doc.size_bytes,
            checksum: doc.checksum.clone(),
            created_at: doc.created_at.to_rfc3339(),
        }
    }
}

/// One collection within a listing.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct CollectionInfo {
    /// Collection id.
    pub local_doc_id: String,
    /// Collection version (0 for an unknown collection).
    pub version: u64,
    /// Documents in insertion order.
    pub documents: Vec<DocumentInfo>,
}

impl From<CollectionListing> for CollectionInfo {
    fn from(listing: CollectionListing) -> Self {
        Self {
            local_doc_id: listing.collection_id,
            version: listing.version,
            documents: listing.documents.iter().map(DocumentInfo::from).collect(),
        }
    }
}

/// Response for a listing request.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ListResponse {
    /// One entry when `local_doc_id` was given; all known collections
    /// otherwise.
    pub collections: Vec<CollectionInfo>,
}

/// Response for a committed delete.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct DeleteResponse {
    /// Target collection id.
    pub local_doc_id: String,
    /// Names removed by this operation.
    pub removed: Vec<String>,
    /// Names remaining in the collection.
    pub remaining: Vec<String>,
}

/// Query parameters for listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Collection to list; all collections when omitted.
    pub local_doc_id: Option<String>,
}

/// Query parameters for deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// Target collection id.
    pub local_doc_id: Option<String>,
    /// Document to delete; the whole collection when omitted.
    pub doc_name: Option<String>,
}

/// Creates collection routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/collections/upload", post(upload_documents))
        .route("/collections/list", get(list_documents))
        .route("/collections/delete", delete(delete_documents))
}

/// Upload a batch of files into a collection.
///
/// POST /collections/upload
#[utoipa::path(
    post,
    path = "/collections/upload",
    tag = "collections",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Batch committed", body = UploadResponse),
        (status = 409, description = "Name conflict", body = ApiErrorBody),
        (status = 422, description = "Validation error", body = ApiErrorBody),
        (status = 500, description = "Storage error", body = ApiErrorBody),
        (status = 503, description = "Collection busy", body = ApiErrorBody),
    ),
)]
pub(crate) async fn upload_documents(
    ctx: RequestContext,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut local_doc_id: Option<String> = None;
    let mut files: Vec<UploadFile> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::validation(&["body"], format!("malformed multipart body: {e}"))
            .with_request_id(ctx.request_id.clone())
    })? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("local_doc_id") => {
                let value = field.text().await.map_err(|e| {
                    ApiError::validation(
                        &["body", "local_doc_id"],
                        format!("unreadable field: {e}"),
                    )
                    .with_request_id(ctx.request_id.clone())
                })?;
                local_doc_id = Some(value);
            }
            Some("files") => {
                let name = field.file_name().map(str::to_string).ok_or_else(|| {
                    ApiError::validation(&["body", "files"], "file part is missing a filename")
                        .with_request_id(ctx.request_id.clone())
                })?;
                let content = field.bytes().await.map_err(|e| {
                    ApiError::validation(
                        &["body", "files"],
                        format!("unreadable file part '{name}': {e}"),
                    )
                    .with_request_id(ctx.request_id.clone())
                })?;
                files.push(UploadFile { name, content });
            }
            _ => {}
        }
    }

    let local_doc_id = local_doc_id.ok_or_else(|| {
        ApiError::missing(&["body", "local_doc_id"]).with_request_id(ctx.request_id.clone())
    })?;
    if files.is_empty() {
        return Err(
            ApiError::missing(&["body", "files"]).with_request_id(ctx.request_id.clone())
        );
    }

    tracing::info!(
        collection = %local_doc_id,
        files = files.len(),
        request_id = %ctx.request_id,
        "Uploading batch"
    );

    let outcome = state
        .store()
        .upload(&local_doc_id, files)
        .await
        .map_err(|e| ApiError::from(e).with_request_id(ctx.request_id.clone()))?;

    Ok(Json(UploadResponse {
        local_doc_id,
        version: outcome.version,
        documents: outcome.documents,
    }))
}

/// List one collection's documents, or all collections.
///
/// GET /collections/list
#[utoipa::path(
    get,
    path = "/collections/list",
    tag = "collections",
    params(
        ("local_doc_id" = Option<String>, Query, description = "Collection to list; all collections when omitted")
    ),
    responses(
        (status = 200, description = "Listing", body = ListResponse),
        (status = 422, description = "Validation error", body = ApiErrorBody),
    ),
)]
pub(crate) async fn list_documents(
    ctx: RequestContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::debug!(
        collection = query.local_doc_id.as_deref().unwrap_or("<all>"),
        request_id = %ctx.request_id,
        "Listing collections"
    );

    let collections: Vec<CollectionInfo> = match query.local_doc_id.as_deref() {
        Some(local_doc_id) => {
            let listing = state
                .store()
                .list(local_doc_id)
                .map_err(|e| ApiError::from(e).with_request_id(ctx.request_id.clone()))?;
            vec![CollectionInfo::from(listing)]
        }
        None => state
            .store()
            .list_all()
            .map_err(|e| ApiError::from(e).with_request_id(ctx.request_id.clone()))?
            .into_iter()
            .map(CollectionInfo::from)
            .collect(),
    };

    Ok(Json(ListResponse { collections }))
}

/// Delete a collection, or one document when `doc_name` is given.
///
/// DELETE /collections/delete
#[utoipa::path(
    delete,
    path = "/collections/delete",
    tag = "collections",
    params(
        ("local_doc_id" = String, Query, description = "Target collection id"),
        ("doc_name" = Option<String>, Query, description = "Document to delete; the whole collection when omitted")
    ),
    responses(
        (status = 200, description = "Delete committed", body = DeleteResponse),
        (status = 404, description = "Unknown collection or document", body = ApiErrorBody),
        (status = 422, description = "Validation error", body = ApiErrorBody),
        (status = 503, description = "Collection busy", body = ApiErrorBody),
    ),
)]
pub(crate) async fn delete_documents(
    ctx: RequestContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let local_doc_id = query.local_doc_id.ok_or_else(|| {
        ApiError::missing(&["query", "local_doc_id"]).with_request_id(ctx.request_id.clone())
    })?;

    tracing::info!(
        collection = %local_doc_id,
        document = query.doc_name.as_deref().unwrap_or("<all>"),
        request_id = %ctx.request_id,
        "Deleting"
    );

    let outcome = state
        .store()
        .delete(&local_doc_id, query.doc_name.as_deref())
        .await
        .map_err(|e| ApiError::from(e).with_request_id(ctx.request_id.clone()))?;

    Ok(Json(DeleteResponse {
        local_doc_id,
        removed: outcome.removed,
        remaining: outcome.remaining,
    }))
}
