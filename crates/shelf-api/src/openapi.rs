//! `OpenAPI` specification generation for `shelf-api`.
//!
//! The generated spec is used to produce external clients and API docs
//! (`gen_openapi` bin prints it to stdout).

use utoipa::OpenApi;

use shelf_core::{Error, Result};

/// `OpenAPI` documentation for the shelf REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "shelf API",
        version = "0.1.0",
        description = "Document collection store REST API"
    ),
    paths(
        crate::routes::collections::upload_documents,
        crate::routes::collections::list_documents,
        crate::routes::collections::delete_documents,
    ),
    components(
        schemas(
            crate::error::ApiErrorBody,
            crate::error::ErrorDetail,
            crate::routes::collections::UploadForm,
            crate::routes::collections::UploadResponse,
            crate::routes::collections::DocumentInfo,
            crate::routes::collections::CollectionInfo,
            crate::routes::collections::ListResponse,
            crate::routes::collections::DeleteResponse,
        )
    ),
    tags(
        (name = "collections", description = "Document collection operations"),
    ),
)]
pub struct ApiDoc;

/// Returns the generated `OpenAPI` spec as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the spec cannot be serialized.
pub fn openapi_json() -> Result<String> {
    ApiDoc::openapi()
        .to_pretty_json()
        .map_err(|e| Error::Internal {
            message: format!("failed to serialize OpenAPI spec: {e}"),
        })
}
