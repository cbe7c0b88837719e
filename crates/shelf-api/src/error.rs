//! API error types and HTTP response mapping.
//!
//! Every error status shares one wire shape: a `detail` list of structured
//! entries naming the offending input (`loc`), a human-readable message, and
//! a stable machine-readable `type`. Validation failures are 422; conflicts
//! 409; unknown targets 404; lock-budget exhaustion 503 with `Retry-After`;
//! storage and internal failures 500.

use axum::http::header::HeaderName;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use shelf_store::StoreError;

/// API result type.
pub type ApiResult<T> = Result<T, ApiError>;

/// One structured error entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorDetail {
    /// Location of the offending input, outermost first
    /// (e.g. `["body", "local_doc_id"]`).
    #[schema(value_type = Vec<Object>)]
    pub loc: Vec<serde_json::Value>,
    /// Human-readable message (safe for clients).
    pub msg: String,
    /// Stable machine-readable error type.
    #[serde(rename = "type")]
    pub error_type: String,
}

impl ErrorDetail {
    fn new(loc: &[&str], msg: impl Into<String>, error_type: &str) -> Self {
        Self {
            loc: loc
                .iter()
                .map(|segment| serde_json::Value::String((*segment).to_string()))
                .collect(),
            msg: msg.into(),
            error_type: error_type.to_string(),
        }
    }
}

/// Standard JSON error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorBody {
    /// Structured error entries.
    pub detail: Vec<ErrorDetail>,
}

/// HTTP API error with a structured detail list.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: Vec<ErrorDetail>,
    request_id: Option<String>,
    retry_after_secs: Option<u64>,
}

impl ApiError {
    /// Returns a 422 for a malformed input at the given location.
    pub fn validation(loc: &[&str], message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorDetail::new(loc, message, "value_error"),
        )
    }

    /// Returns a 422 for a missing required input.
    #[must_use]
    pub fn missing(loc: &[&str]) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorDetail::new(loc, "field required", "value_error.missing"),
        )
    }

    /// Returns a 409 for a name conflict.
    pub fn conflict(loc: &[&str], message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            ErrorDetail::new(loc, message, "conflict_error"),
        )
    }

    /// Returns a 404 for an unknown collection or document.
    pub fn not_found(loc: &[&str], message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            ErrorDetail::new(loc, message, "not_found_error"),
        )
    }

    /// Returns a 503 for a contended collection, with a Retry-After hint.
    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorDetail::new(&[], message, "busy_error"),
        )
        .with_retry_after(1)
    }

    /// Returns a 500 for a storage failure.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetail::new(&[], message, "storage_error"),
        )
    }

    /// Returns a 500 for an internal failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetail::new(&[], message, "internal_error"),
        )
    }

    /// Attaches a request ID for correlation.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attaches a Retry-After header value in seconds.
    #[must_use]
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after_secs = Some(seconds);
        self
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the structured detail entries.
    #[must_use]
    pub fn detail(&self) -> &[ErrorDetail] {
        &self.detail
    }

    /// Returns the request ID, if one was attached.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    fn new(status: StatusCode, detail: ErrorDetail) -> Self {
        Self {
            status,
            detail: vec![detail],
            request_id: None,
            retry_after_secs: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = self.request_id;
        let retry_after_secs = self.retry_after_secs;
        let mut response = (
            self.status,
            Json(ApiErrorBody {
                detail: self.detail,
            }),
        )
            .into_response();

        if let Some(request_id) = request_id {
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static("x-request-id"), value);
            }
        }

        if let Some(secs) = retry_after_secs {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static("retry-after"), value);
            }
        }

        response
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation { field, message } => Self::validation(&[field], message),
            StoreError::Conflict {
                collection,
                document,
            } => Self::conflict(
                &["body", "files"],
                format!("document '{document}' already exists in collection '{collection}'"),
            ),
            StoreError::CollectionNotFound { collection } => Self::not_found(
                &["query", "local_doc_id"],
                format!("collection not found: {collection}"),
            ),
            StoreError::DocumentNotFound {
                collection,
                document,
            } => Self::not_found(
                &["query", "doc_name"],
                format!("document '{document}' not found in collection '{collection}'"),
            ),
            StoreError::Storage { message } => Self::storage(message),
            StoreError::Busy {
                collection,
                waited_ms,
            } => Self::busy(format!(
                "collection '{collection}' is busy (waited {waited_ms}ms)"
            )),
            StoreError::Internal { message } => Self::internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_is_422_with_detail_shape() {
        let error = ApiError::missing(&["body", "local_doc_id"]);
        assert_eq!(error.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let detail = &error.detail()[0];
        assert_eq!(detail.error_type, "value_error.missing");
        assert_eq!(
            detail.loc,
            vec![
                serde_json::Value::String("body".into()),
                serde_json::Value::String("local_doc_id".into()),
            ]
        );
    }

    #[test]
    fn busy_carries_retry_after_header() {
        let response = ApiError::busy("collection 'sess1' is busy").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let retry_after = response
            .headers()
            .get("retry-after")
            .expect("Retry-After header should be present");
        assert_eq!(retry_after.to_str().unwrap(), "1");
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let conflict = ApiError::from(StoreError::Conflict {
            collection: "sess1".into(),
            document: "a.txt".into(),
        });
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let not_found = ApiError::from(StoreError::CollectionNotFound {
            collection: "sess1".into(),
        });
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let validation = ApiError::from(StoreError::Validation {
            field: "files",
            message: "at least one file is required".into(),
        });
        assert_eq!(validation.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn request_id_is_attached_as_header() {
        let response = ApiError::storage("disk gone")
            .with_request_id("01JABCDEF")
            .into_response();
        assert_eq!(
            response.headers().get("x-request-id").unwrap().to_str().unwrap(),
            "01JABCDEF"
        );
    }
}
