//! End-to-end API tests driven through the router in-process.
//!
//! These tests cover the full upload/list/delete surface including the
//! structured 422 payload shape, without binding a socket.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use shelf_api::config::Config;
use shelf_api::server::Server;

const BOUNDARY: &str = "shelf-test-boundary";

fn test_router() -> Router {
    let config = Config {
        debug: true,
        ..Config::default()
    };
    Server::new(config).test_router()
}

/// Builds a multipart/form-data body with an optional id field and file parts.
fn multipart_body(local_doc_id: Option<&str>, files: &[(&str, &str)]) -> String {
    let mut body = String::new();
    if let Some(id) = local_doc_id {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"local_doc_id\"\r\n\r\n{id}\r\n"
        ));
    }
    for (name, content) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

fn upload_request(local_doc_id: Option<&str>, files: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/collections/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(local_doc_id, files)))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn listed_names(body: &serde_json::Value) -> Vec<String> {
    body["collections"][0]["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|doc| doc["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_and_ready_endpoints_respond() {
    let router = test_router();

    let (status, body) = send(&router, get_request("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&router, get_request("/readyz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn upload_then_list_returns_ordered_documents() {
    let router = test_router();

    let (status, body) = send(
        &router,
        upload_request(Some("sess1"), &[("a.txt", "alpha"), ("b.txt", "beta")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["local_doc_id"], "sess1");
    assert_eq!(body["version"], 1);
    assert_eq!(
        body["documents"],
        serde_json::json!(["a.txt", "b.txt"]),
        "upload returns the updated ordered name list"
    );

    let (status, body) = send(&router, get_request("/collections/list?local_doc_id=sess1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed_names(&body), vec!["a.txt", "b.txt"]);
    assert_eq!(body["collections"][0]["version"], 1);

    let doc = &body["collections"][0]["documents"][0];
    assert_eq!(doc["size_bytes"], 5);
    assert!(doc["checksum"].as_str().unwrap().len() == 64);
    assert!(doc["created_at"].as_str().is_some());
}

#[tokio::test]
async fn upload_missing_id_is_422_with_structured_detail() {
    let router = test_router();

    let (status, body) = send(&router, upload_request(None, &[("a.txt", "alpha")])).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let detail = &body["detail"][0];
    assert_eq!(detail["loc"], serde_json::json!(["body", "local_doc_id"]));
    assert_eq!(detail["type"], "value_error.missing");
    assert!(detail["msg"].as_str().is_some());
}

#[tokio::test]
async fn upload_without_files_is_422() {
    let router = test_router();

    let (status, body) = send(&router, upload_request(Some("sess1"), &[])).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["detail"][0]["loc"],
        serde_json::json!(["body", "files"])
    );
}

#[tokio::test]
async fn duplicate_name_is_409_and_state_is_unchanged() {
    let router = test_router();

    send(
        &router,
        upload_request(Some("sess1"), &[("a.txt", "alpha"), ("b.txt", "beta")]),
    )
    .await;

    let (status, body) = send(&router, upload_request(Some("sess1"), &[("a.txt", "again")])).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"][0]["type"], "conflict_error");

    let (_, body) = send(&router, get_request("/collections/list?local_doc_id=sess1")).await;
    assert_eq!(listed_names(&body), vec!["a.txt", "b.txt"]);
    assert_eq!(body["collections"][0]["version"], 1);
}

#[tokio::test]
async fn listing_unknown_collection_is_empty_not_error() {
    let router = test_router();

    let (status, body) = send(
        &router,
        get_request("/collections/list?local_doc_id=never-seen"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collections"][0]["local_doc_id"], "never-seen");
    assert_eq!(body["collections"][0]["version"], 0);
    assert_eq!(body["collections"][0]["documents"], serde_json::json!([]));
}

#[tokio::test]
async fn listing_without_id_returns_all_collections() {
    let router = test_router();

    send(&router, upload_request(Some("beta"), &[("b.txt", "b")])).await;
    send(&router, upload_request(Some("alpha"), &[("a.txt", "a")])).await;

    let (status, body) = send(&router, get_request("/collections/list")).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = body["collections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["local_doc_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["alpha", "beta"]);
}

#[tokio::test]
async fn delete_document_then_collection_lifecycle() {
    let router = test_router();

    send(
        &router,
        upload_request(Some("sess1"), &[("a.txt", "alpha"), ("b.txt", "beta")]),
    )
    .await;

    // Document-level delete.
    let (status, body) = send(
        &router,
        delete_request("/collections/delete?local_doc_id=sess1&doc_name=a.txt"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], serde_json::json!(["a.txt"]));
    assert_eq!(body["remaining"], serde_json::json!(["b.txt"]));

    let (_, body) = send(&router, get_request("/collections/list?local_doc_id=sess1")).await;
    assert_eq!(listed_names(&body), vec!["b.txt"]);

    // Whole-collection delete.
    let (status, body) = send(
        &router,
        delete_request("/collections/delete?local_doc_id=sess1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], serde_json::json!(["b.txt"]));
    assert_eq!(body["remaining"], serde_json::json!([]));

    let (_, body) = send(&router, get_request("/collections/list?local_doc_id=sess1")).await;
    assert_eq!(body["collections"][0]["documents"], serde_json::json!([]));

    // Second whole-collection delete is a hard 404.
    let (status, body) = send(
        &router,
        delete_request("/collections/delete?local_doc_id=sess1"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"][0]["type"], "not_found_error");
}

#[tokio::test]
async fn delete_unknown_document_is_404() {
    let router = test_router();
    send(&router, upload_request(Some("sess1"), &[("a.txt", "a")])).await;

    let (status, body) = send(
        &router,
        delete_request("/collections/delete?local_doc_id=sess1&doc_name=missing.txt"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["detail"][0]["loc"],
        serde_json::json!(["query", "doc_name"])
    );
}

#[tokio::test]
async fn delete_missing_id_is_422() {
    let router = test_router();

    let (status, body) = send(&router, delete_request("/collections/delete")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["detail"][0]["loc"],
        serde_json::json!(["query", "local_doc_id"])
    );
}

#[tokio::test]
async fn request_id_header_is_echoed_on_errors() {
    let router = test_router();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/collections/delete?local_doc_id=never-seen")
                .header("x-request-id", "req-test-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .unwrap()
            .to_str()
            .unwrap(),
        "req-test-42"
    );
}

#[tokio::test]
async fn invalid_collection_id_is_422() {
    let router = test_router();

    let (status, body) = send(
        &router,
        upload_request(Some("../escape"), &[("a.txt", "alpha")]),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["type"], "value_error");
}
