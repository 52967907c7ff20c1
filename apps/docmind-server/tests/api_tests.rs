use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use docmind_answer::ExtractiveSynthesizer;
use docmind_core::config::ServerConfig;
use docmind_core::traits::Embedder;
use docmind_core::Chunker;
use docmind_embed::HashedEmbedder;
use docmind_index::IndexRegistry;
use docmind_server::{build_router, AppState};
use docmind_service::DocumentService;

const BOUNDARY: &str = "docmind-test-boundary";

fn app_with(config: ServerConfig) -> Router {
    let embedder: Arc<dyn Embedder> = Arc::new(HashedEmbedder::new(512).expect("embedder"));
    let registry = Arc::new(IndexRegistry::unbounded(embedder));
    let service =
        DocumentService::new(Chunker::new(120, 20).expect("chunker"), registry, Arc::new(ExtractiveSynthesizer), 2)
            .expect("service");
    build_router(Arc::new(AppState::new(Arc::new(service), config)))
}

fn app() -> Router {
    app_with(ServerConfig::default())
}

fn multipart(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Request::post("/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .expect("request")
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("response");
    let status = resp.status();
    let bytes = resp.into_body().collect().await.expect("body").to_bytes();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json body") };
    (status, value)
}

const NOTES: &str = "Seed potatoes go in the ground after the last frost.\n\n\
                     Goats should be milked twice a day, morning and evening.\n\n\
                     The rain barrel overflow pipe drains toward the orchard.\n";

#[tokio::test]
async fn health_reports_document_count() {
    let app = app();
    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).expect("request")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["documents"], 0);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn upload_then_ask() {
    let app = app();
    let (status, body) = send(&app, multipart("file", "notes.txt", NOTES.as_bytes())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "success");
    assert_eq!(body["doc_id"], "notes.txt");
    assert_eq!(body["filename"], "notes.txt");
    assert!(body["chunks"].as_u64().expect("chunks") >= 2);

    let (status, body) =
        send(&app, post_json("/ask", &json!({"query": "how often are goats milked", "doc_id": "notes.txt"}))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["response"].as_str().expect("response").contains("Goats should be milked"), "{body}");

    let (_, health) = send(&app, Request::get("/health").body(Body::empty()).expect("request")).await;
    assert_eq!(health["documents"], 1);
}

#[tokio::test]
async fn analyze_selection_uses_the_selected_text() {
    let app = app();
    send(&app, multipart("file", "notes.txt", NOTES.as_bytes())).await;
    let req = json!({
        "query": "Summarize",
        "doc_id": "notes.txt",
        "context_text": "rain barrel overflow pipe",
    });
    let (status, body) = send(&app, post_json("/analyze-selection", &req)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response = body["response"].as_str().expect("response");
    assert!(response.contains("Selected text: rain barrel overflow pipe"), "{response}");
    assert!(response.contains("The rain barrel overflow pipe drains toward the orchard."), "{response}");
}

#[tokio::test]
async fn ask_about_unknown_document_still_answers() {
    let app = app();
    let (status, body) = send(&app, post_json("/ask", &json!({"query": "anything", "doc_id": "nope.pdf"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["response"].as_str().expect("response").starts_with("No supporting passages"));
}

#[tokio::test]
async fn unsupported_upload_is_415() {
    let app = app();
    let (status, body) = send(&app, multipart("file", "diagram.png", b"\x89PNG\r\n")).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
}

#[tokio::test]
async fn empty_document_is_422() {
    let app = app();
    let (status, body) = send(&app, multipart("file", "empty.txt", b"")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "EMPTY_DOCUMENT");
}

#[tokio::test]
async fn upload_without_file_field_is_400() {
    let app = app();
    let (status, body) = send(&app, multipart("attachment", "notes.txt", NOTES.as_bytes())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = app_with(ServerConfig { max_upload_mb: 1, ..ServerConfig::default() });
    let big = vec![b'a'; 2 * 1024 * 1024];
    let resp = app.oneshot(multipart("file", "big.txt", &big)).await.expect("response");
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn blank_query_is_400() {
    let app = app();
    let (status, body) = send(&app, post_json("/ask", &json!({"query": "  ", "doc_id": "notes.txt"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn malformed_json_uses_the_error_body() {
    let app = app();
    let req = Request::post("/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"query\": \"goats\","))
        .expect("request");
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].as_str().is_some_and(|m| m.contains("invalid JSON body")), "{body}");
}

#[tokio::test]
async fn missing_json_field_uses_the_error_body() {
    let app = app();
    let (status, body) = send(&app, post_json("/analyze-selection", &json!({"query": "goats"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].as_str().is_some_and(|m| m.contains("doc_id")), "{body}");
}

#[tokio::test]
async fn json_without_content_type_uses_the_error_body() {
    let app = app();
    let req = Request::post("/ask").body(Body::from(json!({"query": "q", "doc_id": "d"}).to_string())).expect("request");
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let app = app();
    let (status, body) = send(&app, Request::get("/nowhere").body(Body::empty()).expect("request")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = app();
    let req = Request::get("/health").header("x-request-id", "abc-123").body(Body::empty()).expect("request");
    let resp = app.clone().oneshot(req).await.expect("response");
    assert_eq!(resp.headers()["x-request-id"], "abc-123");

    let resp = app.oneshot(Request::get("/health").body(Body::empty()).expect("request")).await.expect("response");
    assert!(resp.headers().contains_key("x-request-id"));
}
