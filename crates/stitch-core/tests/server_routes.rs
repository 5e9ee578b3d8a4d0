//! Receiver HTTP status mapping, driven through the router without a socket.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use stitch_core::server;
use stitch_core::store::Receiver;
use tower::ServiceExt;

fn app(max_chunk_bytes: u64) -> (tempfile::TempDir, Router) {
    let root = tempfile::tempdir().unwrap();
    let router = server::router(Receiver::new(root.path(), max_chunk_bytes));
    (root, router)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, body)
}

fn post_chunk(query: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::post(format!("/api/chunks?{query}"))
        .header("content-type", content_type)
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn error_code(body: &[u8]) -> String {
    let v: Value = serde_json::from_slice(body).unwrap();
    v["code"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn upload_probe_merge_digest() {
    let (root, app) = app(1024);
    let q = "directory=in&filename=hello.txt&total=2";

    let (status, body) = send(
        &app,
        post_chunk(&format!("{q}&chunk=2"), "application/octet-stream", "lo\n"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, b"hello.0000000000000002..txt.tmp");

    let (status, _) = send(&app, get("/api/chunks?directory=in&filename=hello.txt&chunk=2")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get("/api/chunks?directory=in&filename=hello.txt&chunk=1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let merge = || {
        Request::post("/api/merge?directory=in&filename=hello.txt&total=2")
            .body(Body::empty())
            .unwrap()
    };
    let (status, body) = send(&app, merge()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "INCOMPLETE");

    let req = Request::post(format!("/api/chunks?{q}&chunk=1"))
        .header("content-type", "text/plain")
        .header("x-stitch-encoding", "base64")
        .body(Body::from("aGVs"))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, get("/api/files?directory=in&filename=hello.txt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, merge()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, get("/api/files?directory=in&filename=hello.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(std::fs::read(root.path().join("in/hello.txt")).unwrap(), b"hello\n");

    let (status, body) = send(&app, get("/api/digest?directory=in&filename=hello.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        b"5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
    );
}

#[tokio::test]
async fn upload_rejections() {
    let (_root, app) = app(8);
    let q = "filename=a.bin&chunk=1&total=1";

    let (status, body) = send(&app, post_chunk(q, "application/json", "{}")).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(error_code(&body), "UNSUPPORTED_PAYLOAD");

    let bad_b64 = Request::post(format!("/api/chunks?{q}"))
        .header("content-type", "text/plain")
        .header("x-stitch-encoding", "base64")
        .body(Body::from("***"))
        .unwrap();
    let (status, _) = send(&app, bad_b64).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (status, body) = send(&app, post_chunk(q, "application/octet-stream", "123456789")).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error_code(&body), "TOO_LARGE");

    // Over the router's body limit (twice the chunk limit).
    let (status, _) = send(&app, post_chunk(q, "application/octet-stream", vec![0u8; 64])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let (status, body) = send(
        &app,
        post_chunk("filename=a.bin&chunk=2&total=1", "application/octet-stream", "x"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "INDEX_OUT_OF_RANGE");

    let (status, body) = send(&app, post_chunk(q, "application/octet-stream", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "NO_PAYLOAD");

    let (status, body) = send(
        &app,
        post_chunk(
            "directory=..%2Fetc&filename=a.bin&chunk=1&total=1",
            "application/octet-stream",
            "x",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_IDENTITY");

    let (status, body) = send(
        &app,
        post_chunk("filename=a.bin&total=1", "application/octet-stream", "x"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_REQUEST");
}

#[tokio::test]
async fn malformed_query_strings_get_json_errors() {
    let (_root, app) = app(8);

    let (status, body) = send(
        &app,
        post_chunk("chunk=1&total=1", "application/octet-stream", "x"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_REQUEST");

    let (status, body) = send(&app, get("/api/chunks?filename=a.bin&chunk=three")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_REQUEST");

    let (status, body) = send(&app, get("/api/digest")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_REQUEST");
}

#[tokio::test]
async fn merge_onto_another_files_staging_dir_is_409_conflict() {
    let (root, app) = app(64);
    let (status, _) = send(
        &app,
        post_chunk("filename=report.pdf&chunk=1&total=2", "application/octet-stream", "pdf"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
        &app,
        post_chunk("filename=report&chunk=1&total=1", "application/octet-stream", "bare"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let req = Request::post("/api/merge?filename=report&total=1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "CONFLICT");
    assert!(root.path().join("report").is_dir());
}

#[tokio::test]
async fn digest_of_missing_file_is_404_and_health_is_ok() {
    let (_root, app) = app(8);
    let (status, body) = send(&app, get("/api/digest?filename=nope.bin")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["status"], "ok");
}
