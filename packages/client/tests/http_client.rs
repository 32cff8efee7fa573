#![cfg(not(target_arch = "wasm32"))]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde_json::{json, Value};
use wireline_client::http::{FilePart, RequestOptions, ResponseBody, UploadStage};
use wireline_client::{HttpClient, RetryPolicy, StreamUploadOptions};

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn flaky(State(hits): State<Arc<AtomicUsize>>) -> impl IntoResponse {
    if hits.fetch_add(1, Ordering::SeqCst) < 3 {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"detail": "warming up"})))
    } else {
        (StatusCode::OK, Json(json!({"ok": true})))
    }
}

/// Summarize a multipart body without a multipart parser.
async fn inspect_form(body: Bytes) -> Json<Value> {
    let text = String::from_utf8_lossy(&body);
    let files = text.matches("; filename=\"").count();
    let parts = text.matches("Content-Disposition: form-data;").count();
    Json(json!({
        "parts": parts,
        "files": files,
        "fields": parts - files,
        "has_file": text.contains("name=\"file\"; filename=\"a.txt\""),
        "has_caption": text.contains("name=\"caption\"\r\n\r\nx\r\n"),
        "payload": text.matches('z').count(),
    }))
}

async fn download() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"report.bin\""),
        ],
        vec![7u8; 1024],
    )
}

async fn invalid() -> impl IntoResponse {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"detail": [{"msg": "name is required"}, {"msg": "age must be positive"}]})),
    )
}

async fn app() -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/flaky", get(flaky))
        .route("/upload", post(inspect_form))
        .route("/download", get(download))
        .route("/invalid", post(invalid))
        .route("/reject", post(|_: Bytes| invalid()))
        .route("/report", get(|| async { Json(json!({"rows": 3})) }))
        .with_state(Arc::clone(&hits));
    (serve(router).await, hits)
}

fn client(addr: SocketAddr) -> HttpClient {
    HttpClient::builder()
        .base_url(&format!("http://{addr}/"))
        .retry(
            RetryPolicy::default()
                .with_max_attempts(4)
                .with_backoff(Duration::from_millis(5), 2.0, Duration::from_millis(20))
                .with_jitter(0.0),
        )
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_retries_until_success() {
    let (addr, hits) = app().await;
    let client = client(addr);

    let response = client.get("flaky").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>().unwrap(), json!({"ok": true}));
    assert_eq!(hits.load(Ordering::SeqCst), 4);

    let stats = client.stats().snapshot();
    assert_eq!(stats.retries, 3);
    assert_eq!(stats.successful_requests, 1);
}

#[tokio::test]
async fn test_retries_exhausted_surface_last_status() {
    let (addr, hits) = app().await;
    let client = client(addr);

    let options = RequestOptions::get().retry(RetryPolicy::default().with_max_attempts(2).with_jitter(0.0).with_backoff(
        Duration::from_millis(1),
        2.0,
        Duration::from_millis(2),
    ));
    let err = client.request("flaky", options).await.unwrap_err();
    assert!(err.is_status());
    assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(err.detail(), Some("warming up"));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_upload_files_sends_one_file_and_one_field() {
    let (addr, _) = app().await;
    let client = client(addr);

    let file = FilePart::new("file", vec![b'z'; 100]).filename("a.txt");
    let response = client
        .upload_files("upload", vec![file], [("caption", "x")], RequestOptions::get())
        .await
        .unwrap();

    let summary: Value = response.json().unwrap();
    assert_eq!(summary["parts"], 2);
    assert_eq!(summary["files"], 1);
    assert_eq!(summary["fields"], 1);
    assert_eq!(summary["has_file"], true);
    assert_eq!(summary["has_caption"], true);
    assert_eq!(summary["payload"], 100);
}

#[tokio::test]
async fn test_stream_upload_reports_increasing_progress() {
    let (addr, _) = app().await;
    let client = client(addr);

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let upload = StreamUploadOptions::default()
        .chunk_size(100)
        .on_progress(move |progress| sink.lock().unwrap().push(progress));

    let file = FilePart::new("file", vec![b'z'; 300]).filename("big.bin");
    let response = client
        .stream_upload("upload", vec![file], [("caption", "x")], upload)
        .await
        .unwrap();
    assert_eq!(response.json::<Value>().unwrap()["payload"], 300);

    let events = events.lock().unwrap();
    let uploaded: Vec<u64> = events
        .iter()
        .filter(|e| e.stage == UploadStage::Uploading)
        .map(|e| e.uploaded_bytes)
        .collect();
    assert_eq!(uploaded, vec![100, 200, 300]);
    assert!(uploaded.windows(2).all(|pair| pair[0] < pair[1]));

    assert_eq!(events.first().unwrap().stage, UploadStage::Preparing);
    let last = events.last().unwrap();
    assert_eq!(last.stage, UploadStage::Completed);
    assert_eq!(last.uploaded_bytes, 300);
    assert_eq!(last.total_bytes, 300);
    assert_eq!(last.percentage, 100.0);
    assert_eq!(
        events.iter().filter(|e| e.stage == UploadStage::Processing).count(),
        1
    );
}

fn recorded() -> (Arc<Mutex<Vec<UploadStage>>>, StreamUploadOptions) {
    let stages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&stages);
    let upload = StreamUploadOptions::default().on_progress(move |progress| sink.lock().unwrap().push(progress.stage));
    (stages, upload)
}

#[tokio::test]
async fn test_stream_upload_without_files_still_completes() {
    let (addr, _) = app().await;
    let client = client(addr);
    let (stages, upload) = recorded();

    let response = client
        .stream_upload("upload", Vec::new(), [("caption", "x")], upload)
        .await
        .unwrap();
    assert_eq!(response.json::<Value>().unwrap()["files"], 0);

    let stages = stages.lock().unwrap();
    assert_eq!(stages.first(), Some(&UploadStage::Preparing));
    assert_eq!(stages.last(), Some(&UploadStage::Completed));
    assert_eq!(stages.iter().filter(|s| **s == UploadStage::Completed).count(), 1);
    assert!(!stages.contains(&UploadStage::Uploading));
}

#[tokio::test]
async fn test_failed_stream_upload_ends_with_one_completed_event() {
    let (addr, _) = app().await;
    let client = client(addr);

    let (stages, upload) = recorded();
    let file = FilePart::new("file", vec![b'z'; 10]);
    let err = client
        .stream_upload("reject", vec![file], [("caption", "x")], upload)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
    let stages = stages.lock().unwrap().clone();
    assert_eq!(stages.first(), Some(&UploadStage::Preparing));
    assert_eq!(stages.iter().filter(|s| **s == UploadStage::Completed).count(), 1);
    assert_eq!(stages.last(), Some(&UploadStage::Completed));

    let (stages, upload) = recorded();
    let err = client
        .stream_upload("upload", Vec::new(), [("caption", "x")], upload.chunk_size(0))
        .await
        .unwrap_err();
    assert!(err.is_builder());
    assert_eq!(*stages.lock().unwrap(), vec![UploadStage::Preparing, UploadStage::Completed]);
}

#[tokio::test]
async fn test_file_stream_for_opaque_binary() {
    let (addr, _) = app().await;
    let client = client(addr);

    let response = client
        .request_file_stream("download", RequestOptions::get())
        .await
        .unwrap();
    assert!(response.is_file());
    let metadata = response.file_metadata.clone().unwrap();
    assert_eq!(metadata.filename.as_deref(), Some("report.bin"));
    assert_eq!(metadata.size, Some(1024));

    let mut stream = response.file_stream.unwrap();
    let mut received = 0;
    while let Some(chunk) = stream.next().await {
        received += chunk.unwrap().len();
    }
    assert_eq!(received, 1024);
}

#[tokio::test]
async fn test_file_stream_parses_json_bodies() {
    let (addr, _) = app().await;
    let client = client(addr);

    let response = client.request_file_stream("report", RequestOptions::get()).await.unwrap();
    assert!(!response.is_file());
    match response.data {
        Some(ResponseBody::Json(value)) => assert_eq!(value, json!({"rows": 3})),
        other => panic!("unexpected body {other:?}"),
    }
}

#[tokio::test]
async fn test_status_error_carries_joined_detail() {
    let (addr, _) = app().await;
    let client = client(addr);

    let err = client
        .post_json::<_, Value>("invalid", &json!({"name": null}))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
    assert_eq!(err.detail(), Some("name is required; age must be positive"));
    assert!(err.url().unwrap().path().ends_with("/invalid"));
}

#[tokio::test]
async fn test_refused_connection_is_a_connect_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpClient::builder()
        .base_url(&format!("http://{addr}/"))
        .retry(RetryPolicy::no_retry())
        .build()
        .unwrap();
    let err = client.get("anything").await.unwrap_err();
    assert!(err.is_connect(), "{err:?}");
}
