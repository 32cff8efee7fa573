#![cfg(not(target_arch = "wasm32"))]

use std::time::Duration;

use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use wireline::{CapabilityReport, RequestOptions};

async fn whoami(headers: HeaderMap) -> Json<Value> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    Json(json!({
        "authorization": header("authorization"),
        "agent": header("user-agent"),
        "tenant": header("x-tenant"),
    }))
}

async fn serve() -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/whoami", get(whoami));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_http_builder_sends_default_headers() {
    let addr = serve().await;
    let client = wireline::http()
        .base_url(&format!("http://{addr}/"))
        .bearer_auth("sk-123")
        .header("x-tenant", "acme")
        .user_agent("builders-test/1.0")
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let seen: Value = client.get_json("whoami").await.unwrap();
    assert_eq!(seen["authorization"], "Bearer sk-123");
    assert_eq!(seen["agent"], "builders-test/1.0");
    assert_eq!(seen["tenant"], "acme");
}

#[tokio::test]
async fn test_per_call_headers_override_defaults() {
    let addr = serve().await;
    let client = wireline::http()
        .base_url(&format!("http://{addr}/"))
        .header("x-tenant", "acme")
        .build()
        .unwrap();

    let response = client
        .request("whoami", RequestOptions::get().header("x-tenant", "globex"))
        .await
        .unwrap();
    assert_eq!(response.json::<Value>().unwrap()["tenant"], "globex");
}

#[tokio::test]
async fn test_duplex_without_transport_fails_fast() {
    let client = wireline::duplex("ws://127.0.0.1:9/")
        .capabilities(CapabilityReport::unknown())
        .build()
        .unwrap();
    assert!(client.connect().await.unwrap_err().is_no_transport());
    assert!(client.send_text("x").unwrap_err().is_not_connected());
}

#[test]
fn test_entry_points_agree() {
    let a = wireline::Wireline::duplex("ws://127.0.0.1/").build().unwrap();
    let b = wireline::duplex("ws://127.0.0.1/").build().unwrap();
    assert_eq!(a.config().url, b.config().url);
    assert!(wireline::Wireline::http().build().is_ok());
}
