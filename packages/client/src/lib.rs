//! # Wireline client
//!
//! Runtime-agnostic HTTP and duplex (WebSocket) transport. The same API runs
//! on servers, where it drives `hyper` and `tokio-tungstenite`, and on
//! wasm32 hosts, where it drives `fetch` and the host `WebSocket`.
//!
//! ## Features
//!
//! - **Capability detection** picks the transport available in the host
//! - **Retry with exponential backoff**, status- and method-aware
//! - **Cancellation** through [`AbortController`] and per-request timeouts
//! - **Multipart uploads** with chunked streaming and progress events
//! - **File download streaming** with content metadata
//! - **Duplex connections** with shared connects and swappable event hooks
//! - **Binary utilities** for text, base64 and hex conversions
//!
//! ## Usage
//!
//! ```no_run
//! use wireline_client::{HttpClient, RetryPolicy};
//!
//! # async fn run() -> wireline_client::Result<()> {
//! let client = HttpClient::builder()
//!     .base_url("http://127.0.0.1:8080/api/")
//!     .retry(RetryPolicy::default().with_max_attempts(4))
//!     .build()?;
//!
//! let models: serde_json::Value = client.get_json("models").await?;
//! println!("{models}");
//! # Ok(())
//! # }
//! ```
//!
//! ```no_run
//! use wireline_client::{DuplexClient, DuplexConfig};
//!
//! # async fn run() -> wireline_client::Result<()> {
//! let chat = DuplexClient::new(DuplexConfig::new("ws://127.0.0.1:8080/chat"));
//! chat.on_message(|message| println!("{:?}", message.as_text()));
//!
//! chat.connect().await?;
//! chat.send_text("hello")?;
//! chat.disconnect();
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod binary;
pub mod client;
pub mod config;
pub mod crypto;
pub mod duplex;
pub mod error;
pub mod http;
pub mod retry;
pub mod runtime;
pub mod scheduling;
pub mod telemetry;

// Prelude with canonical types
pub mod prelude;

pub use crate::prelude::*;

pub use client::{global_client, global_stats, init_global_client};
