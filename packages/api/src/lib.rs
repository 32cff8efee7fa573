//! Wireline public API
//!
//! HTTP and WebSocket transport that runs the same way on servers and in
//! wasm32 hosts. Start with [`http()`] or [`duplex()`].
//!
//! ```no_run
//! # async fn run() -> wireline::Result<()> {
//! let api = wireline::http()
//!     .base_url("http://127.0.0.1:8080/")
//!     .max_attempts(4)
//!     .build()?;
//! let health: serde_json::Value = api.get_json("health").await?;
//!
//! let events = wireline::duplex("ws://127.0.0.1:8080/events")
//!     .on_message(|message| println!("{:?}", message.as_text()))
//!     .build()?;
//! events.connect().await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod builder;

pub use builder::{header, DuplexBuilder, HttpBuilder};

// Re-export the canonical types from the client package
pub use wireline_client::prelude::*;
pub use wireline_client::{binary, duplex as transport, error, runtime, scheduling};
pub use wireline_client::{global_client, global_stats, init_global_client};

/// Main entry point providing static builder methods
#[derive(Debug, Clone, Copy)]
pub struct Wireline;

impl Wireline {
    /// Shorthand for [`HttpBuilder::new`]
    #[must_use]
    pub fn http() -> HttpBuilder {
        HttpBuilder::new()
    }

    /// Shorthand for [`DuplexBuilder::new`]
    #[must_use]
    pub fn duplex(url: impl Into<String>) -> DuplexBuilder {
        DuplexBuilder::new(url)
    }
}

/// Configure an HTTP client.
#[must_use]
pub fn http() -> HttpBuilder {
    HttpBuilder::new()
}

/// Configure a duplex connection to `url`.
#[must_use]
pub fn duplex(url: impl Into<String>) -> DuplexBuilder {
    DuplexBuilder::new(url)
}
