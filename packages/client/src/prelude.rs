//! Wireline prelude
//!
//! The types end users need for HTTP and duplex operations.
//! Only canonical types that are part of the public API belong here.

// Error types
pub use crate::error::{Error, Kind as ErrorKind, Result};

// Core clients
pub use crate::client::{HttpClient, HttpClientBuilder, StreamUploadOptions};
pub use crate::duplex::{
    CloseEvent, DuplexClient, DuplexMessage, Handler, HookEvent, HookTable, MessageKind, Peer, ReadyState,
};

// Configuration
pub use crate::config::{ClientConfig, DuplexConfig};

// Request and response shapes
pub use crate::http::{
    FileData, FileMetadata, FilePart, FileStreamResponse, Form, RequestBody, RequestOptions, ResponseBody,
    ResponseEnvelope, ResponseMode, UploadProgress, UploadStage,
};

// Binary data
pub use crate::binary::{BinaryData, ByteStream};

// Scheduling and retry
pub use crate::retry::{retry, RetryPolicy};
pub use crate::scheduling::{debounce, delay, interval, throttle, AbortController, AbortSignal};

// Environment
pub use crate::runtime::{capability_report, detect_runtime, CapabilityReport, RuntimeFamily};

// HTTP standard types from http crate
pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

// URL handling
pub use url::Url;

// Telemetry types
pub use crate::telemetry::{ClientStats, ClientStatsSnapshot};
