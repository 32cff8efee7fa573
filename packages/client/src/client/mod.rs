//! HTTP client modules with focused separation of concerns
//!
//! Construction and configuration, the execution pipeline, verb shortcuts,
//! uploads, downloads and the process-wide default client.

pub mod configuration;
pub mod convenience;
pub mod core;
pub mod download;
pub mod execute;
pub mod global;
pub mod upload;

pub use configuration::HttpClientBuilder;
pub use self::core::HttpClient;
pub use global::{global_client, global_stats, init_global_client};
pub use upload::{StreamUploadOptions, DEFAULT_CHUNK_SIZE};
