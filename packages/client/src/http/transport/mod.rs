//! Request primitive seam
//!
//! [`HttpTransport`] performs exactly one exchange: no retries, no timeouts,
//! no status handling. The client layers those on top. Dropping the returned
//! future cancels the exchange and releases the native request.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, Response};
use url::Url;

use crate::binary::ByteStream;
use crate::error::Result;
use crate::runtime::{MaybeSend, MaybeSync};

#[cfg(target_arch = "wasm32")]
mod fetch;
#[cfg(not(target_arch = "wasm32"))]
mod hyper_transport;

#[cfg(target_arch = "wasm32")]
pub use fetch::FetchTransport;
#[cfg(not(target_arch = "wasm32"))]
pub use hyper_transport::HyperTransport;

/// Body handed to a transport.
pub enum TransportBody {
    Empty,
    Full(Bytes),
    Stream {
        stream: ByteStream,
        length: Option<u64>,
    },
}

impl TransportBody {
    /// Declared size, when known up front.
    #[must_use]
    pub fn len(&self) -> Option<u64> {
        match self {
            TransportBody::Empty => Some(0),
            TransportBody::Full(bytes) => Some(bytes.len() as u64),
            TransportBody::Stream { length, .. } => *length,
        }
    }
}

impl fmt::Debug for TransportBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportBody::Empty => f.write_str("Empty"),
            TransportBody::Full(bytes) => write!(f, "Full({} bytes)", bytes.len()),
            TransportBody::Stream { length, .. } => f.debug_struct("Stream").field("length", length).finish(),
        }
    }
}

/// One outbound request.
#[derive(Debug)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: TransportBody,
}

/// Reason phrase reported by the peer, stored in response extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusText(pub String);

/// Response head plus unread body.
pub type TransportResponse = Response<ByteStream>;

/// Native request primitive.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait HttpTransport: MaybeSend + MaybeSync + fmt::Debug {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Transport for the current target: hyper on servers, `fetch` in browsers
/// and workers.
#[cfg(not(target_arch = "wasm32"))]
pub fn default_transport(config: &crate::config::ClientConfig) -> std::sync::Arc<dyn HttpTransport> {
    std::sync::Arc::new(HyperTransport::new(config.connect_timeout))
}

/// Transport for the current target: hyper on servers, `fetch` in browsers
/// and workers.
#[cfg(target_arch = "wasm32")]
pub fn default_transport(_config: &crate::config::ClientConfig) -> std::sync::Arc<dyn HttpTransport> {
    std::sync::Arc::new(FetchTransport::new())
}

/// Status text for `response`: the wire reason phrase when the transport
/// recorded one, else the canonical phrase.
pub(crate) fn status_text<B>(response: &Response<B>) -> String {
    response
        .extensions()
        .get::<StatusText>()
        .map(|text| text.0.clone())
        .filter(|text| !text.is_empty())
        .or_else(|| response.status().canonical_reason().map(str::to_owned))
        .unwrap_or_default()
}
