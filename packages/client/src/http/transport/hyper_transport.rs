use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use super::{HttpTransport, StatusText, TransportBody, TransportRequest, TransportResponse};
use crate::binary::boxed;
use crate::error::{self, Error, Result};

type Body = UnsyncBoxBody<bytes::Bytes, Error>;

/// HTTP/1.1 transport over `hyper-util`'s pooled client.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport").finish_non_exhaustive()
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HyperTransport {
    #[must_use]
    pub fn new(connect_timeout: Option<Duration>) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(connect_timeout);
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);
        HyperTransport { client }
    }
}

fn into_body(body: TransportBody) -> Body {
    match body {
        TransportBody::Empty => Empty::<bytes::Bytes>::new().map_err(|never| match never {}).boxed_unsync(),
        TransportBody::Full(bytes) => Full::new(bytes).map_err(|never| match never {}).boxed_unsync(),
        TransportBody::Stream { stream, .. } => StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync(),
    }
}

#[async_trait]
impl HttpTransport for HyperTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let length = body.len();
        let mut builder = http::Request::builder().method(method).uri(url.as_str());
        if let Some(request_headers) = builder.headers_mut() {
            *request_headers = headers;
            if let Some(length) = length.filter(|n| *n > 0) {
                request_headers
                    .entry(http::header::CONTENT_LENGTH)
                    .or_insert_with(|| http::HeaderValue::from(length));
            }
        }
        let request = builder.body(into_body(body)).map_err(error::builder)?;

        let response = self.client.request(request).await.map_err(|e| {
            if e.is_connect() {
                error::connect(e).with_url(url.clone())
            } else {
                error::transport(e).with_url(url.clone())
            }
        })?;

        let (mut parts, incoming) = response.into_parts();
        if let Some(reason) = parts.extensions.get::<hyper::ext::ReasonPhrase>() {
            if let Ok(text) = std::str::from_utf8(reason.as_bytes()) {
                let text = text.to_owned();
                parts.extensions.insert(StatusText(text));
            }
        }

        let stream = incoming.into_data_stream().map_err(error::transport);
        Ok(TransportResponse::from_parts(parts, boxed(stream)))
    }
}
