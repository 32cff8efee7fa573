//! Request execution pipeline
//!
//! One call resolves the target, merges headers, encodes the body once and
//! then drives the transport through the retry loop. The whole exchange,
//! retries included, is raced against the timeout and the abort signal.

use bytes::Bytes;
use futures::StreamExt;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use url::Url;

use super::HttpClient;
use crate::binary::{boxed, collect_stream, collect_stream_limited, BinaryData, ByteStream};
use crate::error::{self, extract_detail, Result};
use crate::http::headers::{application_json, default_content_type, octet_stream, replace_headers, text_plain};
use crate::http::multipart::FormBody;
use crate::http::request::{RequestBody, RequestOptions, ResponseMode};
use crate::http::response::{ResponseBody, ResponseEnvelope};
use crate::http::transport::{status_text, TransportBody, TransportRequest};
use crate::retry::retry_when;
use crate::scheduling::{race_with_timeout, until_aborted, Instant};

/// Encoded request body. Buffered payloads are replayed on every attempt,
/// streams are handed out once.
enum Payload {
    Empty,
    Full(Bytes),
    OneShot(Option<TransportBody>),
}

impl Payload {
    fn encode(body: RequestBody, headers: &mut HeaderMap) -> Result<Self> {
        let payload = match body {
            RequestBody::Empty => Payload::Empty,
            RequestBody::Text(text) => {
                default_content_type(headers, text_plain());
                Payload::Full(Bytes::from(text))
            }
            RequestBody::Bytes(bytes) => {
                default_content_type(headers, octet_stream());
                Payload::Full(bytes)
            }
            RequestBody::Json(value) => {
                default_content_type(headers, application_json());
                Payload::Full(Bytes::from(serde_json::to_vec(&value).map_err(error::builder)?))
            }
            RequestBody::Multipart(form) => {
                let content_type = HeaderValue::from_str(&form.content_type()).map_err(error::builder)?;
                headers.insert(CONTENT_TYPE, content_type);
                match form.into_body() {
                    FormBody::Full(bytes) => Payload::Full(bytes),
                    FormBody::Stream { stream, length } => {
                        Payload::OneShot(Some(TransportBody::Stream { stream, length }))
                    }
                }
            }
            RequestBody::Stream { stream, length } => {
                default_content_type(headers, octet_stream());
                Payload::OneShot(Some(TransportBody::Stream { stream, length }))
            }
        };
        Ok(payload)
    }

    fn is_replayable(&self) -> bool {
        !matches!(self, Payload::OneShot(_))
    }

    fn next(&mut self) -> Result<TransportBody> {
        match self {
            Payload::Empty => Ok(TransportBody::Empty),
            Payload::Full(bytes) => Ok(TransportBody::Full(bytes.clone())),
            Payload::OneShot(slot) => slot
                .take()
                .ok_or_else(|| error::builder("stream body cannot be sent twice")),
        }
    }
}

impl HttpClient {
    /// Perform one logical exchange.
    ///
    /// Non-2xx responses reject with the status kind, carrying the detail
    /// extracted from the error body. Retries follow the per-call policy, or
    /// the client's when none is given.
    pub async fn request(&self, target: &str, options: RequestOptions) -> Result<ResponseEnvelope> {
        let started = Instant::now();
        self.stats.record_request();
        let result = self.execute(target, options).await;
        self.stats.record_outcome(result.is_ok(), started.elapsed());
        if let Err(ref e) = result {
            tracing::debug!(target: "wireline::http", error = %e, "request failed");
        }
        result
    }

    async fn execute(&self, target: &str, mut options: RequestOptions) -> Result<ResponseEnvelope> {
        options.take_error()?;
        let RequestOptions {
            method,
            headers,
            body,
            query,
            timeout,
            retry,
            signal,
            response_mode,
            ..
        } = options;

        let url = self.resolve(target, &query)?;
        let mut headers = self.merge_headers(headers);
        let mut payload = Payload::encode(body, &mut headers)?;
        let replayable = payload.is_replayable();
        let policy = match retry {
            Some(policy) => {
                policy.validate()?;
                policy
            }
            None => self.config.retry.clone(),
        };

        let exchange = retry_when(
            |attempt| {
                let request = payload.next().map(|body| TransportRequest {
                    method: method.clone(),
                    url: url.clone(),
                    headers: headers.clone(),
                    body,
                });
                async move { self.attempt(request?, attempt, response_mode).await }
            },
            &policy,
            signal.as_ref(),
            |error, attempt| {
                let again = replayable && policy.should_retry(error, attempt) && policy.allows_method(&method, error);
                if again {
                    self.stats.record_retry();
                }
                again
            },
        );
        let exchange = until_aborted(exchange, signal.as_ref());

        match timeout.or(self.config.timeout) {
            Some(limit) => race_with_timeout(exchange, limit)
                .await
                .and_then(|result| result)
                .map_err(|e| if e.url().is_none() { e.with_url(url.clone()) } else { e }),
            None => exchange.await,
        }
    }

    async fn attempt(&self, request: TransportRequest, attempt: u32, mode: ResponseMode) -> Result<ResponseEnvelope> {
        let url = request.url.clone();
        tracing::debug!(
            target: "wireline::http",
            method = %request.method,
            url = %url,
            attempt,
            "sending request"
        );
        if let Some(length) = request.body.len() {
            self.stats.record_sent(length);
        }

        let response = self.transport.send(request).await?;
        let status_text = status_text(&response);
        let (parts, body) = response.into_parts();

        if !parts.status.is_success() {
            // Detail is best effort; an unreadable error body still yields the status.
            let detail = self.read_body(body).await.ok().and_then(|bytes| extract_detail(&bytes));
            return Err(error::status(parts.status, detail, Some(url)));
        }

        let body = self.shape(body, mode).await?;
        Ok(ResponseEnvelope::new(url, status_text, parts, body))
    }

    pub(crate) async fn read_body(&self, body: ByteStream) -> Result<Bytes> {
        let bytes = match self.config.max_response_bytes {
            Some(limit) => collect_stream_limited(body, limit).await?,
            None => collect_stream(body).await?,
        };
        self.stats.record_received(bytes.len() as u64);
        Ok(bytes)
    }

    async fn shape(&self, body: ByteStream, mode: ResponseMode) -> Result<ResponseBody> {
        let shaped = match mode {
            ResponseMode::Stream => {
                let stats = self.stats();
                ResponseBody::Stream(boxed(body.inspect(move |chunk| {
                    if let Ok(chunk) = chunk {
                        stats.record_received(chunk.len() as u64);
                    }
                })))
            }
            ResponseMode::Json => ResponseBody::Json(parse_json(&self.read_body(body).await?)?),
            ResponseMode::Text => {
                let bytes = self.read_body(body).await?;
                ResponseBody::Text(std::str::from_utf8(&bytes).map_err(error::decode)?.to_owned())
            }
            ResponseMode::Bytes => ResponseBody::Bytes(BinaryData::from(self.read_body(body).await?)),
        };
        Ok(shaped)
    }

    /// Join `target` onto the base URL and append `query`.
    pub(crate) fn resolve(&self, target: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = match &self.config.base_url {
            Some(base) => base.join(target),
            None => Url::parse(target),
        }
        .map_err(|e| error::builder(format!("invalid request target {target:?}: {e}")))?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Client defaults, then user agent, then per-call headers.
    fn merge_headers(&self, per_call: HeaderMap) -> HeaderMap {
        let mut headers = self.config.headers.clone();
        if !headers.contains_key(USER_AGENT) {
            if let Ok(agent) = HeaderValue::from_str(&self.config.user_agent) {
                headers.insert(USER_AGENT, agent);
            }
        }
        replace_headers(&mut headers, per_call);
        headers
    }
}

/// Parse a JSON body; empty bodies parse as `null`.
pub(crate) fn parse_json(bytes: &[u8]) -> Result<serde_json::Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_slice(bytes).map_err(error::decode)
}
