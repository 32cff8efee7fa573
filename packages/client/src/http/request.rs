//! Per-call request options
//!
//! `RequestOptions` collects everything one exchange needs. Builder methods
//! never fail on the spot: the first invalid input (bad header, unserializable
//! JSON) is kept and surfaced when the request is sent.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, AUTHORIZATION};
use http::{HeaderMap, Method};
use serde::Serialize;

use super::multipart::Form;
use crate::binary::ByteStream;
use crate::error::{self, Error, Result};
use crate::retry::RetryPolicy;
use crate::scheduling::AbortSignal;

/// Request body variants
#[derive(Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// UTF-8 text, sent unchanged
    Text(String),
    /// Raw bytes, sent unchanged
    Bytes(Bytes),
    /// JSON document, serialized with `application/json`
    Json(serde_json::Value),
    /// Multipart form. Any caller-supplied content type is replaced.
    Multipart(Form),
    /// Lazy byte stream. Never replayed by retries.
    Stream {
        stream: ByteStream,
        length: Option<u64>,
    },
}

impl RequestBody {
    #[must_use]
    pub fn is_stream(&self) -> bool {
        match self {
            RequestBody::Stream { .. } => true,
            RequestBody::Multipart(form) => form.is_streaming(),
            _ => false,
        }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Text(text) => f
                .debug_tuple("Text")
                .field(&format!("{} chars", text.len()))
                .finish(),
            RequestBody::Bytes(bytes) => f
                .debug_tuple("Bytes")
                .field(&format!("{} bytes", bytes.len()))
                .finish(),
            RequestBody::Json(value) => f.debug_tuple("Json").field(value).finish(),
            RequestBody::Multipart(form) => f.debug_tuple("Multipart").field(form).finish(),
            RequestBody::Stream { length, .. } => f.debug_struct("Stream").field("length", length).finish(),
        }
    }
}

/// How the response body is delivered to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseMode {
    /// Accumulate and parse as JSON. An empty body parses as `null`.
    #[default]
    Json,
    /// Accumulate and decode as UTF-8 text.
    Text,
    /// Accumulate raw bytes.
    Bytes,
    /// Hand the body over as a byte stream without reading it.
    Stream,
}

/// Options for one request. Unset fields fall back to the client's config.
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: RequestBody,
    /// Extra query pairs appended to the target URL
    pub query: Vec<(String, String)>,
    /// Deadline for the whole exchange, retries included
    pub timeout: Option<Duration>,
    pub retry: Option<RetryPolicy>,
    pub signal: Option<AbortSignal>,
    pub response_mode: ResponseMode,
    error: Option<Error>,
}

impl RequestOptions {
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    #[must_use]
    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    #[must_use]
    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    #[must_use]
    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    #[must_use]
    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set a header, replacing earlier values for the same name.
    #[must_use]
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        let parsed = HeaderName::try_from(key)
            .map_err(Into::<http::Error>::into)
            .and_then(|name| {
                HeaderValue::try_from(value)
                    .map(|value| (name, value))
                    .map_err(Into::<http::Error>::into)
            });
        match parsed {
            Ok((name, value)) => {
                self.headers.insert(name, value);
            }
            Err(e) => self.defer(error::builder(e)),
        }
        self
    }

    /// Merge `headers`, replacing earlier values for the same names.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        crate::http::headers::replace_headers(&mut self.headers, headers);
        self
    }

    #[must_use]
    pub fn bearer_auth(mut self, token: impl fmt::Display) -> Self {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.headers.insert(AUTHORIZATION, value);
            }
            Err(e) => self.defer(error::builder(e)),
        }
        self
    }

    #[must_use]
    pub fn query<K: Into<String>, V: Into<String>>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body = RequestBody::Text(text.into());
        self
    }

    #[must_use]
    pub fn bytes(mut self, bytes: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Bytes(bytes.into());
        self
    }

    #[must_use]
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => self.body = RequestBody::Json(value),
            Err(e) => self.defer(error::builder(e)),
        }
        self
    }

    #[must_use]
    pub fn multipart(mut self, form: Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    #[must_use]
    pub fn stream(mut self, stream: ByteStream, length: Option<u64>) -> Self {
        self.body = RequestBody::Stream { stream, length };
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    #[must_use]
    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    #[must_use]
    pub fn response_mode(mut self, mode: ResponseMode) -> Self {
        self.response_mode = mode;
        self
    }

    /// The first deferred builder error, if any.
    pub(crate) fn take_error(&mut self) -> Result<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn defer(&mut self, e: Error) {
        if self.error.is_none() {
            self.error = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_header_is_deferred_until_send() {
        let mut options = RequestOptions::get()
            .header("bad header", "x")
            .header("x-ok", "1");
        assert_eq!(options.headers.get("x-ok").unwrap(), "1");
        assert!(options.take_error().unwrap_err().is_builder());
        assert!(options.take_error().is_ok());
    }

    #[test]
    fn bearer_auth_sets_sensitive_authorization() {
        let options = RequestOptions::get().bearer_auth("t0ken");
        let value = options.headers.get(AUTHORIZATION).unwrap();
        assert_eq!(value, "Bearer t0ken");
        assert!(value.is_sensitive());
    }

    #[test]
    fn json_body_is_captured() {
        let options = RequestOptions::post().json(&serde_json::json!({"a": 1}));
        assert!(matches!(options.body, RequestBody::Json(ref v) if v["a"] == 1));
        assert!(!options.body.is_stream());
    }
}
