//! Response envelope

use std::fmt;

use http::response::Parts;
use http::{HeaderMap, StatusCode, Version};
use serde::de::DeserializeOwned;
use url::Url;

use crate::binary::{BinaryData, ByteStream};
use crate::error::{self, Result};

/// Response body, shaped by the request's response mode.
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
    Bytes(BinaryData),
    /// Unread body. Materialized variants and the stream are mutually
    /// exclusive for one response.
    Stream(ByteStream),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Json(value) => f.debug_tuple("Json").field(value).finish(),
            ResponseBody::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ResponseBody::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            ResponseBody::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A completed HTTP exchange.
pub struct ResponseEnvelope {
    url: Url,
    status_text: String,
    raw: Parts,
    body: ResponseBody,
}

impl ResponseEnvelope {
    pub(crate) fn new(url: Url, status_text: String, raw: Parts, body: ResponseBody) -> Self {
        ResponseEnvelope {
            url,
            status_text,
            raw,
            body,
        }
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.raw.status
    }

    /// Reason phrase from the wire, else the canonical one for the code.
    #[inline]
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    #[inline]
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.raw.headers
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> Version {
        self.raw.version
    }

    /// Final request URL, query included.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Raw transport response head, extensions included.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &Parts {
        &self.raw
    }

    #[inline]
    #[must_use]
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    #[must_use]
    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    #[must_use]
    pub fn into_parts(self) -> (Parts, ResponseBody) {
        (self.raw, self.body)
    }

    /// Deserialize a JSON body. Text and byte bodies are parsed on the fly.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.body {
            ResponseBody::Json(value) => T::deserialize(value).map_err(error::decode),
            ResponseBody::Text(text) => serde_json::from_str(text).map_err(error::decode),
            ResponseBody::Bytes(bytes) => serde_json::from_slice(bytes).map_err(error::decode),
            ResponseBody::Stream(_) => Err(error::decode("body is a stream, read it first")),
        }
    }

    /// The body as text. JSON bodies are re-serialized.
    pub fn text(&self) -> Result<String> {
        match &self.body {
            ResponseBody::Json(value) => Ok(value.to_string()),
            ResponseBody::Text(text) => Ok(text.clone()),
            ResponseBody::Bytes(bytes) => bytes.to_text().map_err(error::decode),
            ResponseBody::Stream(_) => Err(error::decode("body is a stream, read it first")),
        }
    }

    pub fn bytes(&self) -> Result<BinaryData> {
        match &self.body {
            ResponseBody::Json(value) => Ok(BinaryData::from(value.to_string())),
            ResponseBody::Text(text) => Ok(BinaryData::from_text(text)),
            ResponseBody::Bytes(bytes) => Ok(bytes.clone()),
            ResponseBody::Stream(_) => Err(error::decode("body is a stream, read it first")),
        }
    }

    /// Take the unread body stream.
    pub fn into_stream(self) -> Result<ByteStream> {
        match self.body {
            ResponseBody::Stream(stream) => Ok(stream),
            _ => Err(error::decode("body was already materialized")),
        }
    }
}

impl fmt::Debug for ResponseEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseEnvelope")
            .field("url", &self.url.as_str())
            .field("status", &self.raw.status)
            .field("status_text", &self.status_text)
            .field("headers", &self.raw.headers)
            .field("body", &self.body)
            .finish()
    }
}
