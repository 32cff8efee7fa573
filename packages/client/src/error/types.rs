use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;

/// A Result alias where the Err case is `wireline_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// Represents every failure surfaced by the HTTP client and the duplex layer.
///
/// Native errors (hyper, tungstenite, JavaScript exceptions) never escape
/// directly: they are converted at the transport boundary and kept as the
/// [`source`](StdError::source) of one of these.
#[derive(Clone)]
pub struct Error {
    pub(crate) inner: Box<Inner>,
}

#[derive(Clone)]
pub(crate) struct Inner {
    pub(crate) kind: Kind,
    pub(crate) source: Option<Arc<dyn StdError + Send + Sync>>,
    pub(crate) url: Option<url::Url>,
    pub(crate) detail: Option<String>,
}

/// Error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Invalid caller input: unparseable URL, bad header, invalid config.
    Builder,
    /// Malformed text/base64/hex input or an undecodable body.
    Decode,
    /// The operation was cancelled through an abort signal.
    Aborted,
    /// A deadline elapsed before the operation settled.
    Timeout,
    /// A duplex connection did not open before its connect deadline.
    ConnectionTimeout,
    /// No duplex transport is available in this environment.
    NoTransport,
    /// A send was attempted without an open peer.
    NotConnected,
    /// Native transport failure. `connect` is set when the failure happened
    /// before the request reached the peer.
    Transport { connect: bool },
    /// Non-2xx response.
    Status(StatusCode),
}

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                url: None,
                detail: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<BoxError>>(mut self, source: E) -> Error {
        self.inner.source = Some(Arc::from(source.into()));
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: url::Url) -> Self {
        self.inner.url = Some(url);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.inner.detail = Some(detail.into());
        self
    }

    /// The error kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }

    /// Get the URL associated with this error, if any
    #[must_use]
    pub fn url(&self) -> Option<&url::Url> {
        self.inner.url.as_ref()
    }

    /// Human-readable message, identical to the `Display` output.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("wireline::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref detail) = self.inner.detail {
            f.field("detail", detail);
        }

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref url) = self.inner.url {
            f.field("url", &url.as_str());
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Builder => f.write_str("builder error")?,
            Kind::Decode => f.write_str("decoding error")?,
            Kind::Aborted => f.write_str("operation aborted")?,
            Kind::Timeout => f.write_str("operation timed out")?,
            Kind::ConnectionTimeout => f.write_str("connection timed out")?,
            Kind::NoTransport => f.write_str("no transport available")?,
            Kind::NotConnected => f.write_str("not connected")?,
            Kind::Transport { connect: true } => f.write_str("error establishing connection")?,
            Kind::Transport { connect: false } => f.write_str("transport error")?,
            Kind::Status(code) => {
                let prefix = if code.is_client_error() {
                    "HTTP status client error"
                } else if code.is_server_error() {
                    "HTTP status server error"
                } else {
                    "unexpected HTTP status"
                };
                write!(f, "{prefix} ({code})")?;
            }
        }

        if let Some(ref detail) = self.inner.detail {
            write!(f, ": {detail}")?;
        } else if let Some(ref source) = self.inner.source {
            write!(f, ": {source}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
