//! One open duplex connection

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use url::Url;

use super::message::DuplexMessage;
use super::state::{AtomicReadyState, ReadyState};
use crate::crypto::random_id;
use crate::error::{self, Result};
use crate::runtime::{MaybeSend, MaybeSync};

/// Outbound half of a native connection. Implemented once per adapter.
pub(crate) trait PeerLink: MaybeSend + MaybeSync {
    fn send(&self, message: DuplexMessage) -> Result<()>;
    fn ping(&self, payload: Bytes) -> Result<()>;
    /// Start the closing handshake.
    fn close(&self, code: u16, reason: &str);
    /// Drop the connection without a handshake.
    fn terminate(&self);
}

/// A live connection produced by one successful connect.
///
/// Clones refer to the same connection. Sends never queue behind a
/// connection that is not open: they fail with the not-connected kind.
#[derive(Clone)]
pub struct Peer {
    inner: Arc<PeerInner>,
}

struct PeerInner {
    id: String,
    url: Url,
    protocol: Option<String>,
    state: Arc<AtomicReadyState>,
    link: Box<dyn PeerLink>,
}

impl Peer {
    pub(crate) fn new(
        url: Url,
        protocol: Option<String>,
        state: Arc<AtomicReadyState>,
        link: Box<dyn PeerLink>,
    ) -> Self {
        Peer {
            inner: Arc::new(PeerInner {
                id: random_id(),
                url,
                protocol: protocol.filter(|p| !p.is_empty()),
                state,
                link,
            }),
        }
    }

    /// Identifier unique to this connection
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Sub-protocol chosen by the server
    #[inline]
    #[must_use]
    pub fn protocol(&self) -> Option<&str> {
        self.inner.protocol.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> ReadyState {
        self.inner.state.load()
    }

    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ReadyState::Open
    }

    pub fn send(&self, message: DuplexMessage) -> Result<()> {
        self.ensure_open()?;
        self.inner.link.send(message)
    }

    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(DuplexMessage::text(text))
    }

    pub fn send_binary(&self, bytes: impl Into<Bytes>) -> Result<()> {
        self.send(DuplexMessage::binary(bytes))
    }

    /// Serialize `value` and send it as a text frame.
    pub fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string(value).map_err(error::builder)?;
        self.send_text(text)
    }

    /// Send a ping control frame. Not every transport exposes control
    /// frames; those reject with a transport error.
    pub fn ping(&self, payload: impl Into<Bytes>) -> Result<()> {
        self.ensure_open()?;
        self.inner.link.ping(payload.into())
    }

    /// Start the closing handshake. A no-op unless open.
    pub fn close(&self, code: u16, reason: &str) {
        if self.inner.state.transition(ReadyState::Open, ReadyState::Closing) {
            tracing::debug!(target: "wireline::duplex", peer = %self.id(), code, reason, "closing");
            self.inner.link.close(code, reason);
        }
    }

    /// Drop the connection immediately.
    pub fn terminate(&self) {
        if self.inner.state.advance(ReadyState::Closing) < ReadyState::Closing {
            tracing::debug!(target: "wireline::duplex", peer = %self.id(), "terminating");
        }
        self.inner.link.terminate();
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(error::not_connected())
        }
    }
}

impl PartialEq for Peer {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Peer {}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.inner.id)
            .field("url", &self.inner.url.as_str())
            .field("protocol", &self.inner.protocol)
            .field("state", &self.state())
            .finish()
    }
}
