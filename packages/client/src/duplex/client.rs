//! Caller-facing duplex client
//!
//! Hides adapter selection and caches the connection attempt. Concurrent
//! callers share one attempt; a failed attempt is forgotten so the next
//! `connect` starts over with a fresh adapter.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use futures::future::{FutureExt, Shared};
use serde::Serialize;

use super::adapter::Adapter;
use super::factory::create_adapter;
use super::hooks::{Handler, HookCell, HookEvent, HookTable};
use super::message::{CloseEvent, DuplexMessage};
use super::peer::Peer;
use crate::config::DuplexConfig;
use crate::error::{self, Error, Result};

#[cfg(not(target_arch = "wasm32"))]
type ConnectFuture = futures::future::BoxFuture<'static, Result<Peer>>;
#[cfg(target_arch = "wasm32")]
type ConnectFuture = futures::future::LocalBoxFuture<'static, Result<Peer>>;

#[derive(Default)]
struct Slot {
    generation: u64,
    adapter: Option<Arc<dyn Adapter>>,
    attempt: Option<Shared<ConnectFuture>>,
}

struct Inner {
    config: DuplexConfig,
    hooks: HookCell,
    slot: Mutex<Slot>,
}

/// Duplex connection with lazy, shared connects.
///
/// Cloning is cheap; clones drive the same connection and hooks.
#[derive(Clone)]
pub struct DuplexClient {
    inner: Arc<Inner>,
}

impl DuplexClient {
    pub fn new(config: DuplexConfig) -> Self {
        Self::with_hooks(config, HookTable::new())
    }

    pub fn with_hooks(config: DuplexConfig, hooks: HookTable) -> Self {
        DuplexClient {
            inner: Arc::new(Inner {
                config,
                hooks: HookCell::new(hooks),
                slot: Mutex::new(Slot::default()),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DuplexConfig {
        &self.inner.config
    }

    /// Connect, or join the attempt already under way.
    ///
    /// An attempt that is still in flight, or that produced a peer which is
    /// still open, is shared. Otherwise a new adapter is created.
    pub async fn connect(&self) -> Result<Peer> {
        let (generation, attempt) = {
            let mut slot = self.slot();
            match reusable(&slot) {
                Some(attempt) => (slot.generation, attempt),
                None => {
                    let adapter: Arc<dyn Adapter> =
                        Arc::from(create_adapter(&self.inner.config, self.inner.hooks.clone())?);
                    let running = Arc::clone(&adapter);
                    let future: ConnectFuture = Box::pin(async move { running.connect().await });
                    let attempt = future.shared();

                    slot.generation += 1;
                    slot.adapter = Some(adapter);
                    slot.attempt = Some(attempt.clone());
                    (slot.generation, attempt)
                }
            }
        };

        let result = attempt.await;
        if let Err(e) = &result {
            let mut slot = self.slot();
            if slot.generation == generation {
                tracing::debug!(target: "wireline::duplex", error = %e, "connect failed, attempt cleared");
                slot.adapter = None;
                slot.attempt = None;
            }
        }
        result
    }

    /// Close the active connection and forget it. A no-op when nothing is
    /// connected or connecting.
    pub fn close(&self, code: u16, reason: &str) {
        let adapter = {
            let mut slot = self.slot();
            slot.attempt = None;
            slot.generation += 1;
            slot.adapter.take()
        };
        if let Some(adapter) = adapter {
            adapter.close(code, reason);
        }
    }

    /// [`close`](Self::close) with the normal closure code.
    pub fn disconnect(&self) {
        self.close(CloseEvent::NORMAL, "");
    }

    /// Peer of the active connection, if it opened.
    #[must_use]
    pub fn peer(&self) -> Option<Peer> {
        self.slot().adapter.as_ref().and_then(|adapter| adapter.peer())
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.peer().is_some_and(|peer| peer.is_open())
    }

    pub fn send(&self, message: DuplexMessage) -> Result<()> {
        self.open_peer()?.send(message)
    }

    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.open_peer()?.send_text(text)
    }

    pub fn send_binary(&self, bytes: impl Into<Bytes>) -> Result<()> {
        self.open_peer()?.send_binary(bytes)
    }

    pub fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        self.open_peer()?.send_json(value)
    }

    /// Install `handler`. Takes effect on the live connection from its next
    /// event.
    pub fn on(&self, handler: Handler) -> &Self {
        self.inner.hooks.update(|table| table.set(handler));
        self
    }

    pub fn off(&self, event: HookEvent) -> &Self {
        self.inner.hooks.update(|table| table.clear(event));
        self
    }

    /// Replace every hook at once.
    pub fn set_hooks(&self, hooks: HookTable) {
        self.inner.hooks.replace(hooks);
    }

    #[must_use]
    pub fn hooks(&self) -> HookTable {
        self.inner.hooks.snapshot()
    }

    pub fn on_open(&self, f: impl Fn(&Peer) + Send + Sync + 'static) -> &Self {
        self.on(Handler::open(f))
    }

    pub fn on_message(&self, f: impl Fn(&DuplexMessage) + Send + Sync + 'static) -> &Self {
        self.on(Handler::message(f))
    }

    pub fn on_close(&self, f: impl Fn(&CloseEvent) + Send + Sync + 'static) -> &Self {
        self.on(Handler::close(f))
    }

    pub fn on_error(&self, f: impl Fn(&Error) + Send + Sync + 'static) -> &Self {
        self.on(Handler::error(f))
    }

    fn open_peer(&self) -> Result<Peer> {
        self.peer()
            .filter(Peer::is_open)
            .ok_or_else(error::not_connected)
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn reusable(slot: &Slot) -> Option<Shared<ConnectFuture>> {
    let attempt = slot.attempt.as_ref()?;
    match attempt.peek() {
        None => Some(attempt.clone()),
        Some(Ok(peer)) if peer.is_open() => Some(attempt.clone()),
        Some(_) => None,
    }
}

impl fmt::Debug for DuplexClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuplexClient")
            .field("url", &self.inner.config.url)
            .field("peer", &self.peer())
            .field("hooks", &self.inner.hooks)
            .finish()
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::runtime::CapabilityReport;

    fn offline() -> DuplexClient {
        DuplexClient::new(DuplexConfig::new("ws://127.0.0.1:9/").capabilities(CapabilityReport::unknown()))
    }

    #[tokio::test]
    async fn no_transport_is_not_cached() {
        let client = offline();
        assert!(client.connect().await.unwrap_err().is_no_transport());
        assert!(client.connect().await.unwrap_err().is_no_transport());
        assert!(client.peer().is_none());
    }

    #[test]
    fn sends_without_peer_fail() {
        let client = offline();
        assert!(client.send_text("x").unwrap_err().is_not_connected());
        assert!(client.send_json(&[1, 2]).unwrap_err().is_not_connected());
        assert!(client.send_binary(vec![0u8]).unwrap_err().is_not_connected());
        assert!(!client.is_connected());
    }

    #[test]
    fn close_without_connection_is_noop() {
        let client = offline();
        client.close(1000, "bye");
        client.disconnect();
        assert!(client.peer().is_none());
    }

    #[test]
    fn hooks_are_shared_between_clones() {
        let client = offline();
        let clone = client.clone();
        client.on_message(|_| {}).on_close(|_| {});
        assert!(clone.hooks().has(HookEvent::Message));

        clone.off(HookEvent::Message);
        assert!(!client.hooks().has(HookEvent::Message));
        assert!(client.hooks().has(HookEvent::Close));

        client.set_hooks(HookTable::new());
        assert!(!clone.hooks().has(HookEvent::Close));
    }

    #[cfg(feature = "library-transport")]
    #[tokio::test]
    async fn refused_connection_clears_attempt() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = DuplexClient::new(DuplexConfig::new(format!("ws://{addr}/")));
        let err = client.connect().await.unwrap_err();
        assert!(err.is_connect() || err.is_connection_timeout(), "{err:?}");
        assert!(client.slot().attempt.is_none());
    }
}
