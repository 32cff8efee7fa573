//! Event hooks
//!
//! The façade and its live adapter share one [`HookCell`]. Dispatch takes a
//! snapshot of the table per event, so a replaced hook applies from the next
//! event on and no lock is held while user code runs.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;

use super::message::{CloseEvent, DuplexMessage};
use super::peer::Peer;
use crate::error::Error;

pub type OpenHook = Arc<dyn Fn(&Peer) + Send + Sync>;
pub type MessageHook = Arc<dyn Fn(&DuplexMessage) + Send + Sync>;
pub type CloseHook = Arc<dyn Fn(&CloseEvent) + Send + Sync>;
pub type ErrorHook = Arc<dyn Fn(&Error) + Send + Sync>;
/// Receives ping or pong payloads
pub type ControlHook = Arc<dyn Fn(&Bytes) + Send + Sync>;

/// Names of the hookable events, used by `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    Open,
    Message,
    Close,
    Error,
    Ping,
    Pong,
}

/// A handler for one event, used by `on`.
#[derive(Clone)]
pub enum Handler {
    Open(OpenHook),
    Message(MessageHook),
    Close(CloseHook),
    Error(ErrorHook),
    Ping(ControlHook),
    Pong(ControlHook),
}

impl Handler {
    #[must_use]
    pub fn event(&self) -> HookEvent {
        match self {
            Handler::Open(_) => HookEvent::Open,
            Handler::Message(_) => HookEvent::Message,
            Handler::Close(_) => HookEvent::Close,
            Handler::Error(_) => HookEvent::Error,
            Handler::Ping(_) => HookEvent::Ping,
            Handler::Pong(_) => HookEvent::Pong,
        }
    }

    pub fn open(f: impl Fn(&Peer) + Send + Sync + 'static) -> Self {
        Handler::Open(Arc::new(f))
    }

    pub fn message(f: impl Fn(&DuplexMessage) + Send + Sync + 'static) -> Self {
        Handler::Message(Arc::new(f))
    }

    pub fn close(f: impl Fn(&CloseEvent) + Send + Sync + 'static) -> Self {
        Handler::Close(Arc::new(f))
    }

    pub fn error(f: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        Handler::Error(Arc::new(f))
    }

    pub fn ping(f: impl Fn(&Bytes) + Send + Sync + 'static) -> Self {
        Handler::Ping(Arc::new(f))
    }

    pub fn pong(f: impl Fn(&Bytes) + Send + Sync + 'static) -> Self {
        Handler::Pong(Arc::new(f))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.event()).finish()
    }
}

/// Optional callbacks for each event.
#[derive(Clone, Default)]
pub struct HookTable {
    pub on_open: Option<OpenHook>,
    pub on_message: Option<MessageHook>,
    pub on_close: Option<CloseHook>,
    pub on_error: Option<ErrorHook>,
    pub on_ping: Option<ControlHook>,
    pub on_pong: Option<ControlHook>,
}

impl HookTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler`, replacing any previous one for its event.
    #[must_use]
    pub fn with(mut self, handler: Handler) -> Self {
        self.set(handler);
        self
    }

    pub fn set(&mut self, handler: Handler) {
        match handler {
            Handler::Open(f) => self.on_open = Some(f),
            Handler::Message(f) => self.on_message = Some(f),
            Handler::Close(f) => self.on_close = Some(f),
            Handler::Error(f) => self.on_error = Some(f),
            Handler::Ping(f) => self.on_ping = Some(f),
            Handler::Pong(f) => self.on_pong = Some(f),
        }
    }

    pub fn clear(&mut self, event: HookEvent) {
        match event {
            HookEvent::Open => self.on_open = None,
            HookEvent::Message => self.on_message = None,
            HookEvent::Close => self.on_close = None,
            HookEvent::Error => self.on_error = None,
            HookEvent::Ping => self.on_ping = None,
            HookEvent::Pong => self.on_pong = None,
        }
    }

    #[must_use]
    pub fn has(&self, event: HookEvent) -> bool {
        match event {
            HookEvent::Open => self.on_open.is_some(),
            HookEvent::Message => self.on_message.is_some(),
            HookEvent::Close => self.on_close.is_some(),
            HookEvent::Error => self.on_error.is_some(),
            HookEvent::Ping => self.on_ping.is_some(),
            HookEvent::Pong => self.on_pong.is_some(),
        }
    }
}

impl fmt::Debug for HookTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookTable")
            .field("on_open", &self.on_open.is_some())
            .field("on_message", &self.on_message.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_ping", &self.on_ping.is_some())
            .field("on_pong", &self.on_pong.is_some())
            .finish()
    }
}

/// Shared, mutable [`HookTable`].
#[derive(Clone, Default)]
pub struct HookCell {
    table: Arc<RwLock<HookTable>>,
}

impl HookCell {
    #[must_use]
    pub fn new(table: HookTable) -> Self {
        HookCell {
            table: Arc::new(RwLock::new(table)),
        }
    }

    /// Copy of the current table. Cloning only bumps reference counts.
    #[must_use]
    pub fn snapshot(&self) -> HookTable {
        self.table.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn replace(&self, table: HookTable) {
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = table;
    }

    pub fn update(&self, f: impl FnOnce(&mut HookTable)) {
        f(&mut self.table.write().unwrap_or_else(PoisonError::into_inner));
    }
}

impl fmt::Debug for HookCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.snapshot().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn set_and_clear() {
        let mut table = HookTable::new().with(Handler::message(|_| {}));
        assert!(table.has(HookEvent::Message));
        assert!(!table.has(HookEvent::Close));
        table.clear(HookEvent::Message);
        assert!(!table.has(HookEvent::Message));
    }

    #[test]
    fn snapshots_see_replacements() {
        let cell = HookCell::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        cell.update(|table| {
            table.set(Handler::message(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
        });

        let shared = cell.clone();
        if let Some(hook) = shared.snapshot().on_message {
            hook(&DuplexMessage::text("a"));
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        cell.replace(HookTable::new());
        assert!(shared.snapshot().on_message.is_none());
    }
}
