//! Event dispatch shared by every adapter
//!
//! Adapters translate native events and hand them to a [`Dispatcher`], which
//! applies the lifecycle rules and invokes the current hooks. A panicking
//! hook is logged and does not take the connection down.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;

use super::hooks::HookCell;
use super::message::{CloseEvent, DuplexMessage};
use super::peer::Peer;
use super::state::{AtomicReadyState, ReadyState};
use crate::error::Error;

#[derive(Clone, Debug)]
pub(crate) struct Dispatcher {
    hooks: HookCell,
    state: Arc<AtomicReadyState>,
}

impl Dispatcher {
    pub(crate) fn new(hooks: HookCell, state: Arc<AtomicReadyState>) -> Self {
        Dispatcher { hooks, state }
    }

    pub(crate) fn state(&self) -> &Arc<AtomicReadyState> {
        &self.state
    }

    /// Connecting -> open. False when the attempt was closed meanwhile.
    pub(crate) fn open(&self, peer: &Peer) -> bool {
        if !self.state.transition(ReadyState::Connecting, ReadyState::Open) {
            return false;
        }
        tracing::debug!(
            target: "wireline::duplex",
            peer = %peer.id(),
            url = %peer.url(),
            protocol = ?peer.protocol(),
            "peer open"
        );
        if let Some(hook) = self.hooks.snapshot().on_open {
            guard("open", || hook(peer));
        }
        true
    }

    pub(crate) fn message(&self, message: &DuplexMessage) {
        if self.state.load() == ReadyState::Closed {
            return;
        }
        if let Some(hook) = self.hooks.snapshot().on_message {
            guard("message", || hook(message));
        }
    }

    pub(crate) fn ping(&self, payload: &Bytes) {
        if let Some(hook) = self.hooks.snapshot().on_ping {
            guard("ping", || hook(payload));
        }
    }

    pub(crate) fn pong(&self, payload: &Bytes) {
        if let Some(hook) = self.hooks.snapshot().on_pong {
            guard("pong", || hook(payload));
        }
    }

    pub(crate) fn error(&self, error: &Error) {
        tracing::debug!(target: "wireline::duplex", error = %error, "transport error");
        if let Some(hook) = self.hooks.snapshot().on_error {
            guard("error", || hook(error));
        }
    }

    /// Connect attempt failed before opening. Reports `error` and closes the
    /// attempt without a close event.
    pub(crate) fn fail(&self, error: &Error) {
        if self.state.advance(ReadyState::Closed) == ReadyState::Connecting {
            self.error(error);
        }
    }

    /// Terminal close. Fires the close hook once, and only for a connection
    /// that was open.
    pub(crate) fn close(&self, event: &CloseEvent) {
        let previous = self.state.advance(ReadyState::Closed);
        if !matches!(previous, ReadyState::Open | ReadyState::Closing) {
            return;
        }
        tracing::debug!(
            target: "wireline::duplex",
            code = event.code,
            reason = %event.reason,
            clean = event.was_clean,
            "peer closed"
        );
        if let Some(hook) = self.hooks.snapshot().on_close {
            guard("close", || hook(event));
        }
    }
}

fn guard(event: &'static str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::warn!(target: "wireline::duplex", event, "hook panicked");
    }
}
