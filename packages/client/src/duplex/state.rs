//! Connection lifecycle state

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of one connection attempt. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReadyState::Connecting => "connecting",
            ReadyState::Open => "open",
            ReadyState::Closing => "closing",
            ReadyState::Closed => "closed",
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock-free [`ReadyState`] cell shared by an adapter, its peer and its
/// dispatcher.
#[derive(Debug)]
pub struct AtomicReadyState(AtomicU8);

impl Default for AtomicReadyState {
    fn default() -> Self {
        AtomicReadyState(AtomicU8::new(ReadyState::Connecting as u8))
    }
}

impl AtomicReadyState {
    #[inline]
    pub fn load(&self) -> ReadyState {
        ReadyState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `to` unless the state is already there or beyond. Returns
    /// the previous state.
    #[inline]
    pub fn advance(&self, to: ReadyState) -> ReadyState {
        ReadyState::from_u8(self.0.fetch_max(to as u8, Ordering::AcqRel))
    }

    /// Move from exactly `from` to `to`.
    #[inline]
    pub fn transition(&self, from: ReadyState, to: ReadyState) -> bool {
        from < to
            && self
                .0
                .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }
}
