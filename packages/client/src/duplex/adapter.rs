//! Adapter seam
//!
//! One implementation per environment family. An adapter drives a single
//! connection attempt; once closed it is inert and a new adapter is needed.

use std::fmt;

use async_trait::async_trait;

use super::peer::Peer;
use super::state::ReadyState;
use crate::error::Result;
use crate::runtime::{MaybeSend, MaybeSync};

/// Which transport backs an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// Host-provided `WebSocket`
    Native,
    /// `tokio-tungstenite`
    Library,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AdapterKind::Native => "native",
            AdapterKind::Library => "library",
        })
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Adapter: MaybeSend + MaybeSync + fmt::Debug {
    fn kind(&self) -> AdapterKind;

    fn state(&self) -> ReadyState;

    /// Open the connection.
    ///
    /// Resolves once open. Rejects with the connection-timeout kind after
    /// tearing down the half-open handle, or with the normalized native
    /// failure. A second call rejects: adapters are single use.
    async fn connect(&self) -> Result<Peer>;

    /// Peer produced by a successful `connect`
    fn peer(&self) -> Option<Peer>;

    /// Close the connection, or abandon a pending attempt.
    fn close(&self, code: u16, reason: &str);
}
