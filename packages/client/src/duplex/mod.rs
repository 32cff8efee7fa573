//! Duplex (WebSocket) transport
//!
//! [`DuplexClient`] is the entry point. It picks an [`Adapter`] from the
//! capability report: the host `WebSocket` on wasm32, `tokio-tungstenite`
//! on servers built with the `library-transport` feature.

pub mod adapter;
pub mod client;
pub(crate) mod dispatch;
pub mod factory;
pub mod hooks;
#[cfg(all(not(target_arch = "wasm32"), feature = "library-transport"))]
pub mod library;
pub mod message;
#[cfg(target_arch = "wasm32")]
pub mod native;
pub mod peer;
pub mod state;

pub use adapter::{Adapter, AdapterKind};
pub use client::DuplexClient;
pub use factory::{create_adapter, select_adapter};
pub use hooks::{
    CloseHook, ControlHook, ErrorHook, Handler, HookCell, HookEvent, HookTable, MessageHook, OpenHook,
};
#[cfg(all(not(target_arch = "wasm32"), feature = "library-transport"))]
pub use library::LibraryAdapter;
pub use message::{CloseEvent, DuplexMessage, MessageKind};
#[cfg(target_arch = "wasm32")]
pub use native::NativeAdapter;
pub use peer::Peer;
pub use state::ReadyState;
