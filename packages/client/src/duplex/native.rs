//! Host `WebSocket` adapter for browsers and workers

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::oneshot;
use js_sys::{Array, ArrayBuffer, Uint8Array};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{BinaryType, Event, MessageEvent, WebSocket};

use super::adapter::{Adapter, AdapterKind};
use super::dispatch::Dispatcher;
use super::hooks::HookCell;
use super::message::{CloseEvent, DuplexMessage, MessageKind};
use super::peer::{Peer, PeerLink};
use super::state::{AtomicReadyState, ReadyState};
use crate::config::DuplexConfig;
use crate::error::{self, Result};
use crate::runtime::spawn;
use crate::scheduling::{race_with_timeout, until_aborted, AbortController};

type OpenSignal = Rc<RefCell<Option<oneshot::Sender<Result<()>>>>>;

/// Listeners of one socket. The close listener holds the slot itself, so the
/// set outlives the adapter and the peer until the socket reports `close`.
type ListenerSlot = Rc<RefCell<Option<Listeners>>>;

struct NativeLink {
    socket: WebSocket,
}

impl PeerLink for NativeLink {
    fn send(&self, message: DuplexMessage) -> Result<()> {
        match message.kind() {
            MessageKind::Text => self.socket.send_with_str(message.as_text()?),
            MessageKind::Binary => self.socket.send_with_u8_array(message.as_bytes()),
        }
        .map_err(error::js)
    }

    fn ping(&self, _payload: Bytes) -> Result<()> {
        Err(error::transport("host WebSocket does not expose control frames"))
    }

    fn close(&self, code: u16, reason: &str) {
        if let Err(e) = self.socket.close_with_code_and_reason(code, reason) {
            tracing::debug!(target: "wireline::duplex", error = ?e, "close rejected by host");
        }
    }

    fn terminate(&self) {
        let _ = self.socket.close();
    }
}

impl Drop for NativeLink {
    fn drop(&mut self) {
        // Listeners stay attached; the close event still reaches the hooks.
        if matches!(self.socket.ready_state(), WebSocket::CONNECTING | WebSocket::OPEN) {
            let _ = self.socket.close_with_code(CloseEvent::GOING_AWAY);
        }
    }
}

/// Event listeners installed on the socket. Dropped only after they are
/// detached from it, and never from inside one of them.
struct Listeners {
    _open: Closure<dyn FnMut(Event)>,
    _message: Closure<dyn FnMut(MessageEvent)>,
    _error: Closure<dyn FnMut(Event)>,
    _close: Closure<dyn FnMut(web_sys::CloseEvent)>,
}

impl Listeners {
    fn attach(socket: &WebSocket, dispatcher: &Dispatcher, opened: OpenSignal, slot: &ListenerSlot) {
        let on_open = {
            let opened = Rc::clone(&opened);
            Closure::<dyn FnMut(Event)>::new(move |_: Event| {
                if let Some(tx) = opened.borrow_mut().take() {
                    let _ = tx.send(Ok(()));
                }
            })
        };

        let on_message = {
            let dispatcher = dispatcher.clone();
            Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
                let data = event.data();
                if let Some(text) = data.as_string() {
                    dispatcher.message(&DuplexMessage::text(text));
                } else if let Ok(buffer) = data.dyn_into::<ArrayBuffer>() {
                    dispatcher.message(&DuplexMessage::binary(Uint8Array::new(&buffer).to_vec()));
                } else {
                    tracing::debug!(target: "wireline::duplex", "ignoring message with unsupported payload");
                }
            })
        };

        let on_error = {
            let dispatcher = dispatcher.clone();
            let opened = Rc::clone(&opened);
            Closure::<dyn FnMut(Event)>::new(move |_: Event| match opened.borrow_mut().take() {
                Some(tx) => {
                    let _ = tx.send(Err(error::connect("WebSocket connection failed")));
                }
                None => dispatcher.error(&error::transport("WebSocket error")),
            })
        };

        let on_close = {
            let dispatcher = dispatcher.clone();
            let socket = socket.clone();
            let slot = Rc::clone(slot);
            Closure::<dyn FnMut(web_sys::CloseEvent)>::new(move |event: web_sys::CloseEvent| {
                match opened.borrow_mut().take() {
                    Some(tx) => {
                        let _ = tx.send(Err(error::connect(format!(
                            "closed during handshake with code {}",
                            event.code()
                        ))));
                    }
                    None => {
                        dispatcher.close(&CloseEvent {
                            code: event.code(),
                            reason: event.reason(),
                            was_clean: event.was_clean(),
                        });
                        release(&socket, &slot);
                    }
                }
            })
        };

        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        *slot.borrow_mut() = Some(Listeners {
            _open: on_open,
            _message: on_message,
            _error: on_error,
            _close: on_close,
        });
    }
}

/// Detach every listener from `socket` and free them once the running event,
/// if any, has returned.
fn release(socket: &WebSocket, slot: &ListenerSlot) {
    socket.set_onopen(None);
    socket.set_onmessage(None);
    socket.set_onerror(None);
    socket.set_onclose(None);
    if let Some(listeners) = slot.borrow_mut().take() {
        spawn(async move { drop(listeners) });
    }
}

/// Duplex adapter backed by the host `WebSocket`.
///
/// Browsers neither send custom handshake headers nor expose ping and pong
/// frames, so `DuplexConfig::headers` is ignored and the ping/pong hooks
/// never fire.
pub struct NativeAdapter {
    config: DuplexConfig,
    dispatcher: Dispatcher,
    started: Cell<bool>,
    cancel: AbortController,
    /// Socket of an attempt that has not opened yet
    socket: RefCell<Option<WebSocket>>,
    listeners: ListenerSlot,
    peer: RefCell<Option<Peer>>,
}

impl NativeAdapter {
    pub fn new(config: DuplexConfig, hooks: HookCell) -> Self {
        NativeAdapter {
            config,
            dispatcher: Dispatcher::new(hooks, std::sync::Arc::new(AtomicReadyState::default())),
            started: Cell::new(false),
            cancel: AbortController::new(),
            socket: RefCell::new(None),
            listeners: ListenerSlot::default(),
            peer: RefCell::new(None),
        }
    }

    fn open_socket(&self, url: &str) -> Result<WebSocket> {
        let socket = if self.config.protocols.is_empty() {
            WebSocket::new(url)
        } else {
            let offered: Array = self.config.protocols.iter().map(|p| JsValue::from_str(p)).collect();
            WebSocket::new_with_str_sequence(url, &offered)
        }
        .map_err(error::js)?;
        socket.set_binary_type(BinaryType::Arraybuffer);
        Ok(socket)
    }

    /// Abandon an attempt that never opened. Once open, the socket belongs
    /// to the peer and this does nothing.
    fn teardown(&self, code: u16) {
        if let Some(socket) = self.socket.borrow_mut().take() {
            release(&socket, &self.listeners);
            let _ = socket.close_with_code(code);
        }
    }
}

#[async_trait(?Send)]
impl Adapter for NativeAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Native
    }

    fn state(&self) -> ReadyState {
        self.dispatcher.state().load()
    }

    async fn connect(&self) -> Result<Peer> {
        if self.started.replace(true) {
            return Err(error::builder("adapter already used, create a new one to reconnect"));
        }

        let url = self.config.parsed_url()?;
        let socket = match self.open_socket(url.as_str()) {
            Ok(socket) => socket,
            Err(e) => {
                self.dispatcher.fail(&e);
                return Err(e);
            }
        };
        tracing::debug!(target: "wireline::duplex", url = %url, "connecting");

        let (tx, rx) = oneshot::channel();
        Listeners::attach(&socket, &self.dispatcher, Rc::new(RefCell::new(Some(tx))), &self.listeners);
        *self.socket.borrow_mut() = Some(socket.clone());

        let timeout = self.config.connect_timeout;
        let signal = self.cancel.signal();
        let opened = async {
            match race_with_timeout(rx, timeout).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(error::aborted()),
                Err(_) => Err(error::connection_timeout(timeout).with_url(url.clone())),
            }
        };
        if let Err(e) = until_aborted(opened, Some(&signal)).await {
            self.teardown(CloseEvent::NORMAL);
            self.dispatcher.fail(&e);
            return Err(e);
        }

        let peer = Peer::new(
            url,
            Some(socket.protocol()),
            std::sync::Arc::clone(self.dispatcher.state()),
            Box::new(NativeLink { socket }),
        );
        if !self.dispatcher.open(&peer) {
            self.teardown(CloseEvent::NORMAL);
            return Err(error::aborted());
        }
        self.socket.borrow_mut().take();
        *self.peer.borrow_mut() = Some(peer.clone());
        Ok(peer)
    }

    fn peer(&self) -> Option<Peer> {
        self.peer.borrow().clone()
    }

    fn close(&self, code: u16, reason: &str) {
        if self
            .dispatcher
            .state()
            .transition(ReadyState::Connecting, ReadyState::Closed)
        {
            self.cancel.abort();
            return;
        }
        if let Some(peer) = self.peer() {
            peer.close(code, reason);
        }
    }
}

impl Drop for NativeAdapter {
    fn drop(&mut self) {
        self.teardown(CloseEvent::GOING_AWAY);
    }
}

impl fmt::Debug for NativeAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeAdapter")
            .field("url", &self.config.url)
            .field("state", &self.state())
            .field("peer", &self.peer())
            .finish()
    }
}
