//! `tokio-tungstenite` adapter for server targets
//!
//! After the handshake a single pump task owns the socket. It forwards
//! outbound commands from the peer and delivers inbound frames to the
//! dispatcher in wire order.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::header::{HeaderValue, SEC_WEBSOCKET_PROTOCOL};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use url::Url;

use super::adapter::{Adapter, AdapterKind};
use super::dispatch::Dispatcher;
use super::hooks::HookCell;
use super::message::{CloseEvent, DuplexMessage, MessageKind};
use super::peer::{Peer, PeerLink};
use super::state::{AtomicReadyState, ReadyState};
use crate::config::DuplexConfig;
use crate::error::{self, Error, Result};
use crate::http::headers::replace_headers;
use crate::runtime::spawn;
use crate::scheduling::{race_with_timeout, until_aborted, AbortController};

enum Command {
    Send(Message),
    Close(u16, String),
    Terminate,
}

struct LibraryLink {
    commands: mpsc::UnboundedSender<Command>,
}

impl PeerLink for LibraryLink {
    fn send(&self, message: DuplexMessage) -> Result<()> {
        let frame = match message.kind() {
            MessageKind::Text => Message::Text(message.as_text()?.to_owned()),
            MessageKind::Binary => Message::Binary(message.into_bytes().to_vec()),
        };
        self.commands
            .send(Command::Send(frame))
            .map_err(|_| error::not_connected())
    }

    fn ping(&self, payload: Bytes) -> Result<()> {
        self.commands
            .send(Command::Send(Message::Ping(payload.to_vec())))
            .map_err(|_| error::not_connected())
    }

    fn close(&self, code: u16, reason: &str) {
        // The pump is gone once the connection closed; nothing left to do.
        let _ = self.commands.send(Command::Close(code, reason.to_owned()));
    }

    fn terminate(&self) {
        let _ = self.commands.send(Command::Terminate);
    }
}

/// Duplex adapter backed by `tokio-tungstenite`.
///
/// Plain `ws://` only; `wss://` targets fail at connect.
pub struct LibraryAdapter {
    config: DuplexConfig,
    dispatcher: Dispatcher,
    started: AtomicBool,
    cancel: AbortController,
    peer: Mutex<Option<Peer>>,
}

impl LibraryAdapter {
    pub fn new(config: DuplexConfig, hooks: HookCell) -> Self {
        LibraryAdapter {
            config,
            dispatcher: Dispatcher::new(hooks, Arc::new(AtomicReadyState::default())),
            started: AtomicBool::new(false),
            cancel: AbortController::new(),
            peer: Mutex::new(None),
        }
    }

    fn handshake_request(&self, url: &Url) -> Result<Request> {
        let mut request = url.as_str().into_client_request().map_err(error::builder)?;
        replace_headers(request.headers_mut(), self.config.headers.clone());
        if !self.config.protocols.is_empty() {
            let offered = HeaderValue::from_str(&self.config.protocols.join(", ")).map_err(error::builder)?;
            request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, offered);
        }
        Ok(request)
    }
}

#[async_trait]
impl Adapter for LibraryAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Library
    }

    fn state(&self) -> ReadyState {
        self.dispatcher.state().load()
    }

    async fn connect(&self) -> Result<Peer> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(error::builder("adapter already used, create a new one to reconnect"));
        }

        let url = self.config.parsed_url()?;
        let request = self.handshake_request(&url)?;
        let timeout = self.config.connect_timeout;
        tracing::debug!(target: "wireline::duplex", url = %url, ?timeout, "connecting");

        let signal = self.cancel.signal();
        let handshake = async {
            match race_with_timeout(tokio_tungstenite::connect_async(request), timeout).await {
                Ok(Ok(pair)) => Ok(pair),
                Ok(Err(e)) => Err(error::connect(e).with_url(url.clone())),
                Err(_) => {
                    tracing::debug!(target: "wireline::duplex", url = %url, "handshake timed out, socket dropped");
                    Err(error::connection_timeout(timeout).with_url(url.clone()))
                }
            }
        };
        let (socket, response) = match until_aborted(handshake, Some(&signal)).await {
            Ok(pair) => pair,
            Err(e) => {
                self.dispatcher.fail(&e);
                return Err(e);
            }
        };

        let protocol = response
            .headers()
            .get(SEC_WEBSOCKET_PROTOCOL)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let (commands, receiver) = mpsc::unbounded_channel();
        let peer = Peer::new(
            url,
            protocol,
            Arc::clone(self.dispatcher.state()),
            Box::new(LibraryLink { commands }),
        );

        if !self.dispatcher.open(&peer) {
            return Err(error::aborted());
        }
        *self.peer.lock().unwrap_or_else(PoisonError::into_inner) = Some(peer.clone());
        spawn(pump(socket, receiver, self.dispatcher.clone(), self.config.close_timeout));
        Ok(peer)
    }

    fn peer(&self) -> Option<Peer> {
        self.peer.lock().unwrap_or_else(PoisonError::into_inner).clone()
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

impl fmt::Debug for LibraryAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryAdapter")
            .field("url", &self.config.url)
            .field("state", &self.state())
            .field("peer", &self.peer())
            .finish()
    }
}

/// Owns the socket until the connection ends.
///
/// Once closing, outbound frames are dropped but `Terminate` is still
/// honored. A peer that does not finish the closing handshake within
/// `close_timeout` is dropped with an abnormal close.
async fn pump<S>(
    mut socket: WebSocketStream<S>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    dispatcher: Dispatcher,
    close_timeout: Duration,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut closing = false;
    let mut detached = false;
    let mut received_close: Option<CloseEvent> = None;
    let deadline = tokio::time::sleep(close_timeout);
    tokio::pin!(deadline);

    let failure: Option<Error> = loop {
        tokio::select! {
            command = commands.recv(), if !detached => {
                let close = match command {
                    Some(Command::Send(frame)) if !closing => {
                        if let Err(e) = socket.send(frame).await {
                            break Some(error::transport(e));
                        }
                        None
                    }
                    Some(Command::Close(code, reason)) if !closing => Some((code, reason)),
                    Some(Command::Send(_) | Command::Close(..)) => None,
                    Some(Command::Terminate) => {
                        tracing::debug!(target: "wireline::duplex", "terminated");
                        break None;
                    }
                    None => {
                        // Every handle to the peer is gone.
                        detached = true;
                        dispatcher.state().advance(ReadyState::Closing);
                        (!closing).then(|| (CloseEvent::GOING_AWAY, String::new()))
                    }
                };
                if let Some((code, reason)) = close {
                    closing = true;
                    deadline.as_mut().reset(tokio::time::Instant::now() + close_timeout);
                    let frame = CloseFrame { code: CloseCode::from(code), reason: reason.into() };
                    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
                        break Some(error::transport(e));
                    }
                }
            },
            () = &mut deadline, if closing => {
                tracing::debug!(
                    target: "wireline::duplex",
                    ?close_timeout,
                    "closing handshake timed out, dropping socket"
                );
                break None;
            },
            incoming = socket.next() => match incoming {
                Some(Ok(Message::Text(text))) => dispatcher.message(&DuplexMessage::text(text)),
                Some(Ok(Message::Binary(data))) => dispatcher.message(&DuplexMessage::binary(data)),
                Some(Ok(Message::Ping(payload))) => dispatcher.ping(&Bytes::from(payload)),
                Some(Ok(Message::Pong(payload))) => dispatcher.pong(&Bytes::from(payload)),
                Some(Ok(Message::Close(frame))) => {
                    dispatcher.state().advance(ReadyState::Closing);
                    if !closing {
                        closing = true;
                        deadline.as_mut().reset(tokio::time::Instant::now() + close_timeout);
                    }
                    received_close = Some(match frame {
                        Some(frame) => CloseEvent {
                            code: frame.code.into(),
                            reason: frame.reason.into_owned(),
                            was_clean: true,
                        },
                        None => CloseEvent {
                            code: CloseEvent::NO_STATUS,
                            reason: String::new(),
                            was_clean: true,
                        },
                    });
                }
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => break Some(error::transport(e)),
                None => break None,
            },
        }
    };

    if let Some(error) = &failure {
        dispatcher.error(error);
    }
    dispatcher.close(&received_close.unwrap_or_else(CloseEvent::abnormal));
}
