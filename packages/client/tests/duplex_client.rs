#![cfg(all(feature = "library-transport", not(target_arch = "wasm32")))]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use wireline_client::duplex::{Handler, HookEvent};
use wireline_client::runtime::CapabilityReport;
use wireline_client::{CloseEvent, DuplexClient, DuplexConfig, ReadyState};

/// Echo server that counts accepted connections.
async fn echo_server() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let Ok(mut socket) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(message)) = socket.next().await {
                    match message {
                        Message::Text(_) | Message::Binary(_) => {
                            if socket.send(message).await.is_err() {
                                break;
                            }
                        }
                        // Close replies are sent by tungstenite; keep reading
                        // until the handshake completes.
                        _ => {}
                    }
                }
            });
        }
    });

    (addr, accepted)
}

/// Server that completes the handshake and then never reads again.
async fn stalled_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _socket = tokio_tungstenite::accept_async(stream).await;
                futures::future::pending::<()>().await;
            });
        }
    });
    addr
}

fn close_codes(client: &DuplexClient) -> Arc<Mutex<Vec<u16>>> {
    let codes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&codes);
    client.on_close(move |event| sink.lock().unwrap().push(event.code));
    codes
}

async fn wait_for_close(codes: &Arc<Mutex<Vec<u16>>>, within: Duration) -> u16 {
    tokio::time::timeout(within, async {
        loop {
            if let Some(code) = codes.lock().unwrap().first().copied() {
                return code;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("close hook did not fire")
}

fn config(addr: SocketAddr) -> DuplexConfig {
    DuplexConfig::new(format!("ws://{addr}/")).connect_timeout(Duration::from_secs(5))
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("channel closed")
}

#[tokio::test]
async fn test_concurrent_connects_share_one_attempt() {
    let (addr, accepted) = echo_server().await;
    let client = DuplexClient::new(config(addr));

    let (a, b) = tokio::join!(client.connect(), client.connect());
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.id(), b.id());

    let again = client.connect().await.unwrap();
    assert_eq!(again.id(), a.id());
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_messages_echo_through_hooks() {
    let (addr, _) = echo_server().await;
    let client = DuplexClient::new(config(addr));
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.on_message(move |message| {
        let _ = tx.send(message.as_text().unwrap_or("<binary>").to_owned());
    });

    client.connect().await.unwrap();
    client.send_text("hello").unwrap();
    assert_eq!(recv(&mut rx).await, "hello");

    client.send_json(&serde_json::json!({"n": 1})).unwrap();
    assert_eq!(recv(&mut rx).await, r#"{"n":1}"#);
}

#[tokio::test]
async fn test_close_then_reconnect_yields_new_peer() {
    let (addr, accepted) = echo_server().await;
    let client = DuplexClient::new(config(addr));
    let closes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&closes);
    client.on_close(move |event| sink.lock().unwrap().push(event.code));

    let first = client.connect().await.unwrap();
    client.close(CloseEvent::NORMAL, "done");
    assert!(client.send_text("late").unwrap_err().is_not_connected());
    assert!(first.send_text("late").unwrap_err().is_not_connected());
    assert!(client.peer().is_none());

    let second = client.connect().await.unwrap();
    assert_ne!(first.id(), second.id());
    client.send_text("again").unwrap();
    assert_eq!(accepted.load(Ordering::SeqCst), 2);

    tokio::time::timeout(Duration::from_secs(5), async {
        while closes.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(closes.lock().unwrap()[0], CloseEvent::NORMAL);
}

#[tokio::test]
async fn test_no_transport_fails_before_io() {
    let (addr, accepted) = echo_server().await;
    let client = DuplexClient::new(config(addr).capabilities(CapabilityReport::unknown()));

    let err = client.connect().await.unwrap_err();
    assert!(err.is_no_transport());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_hook_replacement_applies_to_next_event() {
    let (addr, _) = echo_server().await;
    let client = DuplexClient::new(config(addr));
    let (first_tx, mut first_rx) = mpsc::unbounded_channel();
    let (second_tx, mut second_rx) = mpsc::unbounded_channel();

    client.on(Handler::message(move |m| {
        let _ = first_tx.send(m.as_text().unwrap().to_owned());
    }));
    client.connect().await.unwrap();
    client.send_text("one").unwrap();
    assert_eq!(recv(&mut first_rx).await, "one");

    client.on(Handler::message(move |m| {
        let _ = second_tx.send(m.as_text().unwrap().to_owned());
    }));
    client.send_text("two").unwrap();
    assert_eq!(recv(&mut second_rx).await, "two");
    assert!(first_rx.try_recv().is_err());

    client.off(HookEvent::Message);
    client.send_text("three").unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(second_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_silent_server_times_out_connect() {
    // Accepts TCP but never answers the handshake.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let errors = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&errors);
    let client = DuplexClient::new(
        DuplexConfig::new(format!("ws://{addr}/")).connect_timeout(Duration::from_millis(100)),
    );
    client.on_error(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let err = client.connect().await.unwrap_err();
    assert!(err.is_connection_timeout(), "{err:?}");
    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_server_close_reaches_close_hook() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();
            let frame = tokio_tungstenite::tungstenite::protocol::CloseFrame {
                code: 4000u16.into(),
                reason: "bye".into(),
            };
            let _ = socket.close(Some(frame)).await;
            while socket.next().await.is_some() {}
        }
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = DuplexClient::new(config(addr));
    client.on_close(move |event| {
        let _ = tx.send(format!("{}:{}:{}", event.code, event.reason, event.was_clean));
    });

    client.connect().await.unwrap();
    assert_eq!(recv(&mut rx).await, "4000:bye:true");
    assert!(!client.is_connected());
    assert!(client.send_text("x").unwrap_err().is_not_connected());
}

#[tokio::test]
async fn test_ping_is_answered_with_pong() {
    let (addr, _) = echo_server().await;
    let client = DuplexClient::new(config(addr));
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.on(Handler::pong(move |payload| {
        let _ = tx.send(String::from_utf8_lossy(payload).into_owned());
    }));

    let peer = client.connect().await.unwrap();
    peer.ping(&b"are-you-there"[..]).unwrap();
    assert_eq!(recv(&mut rx).await, "are-you-there");
}

#[tokio::test]
async fn test_terminate_while_closing_tears_down() {
    let addr = stalled_server().await;
    let client = DuplexClient::new(config(addr));
    let codes = close_codes(&client);

    let peer = client.connect().await.unwrap();
    peer.close(CloseEvent::NORMAL, "bye");
    assert_eq!(peer.state(), ReadyState::Closing);
    peer.terminate();

    assert_eq!(wait_for_close(&codes, Duration::from_secs(1)).await, CloseEvent::ABNORMAL);
    assert_eq!(peer.state(), ReadyState::Closed);
    assert_eq!(codes.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unanswered_close_times_out() {
    let addr = stalled_server().await;
    let client = DuplexClient::new(config(addr).close_timeout(Duration::from_millis(200)));
    let codes = close_codes(&client);

    let peer = client.connect().await.unwrap();
    client.close(CloseEvent::NORMAL, "bye");

    assert_eq!(wait_for_close(&codes, Duration::from_secs(3)).await, CloseEvent::ABNORMAL);
    assert_eq!(peer.state(), ReadyState::Closed);
}
