//! End-to-end relay tests over real WebSocket connections.
//!
//! Boots the server on an ephemeral port and drives it with tokio-tungstenite
//! clients: fan-out with sender echo, room isolation, negotiation rejections,
//! lossy binary decoding, and identity survival across hibernation.

use std::{net::SocketAddr, time::Duration};

use futures::{SinkExt, StreamExt};
use roomcast_proto::{Envelope, MessageKind, Sender};
use roomcast_server::{RuntimeConfig, Server};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn boot(config: RuntimeConfig) -> SocketAddr {
    let server = Server::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    drop(tokio::spawn(server.run()));
    addr
}

async fn boot_default() -> SocketAddr {
    boot(RuntimeConfig {
        bind_address: "127.0.0.1:0".to_owned(),
        ..RuntimeConfig::default()
    })
    .await
}

async fn connect(addr: SocketAddr, room: &str) -> WsStream {
    let (ws, response) = connect_async(format!("ws://{addr}/rooms/{room}"))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 101);
    ws
}

async fn recv_envelope(ws: &mut WsStream) -> Envelope {
    loop {
        let message = timeout(RECV_TIMEOUT, ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        match message {
            Message::Text(text) => return Envelope::from_json(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => {}
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

#[tokio::test]
async fn message_is_relayed_to_every_member_including_sender() {
    let addr = boot_default().await;
    let mut alice = connect(addr, "lobby").await;
    let mut bob = connect(addr, "lobby").await;

    alice
        .send(Message::Text("hello room".into()))
        .await
        .unwrap();

    let to_alice = recv_envelope(&mut alice).await;
    let to_bob = recv_envelope(&mut bob).await;

    assert_eq!(to_alice, to_bob);
    assert_eq!(to_alice.kind, MessageKind::Message);
    assert_eq!(to_alice.message, "hello room");
    assert!(matches!(to_alice.from, Sender::Known(_)));
    assert!(to_alice.timestamp > 0);
}

#[tokio::test]
async fn distinct_senders_get_distinct_tags() {
    let addr = boot_default().await;
    let mut alice = connect(addr, "tags").await;
    let mut bob = connect(addr, "tags").await;

    alice.send(Message::Text("from alice".into())).await.unwrap();
    let first = recv_envelope(&mut alice).await;
    let _ = recv_envelope(&mut bob).await;

    bob.send(Message::Text("from bob".into())).await.unwrap();
    let second = recv_envelope(&mut alice).await;

    assert_ne!(first.from, second.from);
}

#[tokio::test]
async fn rooms_are_isolated() {
    let addr = boot_default().await;
    let mut alice = connect(addr, "red").await;
    let mut bob = connect(addr, "blue").await;

    alice.send(Message::Text("red only".into())).await.unwrap();

    let echo = recv_envelope(&mut alice).await;
    assert_eq!(echo.message, "red only");

    let leaked = timeout(Duration::from_millis(300), bob.next()).await;
    assert!(leaked.is_err(), "message crossed rooms: {leaked:?}");
}

#[tokio::test]
async fn missing_upgrade_header_is_rejected_with_426() {
    let addr = boot_default().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{addr}/rooms/lobby"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 426);
    assert_eq!(response.text().await.unwrap(), "Expected Upgrade: websocket");
}

#[tokio::test]
async fn wrong_method_is_rejected_with_405() {
    let addr = boot_default().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/rooms/lobby"))
        .header("Upgrade", "websocket")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 405);
    assert_eq!(response.text().await.unwrap(), "Expected GET");
}

#[tokio::test]
async fn binary_frames_are_decoded_lossily() {
    let addr = boot_default().await;
    let mut alice = connect(addr, "binary").await;

    alice
        .send(Message::Binary(vec![b'h', b'i', 0xFF].into()))
        .await
        .unwrap();

    let envelope = recv_envelope(&mut alice).await;
    assert_eq!(envelope.message, "hi\u{FFFD}");
}

#[tokio::test]
async fn hibernation_preserves_sender_identity() {
    let addr = boot(RuntimeConfig {
        bind_address: "127.0.0.1:0".to_owned(),
        hibernate_after: Duration::from_millis(150),
        ..RuntimeConfig::default()
    })
    .await;
    let mut alice = connect(addr, "attic").await;

    alice.send(Message::Text("one".into())).await.unwrap();
    let first = recv_envelope(&mut alice).await;

    // Long enough for the idle room instance to hibernate; the socket and its
    // attachment survive, the in-memory registry does not.
    tokio::time::sleep(Duration::from_millis(600)).await;

    alice.send(Message::Text("two".into())).await.unwrap();
    let second = recv_envelope(&mut alice).await;

    assert!(matches!(second.from, Sender::Known(_)));
    assert_eq!(first.from, second.from);
}

#[tokio::test]
async fn departed_member_no_longer_blocks_broadcasts() {
    let addr = boot_default().await;
    let mut alice = connect(addr, "hall").await;
    let mut bob = connect(addr, "hall").await;

    bob.close(None).await.unwrap();
    // Let the close reach the room before broadcasting.
    tokio::time::sleep(Duration::from_millis(200)).await;

    alice.send(Message::Text("still here".into())).await.unwrap();
    let envelope = recv_envelope(&mut alice).await;
    assert_eq!(envelope.message, "still here");
}

#[tokio::test]
async fn reconnecting_gets_a_fresh_identity() {
    let addr = boot_default().await;
    let mut alice = connect(addr, "revolving-door").await;

    alice.send(Message::Text("first life".into())).await.unwrap();
    let first = recv_envelope(&mut alice).await;
    alice.close(None).await.unwrap();

    let mut alice = connect(addr, "revolving-door").await;
    alice.send(Message::Text("second life".into())).await.unwrap();
    let second = recv_envelope(&mut alice).await;

    assert_ne!(first.from, second.from);
}
