//! Per-socket session: pumps frames between one WebSocket and its room.

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::{SinkExt, StreamExt, stream::SplitStream};
use roomcast_core::{InboundFrame, SocketId};
use tokio::sync::mpsc;

use crate::room::{Outbound, RoomHandle};

/// Close code used when the peer vanished without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

/// Close code reported when the peer closed without a status code.
const NO_STATUS_RECEIVED: u16 = 1005;

/// How long to wait for the outbound forwarder to drain after close.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Run one connected socket until it closes.
///
/// Splits the socket: a forwarder task drains the room's outbound queue into
/// the sink, while this task maps inbound frames to room commands. When the
/// stream ends, the room is told to close the socket with whatever code and
/// reason the peer supplied; the room answers by dropping the outbound
/// channel, which lets the forwarder finish.
pub(crate) async fn run(
    socket: WebSocket,
    socket_id: SocketId,
    room: RoomHandle,
    mut outbound_rx: mpsc::Receiver<Outbound>,
) {
    let (mut sink, mut stream) = socket.split();

    let mut forwarder = tokio::spawn(async move {
        while let Some(outbound) = outbound_rx.recv().await {
            match outbound {
                Outbound::Frame(text) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Outbound::Close { code, reason } => {
                    // Reserved codes (1005/1006) must not go on the wire.
                    let frame = (code != NO_STATUS_RECEIVED && code != ABNORMAL_CLOSURE)
                        .then(|| CloseFrame {
                            code,
                            reason: reason.into(),
                        });
                    let _ = sink.send(Message::Close(frame)).await;
                    break;
                }
            }
        }
    });

    let (code, reason, was_clean) = inbound_loop(&mut stream, socket_id, &room).await;
    room.close(socket_id, code, reason, was_clean);

    if tokio::time::timeout(CLOSE_GRACE, &mut forwarder).await.is_err() {
        forwarder.abort();
    }
}

async fn inbound_loop(
    stream: &mut SplitStream<WebSocket>,
    socket_id: SocketId,
    room: &RoomHandle,
) -> (u16, String, bool) {
    while let Some(received) = stream.next().await {
        match received {
            Ok(Message::Text(text)) => {
                room.message(socket_id, InboundFrame::Text(text.as_str().to_owned()));
            }
            Ok(Message::Binary(bytes)) => {
                room.message(socket_id, InboundFrame::Binary(bytes.to_vec()));
            }
            Ok(Message::Close(Some(frame))) => {
                return (frame.code, frame.reason.as_str().to_owned(), true);
            }
            Ok(Message::Close(None)) => {
                return (NO_STATUS_RECEIVED, String::new(), true);
            }
            // The transport layer answers pings itself.
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(error) => {
                tracing::debug!(socket = %socket_id, %error, "socket errored");
                return (ABNORMAL_CLOSURE, String::new(), false);
            }
        }
    }

    (ABNORMAL_CLOSURE, String::new(), false)
}
