//! Per-room actor: serialized command processing with hibernation.
//!
//! Every room runs as one tokio task owning two things: the socket table
//! (outbound channels plus durable attachment bytes, playing the part of the
//! hosting runtime's socket layer) and an optional [`RoomDriver`]. Commands
//! are processed strictly in order, which gives the driver its serialized,
//! non-overlapping callback guarantee without any locking.
//!
//! After sitting idle for the configured duration the actor drops the driver
//! while the socket table lives on - the in-memory registry is gone but the
//! connections are not. The next command rebuilds the driver from the socket
//! table via [`RoomDriver::resume`], recovering each identity from its
//! attachment bytes. An idle room with no sockets retires completely; the
//! router creates a fresh actor on next use.

use std::{collections::HashMap, time::Duration};

use roomcast_core::{
    InboundFrame, NegotiationError, RoomAction, RoomDriver, SocketId, UpgradeRequest,
    env::Environment,
};
use tokio::sync::{mpsc, oneshot};

/// Frames the actor pushes toward one socket's session task.
#[derive(Debug)]
pub(crate) enum Outbound {
    /// A serialized envelope to forward as a text frame.
    Frame(String),
    /// Finalize the close with the given code and reason.
    Close {
        /// Close code to relay.
        code: u16,
        /// Close reason, possibly empty.
        reason: String,
    },
}

/// Commands delivered to a room actor.
enum RoomCommand {
    /// Negotiate and register a new connection.
    Accept {
        socket: SocketId,
        method: String,
        upgrade: Option<String>,
        outbound: mpsc::Sender<Outbound>,
        done: oneshot::Sender<Result<(), NegotiationError>>,
    },
    /// An inbound frame from a connected socket.
    Message { socket: SocketId, frame: InboundFrame },
    /// The runtime reports a socket closing (either end).
    Close {
        socket: SocketId,
        code: u16,
        reason: String,
        was_clean: bool,
    },
}

/// Cloneable handle for sending commands to a room actor.
#[derive(Clone)]
pub(crate) struct RoomHandle {
    name: String,
    tx: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    /// Ask the room to accept a connection.
    ///
    /// Returns `None` if the actor retired before answering; the caller
    /// should resolve the room again or fail the request.
    pub(crate) async fn accept(
        &self,
        socket: SocketId,
        method: String,
        upgrade: Option<String>,
        outbound: mpsc::Sender<Outbound>,
    ) -> Option<Result<(), NegotiationError>> {
        let (done, result) = oneshot::channel();
        let command = RoomCommand::Accept {
            socket,
            method,
            upgrade,
            outbound,
            done,
        };
        if self.tx.send(command).is_err() {
            return None;
        }
        result.await.ok()
    }

    /// Relay an inbound frame. Fire-and-forget.
    pub(crate) fn message(&self, socket: SocketId, frame: InboundFrame) {
        let command = RoomCommand::Message { socket, frame };
        if self.tx.send(command).is_err() {
            tracing::debug!(room = %self.name, %socket, "message for retired room dropped");
        }
    }

    /// Report a socket closing. Fire-and-forget, idempotent at the room.
    pub(crate) fn close(&self, socket: SocketId, code: u16, reason: String, was_clean: bool) {
        let command = RoomCommand::Close {
            socket,
            code,
            reason,
            was_clean,
        };
        let _ = self.tx.send(command);
    }

    /// Whether the actor behind this handle has stopped.
    pub(crate) fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Socket-table entry: the runtime-owned half of one connection.
struct SocketEntry {
    outbound: mpsc::Sender<Outbound>,
    attachment: Option<Vec<u8>>,
}

/// The actor task state for one room.
pub(crate) struct RoomActor<E: Environment> {
    name: String,
    env: E,
    hibernate_after: Duration,
    driver: Option<RoomDriver<E>>,
    sockets: HashMap<SocketId, SocketEntry>,
    rx: mpsc::UnboundedReceiver<RoomCommand>,
}

impl<E: Environment> RoomActor<E> {
    /// Spawn the actor task for a room and return its handle.
    pub(crate) fn spawn(name: String, env: E, hibernate_after: Duration) -> RoomHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = RoomHandle {
            name: name.clone(),
            tx,
        };
        let actor = Self {
            name,
            env,
            hibernate_after,
            driver: None,
            sockets: HashMap::new(),
            rx,
        };
        drop(tokio::spawn(actor.run()));
        handle
    }

    async fn run(mut self) {
        loop {
            let command = if self.driver.is_some() {
                match tokio::time::timeout(self.hibernate_after, self.rx.recv()).await {
                    Ok(command) => command,
                    Err(_) => {
                        if self.hibernate() {
                            continue;
                        }
                        break;
                    }
                }
            } else {
                self.rx.recv().await
            };

            let Some(command) = command else { break };
            self.handle(command);
        }
        tracing::debug!(room = %self.name, "room actor stopped");
    }

    /// Drop the driver, keeping sockets. Returns false when the room is empty
    /// and the actor should retire instead.
    fn hibernate(&mut self) -> bool {
        self.driver = None;
        if self.sockets.is_empty() {
            tracing::debug!(room = %self.name, "empty room retired");
            false
        } else {
            tracing::debug!(room = %self.name, sockets = self.sockets.len(), "room hibernated");
            true
        }
    }

    /// Ensure a live driver, rebuilding from the socket table after
    /// hibernation.
    fn wake(&mut self) -> &mut RoomDriver<E> {
        let driver = match self.driver.take() {
            Some(driver) => driver,
            None => self.build_driver(),
        };
        self.driver.insert(driver)
    }

    fn build_driver(&self) -> RoomDriver<E> {
        if self.sockets.is_empty() {
            tracing::debug!(room = %self.name, "room instance cold started");
            return RoomDriver::new(self.env.clone());
        }

        let driver = RoomDriver::resume(
            self.env.clone(),
            self.sockets
                .iter()
                .map(|(socket, entry)| (*socket, entry.attachment.as_deref())),
        );
        tracing::debug!(
            room = %self.name,
            restored = driver.connection_count(),
            "room instance resumed"
        );
        driver
    }

    fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Accept {
                socket,
                method,
                upgrade,
                outbound,
                done,
            } => {
                let request = UpgradeRequest::new(&method, upgrade.as_deref());
                match self.wake().accept(socket, &request) {
                    Ok(actions) => {
                        let _ = self.sockets.insert(
                            socket,
                            SocketEntry {
                                outbound,
                                attachment: None,
                            },
                        );
                        self.execute(actions);
                        let _ = done.send(Ok(()));
                    }
                    Err(error) => {
                        let _ = done.send(Err(error));
                    }
                }
            }

            RoomCommand::Message { socket, frame } => {
                let actions = self.wake().on_message(socket, frame);
                self.execute(actions);
            }

            RoomCommand::Close {
                socket,
                code,
                reason,
                was_clean,
            } => {
                let actions = self.wake().on_close(socket, code, &reason, was_clean);
                self.execute(actions);
            }
        }
    }

    fn execute(&mut self, actions: Vec<RoomAction>) {
        let mut stale: Vec<SocketId> = Vec::new();

        for action in actions {
            match action {
                RoomAction::Attach { socket, state } => {
                    if let Some(entry) = self.sockets.get_mut(&socket) {
                        entry.attachment = Some(state);
                    }
                }

                RoomAction::Deliver { socket, frame } => {
                    let Some(entry) = self.sockets.get(&socket) else {
                        continue;
                    };
                    match entry.outbound.try_send(Outbound::Frame(frame)) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            tracing::debug!(room = %self.name, %socket, "send queue full, frame dropped");
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            stale.push(socket);
                        }
                    }
                }

                RoomAction::Close {
                    socket,
                    code,
                    reason,
                } => {
                    if let Some(entry) = self.sockets.remove(&socket) {
                        let _ = entry.outbound.try_send(Outbound::Close { code, reason });
                    }
                }
            }
        }

        // A recipient whose session vanished without a close callback: prune
        // it now instead of waiting for a callback that may never arrive.
        for socket in stale {
            tracing::debug!(room = %self.name, %socket, "pruning unreachable socket");
            let _ = self.sockets.remove(&socket);
            if let Some(driver) = self.driver.as_mut() {
                let _ = driver.on_close(socket, 1006, "send channel closed", false);
            }
        }
    }
}
