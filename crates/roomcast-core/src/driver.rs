//! Room driver - sans-IO lifecycle handler and broadcast engine.
//!
//! The hosting runtime feeds the driver accepts, inbound frames, and closes;
//! the driver mutates its registry and returns [`RoomAction`]s for the runtime
//! to execute. The host guarantees serialized invocation per room instance, so
//! no locking guards the registry.

use roomcast_proto::{Envelope, Sender};

use crate::{
    env::Environment,
    record::ConnectionRecord,
    registry::{RoomRegistry, SocketId},
    upgrade::{NegotiationError, UpgradeRequest},
};

/// An inbound frame as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// A text frame.
    Text(String),
    /// A binary frame; decoded as UTF-8 with replacement, never fatally.
    Binary(Vec<u8>),
}

impl InboundFrame {
    /// Decode to message text. Malformed UTF-8 is replaced, not rejected.
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// Actions the driver asks the hosting runtime to execute.
///
/// Execution is best-effort: a failure delivering to one socket must not
/// affect any other action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomAction {
    /// Store `state` in the socket's durable attachment slot so the record
    /// survives instance suspension.
    Attach {
        /// Socket whose slot to write.
        socket: SocketId,
        /// Encoded connection record.
        state: Vec<u8>,
    },

    /// Deliver a serialized envelope to one socket, fire-and-forget.
    Deliver {
        /// Recipient socket.
        socket: SocketId,
        /// The envelope text, identical for every recipient of one fan-out.
        frame: String,
    },

    /// Finalize a socket close with the given code and reason.
    Close {
        /// Socket being closed.
        socket: SocketId,
        /// Close code reported by or relayed to the peer.
        code: u16,
        /// Close reason, possibly empty.
        reason: String,
    },
}

/// Lifecycle handler and broadcast engine for one room instance.
///
/// Owns the room's [`RoomRegistry`] exclusively. Constructed fresh via
/// [`RoomDriver::new`] or from a suspended instance's surviving sockets via
/// [`RoomDriver::resume`].
#[derive(Debug)]
pub struct RoomDriver<E: Environment> {
    registry: RoomRegistry,
    env: E,
}

impl<E: Environment> RoomDriver<E> {
    /// Create a driver for a cold-started instance with no members.
    pub fn new(env: E) -> Self {
        Self {
            registry: RoomRegistry::new(),
            env,
        }
    }

    /// Reconstruct a driver from the runtime's live-socket report.
    ///
    /// Each socket the runtime still considers open is paired with the bytes
    /// of its attachment slot, if any. Decodable attachments restore the
    /// connection's identity; a missing or corrupt attachment keeps the socket
    /// tracked with unknown identity rather than dropping it, so broadcasts
    /// still reach it.
    pub fn resume<'a, I>(env: E, live: I) -> Self
    where
        I: IntoIterator<Item = (SocketId, Option<&'a [u8]>)>,
    {
        let mut registry = RoomRegistry::new();
        registry.rebuild(live.into_iter().map(|(socket, attachment)| {
            let record = match attachment.map(ConnectionRecord::from_attachment) {
                Some(Ok(record)) => Some(record),
                Some(Err(error)) => {
                    tracing::warn!(%socket, %error, "attachment recovery failed");
                    None
                }
                None => {
                    tracing::debug!(%socket, "live socket has no attachment");
                    None
                }
            };
            (socket, record)
        }));

        Self { registry, env }
    }

    /// Accept a new connection.
    ///
    /// Negotiates the upgrade first; a rejected request has no side effects.
    /// On success a fresh identity is generated, its record registered for
    /// `socket`, and a [`RoomAction::Attach`] returned so the runtime
    /// persists the record before completing the upgrade.
    pub fn accept(
        &mut self,
        socket: SocketId,
        request: &UpgradeRequest<'_>,
    ) -> Result<Vec<RoomAction>, NegotiationError> {
        request.negotiate()?;

        let record = ConnectionRecord::generate(&self.env);
        let state = record.attachment_bytes();
        tracing::debug!(%socket, identity = %record.identity(), "connection accepted");
        self.registry.register(socket, record);

        Ok(vec![RoomAction::Attach { socket, state }])
    }

    /// Relay an inbound frame to every member of the room, origin included.
    ///
    /// The sender tag comes from the registry; an origin that is not tracked
    /// or whose identity was never recovered is tagged `"unknown"`. One
    /// envelope is serialized and delivered verbatim to each member. Delivery
    /// failures are the runtime's to swallow per recipient - nothing here can
    /// fail.
    pub fn on_message(&self, origin: SocketId, frame: InboundFrame) -> Vec<RoomAction> {
        let text = frame.into_text();
        let from = Sender::from(self.registry.record(origin).map(ConnectionRecord::identity));
        let envelope = Envelope::message(from, text, self.env.wall_clock_millis());
        let frame = envelope.to_json();

        // Copy the membership before fanning out so delivery stays untangled
        // from any registry mutation the executing runtime interleaves.
        let recipients: Vec<SocketId> = self.registry.sockets().collect();
        tracing::trace!(%origin, recipients = recipients.len(), "broadcasting message");

        recipients
            .into_iter()
            .map(|socket| RoomAction::Deliver {
                socket,
                frame: frame.clone(),
            })
            .collect()
    }

    /// Handle a socket close reported by either end.
    ///
    /// Deregisters unconditionally - closing an untracked socket is a no-op,
    /// never an error - and always finalizes with the given code and reason.
    /// Teardown is terminal; there is no retry.
    pub fn on_close(
        &mut self,
        socket: SocketId,
        code: u16,
        reason: &str,
        was_clean: bool,
    ) -> Vec<RoomAction> {
        let removed = self.registry.deregister(socket);
        tracing::debug!(%socket, code, reason, was_clean, removed, "socket closed");

        vec![RoomAction::Close {
            socket,
            code,
            reason: reason.to_owned(),
        }]
    }

    /// The room's registry.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Number of currently tracked connections.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }
}
