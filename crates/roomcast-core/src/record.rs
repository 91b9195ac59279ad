//! Per-connection record bound to a live socket.

use roomcast_proto::{Attachment, ConnectionId, ProtocolError};

use crate::env::Environment;

/// Value object binding a durable identity to one accepted connection.
///
/// Created at accept time and exported to the socket's attachment slot so it
/// survives the room instance being torn down. The registry holds a lookup of
/// records; the attachment slot is the source of truth across a resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionRecord {
    identity: ConnectionId,
}

impl ConnectionRecord {
    /// Create a record with a freshly generated identity.
    pub fn generate<E: Environment>(env: &E) -> Self {
        Self {
            identity: ConnectionId::from_random_bytes(env.random_id_bytes()),
        }
    }

    /// Identity assigned to this connection.
    pub fn identity(&self) -> ConnectionId {
        self.identity
    }

    /// Byte form for the socket's durable attachment slot.
    pub fn attachment_bytes(&self) -> Vec<u8> {
        Attachment::new(self.identity).encode()
    }

    /// Recover a record from attachment bytes read back after a resume.
    pub fn from_attachment(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Attachment::decode(bytes).map(|attachment| Self {
            identity: attachment.id,
        })
    }
}
