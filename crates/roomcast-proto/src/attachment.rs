//! Durable per-socket attachment payload.

use serde::{Deserialize, Serialize};

use crate::{errors::ProtocolError, identity::ConnectionId};

/// State attached to the server half of a socket so it survives the room
/// instance being torn down and later reconstructed.
///
/// The attachment slot belongs to the socket, not to the room instance: the
/// registry holds a lookup, this payload is the source of truth. Written once
/// at accept time, read back during resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Identity assigned when the connection was first accepted.
    pub id: ConnectionId,
}

impl Attachment {
    /// Create an attachment for a freshly assigned identity.
    pub fn new(id: ConnectionId) -> Self {
        Self { id }
    }

    /// Encode to the stored byte form.
    pub fn encode(&self) -> Vec<u8> {
        #[allow(clippy::expect_used)]
        serde_json::to_vec(self).expect("invariant: attachment serialization is infallible")
    }

    /// Decode from stored bytes.
    ///
    /// Failure is recoverable: the caller keeps the socket and treats its
    /// identity as unknown.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        serde_json::from_slice(bytes).map_err(ProtocolError::MalformedAttachment)
    }
}
