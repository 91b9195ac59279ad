//! Opaque per-connection identity tokens.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ProtocolError;

/// Opaque token identifying one accepted connection.
///
/// Generated once at accept time and immutable afterwards. The token only
/// labels outgoing envelopes with a sender tag; it never authenticates
/// anything and is never used for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Build an identity from 16 random bytes.
    ///
    /// The bytes are shaped into a version-4 UUID so the textual form is
    /// conventional, but uniqueness is the only property relied upon. Callers
    /// supply the randomness so identity generation stays deterministic under
    /// a seeded environment.
    pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Parse the canonical hyphenated form.
    pub fn parse(s: &str) -> Result<Self, ProtocolError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(ProtocolError::InvalidConnectionId)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_from_bytes_is_stable() {
        let bytes = [7u8; 16];
        let a = ConnectionId::from_random_bytes(bytes);
        let b = ConnectionId::from_random_bytes(bytes);
        assert_eq!(a, b);
    }

    #[test]
    fn display_round_trips_through_parse() {
        let id = ConnectionId::from_random_bytes([42u8; 16]);
        let parsed = ConnectionId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(ConnectionId::parse("not-a-uuid").is_err());
    }
}
