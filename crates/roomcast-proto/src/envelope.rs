//! Broadcast envelope pushed to every room member.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{errors::ProtocolError, identity::ConnectionId};

/// Sender tag carried in an envelope.
///
/// Identity can be unknown when the origin socket was never resolved, for
/// example after a resume where the attachment failed to decode. The message
/// still broadcasts; only the tag degrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    /// Resolved identity of the origin connection.
    Known(ConnectionId),
    /// Identity could not be resolved; serializes as the literal `"unknown"`.
    Unknown,
}

/// Wire form of an unresolved sender.
const UNKNOWN_TAG: &str = "unknown";

impl From<Option<ConnectionId>> for Sender {
    fn from(identity: Option<ConnectionId>) -> Self {
        identity.map_or(Self::Unknown, Self::Known)
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(id) => write!(f, "{id}"),
            Self::Unknown => f.write_str(UNKNOWN_TAG),
        }
    }
}

impl Serialize for Sender {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Sender {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        if tag == UNKNOWN_TAG {
            return Ok(Self::Unknown);
        }
        ConnectionId::parse(&tag)
            .map(Self::Known)
            .map_err(de::Error::custom)
    }
}

/// Type tag of a server-to-client payload.
///
/// Only one kind exists today; the tag keeps the wire format extensible
/// without breaking existing clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// A relayed chat message.
    Message,
}

/// The payload fanned out to every member of a room, origin included.
///
/// Built fresh for each inbound message and serialized exactly once; every
/// recipient receives the identical bytes. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Payload type tag.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Sender tag: a connection id or `"unknown"`.
    pub from: Sender,
    /// The relayed message text, verbatim.
    pub message: String,
    /// Server wall-clock time in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl Envelope {
    /// Build a message envelope.
    pub fn message(from: Sender, message: impl Into<String>, timestamp: u64) -> Self {
        Self {
            kind: MessageKind::Message,
            from,
            message: message.into(),
            timestamp,
        }
    }

    /// Serialize to the JSON text frame sent to clients.
    pub fn to_json(&self) -> String {
        #[allow(clippy::expect_used)]
        serde_json::to_string(self).expect("invariant: envelope serialization is infallible")
    }

    /// Parse a received text frame.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::MalformedEnvelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> ConnectionId {
        ConnectionId::from_random_bytes([byte; 16])
    }

    #[test]
    fn wire_form_uses_expected_field_names() {
        let envelope = Envelope::message(Sender::Known(id(3)), "hi", 1_700_000_000_123);
        let value: serde_json::Value = serde_json::from_str(&envelope.to_json()).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["from"], id(3).to_string());
        assert_eq!(value["message"], "hi");
        assert_eq!(value["timestamp"], 1_700_000_000_123u64);
    }

    #[test]
    fn unresolved_sender_serializes_as_unknown() {
        let envelope = Envelope::message(Sender::Unknown, "hi", 1);
        let value: serde_json::Value = serde_json::from_str(&envelope.to_json()).unwrap();
        assert_eq!(value["from"], "unknown");
    }

    #[test]
    fn json_round_trip_preserves_sender() {
        for from in [Sender::Known(id(8)), Sender::Unknown] {
            let envelope = Envelope::message(from, "payload", 42);
            let parsed = Envelope::from_json(&envelope.to_json()).unwrap();
            assert_eq!(envelope, parsed);
        }
    }

    #[test]
    fn sender_from_option() {
        assert_eq!(Sender::from(None), Sender::Unknown);
        assert_eq!(Sender::from(Some(id(5))), Sender::Known(id(5)));
    }

    #[test]
    fn parse_rejects_non_envelope_text() {
        assert!(Envelope::from_json("raw chat line").is_err());
    }
}
