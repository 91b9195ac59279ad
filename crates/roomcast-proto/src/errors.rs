//! Protocol error types.

/// Errors produced while encoding or decoding wire payloads.
///
/// None of these are fatal to a room: a malformed attachment downgrades the
/// connection to an unknown sender tag, and envelope parse failures only occur
/// on the consuming side (clients, tests).
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Attachment bytes did not parse as a connection attachment.
    #[error("malformed attachment: {0}")]
    MalformedAttachment(#[source] serde_json::Error),

    /// Envelope text did not parse as a broadcast envelope.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    /// A connection id string was neither a UUID nor the unknown tag.
    #[error("invalid connection id: {0}")]
    InvalidConnectionId(#[source] uuid::Error),
}
