//! Wire types for the roomcast broadcast relay.
//!
//! Everything a room sends or persists crosses this crate:
//!
//! - [`Envelope`]: the JSON payload pushed to every room member on each
//!   inbound message. Built fresh per message, never stored.
//! - [`Attachment`]: the durable per-socket payload written at accept time and
//!   read back when a room instance is reconstructed after hibernation.
//! - [`ConnectionId`] / [`Sender`]: the opaque identity token and the sender
//!   tag it becomes on the wire.
//!
//! Payloads are JSON because the client consumes them directly; there is no
//! binary framing layer. Headers and transport negotiation live with the
//! server, not here.
//!
//! # Invariants
//!
//! - An [`Envelope`] always carries the literal type tag `"message"`.
//! - [`Attachment`] round-trips: `decode(encode(a)) == a`.
//! - A [`Sender`] serializes to either a canonical UUID string or the literal
//!   `"unknown"`, never anything else.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod attachment;
mod envelope;
mod errors;
mod identity;

pub use attachment::Attachment;
pub use envelope::{Envelope, MessageKind, Sender};
pub use errors::ProtocolError;
pub use identity::ConnectionId;
