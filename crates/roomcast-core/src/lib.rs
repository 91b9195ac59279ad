//! Sans-IO room logic for the roomcast broadcast relay.
//!
//! A room is a named, isolated broadcast domain: every message received from
//! one member is fanned out to every member, sender included. This crate holds
//! the room's entire decision logic with no I/O attached:
//!
//! - [`RoomDriver`]: lifecycle handler and broadcast engine. The hosting
//!   runtime feeds it accepts, messages, and closes; it returns
//!   [`RoomAction`]s for the runtime to execute.
//! - [`RoomRegistry`]: the live mapping from socket handles to connection
//!   records for one room instance.
//! - [`Environment`]: time and randomness abstraction so the same logic runs
//!   under a seeded simulation or the real system clock.
//!
//! # Suspension and resume
//!
//! The hosting runtime may tear down a room instance between messages while
//! keeping its sockets open. Nothing in this crate is durable across that
//! boundary; instead each accepted connection's record is exported as an
//! attachment ([`RoomAction::Attach`]) that the runtime stores against the
//! socket. [`RoomDriver::resume`] reconstructs the registry from the runtime's
//! live-socket report plus those attachments. A socket whose attachment is
//! missing or corrupt stays tracked with an unknown identity - it keeps
//! receiving broadcasts.
//!
//! # Concurrency
//!
//! The driver assumes serialized invocation: the host never overlaps two
//! callbacks for the same room instance, so no locking guards the registry.
//! Distinct rooms share nothing.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;
pub mod env;
mod record;
mod registry;
mod upgrade;

pub use driver::{InboundFrame, RoomAction, RoomDriver};
pub use record::ConnectionRecord;
pub use registry::{RoomRegistry, SocketId};
pub use upgrade::{NegotiationError, UpgradeRequest};
