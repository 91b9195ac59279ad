//! Connection registry for one room instance.
//!
//! The registry maps live socket handles to their connection records. It is a
//! lookup, not the source of truth: records also live in each socket's durable
//! attachment slot, which is what lets the registry be rebuilt after the
//! hosting runtime resumes a suspended instance.
//!
//! Invariants: at most one entry per socket, and every entry corresponds to a
//! socket the runtime currently reports open. Iteration order is unspecified.

use std::{collections::HashMap, fmt};

use crate::record::ConnectionRecord;

/// Handle naming one live socket.
///
/// Assigned by the hosting runtime at upgrade time, process-local, and opaque
/// to clients. The registry never interprets the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(u64);

impl SocketId {
    /// Wrap a runtime-assigned handle.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The underlying handle value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry of live sockets for one room instance.
///
/// An entry with `None` marks a socket that is tracked but whose identity
/// could not be recovered (missing or corrupt attachment after a resume).
/// Such sockets still receive every broadcast; only their sender tag degrades.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    entries: HashMap<SocketId, Option<ConnectionRecord>>,
}

impl RoomRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for a socket. O(1), infallible.
    pub fn register(&mut self, socket: SocketId, record: ConnectionRecord) {
        let _ = self.entries.insert(socket, Some(record));
    }

    /// Track a socket whose identity could not be recovered.
    pub fn track_unresolved(&mut self, socket: SocketId) {
        let _ = self.entries.insert(socket, None);
    }

    /// Remove a socket's entry.
    ///
    /// Returns whether an entry was present. Removing an absent socket is a
    /// no-op, so close handling stays idempotent.
    pub fn deregister(&mut self, socket: SocketId) -> bool {
        self.entries.remove(&socket).is_some()
    }

    /// Replace the whole membership from the runtime's live-socket report.
    ///
    /// Invoked once per instance (re)initialization. Any previous contents are
    /// discarded, so the result is exactly the live set regardless of prior
    /// state. A `None` record keeps the socket tracked with unknown identity.
    pub fn rebuild<I>(&mut self, live: I)
    where
        I: IntoIterator<Item = (SocketId, Option<ConnectionRecord>)>,
    {
        self.entries.clear();
        self.entries.extend(live);
    }

    /// Record for a socket, if present and resolved.
    pub fn record(&self, socket: SocketId) -> Option<&ConnectionRecord> {
        self.entries.get(&socket).and_then(Option::as_ref)
    }

    /// Whether a socket is tracked (resolved or not).
    pub fn contains(&self, socket: SocketId) -> bool {
        self.entries.contains_key(&socket)
    }

    /// All tracked sockets with their records. Order is unspecified.
    pub fn members(&self) -> impl Iterator<Item = (SocketId, Option<&ConnectionRecord>)> {
        self.entries
            .iter()
            .map(|(socket, record)| (*socket, record.as_ref()))
    }

    /// All tracked socket handles. Order is unspecified.
    pub fn sockets(&self) -> impl Iterator<Item = SocketId> + '_ {
        self.entries.keys().copied()
    }

    /// Number of tracked sockets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the room currently has no members.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
