//! Room name resolution.
//!
//! Maps each room name to exactly one live actor, creating actors lazily on
//! first use. Retired actors (rooms that emptied out and hibernated away) are
//! replaced transparently, so a name always resolves to a working instance.

use std::{collections::HashMap, time::Duration};

use roomcast_core::env::Environment;
use tokio::sync::RwLock;

use crate::room::{RoomActor, RoomHandle};

/// Name-to-actor routing table.
pub(crate) struct RoomMap<E: Environment> {
    env: E,
    hibernate_after: Duration,
    rooms: RwLock<HashMap<String, RoomHandle>>,
}

impl<E: Environment> RoomMap<E> {
    /// Create an empty routing table.
    pub(crate) fn new(env: E, hibernate_after: Duration) -> Self {
        Self {
            env,
            hibernate_after,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a room name to its single live actor, spawning one if needed.
    pub(crate) async fn resolve(&self, name: &str) -> RoomHandle {
        if let Some(handle) = self.rooms.read().await.get(name) {
            if !handle.is_closed() {
                return handle.clone();
            }
        }

        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, handle| !handle.is_closed());
        if let Some(handle) = rooms.get(name) {
            return handle.clone();
        }

        tracing::debug!(room = name, "creating room instance");
        let handle = RoomActor::spawn(name.to_owned(), self.env.clone(), self.hibernate_after);
        let _ = rooms.insert(name.to_owned(), handle.clone());
        handle
    }
}
