//! Runtime configuration.

use std::time::Duration;

/// Configuration for the relay server runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:8787").
    pub bind_address: String,

    /// Idle time before a room instance hibernates.
    ///
    /// Hibernation drops the in-memory registry while sockets stay open; the
    /// next event rebuilds it from per-socket attachments. A room with no
    /// sockets is retired entirely instead.
    pub hibernate_after: Duration,

    /// Per-connection outbound queue capacity.
    ///
    /// Delivery never blocks the room: frames for a full queue are dropped.
    pub send_queue: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8787".to_owned(),
            hibernate_after: Duration::from_secs(60),
            send_queue: 256,
        }
    }
}
