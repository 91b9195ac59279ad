//! Environment abstraction for deterministic testing.
//!
//! Decouples room logic from system resources (wall clock, randomness).
//! Production uses the real clock and OS RNG; tests use a seeded RNG and a
//! settable virtual clock so envelope timestamps and generated identities are
//! reproducible.

/// Abstract environment providing wall-clock time and randomness.
///
/// # Invariants
///
/// Implementations MUST guarantee:
///
/// - `wall_clock_millis()` never goes backwards within one execution context
/// - `random_bytes()` uses cryptographically secure entropy in production
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time as milliseconds since the Unix epoch.
    ///
    /// Stamped onto every broadcast envelope.
    fn wall_clock_millis(&self) -> u64;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    ///
    /// Convenience for socket handles and similar runtime-assigned ids.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Generates 16 random bytes.
    ///
    /// Convenience for connection identity generation.
    fn random_id_bytes(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        bytes
    }
}
