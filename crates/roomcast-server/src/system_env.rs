//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` is the production implementation of the Environment trait using
//! the real wall clock and cryptographic RNG. Production behavior is therefore
//! non-deterministic; tests use the seeded harness environment instead.

use roomcast_core::env::Environment;

/// Production environment using the system clock and cryptographic RNG.
///
/// Randomness comes from getrandom, which provides OS-level cryptographic
/// entropy (e.g., /dev/urandom on Linux). Connection identities and socket
/// handles are drawn from it.
///
/// # Panics
///
/// Panics if the OS RNG fails or the system clock reads before the Unix
/// epoch. Both indicate OS-level breakage the server cannot operate under.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn wall_clock_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after Unix epoch (1970-01-01)")
            .as_millis() as u64
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - identities need entropy");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_clock_is_past_2020() {
        let env = SystemEnv::new();
        // 2020-01-01T00:00:00Z
        assert!(env.wall_clock_millis() > 1_577_836_800_000);
    }

    #[test]
    fn random_bytes_are_random() {
        let env = SystemEnv::new();

        let mut bytes1 = [0u8; 32];
        let mut bytes2 = [0u8; 32];
        env.random_bytes(&mut bytes1);
        env.random_bytes(&mut bytes2);

        // Extremely unlikely to be equal if random
        assert_ne!(bytes1, bytes2);
    }

    #[test]
    fn random_u64_draws_differ() {
        let env = SystemEnv::new();
        assert_ne!(env.random_u64(), env.random_u64());
    }
}
