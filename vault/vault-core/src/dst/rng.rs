//! DeterministicRng - Seeded Randomness
//!
//! TigerStyle: Every random decision in a simulation comes from one seeded
//! ChaCha stream, and the seed is logged so a failing run can be replayed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::constants::DST_SEED_ENV_VAR;

/// A reproducible random number generator.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    seed: u64,
    rng: ChaCha8Rng,
}

impl DeterministicRng {
    /// Create a generator from an explicit seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Use `DST_SEED` if set and parseable, otherwise `default_seed`.
    #[must_use]
    pub fn from_env_or(default_seed: u64) -> Self {
        let seed = std::env::var(DST_SEED_ENV_VAR)
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(default_seed);
        tracing::info!(seed, "DST seed");
        Self::new(seed)
    }

    /// Seed this generator was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return true with the given probability.
    ///
    /// # Panics
    /// Panics if `probability` is outside `0.0..=1.0`.
    pub fn next_bool(&mut self, probability: f64) -> bool {
        // Precondition
        assert!(
            (0.0..=1.0).contains(&probability),
            "probability {} out of range",
            probability
        );

        self.rng.gen_bool(probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = DeterministicRng::new(42);
        let mut b = DeterministicRng::new(42);

        for _ in 0..100 {
            assert_eq!(a.next_bool(0.5), b.next_bool(0.5));
        }
    }

    #[test]
    fn test_probability_bounds() {
        let mut rng = DeterministicRng::new(7);

        for _ in 0..100 {
            assert!(!rng.next_bool(0.0));
            assert!(rng.next_bool(1.0));
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_probability_out_of_range() {
        let mut rng = DeterministicRng::new(7);
        rng.next_bool(1.5);
    }
}
