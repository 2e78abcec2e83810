//! Injectable randomness for rolls.
//!
//! Each engine owns its own [`RollSource`]. Production engines use
//! [`SeededRolls`], a ChaCha8 stream derived from the world seed and the
//! family, so a fixed seed replays the exact same success/failure sequence.
//! Tests can substitute a scripted source.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skilling_types::ActivityFamily;

/// Source of roll values.
pub trait RollSource: Send {
    /// Uniform draw from `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Uniform draw from `min..=max`. Returns `min` when `max <= min`.
    fn between(&mut self, min: u32, max: u32) -> u32;
}

/// Deterministic ChaCha8-backed roll source.
#[derive(Debug, Clone)]
pub struct SeededRolls {
    rng: ChaCha8Rng,
}

impl SeededRolls {
    /// Create a stream from a raw seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Create the stream an engine of `family` uses under `world_seed`.
    pub fn for_family(world_seed: u64, family: ActivityFamily) -> Self {
        Self::new(world_seed ^ family.seed_salt())
    }
}

impl RollSource for SeededRolls {
    fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn between(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        self.rng.random_range(min..=max)
    }
}
