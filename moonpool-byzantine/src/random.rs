//! Seeded random sources for scenario generation.
//!
//! Scenario generation must be a pure function of the random source's call
//! sequence, so everything that draws randomness goes through the
//! [`RandomSource`] trait. [`SimRandom`] is the default implementation: a
//! ChaCha8 generator seeded from a `u64`, the same generator the simulation
//! runtime uses, so a seed reproduces an entire generation.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniformly distributed integers.
///
/// Implement this for scripted sources in tests or to plug an external
/// generator into [`ScenarioGenerator`](crate::ScenarioGenerator).
pub trait RandomSource {
    /// Draw a value uniformly in `[0, bound)`.
    ///
    /// `bound` must be non-zero.
    fn random_below(&mut self, bound: u32) -> u32;

    /// Draw a value uniformly over the whole `i32` range.
    fn random_i32(&mut self) -> i32;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn random_below(&mut self, bound: u32) -> u32 {
        (**self).random_below(bound)
    }

    fn random_i32(&mut self) -> i32 {
        (**self).random_i32()
    }
}

/// Deterministic random source backed by [`ChaCha8Rng`].
///
/// The same seed always produces the same sequence. Calls are counted so a
/// diverging replay can be located.
#[derive(Debug, Clone)]
pub struct SimRandom {
    rng: ChaCha8Rng,
    seed: u64,
    calls: u64,
}

impl SimRandom {
    /// Create a source seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            calls: 0,
        }
    }

    /// The seed this source was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of values drawn since creation.
    pub fn call_count(&self) -> u64 {
        self.calls
    }
}

impl RandomSource for SimRandom {
    fn random_below(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0, "random_below requires a non-zero bound");
        self.calls += 1;
        self.rng.random_range(0..bound)
    }

    fn random_i32(&mut self) -> i32 {
        self.calls += 1;
        self.rng.random()
    }
}

/// Replays a fixed list of draws; panics once the script runs out.
#[cfg(test)]
pub(crate) struct ScriptedRandom(std::collections::VecDeque<u32>);

#[cfg(test)]
impl ScriptedRandom {
    pub(crate) fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self(values.into_iter().collect())
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn random_below(&mut self, bound: u32) -> u32 {
        let value = self.0.pop_front().expect("script exhausted");
        assert!(value < bound, "scripted {value} outside [0, {bound})");
        value
    }

    fn random_i32(&mut self) -> i32 {
        self.0.pop_front().expect("script exhausted") as i32
    }
}
