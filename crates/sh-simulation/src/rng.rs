//! Deterministic random sources.
//!
//! The economy draws every random number through [`RandomSource`], so a
//! run is reproducible from its seed and tests can script exact draws.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{SimError, SimResult};

/// A sequential stream of floats in `[0, 1)`.
pub trait RandomSource: std::fmt::Debug {
    /// Next value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Next value mapped linearly into `[min, max)`.
    fn next_in(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }
}

/// Seeded pseudo-random source backed by [`StdRng`].
#[derive(Debug, Clone)]
pub struct SeededRng {
    seed: u64,
    inner: StdRng,
}

impl SeededRng {
    /// A generator seeded from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// The seed this generator was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRng {
    fn next_f64(&mut self) -> f64 {
        self.inner.random::<f64>()
    }
}

/// Replays a fixed list of values, cycling when it runs out.
///
/// Used to script exact draws in tests.
#[derive(Debug, Clone)]
pub struct ReplayRng {
    values: Vec<f64>,
    cursor: usize,
}

impl ReplayRng {
    /// A source replaying `values`. Fails when the list is empty or holds
    /// anything outside `[0, 1)`.
    pub fn new(values: Vec<f64>) -> SimResult<Self> {
        if values.is_empty() {
            return Err(SimError::RngUnavailable(
                "replay sequence is empty".to_string(),
            ));
        }
        if let Some(bad) = values.iter().find(|v| !(0.0..1.0).contains(*v)) {
            return Err(SimError::RngUnavailable(format!(
                "replay value {bad} is outside [0, 1)"
            )));
        }
        Ok(Self { values, cursor: 0 })
    }

    /// A source that always returns `value`.
    pub fn constant(value: f64) -> SimResult<Self> {
        Self::new(vec![value])
    }

    /// How many values have been drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ReplayRng {
    fn next_f64(&mut self) -> f64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}
