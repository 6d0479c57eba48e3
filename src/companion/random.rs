//! # Random Source
//!
//! Greeting selection, mock transcription and mock vitals all draw from a
//! [`RandomSource`]. Production code uses the thread-local RNG (or a seeded
//! `StdRng` when `companion.random_seed` is configured); tests plug in a fixed
//! value so the choice becomes predictable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// A source of uniform floats in `[0, 1)`.
///
/// Everything random in the service is derived from this single primitive,
/// which keeps test doubles trivial.
pub trait RandomSource: Send + Sync + fmt::Debug {
    fn next_unit(&self) -> f64;
}

/// Uses `rand::thread_rng()` on every call.
#[derive(Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible sequence from a fixed seed.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&self) -> f64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen::<f64>()
    }
}

/// Build the random source described by the configuration.
pub fn from_seed(seed: Option<u64>) -> Arc<dyn RandomSource> {
    match seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(ThreadRandom),
    }
}

/// Pick one element uniformly, `floor(u * len)`.
///
/// Returns `None` only for an empty slice.
pub fn choose<'a, T>(random: &dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let index = (random.next_unit() * items.len() as f64) as usize;
    items.get(index.min(items.len() - 1))
}

/// Integer in `[base, base + span)`, `base + floor(u * span)`.
pub fn int_in(random: &dyn RandomSource, base: u32, span: u32) -> u32 {
    let offset = (random.next_unit() * span as f64) as u32;
    base + offset.min(span.saturating_sub(1))
}

/// Always returns the same unit value. Test-only.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

#[cfg(test)]
impl RandomSource for FixedRandom {
    fn next_unit(&self) -> f64 {
        self.0
    }
}
