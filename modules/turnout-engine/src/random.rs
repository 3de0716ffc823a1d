//! Randomness seam for the tick simulator's call-update roll.

use rand::Rng;

pub trait RandomSource: Send + Sync {
    /// Uniform value in [0, 1).
    fn roll(&self) -> f64;
}

pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn roll(&self) -> f64 {
        rand::rng().random()
    }
}

/// Always returns the same value. Tests use 0.0 to force the roll to hit and
/// 1.0 to force it to miss.
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn roll(&self) -> f64 {
        self.0
    }
}
