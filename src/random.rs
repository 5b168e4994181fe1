//! Randomness handed to schemes at construction time.

use rand::distributions::uniform::SampleUniform;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{HashingError, Result};

/// Seedable random source plus the scale that maps continuous radii onto the
/// integer grid.
///
/// Two schemes built from sources with the same seed, scale and call sequence
/// are identical.
#[derive(Clone, Debug)]
pub struct RandomSource {
    rng: ChaCha8Rng,
    scale: f64,
}

impl RandomSource {
    pub fn from_seed(seed: u64, scale: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            scale,
        }
    }

    pub fn from_entropy(scale: f64) -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
            scale,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Uniform draw from the inclusive range `[low, high]`.
    pub fn rand_range<V>(&mut self, low: V, high: V) -> V
    where
        V: SampleUniform + PartialOrd,
    {
        self.rng.gen_range(low..=high)
    }
}

/// Parses a seed written as hexadecimal digits, e.g. `60042651f648e052`.
pub fn parse_seed(text: &str) -> Result<u64> {
    let digits = text.trim().trim_start_matches("0x");
    u64::from_str_radix(digits, 16)
        .map_err(|e| HashingError::InvalidArgument(format!("seed {text:?}: {e}")))
}
