//! Deterministic Xorshift64 PRNG used for scene population.
//!
//! Body placement must be replayable from a configured seed, so the scene
//! uses this small integer generator instead of an OS-seeded one. The same
//! seed yields the same sequence on every platform.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Xorshift64 generator with shifts (13, 7, 17).
///
/// A seed of 0 is a fixed point of the algorithm and is replaced by a
/// non-zero fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const FALLBACK_SEED: u64 = 0x5EED_F3_44_F1_D0;

    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }

    /// Advances the state and returns the next 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform f64 in [0, 1) from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform f64 in [min, max).
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Uniform point inside the origin-centred cube of side `side`, each
    /// axis drawn from `[-side / 2, side / 2)` in x, y, z order.
    pub fn next_in_cube(&mut self, side: f64) -> DVec3 {
        let half = side * 0.5;
        let x = self.next_range(-half, half);
        let y = self.next_range(-half, half);
        let z = self.next_range(-half, half);
        DVec3::new(x, y, z)
    }
}
