//! Dice service.
//!
//! Every probabilistic decision in combat (hit rolls, on-hit effect procs,
//! encounter draws, reward amounts) goes through a [`DiceRoller`]. The
//! production roller owns a single generator that is seeded once and shared
//! behind a mutex; tests swap in [`crate::testing::ScriptedDice`] to force
//! specific outcomes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Size of the roll space used to turn a probability into a threshold.
pub const CHANCE_ROLL_SPACE: i64 = 100;

/// Source of uniform random integers.
pub trait DiceRoller: Send + Sync {
    /// Draw uniformly from the closed interval `[low, high]`.
    ///
    /// Only called with `low < high`; bound normalization lives in
    /// [`DiceRoller::inclusive_roll`].
    fn roll_range(&self, low: i64, high: i64) -> i64;

    /// Inclusive roll that accepts its bounds in either order.
    fn inclusive_roll(&self, min: i64, max: i64) -> i64 {
        let (low, high) = if min > max { (max, min) } else { (min, max) };
        if low == high {
            return low;
        }
        self.roll_range(low, high)
    }

    /// Percentage check: `chance` is a probability, unclamped on both sides.
    ///
    /// Anything at or below zero (or NaN) always fails and anything at or
    /// above one always succeeds without consuming a roll.
    fn action_succeeds(&self, chance: f64) -> bool {
        if chance.is_nan() || chance <= 0.0 {
            return false;
        }
        if chance >= 1.0 {
            return true;
        }
        let threshold = (chance * CHANCE_ROLL_SPACE as f64).floor() as i64;
        let roll = self.inclusive_roll(0, CHANCE_ROLL_SPACE);
        let success = roll <= threshold;
        tracing::debug!(chance, threshold, roll, success, "chance roll");
        success
    }
}

/// Generator-backed dice, safe to share across request handlers.
pub struct Dice {
    rng: Mutex<StdRng>,
}

impl Dice {
    /// Seed from OS entropy. Call once per process.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Fixed seed, for reproducible runs and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for Dice {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl DiceRoller for Dice {
    fn roll_range(&self, low: i64, high: i64) -> i64 {
        // A panic mid-draw cannot leave the generator in a torn state.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(low..=high)
    }
}
