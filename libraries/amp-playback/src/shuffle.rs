//! Random track selection for shuffle mode

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Picks the next index for a shuffle jump
#[derive(Debug, Clone)]
pub struct ShufflePicker {
    rng: StdRng,
}

impl ShufflePicker {
    /// Create a picker, deterministic when `seed` is given
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Uniformly random index in `0..len` other than `current`
    ///
    /// With a single track there is no other index, so `current` comes back
    /// unchanged. Draws from the `len - 1` other slots directly instead of
    /// re-rolling until the result differs.
    pub fn pick_other(&mut self, current: usize, len: usize) -> usize {
        if len <= 1 {
            return current.min(len.saturating_sub(1));
        }

        let draw = self.rng.gen_range(0..len - 1);
        if draw >= current {
            draw + 1
        } else {
            draw
        }
    }

    /// Uniformly random index in `0..len` that is neither `current` nor in
    /// `excluded`
    ///
    /// Returns `None` when no such index exists.
    pub fn pick_other_excluding(
        &mut self,
        current: usize,
        len: usize,
        excluded: &HashSet<usize>,
    ) -> Option<usize> {
        if excluded.is_empty() {
            return (len > 1).then(|| self.pick_other(current, len));
        }

        let candidates = || (0..len).filter(|i| *i != current && !excluded.contains(i));
        let count = candidates().count();
        if count == 0 {
            return None;
        }
        candidates().nth(self.rng.gen_range(0..count))
    }
}

impl Default for ShufflePicker {
    fn default() -> Self {
        Self::new(None)
    }
}
