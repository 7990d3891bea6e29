//! # ConjectureData: per-test-case draw source
//!
//! Every strategy draws its randomness through a `ConjectureData`. It wraps a
//! ChaCha8 generator seeded from a single `u64`, so any drawn value can be
//! reproduced exactly by re-running the strategy against a fresh
//! `ConjectureData` built from the same seed.
//!
//! ```rust
//! use conjecture_arrays::data::ConjectureData;
//!
//! let mut data = ConjectureData::new(42);
//! let side = data.draw_integer(0, 5);
//! let keep = data.draw_boolean(0.25);
//! assert!((0..=5).contains(&side));
//! # let _ = keep;
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct ConjectureData {
    seed: u64,
    rng: ChaCha8Rng,
    draws: u64,
}

impl ConjectureData {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// The seed this data was created from; replaying it reproduces every draw.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of primitive draws made so far.
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    /// Returns `true` with probability `p`. Probabilities outside [0, 1] are clamped.
    pub fn draw_boolean(&mut self, p: f64) -> bool {
        self.draws += 1;
        if p <= 0.0 || p.is_nan() {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.rng.gen::<f64>() < p
    }

    /// Uniform integer in the inclusive range `[min, max]`.
    ///
    /// Callers validate ranges up front, so an inverted range is a bug.
    pub fn draw_integer(&mut self, min: i128, max: i128) -> i128 {
        debug_assert!(min <= max, "draw_integer({}, {})", min, max);
        self.draws += 1;
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Uniform `u128` in `[0, bound)`. `bound` must be non-zero.
    pub fn draw_below(&mut self, bound: u128) -> u128 {
        debug_assert!(bound > 0);
        self.draws += 1;
        if bound <= 1 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }

    /// Uniform index into a collection of `len` items.
    pub fn draw_index(&mut self, len: usize) -> usize {
        self.draw_below(len as u128) as usize
    }

    /// Uniform side length in `[min, max]`.
    pub fn draw_usize(&mut self, min: usize, max: usize) -> usize {
        self.draw_integer(min as i128, max as i128) as usize
    }

    /// The low `n` bits of a fresh random word.
    pub fn draw_bits(&mut self, n: u32) -> u64 {
        self.draws += 1;
        let word: u64 = self.rng.gen();
        if n >= 64 {
            word
        } else {
            word & ((1u64 << n) - 1)
        }
    }

    /// Uniform float in `[0, 1)`.
    pub fn draw_unit(&mut self) -> f64 {
        self.draws += 1;
        self.rng.gen::<f64>()
    }

    /// Picks one element of a non-empty slice uniformly.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        debug_assert!(!items.is_empty());
        &items[self.draw_index(items.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_replays_same_draws() {
        let mut a = ConjectureData::new(7);
        let mut b = ConjectureData::new(7);
        for _ in 0..100 {
            assert_eq!(a.draw_integer(-1000, 1000), b.draw_integer(-1000, 1000));
            assert_eq!(a.draw_bits(13), b.draw_bits(13));
        }
        assert_eq!(a.draw_count(), 200);
    }

    #[test]
    fn test_draw_boolean_edge_probabilities() {
        let mut data = ConjectureData::new(0);
        for _ in 0..100 {
            assert!(!data.draw_boolean(0.0));
            assert!(data.draw_boolean(1.0));
            assert!(!data.draw_boolean(-0.5));
            assert!(data.draw_boolean(1.5));
        }
    }

    #[test]
    fn test_draw_integer_respects_bounds() {
        let mut data = ConjectureData::new(3);
        for _ in 0..1000 {
            let v = data.draw_integer(-3, 4);
            assert!((-3..=4).contains(&v));
        }
        assert_eq!(data.draw_integer(5, 5), 5);
        let wide = data.draw_integer(i64::MIN as i128, u64::MAX as i128);
        assert!(wide >= i64::MIN as i128 && wide <= u64::MAX as i128);
    }

    #[test]
    fn test_draw_bits_masks() {
        let mut data = ConjectureData::new(11);
        for _ in 0..100 {
            assert!(data.draw_bits(3) < 8);
        }
    }
}
