//! The strategy abstraction every generator in this crate implements.
//!
//! A strategy draws values from a `ConjectureData` and knows how to propose
//! simpler versions of a value it produced. `minimize` runs the shrink-tree
//! search: try candidates in order, accept the first that still fails, and
//! start again from the accepted value.

use crate::data::ConjectureData;
use crate::dtypes::Dtype;
use crate::error::{ArrayError, Result};
use crate::shrinking::{greedy_minimize, ShrinkReport};
use std::fmt;

pub trait Strategy {
    type Value: Clone + fmt::Debug;

    fn draw(&self, data: &mut ConjectureData) -> Result<Self::Value>;

    /// Simpler variants of `value`, most aggressive first. Every candidate is
    /// a value this strategy could itself have drawn.
    fn shrink(&self, _value: &Self::Value) -> Box<dyn Iterator<Item = Self::Value> + '_> {
        Box::new(std::iter::empty())
    }

    /// Shrinks a failing `value` for as long as `still_fails` keeps holding,
    /// making at most `max_calls` predicate calls.
    fn minimize(
        &self,
        value: Self::Value,
        still_fails: &mut dyn FnMut(&Self::Value) -> bool,
        max_calls: usize,
    ) -> (Self::Value, ShrinkReport) {
        greedy_minimize(self, value, still_fails, max_calls)
    }

    /// A lazy sequence of draws. Example `i` is drawn from
    /// `example_seed(seed, i)`, so restarting with the same seed replays it.
    fn samples(&self, seed: u64) -> Samples<'_, Self>
    where
        Self: Sized,
    {
        Samples {
            strategy: self,
            seed,
            index: 0,
        }
    }

    fn example_with_seed(&self, seed: u64) -> Result<Self::Value> {
        self.draw(&mut ConjectureData::new(seed))
    }
}

/// Seed of the `index`-th example derived from `seed` (splitmix64).
pub fn example_seed(seed: u64, index: u64) -> u64 {
    let mut z = seed.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub struct Samples<'a, S: Strategy> {
    strategy: &'a S,
    seed: u64,
    index: u64,
}

impl<'a, S: Strategy> Samples<'a, S> {
    /// Seed of the example the next call to `next` will draw.
    pub fn next_seed(&self) -> u64 {
        example_seed(self.seed, self.index)
    }
}

impl<'a, S: Strategy> Iterator for Samples<'a, S> {
    type Item = Result<S::Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let seed = self.next_seed();
        self.index += 1;
        Some(self.strategy.example_with_seed(seed))
    }
}

#[derive(Debug, Clone)]
pub struct Just<T> {
    value: T,
}

impl<T> Just<T> {
    pub fn new(value: T) -> Self {
        Just { value }
    }
}

impl<T: Clone + fmt::Debug> Strategy for Just<T> {
    type Value = T;

    fn draw(&self, _data: &mut ConjectureData) -> Result<T> {
        Ok(self.value.clone())
    }
}

/// Uniform choice from a fixed list, shrinking towards earlier entries.
#[derive(Debug, Clone)]
pub struct SampledFrom<T> {
    values: Vec<T>,
}

impl<T: Clone + fmt::Debug + PartialEq> SampledFrom<T> {
    pub fn new(values: Vec<T>) -> Result<Self> {
        if values.is_empty() {
            return Err(ArrayError::configuration("cannot sample from an empty collection"));
        }
        Ok(SampledFrom { values })
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T: Clone + fmt::Debug + PartialEq> Strategy for SampledFrom<T> {
    type Value = T;

    fn draw(&self, data: &mut ConjectureData) -> Result<T> {
        Ok(data.choose(&self.values).clone())
    }

    fn shrink(&self, value: &T) -> Box<dyn Iterator<Item = T> + '_> {
        let position = self.values.iter().position(|v| v == value).unwrap_or(0);
        Box::new(self.values[..position].iter().cloned())
    }
}

/// Dtype strategies are plain samplers over catalog entries.
pub type DtypeStrategy = SampledFrom<Dtype>;
