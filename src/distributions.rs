// General distribution helpers shared by the shape, element and array samplers.
// `Repeat` decides how many items a collection gets; `biased_coin` is the
// single weighted decision everything else is built from.

use crate::data::ConjectureData;

pub fn biased_coin(data: &mut ConjectureData, p: f64) -> bool {
    data.draw_boolean(p)
}

/// Draws a count in `[min_count, max_count]` one decision at a time, with the
/// expected count tending towards `expected_count`.
#[derive(Debug, Clone)]
pub struct Repeat {
    min_count: u64,
    max_count: u64,
    p_continue: f64,

    current_count: u64,
    rejections: u64,
}

impl Repeat {
    pub fn new(min_count: u64, max_count: u64, expected_count: f64) -> Repeat {
        let expected = expected_count.max(min_count as f64);
        Repeat {
            min_count,
            max_count,
            p_continue: 1.0 - 1.0 / (1.0 + expected),
            current_count: 0,
            rejections: 0,
        }
    }

    /// Undoes the last accepted item, e.g. because it duplicated an earlier one.
    pub fn reject(&mut self) {
        assert!(self.current_count > 0);
        self.current_count -= 1;
        self.rejections += 1;
    }

    pub fn count(&self) -> u64 {
        self.current_count
    }

    pub fn rejections(&self) -> u64 {
        self.rejections
    }

    pub fn should_continue(&mut self, data: &mut ConjectureData) -> bool {
        if self.min_count == self.max_count {
            if self.current_count < self.max_count {
                self.current_count += 1;
                return true;
            } else {
                return false;
            }
        } else if self.current_count < self.min_count {
            self.current_count += 1;
            return true;
        } else if self.current_count >= self.max_count {
            return false;
        }

        let result = data.draw_boolean(self.p_continue);
        if result {
            self.current_count += 1;
        }
        result
    }
}
