// IEEE 754 helpers for 16, 32 and 64-bit floats.
//
// All element values are carried as `f64`; a `FloatWidth` says which narrower
// format a value must be exactly representable in. Sampling works on the
// "ordinal" of a float: a signed integer that orders every non-NaN value of a
// width (including -0.0 < +0.0 and the infinities) so that each contiguous
// range of ordinals is a contiguous range of floats.

use half::f16;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FloatWidth {
    Width16,
    Width32,
    Width64,
}

impl FloatWidth {
    pub fn from_bits(bits: u32) -> Option<FloatWidth> {
        match bits {
            16 => Some(FloatWidth::Width16),
            32 => Some(FloatWidth::Width32),
            64 => Some(FloatWidth::Width64),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            FloatWidth::Width16 => 16,
            FloatWidth::Width32 => 32,
            FloatWidth::Width64 => 64,
        }
    }

    pub fn exponent_bits(self) -> u32 {
        match self {
            FloatWidth::Width16 => 5,
            FloatWidth::Width32 => 8,
            FloatWidth::Width64 => 11,
        }
    }

    pub fn mantissa_bits(self) -> u32 {
        match self {
            FloatWidth::Width16 => 10,
            FloatWidth::Width32 => 23,
            FloatWidth::Width64 => 52,
        }
    }

    pub fn max_exponent(self) -> u64 {
        (1 << self.exponent_bits()) - 1
    }

    pub fn mantissa_mask(self) -> u64 {
        (1u64 << self.mantissa_bits()) - 1
    }

    fn sign_mask(self) -> u64 {
        1u64 << (self.bits() - 1)
    }

    /// Largest finite value.
    pub fn max_value(self) -> f64 {
        match self {
            FloatWidth::Width16 => f16::MAX.to_f64(),
            FloatWidth::Width32 => f32::MAX as f64,
            FloatWidth::Width64 => f64::MAX,
        }
    }

    /// Smallest positive normal value.
    pub fn min_positive_normal(self) -> f64 {
        match self {
            FloatWidth::Width16 => f16::MIN_POSITIVE.to_f64(),
            FloatWidth::Width32 => f32::MIN_POSITIVE as f64,
            FloatWidth::Width64 => f64::MIN_POSITIVE,
        }
    }

    /// Smallest positive subnormal value.
    pub fn min_positive_subnormal(self) -> f64 {
        self.from_raw(1)
    }

    pub fn epsilon(self) -> f64 {
        match self {
            FloatWidth::Width16 => f16::EPSILON.to_f64(),
            FloatWidth::Width32 => f32::EPSILON as f64,
            FloatWidth::Width64 => f64::EPSILON,
        }
    }

    /// Raw bit pattern of `value` in this width. `value` should already be
    /// representable; anything else is rounded to nearest first.
    pub fn to_raw(self, value: f64) -> u64 {
        match self {
            FloatWidth::Width16 => f16::from_f64(value).to_bits() as u64,
            FloatWidth::Width32 => (value as f32).to_bits() as u64,
            FloatWidth::Width64 => value.to_bits(),
        }
    }

    pub fn from_raw(self, raw: u64) -> f64 {
        match self {
            FloatWidth::Width16 => f16::from_bits(raw as u16).to_f64(),
            FloatWidth::Width32 => f32::from_bits(raw as u32) as f64,
            FloatWidth::Width64 => f64::from_bits(raw),
        }
    }

    /// Rounds `value` to the nearest value of this width.
    pub fn round(self, value: f64) -> f64 {
        self.from_raw(self.to_raw(value))
    }

    /// Whether `value` survives a round trip through this width bit for bit
    /// (NaN always does).
    pub fn is_representable(self, value: f64) -> bool {
        if value.is_nan() {
            return true;
        }
        let rounded = self.round(value);
        rounded == value && rounded.is_sign_negative() == value.is_sign_negative()
    }

    pub fn is_subnormal(self, value: f64) -> bool {
        value != 0.0 && value.is_finite() && value.abs() < self.min_positive_normal()
    }

    /// Ordinal of a non-NaN value. Monotonic: `a < b` (with -0.0 < +0.0)
    /// implies `to_ordinal(a) < to_ordinal(b)`.
    pub fn to_ordinal(self, value: f64) -> i128 {
        debug_assert!(!value.is_nan());
        let raw = self.to_raw(value);
        let magnitude = (raw & !self.sign_mask()) as i128;
        if raw & self.sign_mask() != 0 {
            -magnitude - 1
        } else {
            magnitude
        }
    }

    pub fn from_ordinal(self, ordinal: i128) -> f64 {
        if ordinal >= 0 {
            self.from_raw(ordinal as u64)
        } else {
            self.from_raw(self.sign_mask() | (-ordinal - 1) as u64)
        }
    }

    /// Ordinal of positive infinity; the largest finite value sits just below.
    pub fn infinity_ordinal(self) -> i128 {
        (self.max_exponent() << self.mantissa_bits()) as i128
    }

    /// Ordinal of the largest positive subnormal.
    pub fn max_subnormal_ordinal(self) -> i128 {
        self.mantissa_mask() as i128
    }

    /// The next representable value above `value` (towards +inf).
    pub fn next_up(self, value: f64) -> f64 {
        if value.is_nan() || value == f64::INFINITY {
            return value;
        }
        if value == 0.0 && value.is_sign_negative() {
            // -0.0 and +0.0 are adjacent ordinals but compare equal
            return self.min_positive_subnormal();
        }
        self.from_ordinal(self.to_ordinal(value) + 1)
    }

    pub fn next_down(self, value: f64) -> f64 {
        -self.next_up(-value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTHS: [FloatWidth; 3] = [FloatWidth::Width16, FloatWidth::Width32, FloatWidth::Width64];

    #[test]
    fn test_width_constants() {
        assert_eq!(FloatWidth::Width16.max_value(), 65504.0);
        assert_eq!(FloatWidth::Width32.min_positive_subnormal(), 2f64.powi(-149));
        assert_eq!(FloatWidth::Width64.min_positive_subnormal(), 5e-324);
        assert_eq!(FloatWidth::Width16.min_positive_normal(), 2f64.powi(-14));
        assert_eq!(FloatWidth::from_bits(32), Some(FloatWidth::Width32));
        assert_eq!(FloatWidth::from_bits(8), None);
    }

    #[test]
    fn test_ordinals_are_monotonic() {
        for width in WIDTHS {
            let values = [
                f64::NEG_INFINITY,
                -width.max_value(),
                -1.0,
                -width.min_positive_subnormal(),
                -0.0,
                0.0,
                width.min_positive_subnormal(),
                width.min_positive_normal(),
                1.0,
                width.max_value(),
                f64::INFINITY,
            ];
            let ordinals: Vec<i128> = values.iter().map(|v| width.to_ordinal(*v)).collect();
            for pair in ordinals.windows(2) {
                assert!(pair[0] < pair[1], "{:?} not increasing for {:?}", pair, width);
            }
            assert_eq!(width.to_ordinal(-0.0), -1);
            assert_eq!(width.to_ordinal(0.0), 0);
            assert_eq!(width.to_ordinal(f64::INFINITY), width.infinity_ordinal());
        }
    }

    #[test]
    fn test_ordinal_round_trip_preserves_sign() {
        for width in WIDTHS {
            for ordinal in [-5, -1, 0, 1, 5, width.infinity_ordinal() - 1] {
                let value = width.from_ordinal(ordinal);
                assert_eq!(width.to_ordinal(value), ordinal);
            }
            assert!(width.from_ordinal(-1).is_sign_negative());
        }
    }

    #[test]
    fn test_representability() {
        assert!(FloatWidth::Width32.is_representable(0.5));
        assert!(!FloatWidth::Width32.is_representable(0.1));
        assert!(FloatWidth::Width64.is_representable(0.1));
        assert!(!FloatWidth::Width16.is_representable(65505.0));
        assert!(FloatWidth::Width16.is_representable(f64::NAN));
        assert!(FloatWidth::Width16.is_representable(-0.0));
    }

    #[test]
    fn test_subnormals() {
        let w = FloatWidth::Width32;
        assert!(w.is_subnormal(w.min_positive_subnormal()));
        assert!(!w.is_subnormal(w.min_positive_normal()));
        assert!(!w.is_subnormal(0.0));
        assert_eq!(
            w.from_ordinal(w.max_subnormal_ordinal() + 1),
            w.min_positive_normal()
        );
    }

    #[test]
    fn test_next_up_and_down() {
        let w = FloatWidth::Width64;
        assert_eq!(w.next_up(-0.0), 5e-324);
        assert_eq!(w.next_up(0.0), 5e-324);
        assert_eq!(w.next_down(0.0), -5e-324);
        assert_eq!(w.next_up(1.0), 1.0 + f64::EPSILON);
        assert_eq!(w.next_up(w.max_value()), f64::INFINITY);
    }
}
