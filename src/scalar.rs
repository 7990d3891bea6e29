//! Scalar element values.
//!
//! Every element, whatever the dtype, is carried as a `Scalar`. Integers of
//! all widths fit in an `i128`; floats of every width are carried as `f64`
//! values exactly representable in the narrower width; complex values carry
//! their two parts independently.

use crate::dtypes::{Dtype, DtypeKind};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Bool(bool),
    Int(i128),
    Float(f64),
    Complex(f64, f64),
}

/// Identity used for `unique` arrays: NaN never collides with anything and
/// the two zeros collide with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueKey {
    Bool(bool),
    Int(i128),
    Float(u64),
    Complex(u64, u64),
}

fn float_key(value: f64) -> Option<u64> {
    if value.is_nan() {
        None
    } else if value == 0.0 {
        Some(0)
    } else {
        Some(value.to_bits())
    }
}

impl Scalar {
    pub fn kind(&self) -> DtypeKind {
        match self {
            Scalar::Bool(_) => DtypeKind::Bool,
            Scalar::Int(_) => DtypeKind::Int,
            Scalar::Float(_) => DtypeKind::Float,
            Scalar::Complex(..) => DtypeKind::Complex,
        }
    }

    pub fn is_nan(&self) -> bool {
        match self {
            Scalar::Float(v) => v.is_nan(),
            Scalar::Complex(re, im) => re.is_nan() || im.is_nan(),
            _ => false,
        }
    }

    pub fn is_infinite(&self) -> bool {
        match self {
            Scalar::Float(v) => v.is_infinite(),
            Scalar::Complex(re, im) => re.is_infinite() || im.is_infinite(),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            Scalar::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Scalar::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// `None` for values that never count as duplicates.
    pub fn unique_key(&self) -> Option<UniqueKey> {
        match *self {
            Scalar::Bool(b) => Some(UniqueKey::Bool(b)),
            Scalar::Int(v) => Some(UniqueKey::Int(v)),
            Scalar::Float(v) => float_key(v).map(UniqueKey::Float),
            Scalar::Complex(re, im) => match (float_key(re), float_key(im)) {
                (Some(re), Some(im)) => Some(UniqueKey::Complex(re, im)),
                _ => None,
            },
        }
    }

    /// Bitwise equality, so that NaN equals NaN and -0.0 differs from 0.0.
    pub fn same_as(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Float(a), Scalar::Float(b)) => a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()),
            (Scalar::Complex(a, b), Scalar::Complex(c, d)) => {
                Scalar::Float(*a).same_as(&Scalar::Float(*c)) && Scalar::Float(*b).same_as(&Scalar::Float(*d))
            }
            _ => self == other,
        }
    }

    /// Converts to an equal value of `dtype`, or `None` when the value cannot
    /// be represented exactly.
    pub fn convert_to(&self, dtype: Dtype) -> Option<Scalar> {
        let converted = match (*self, dtype.kind()) {
            (Scalar::Bool(b), DtypeKind::Bool) => Scalar::Bool(b),
            (Scalar::Bool(b), DtypeKind::Int) | (Scalar::Bool(b), DtypeKind::UInt) => Scalar::Int(b as i128),
            (Scalar::Int(v), DtypeKind::Bool) if v == 0 || v == 1 => Scalar::Bool(v == 1),
            (Scalar::Int(v), DtypeKind::Int) | (Scalar::Int(v), DtypeKind::UInt) => Scalar::Int(v),
            (Scalar::Int(v), DtypeKind::Float) => Scalar::Float(v as f64),
            (Scalar::Float(v), DtypeKind::Int) | (Scalar::Float(v), DtypeKind::UInt)
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 2f64.powi(127) =>
            {
                Scalar::Int(v as i128)
            }
            (Scalar::Float(v), DtypeKind::Float) => Scalar::Float(v),
            (Scalar::Float(v), DtypeKind::Complex) => Scalar::Complex(v, 0.0),
            (Scalar::Complex(re, im), DtypeKind::Complex) => Scalar::Complex(re, im),
            (Scalar::Complex(re, im), DtypeKind::Float) if im == 0.0 => Scalar::Float(re),
            _ => return None,
        };
        if dtype.can_hold(&converted) && converted.round_trips(self) {
            Some(converted)
        } else {
            None
        }
    }

    fn round_trips(&self, original: &Scalar) -> bool {
        match (self, original) {
            (Scalar::Int(v), Scalar::Float(f)) | (Scalar::Float(f), Scalar::Int(v)) => *v as f64 == *f,
            _ => true,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{:?}", v),
            Scalar::Complex(re, im) if im.is_sign_negative() => write!(f, "({:?}-{:?}j)", re, -im),
            Scalar::Complex(re, im) => write!(f, "({:?}+{:?}j)", re, im),
        }
    }
}
