//! Element domains: the legal scalar values for one dtype.
//!
//! Every numeric domain is a set of disjoint inclusive integer intervals. For
//! integer dtypes the integers are the values themselves; for floats they are
//! ordinals (see `FloatWidth::to_ordinal`), so excluding infinities,
//! subnormals, a signed zero or a magnitude band is an interval subtraction
//! made once when the domain is built. Sampling then picks from what is left
//! and never has to throw a draw away.

use crate::data::ConjectureData;
use crate::dtypes::{Dtype, DtypeKind};
use crate::error::{ArrayError, Result};
use crate::floats::FloatWidth;
use crate::module::ArrayModule;
use crate::scalar::Scalar;
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};

/// Sorted, disjoint, inclusive intervals of `i128`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntervalSet {
    intervals: Vec<(i128, i128)>,
}

impl IntervalSet {
    pub fn new(lo: i128, hi: i128) -> Self {
        if lo > hi {
            IntervalSet::default()
        } else {
            IntervalSet {
                intervals: vec![(lo, hi)],
            }
        }
    }

    pub fn intervals(&self) -> &[(i128, i128)] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn len(&self) -> u128 {
        self.intervals.iter().map(|(a, b)| (b - a) as u128 + 1).sum()
    }

    pub fn min(&self) -> Option<i128> {
        self.intervals.first().map(|(a, _)| *a)
    }

    pub fn max(&self) -> Option<i128> {
        self.intervals.last().map(|(_, b)| *b)
    }

    pub fn contains(&self, x: i128) -> bool {
        self.intervals.iter().any(|(a, b)| *a <= x && x <= *b)
    }

    pub fn remove(&mut self, lo: i128, hi: i128) {
        if lo > hi {
            return;
        }
        let mut kept = Vec::with_capacity(self.intervals.len() + 1);
        for &(a, b) in &self.intervals {
            if b < lo || a > hi {
                kept.push((a, b));
                continue;
            }
            if a < lo {
                kept.push((a, lo - 1));
            }
            if b > hi {
                kept.push((hi + 1, b));
            }
        }
        self.intervals = kept;
    }

    pub fn intersect(&mut self, lo: i128, hi: i128) {
        self.intervals = self
            .intervals
            .iter()
            .filter_map(|&(a, b)| {
                let (a, b) = (a.max(lo), b.min(hi));
                if a <= b {
                    Some((a, b))
                } else {
                    None
                }
            })
            .collect();
    }

    pub fn nth(&self, mut index: u128) -> Option<i128> {
        for &(a, b) in &self.intervals {
            let n = (b - a) as u128 + 1;
            if index < n {
                return Some(a + index as i128);
            }
            index -= n;
        }
        None
    }

    pub fn index_of(&self, x: i128) -> Option<u128> {
        let mut offset = 0u128;
        for &(a, b) in &self.intervals {
            if a <= x && x <= b {
                return Some(offset + (x - a) as u128);
            }
            offset += (b - a) as u128 + 1;
        }
        None
    }

    /// The member nearest to `x`, preferring the larger one on ties.
    pub fn closest_to(&self, x: i128) -> Option<i128> {
        let mut best: Option<i128> = None;
        for &(a, b) in &self.intervals {
            let candidate = x.clamp(a, b);
            best = match best {
                None => Some(candidate),
                Some(current) => {
                    let (dc, dn) = ((current - x).abs(), (candidate - x).abs());
                    if dn < dc || (dn == dc && candidate > current) {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best
    }

    pub fn sample(&self, data: &mut ConjectureData) -> Option<i128> {
        if self.is_empty() {
            return None;
        }
        self.nth(data.draw_below(self.len()))
    }

    /// Members between `target` and `current`, nearest to `target` first and
    /// halving the distance each step, ending at the neighbour of `current`.
    fn towards(&self, current: i128, target: i128) -> Vec<i128> {
        let (ic, it) = match (self.index_of(current), self.index_of(target)) {
            (Some(ic), Some(it)) => (ic as i128, it as i128),
            _ => return Vec::new(),
        };
        let mut out = Vec::new();
        let mut step = (ic - it) / 2;
        while step != 0 {
            if let Some(v) = self.nth((ic - step) as u128) {
                out.push(v);
            }
            step /= 2;
        }
        out
    }
}

/// Caller-facing element bounds and flags. `None` fields take defaults that
/// depend on the dtype and on the other fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementsConfig {
    pub min_value: Option<Scalar>,
    pub max_value: Option<Scalar>,
    pub allow_nan: Option<bool>,
    pub allow_infinity: Option<bool>,
    pub allow_subnormal: Option<bool>,
    pub allow_signed_zero: Option<bool>,
    pub exclude_min: bool,
    pub exclude_max: bool,
    pub min_magnitude: f64,
    pub max_magnitude: Option<f64>,
}

impl ElementsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_value(mut self, value: impl Into<Scalar>) -> Self {
        self.min_value = Some(value.into());
        self
    }

    pub fn max_value(mut self, value: impl Into<Scalar>) -> Self {
        self.max_value = Some(value.into());
        self
    }

    pub fn allow_nan(mut self, allow: bool) -> Self {
        self.allow_nan = Some(allow);
        self
    }

    pub fn allow_infinity(mut self, allow: bool) -> Self {
        self.allow_infinity = Some(allow);
        self
    }

    pub fn allow_subnormal(mut self, allow: bool) -> Self {
        self.allow_subnormal = Some(allow);
        self
    }

    pub fn allow_signed_zero(mut self, allow: bool) -> Self {
        self.allow_signed_zero = Some(allow);
        self
    }

    pub fn exclude_min(mut self, exclude: bool) -> Self {
        self.exclude_min = exclude;
        self
    }

    pub fn exclude_max(mut self, exclude: bool) -> Self {
        self.exclude_max = exclude;
        self
    }

    pub fn min_magnitude(mut self, magnitude: f64) -> Self {
        self.min_magnitude = magnitude;
        self
    }

    pub fn max_magnitude(mut self, magnitude: f64) -> Self {
        self.max_magnitude = Some(magnitude);
        self
    }

    fn has_value_bounds(&self) -> bool {
        self.min_value.is_some() || self.max_value.is_some()
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value as i128)
    }
}

impl From<i128> for Scalar {
    fn from(value: i128) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FloatPart {
    width: FloatWidth,
    ordinals: IntervalSet,
    nan: bool,
    specials: Vec<f64>,
}

impl FloatPart {
    fn contains(&self, v: f64) -> bool {
        if v.is_nan() {
            self.nan
        } else {
            self.width.is_representable(v) && self.ordinals.contains(self.width.to_ordinal(v))
        }
    }

    fn nasty_values(width: FloatWidth) -> Vec<f64> {
        let mut values = vec![
            0.0,
            -0.0,
            1.0,
            -1.0,
            0.5,
            -0.5,
            2.0,
            -2.0,
            1.5,
            -1.5,
            10.0,
            100.0,
            width.round(1.1),
            width.round(1.0 / 3.0),
            width.round(1e-5),
            1.0 + width.epsilon(),
            width.epsilon(),
            width.max_value(),
            -width.max_value(),
            width.min_positive_normal(),
            -width.min_positive_normal(),
            width.min_positive_subnormal(),
            -width.min_positive_subnormal(),
            width.from_ordinal(width.max_subnormal_ordinal()),
            f64::INFINITY,
            f64::NEG_INFINITY,
        ];
        if width == FloatWidth::Width64 {
            values.push(1e300);
            values.push(-1e300);
        }
        values
    }

    fn build(width: FloatWidth, ordinals: IntervalSet, nan: bool) -> FloatPart {
        let mut part = FloatPart {
            width,
            ordinals,
            nan,
            specials: Vec::new(),
        };
        let mut specials: Vec<f64> = FloatPart::nasty_values(width)
            .into_iter()
            .filter(|v| part.contains(*v))
            .collect();
        for &(a, b) in part.ordinals.intervals() {
            specials.push(width.from_ordinal(a));
            specials.push(width.from_ordinal(b));
        }
        part.specials = specials;
        part
    }

    fn nan(data: &mut ConjectureData) -> f64 {
        if data.draw_boolean(0.5) {
            -f64::NAN
        } else {
            f64::NAN
        }
    }

    fn draw(&self, data: &mut ConjectureData) -> f64 {
        if self.ordinals.is_empty() || (self.nan && data.draw_boolean(0.05)) {
            return FloatPart::nan(data);
        }
        let p = data.draw_unit();
        if p < 0.12 && !self.specials.is_empty() {
            return *data.choose(&self.specials);
        }
        if p < 0.22 {
            let v = data.draw_integer(-256, 256) as f64;
            if self.contains(v) {
                return v;
            }
        }
        match self.ordinals.sample(data) {
            Some(ordinal) => self.width.from_ordinal(ordinal),
            None => FloatPart::nan(data),
        }
    }

    fn simplest(&self) -> f64 {
        match self.ordinals.closest_to(0) {
            Some(ordinal) => self.width.from_ordinal(ordinal),
            None => f64::NAN,
        }
    }

    fn candidates(&self, v: f64) -> Vec<f64> {
        if self.ordinals.is_empty() {
            return Vec::new();
        }
        let simplest = self.simplest();
        let mut out = vec![simplest];
        if v.is_nan() {
            return out;
        }
        if v.is_finite() && v.trunc() != v && self.contains(v.trunc()) {
            out.push(v.trunc());
        }
        if v.is_sign_negative() && self.contains(-v) {
            out.push(-v);
        }
        let (current, target) = (self.width.to_ordinal(v), self.width.to_ordinal(simplest));
        out.extend(self.ordinals.towards(current, target).into_iter().map(|o| self.width.from_ordinal(o)));
        out.retain(|c| c.to_bits() != v.to_bits());
        out
    }

    /// Number of values distinct under `unique`; the two zeros count once.
    fn distinct(&self) -> Option<u128> {
        if self.nan {
            return None;
        }
        let both_zeros = self.ordinals.contains(-1) && self.ordinals.contains(0);
        Some(self.ordinals.len() - both_zeros as u128)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Values {
    Bool,
    Int { intervals: IntervalSet, boundaries: Vec<i128> },
    Float(FloatPart),
    Complex(FloatPart),
}

/// The resolved set of values one dtype may take under an `ElementsConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDomain {
    dtype: Dtype,
    values: Values,
}

fn bound_name(is_min: bool) -> &'static str {
    if is_min {
        "min_value"
    } else {
        "max_value"
    }
}

fn int_bound(dtype: Dtype, value: &Scalar, is_min: bool) -> Result<i128> {
    let name = bound_name(is_min);
    let v = match *value {
        Scalar::Int(v) => v,
        Scalar::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 2f64.powi(127) => f as i128,
        other => {
            return Err(ArrayError::configuration(format!(
                "{}={} is not a valid bound for {}",
                name, other, dtype
            )))
        }
    };
    let (lo, hi) = dtype.int_bounds().unwrap_or((0, 0));
    if v < lo || v > hi {
        return Err(ArrayError::configuration(format!(
            "{}={} is out of range for {}, which holds values from {} to {}",
            name, v, dtype, lo, hi
        )));
    }
    Ok(v)
}

fn float_bound(dtype: Dtype, width: FloatWidth, value: &Scalar, is_min: bool) -> Result<f64> {
    let name = bound_name(is_min);
    let v = match *value {
        Scalar::Float(f) => f,
        Scalar::Int(i) if (i as f64) as i128 == i => i as f64,
        other => {
            return Err(ArrayError::configuration(format!(
                "{}={} is not a valid bound for {}",
                name, other, dtype
            )))
        }
    };
    if v.is_nan() {
        return Err(ArrayError::configuration(format!("{}=nan is not a valid bound", name)));
    }
    if !width.is_representable(v) {
        return Err(ArrayError::configuration(format!(
            "{}={:?} cannot be exactly represented as {}, the nearest value is {:?}",
            name,
            v,
            dtype,
            width.round(v)
        )));
    }
    Ok(v)
}

fn check_exclusions(config: &ElementsConfig) -> Result<()> {
    if config.exclude_min && config.min_value.is_none() {
        return Err(ArrayError::configuration("exclude_min=true requires a min_value"));
    }
    if config.exclude_max && config.max_value.is_none() {
        return Err(ArrayError::configuration("exclude_max=true requires a max_value"));
    }
    Ok(())
}

fn check_magnitudes(config: &ElementsConfig) -> Result<()> {
    if config.min_magnitude.is_nan() || config.min_magnitude < 0.0 {
        return Err(ArrayError::configuration(format!(
            "min_magnitude={} must be a non-negative number",
            config.min_magnitude
        )));
    }
    if let Some(max) = config.max_magnitude {
        if max.is_nan() || max < config.min_magnitude {
            return Err(ArrayError::configuration(format!(
                "max_magnitude={} is smaller than min_magnitude={}",
                max, config.min_magnitude
            )));
        }
    }
    Ok(())
}

fn reject_flag(dtype: Dtype, name: &str, value: Option<bool>) -> Result<()> {
    if value == Some(true) {
        return Err(ArrayError::configuration(format!("{}=true is not valid for {}", name, dtype)));
    }
    Ok(())
}

impl ElementDomain {
    /// Resolves `config` against `dtype`. Contradictory or empty domains are
    /// configuration errors.
    pub fn new(dtype: Dtype, config: &ElementsConfig, flushes_subnormals: bool) -> Result<ElementDomain> {
        check_magnitudes(config)?;
        let values = match dtype.kind() {
            DtypeKind::Bool => {
                if config.has_value_bounds() || config.min_magnitude > 0.0 || config.max_magnitude.is_some() {
                    return Err(ArrayError::configuration("bool dtypes do not accept value or magnitude bounds"));
                }
                reject_flag(dtype, "allow_nan", config.allow_nan)?;
                reject_flag(dtype, "allow_infinity", config.allow_infinity)?;
                Values::Bool
            }
            DtypeKind::Int | DtypeKind::UInt => ElementDomain::int_values(dtype, config)?,
            DtypeKind::Float => Values::Float(ElementDomain::float_part(dtype, config, flushes_subnormals, true)?),
            DtypeKind::Complex => {
                if config.has_value_bounds() {
                    return Err(ArrayError::configuration(format!(
                        "min_value and max_value are not valid for {}, use min_magnitude and max_magnitude",
                        dtype
                    )));
                }
                Values::Complex(ElementDomain::float_part(dtype, config, flushes_subnormals, false)?)
            }
        };
        Ok(ElementDomain { dtype, values })
    }

    /// Resolves `config` for `dtype` as stored by `module`.
    pub fn for_module<M: ArrayModule + ?Sized>(module: &M, dtype: Dtype, config: &ElementsConfig) -> Result<ElementDomain> {
        ElementDomain::new(dtype, config, module.flushes_subnormals(dtype))
    }

    fn int_values(dtype: Dtype, config: &ElementsConfig) -> Result<Values> {
        check_exclusions(config)?;
        reject_flag(dtype, "allow_nan", config.allow_nan)?;
        reject_flag(dtype, "allow_infinity", config.allow_infinity)?;
        let (dlo, dhi) = dtype.int_bounds().unwrap_or((0, 0));
        let mut lo = match &config.min_value {
            Some(v) => int_bound(dtype, v, true)?,
            None => dlo,
        };
        let mut hi = match &config.max_value {
            Some(v) => int_bound(dtype, v, false)?,
            None => dhi,
        };
        if lo > hi {
            return Err(ArrayError::configuration(format!(
                "min_value={} is larger than max_value={}",
                lo, hi
            )));
        }
        if config.exclude_min {
            lo += 1;
        }
        if config.exclude_max {
            hi -= 1;
        }
        let mut intervals = IntervalSet::new(lo, hi);
        if config.min_magnitude > 0.0 {
            let k = config.min_magnitude.ceil().min(1e38) as i128;
            intervals.remove(-(k - 1), k - 1);
        }
        if let Some(max) = config.max_magnitude {
            let k = max.floor().min(1e38) as i128;
            intervals.intersect(-k, k);
        }
        if intervals.is_empty() {
            return Err(ArrayError::configuration(format!("no {} values satisfy {:?}", dtype, config)));
        }
        let mut boundaries: Vec<i128> = vec![0, 1, -1]
            .into_iter()
            .filter(|v| intervals.contains(*v))
            .collect();
        for &(a, b) in intervals.intervals() {
            boundaries.push(a);
            boundaries.push(b);
        }
        Ok(Values::Int { intervals, boundaries })
    }

    fn float_part(dtype: Dtype, config: &ElementsConfig, flushes_subnormals: bool, bounded: bool) -> Result<FloatPart> {
        let width = dtype.float_width().ok_or_else(|| {
            ArrayError::configuration(format!("{} has no floating point representation", dtype))
        })?;
        check_exclusions(config)?;

        let min = match &config.min_value {
            Some(v) if bounded => Some(float_bound(dtype, width, v, true)?),
            _ => None,
        };
        let max = match &config.max_value {
            Some(v) if bounded => Some(float_bound(dtype, width, v, false)?),
            _ => None,
        };
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(ArrayError::configuration(format!(
                    "min_value={:?} is larger than max_value={:?}",
                    lo, hi
                )));
            }
        }

        let finite_bounds = matches!((min, max), (Some(a), Some(b)) if a.is_finite() && b.is_finite());
        let finite_magnitude = config.max_magnitude.map_or(false, f64::is_finite);
        let bounded_values = min.is_some() || max.is_some();

        let allow_nan = match config.allow_nan {
            Some(true) if bounded_values || finite_magnitude => {
                return Err(ArrayError::configuration(
                    "cannot have allow_nan=true together with min_value, max_value or max_magnitude",
                ))
            }
            Some(allow) => allow,
            None => !bounded_values && !finite_magnitude,
        };
        let allow_infinity = match config.allow_infinity {
            Some(true) if finite_bounds || finite_magnitude => {
                return Err(ArrayError::configuration(
                    "cannot have allow_infinity=true with finite bounds on both sides",
                ))
            }
            Some(allow) => allow,
            None => !finite_bounds,
        };
        let allow_subnormal = match config.allow_subnormal {
            Some(true) if flushes_subnormals => {
                return Err(ArrayError::configuration(format!(
                    "allow_subnormal=true but the array module flushes subnormal {} values to zero",
                    dtype
                )))
            }
            Some(allow) => allow,
            None => !flushes_subnormals,
        };
        let allow_signed_zero = config.allow_signed_zero.unwrap_or(true);

        let lo = match min {
            None => width.to_ordinal(f64::NEG_INFINITY),
            Some(v) if config.exclude_min => {
                if v == f64::INFINITY {
                    width.infinity_ordinal() + 1
                } else {
                    width.to_ordinal(width.next_up(v))
                }
            }
            Some(v) => width.to_ordinal(v),
        };
        let hi = match max {
            None => width.infinity_ordinal(),
            Some(v) if config.exclude_max => {
                if v == f64::NEG_INFINITY {
                    width.to_ordinal(f64::NEG_INFINITY) - 1
                } else {
                    width.to_ordinal(width.next_down(v))
                }
            }
            Some(v) => width.to_ordinal(v),
        };
        let mut ordinals = IntervalSet::new(lo, hi);

        if !allow_infinity {
            ordinals.remove(width.infinity_ordinal(), width.infinity_ordinal());
            let neg = width.to_ordinal(f64::NEG_INFINITY);
            ordinals.remove(neg, neg);
        }
        if !allow_subnormal {
            let top = width.max_subnormal_ordinal();
            ordinals.remove(1, top);
            ordinals.remove(-top - 1, -2);
        }
        if !allow_signed_zero {
            ordinals.remove(-1, -1);
        }
        if config.min_magnitude > 0.0 {
            let mut m = width.round(config.min_magnitude);
            if m < config.min_magnitude {
                m = width.next_up(m);
            }
            ordinals.remove(width.to_ordinal(-m) + 1, width.to_ordinal(m) - 1);
        }
        if let Some(max_magnitude) = config.max_magnitude {
            let mut m = width.round(max_magnitude);
            if m > max_magnitude {
                m = width.next_down(m);
            }
            ordinals.intersect(width.to_ordinal(-m), width.to_ordinal(m));
        }

        if ordinals.is_empty() && !allow_nan {
            return Err(ArrayError::configuration(format!(
                "no {} values satisfy the requested bounds and flags",
                dtype
            )));
        }
        Ok(FloatPart::build(width, ordinals, allow_nan))
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn allows_nan(&self) -> bool {
        match &self.values {
            Values::Float(part) | Values::Complex(part) => part.nan,
            _ => false,
        }
    }

    /// Whether NaN is the only value in the domain.
    pub fn only_nan(&self) -> bool {
        match &self.values {
            Values::Float(part) | Values::Complex(part) => part.nan && part.ordinals.is_empty(),
            _ => false,
        }
    }

    pub fn contains(&self, value: &Scalar) -> bool {
        match (&self.values, value) {
            (Values::Bool, Scalar::Bool(_)) => true,
            (Values::Int { intervals, .. }, Scalar::Int(v)) => intervals.contains(*v),
            (Values::Float(part), Scalar::Float(v)) => part.contains(*v),
            (Values::Complex(part), Scalar::Complex(re, im)) => part.contains(*re) && part.contains(*im),
            _ => false,
        }
    }

    pub fn draw_value(&self, data: &mut ConjectureData) -> Scalar {
        match &self.values {
            Values::Bool => Scalar::Bool(data.draw_boolean(0.5)),
            Values::Int { intervals, boundaries } => {
                let p = data.draw_unit();
                if p < 0.2 && !boundaries.is_empty() {
                    return Scalar::Int(*data.choose(boundaries));
                }
                let v = if p < 0.4 {
                    intervals.closest_to(data.draw_integer(-256, 256))
                } else {
                    intervals.sample(data)
                };
                Scalar::Int(v.unwrap_or(0))
            }
            Values::Float(part) => Scalar::Float(part.draw(data)),
            Values::Complex(part) => Scalar::Complex(part.draw(data), part.draw(data)),
        }
    }

    /// The value elements shrink towards: the one closest to zero.
    pub fn simplest(&self) -> Scalar {
        match &self.values {
            Values::Bool => Scalar::Bool(false),
            Values::Int { intervals, .. } => Scalar::Int(intervals.closest_to(0).unwrap_or(0)),
            Values::Float(part) => Scalar::Float(part.simplest()),
            Values::Complex(part) => Scalar::Complex(part.simplest(), part.simplest()),
        }
    }

    /// Simpler members of the domain than `value`, most aggressive first.
    pub fn shrink_candidates(&self, value: &Scalar) -> Vec<Scalar> {
        match (&self.values, value) {
            (Values::Bool, Scalar::Bool(true)) => vec![Scalar::Bool(false)],
            (Values::Int { intervals, .. }, Scalar::Int(v)) => {
                let target = intervals.closest_to(0).unwrap_or(*v);
                let mut out = vec![target];
                if *v < 0 && intervals.contains(-v) {
                    out.push(-v);
                }
                out.extend(intervals.towards(*v, target));
                out.retain(|c| c != v);
                out.into_iter().map(Scalar::Int).collect()
            }
            (Values::Float(part), Scalar::Float(v)) => part.candidates(*v).into_iter().map(Scalar::Float).collect(),
            (Values::Complex(part), Scalar::Complex(re, im)) => {
                let mut out: Vec<Scalar> = part.candidates(*re).into_iter().map(|r| Scalar::Complex(r, *im)).collect();
                out.extend(part.candidates(*im).into_iter().map(|i| Scalar::Complex(*re, i)));
                out.retain(|c| !c.same_as(value));
                out
            }
            _ => Vec::new(),
        }
    }

    /// How many values are distinct for `unique` arrays, or `None` when the
    /// domain is effectively unbounded (NaN never collides).
    pub fn cardinality(&self) -> Option<u128> {
        match &self.values {
            Values::Bool => Some(2),
            Values::Int { intervals, .. } => Some(intervals.len()),
            Values::Float(part) => part.distinct(),
            Values::Complex(part) => part.distinct().and_then(|d| d.checked_mul(d)),
        }
    }

    /// The `index`-th member of the domain in ascending order.
    pub fn value_at(&self, index: u128) -> Option<Scalar> {
        match &self.values {
            Values::Bool => match index {
                0 => Some(Scalar::Bool(false)),
                1 => Some(Scalar::Bool(true)),
                _ => None,
            },
            Values::Int { intervals, .. } => intervals.nth(index).map(Scalar::Int),
            Values::Float(part) => part.ordinals.nth(index).map(|o| Scalar::Float(part.width.from_ordinal(o))),
            Values::Complex(part) => {
                let n = part.ordinals.len();
                if n == 0 {
                    return None;
                }
                let re = part.ordinals.nth(index / n)?;
                let im = part.ordinals.nth(index % n)?;
                Some(Scalar::Complex(part.width.from_ordinal(re), part.width.from_ordinal(im)))
            }
        }
    }
}

impl Strategy for ElementDomain {
    type Value = Scalar;

    fn draw(&self, data: &mut ConjectureData) -> Result<Scalar> {
        Ok(self.draw_value(data))
    }

    fn shrink(&self, value: &Scalar) -> Box<dyn Iterator<Item = Scalar> + '_> {
        Box::new(self.shrink_candidates(value).into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(dtype: Dtype, config: ElementsConfig) -> ElementDomain {
        ElementDomain::new(dtype, &config, false).unwrap()
    }

    #[test]
    fn test_interval_set_operations() {
        let mut set = IntervalSet::new(-10, 10);
        set.remove(-2, 2);
        assert_eq!(set.intervals(), &[(-10, -3), (3, 10)]);
        assert_eq!(set.len(), 16);
        assert_eq!(set.nth(8), Some(3));
        assert_eq!(set.index_of(3), Some(8));
        assert_eq!(set.closest_to(0), Some(3));
        assert_eq!(set.closest_to(-100), Some(-10));
        set.intersect(-5, 4);
        assert_eq!(set.intervals(), &[(-5, -3), (3, 4)]);
        assert!(IntervalSet::new(1, 0).is_empty());
    }

    #[test]
    fn test_towards_ends_next_to_current() {
        let set = IntervalSet::new(0, 100);
        let steps = set.towards(100, 0);
        assert_eq!(steps.first(), Some(&50));
        assert_eq!(steps.last(), Some(&99));
    }

    #[test]
    fn test_int_bounds_are_checked() {
        let err = ElementDomain::new(Dtype::INT8, &ElementsConfig::new().max_value(300i64), false).unwrap_err();
        assert!(err.to_string().contains("out of range for int8"));

        let err = ElementDomain::new(
            Dtype::INT32,
            &ElementsConfig::new().min_value(5i64).max_value(1i64),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("larger than"));

        let err = ElementDomain::new(Dtype::UINT8, &ElementsConfig::new().allow_nan(true), false).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_int_draws_stay_in_bounds_and_hit_boundaries() {
        let d = domain(Dtype::INT16, ElementsConfig::new().min_value(-7i64).max_value(1000i64));
        let mut data = ConjectureData::new(5);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..2000 {
            let v = d.draw_value(&mut data).as_int().unwrap();
            assert!((-7..=1000).contains(&v));
            seen_min |= v == -7;
            seen_max |= v == 1000;
        }
        assert!(seen_min && seen_max);
    }

    #[test]
    fn test_float_defaults_depend_on_bounds() {
        let unbounded = domain(Dtype::FLOAT32, ElementsConfig::new());
        assert!(unbounded.allows_nan());
        assert!(unbounded.contains(&Scalar::Float(f64::INFINITY)));

        let bounded = domain(Dtype::FLOAT32, ElementsConfig::new().min_value(0.0).max_value(1.0));
        assert!(!bounded.allows_nan());
        assert!(!bounded.contains(&Scalar::Float(-0.0)));
        assert!(bounded.contains(&Scalar::Float(1.0)));

        let half_bounded = domain(Dtype::FLOAT64, ElementsConfig::new().min_value(0.0));
        assert!(half_bounded.contains(&Scalar::Float(f64::INFINITY)));
        assert!(!half_bounded.allows_nan());
    }

    #[test]
    fn test_contradictory_float_flags() {
        let err = ElementDomain::new(
            Dtype::FLOAT64,
            &ElementsConfig::new().min_value(0.0).allow_nan(true),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("allow_nan"));

        let err = ElementDomain::new(
            Dtype::FLOAT64,
            &ElementsConfig::new().min_value(0.0).max_value(1.0).allow_infinity(true),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("allow_infinity"));

        let err = ElementDomain::new(Dtype::FLOAT32, &ElementsConfig::new().min_value(0.1), false).unwrap_err();
        assert!(err.to_string().contains("cannot be exactly represented as float32"));

        let err = ElementDomain::new(Dtype::FLOAT32, &ElementsConfig::new().allow_subnormal(true), true).unwrap_err();
        assert!(err.to_string().contains("flushes"));
    }

    #[test]
    fn test_exclusions_are_interval_subtractions() {
        let d = domain(
            Dtype::FLOAT64,
            ElementsConfig::new()
                .min_value(0.0)
                .max_value(1.0)
                .exclude_min(true)
                .exclude_max(true)
                .allow_subnormal(false),
        );
        assert!(!d.contains(&Scalar::Float(0.0)));
        assert!(!d.contains(&Scalar::Float(1.0)));
        assert!(!d.contains(&Scalar::Float(5e-324)));
        assert!(d.contains(&Scalar::Float(f64::MIN_POSITIVE)));
        assert_eq!(d.simplest(), Scalar::Float(f64::MIN_POSITIVE));
    }

    #[test]
    fn test_empty_finite_domain_is_rejected() {
        let err = ElementDomain::new(
            Dtype::FLOAT16,
            &ElementsConfig::new()
                .min_value(0.0)
                .max_value(0.0)
                .exclude_min(true),
            false,
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_magnitudes() {
        let d = domain(Dtype::INT32, ElementsConfig::new().min_magnitude(3.0).max_magnitude(5.0));
        assert_eq!(d.cardinality(), Some(6));
        assert!(d.contains(&Scalar::Int(-4)));
        assert!(!d.contains(&Scalar::Int(2)));

        let c = domain(Dtype::COMPLEX64, ElementsConfig::new().max_magnitude(2.0));
        let mut data = ConjectureData::new(17);
        for _ in 0..500 {
            if let Scalar::Complex(re, im) = c.draw_value(&mut data) {
                assert!(re.abs() <= 2.0 && im.abs() <= 2.0);
            } else {
                panic!("expected a complex value");
            }
        }
    }

    #[test]
    fn test_complex_rejects_value_bounds() {
        let err = ElementDomain::new(Dtype::COMPLEX128, &ElementsConfig::new().min_value(0.0), false).unwrap_err();
        assert!(err.to_string().contains("min_magnitude"));
    }

    #[test]
    fn test_shrink_candidates_move_towards_zero() {
        let d = domain(Dtype::INT32, ElementsConfig::new());
        let candidates = d.shrink_candidates(&Scalar::Int(-40));
        assert_eq!(candidates[0], Scalar::Int(0));
        assert_eq!(candidates[1], Scalar::Int(40));
        assert_eq!(*candidates.last().unwrap(), Scalar::Int(-39));

        let f = domain(Dtype::FLOAT64, ElementsConfig::new());
        let candidates = f.shrink_candidates(&Scalar::Float(2.75));
        assert_eq!(candidates[0], Scalar::Float(0.0));
        assert_eq!(candidates[1], Scalar::Float(2.0));

        let b = domain(Dtype::BOOL, ElementsConfig::new());
        assert_eq!(b.shrink_candidates(&Scalar::Bool(true)), vec![Scalar::Bool(false)]);
        assert!(b.shrink_candidates(&Scalar::Bool(false)).is_empty());
    }

    #[test]
    fn test_cardinality_and_value_at() {
        let d = domain(Dtype::UINT8, ElementsConfig::new());
        assert_eq!(d.cardinality(), Some(256));
        assert_eq!(d.value_at(255), Some(Scalar::Int(255)));
        assert_eq!(d.value_at(256), None);

        let nan = domain(Dtype::FLOAT16, ElementsConfig::new());
        assert_eq!(nan.cardinality(), None);

        let zeros = domain(
            Dtype::FLOAT32,
            ElementsConfig::new().min_value(-0.0).max_value(0.0),
        );
        assert_eq!(zeros.cardinality(), Some(1));
    }
}
