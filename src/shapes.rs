//! Shape strategies.
//!
//! `ArrayShapes` draws single shapes within rank and side bounds.
//! `MutuallyBroadcastableShapes` draws a group of shapes that broadcast
//! together (optionally also against a base shape, or following a gufunc
//! signature), working one trailing axis at a time so that every shape in the
//! group is compatible by construction. `broadcastable_shapes` is the
//! one-shape case of the same sampler.

use crate::data::ConjectureData;
use crate::distributions::{biased_coin, Repeat};
use crate::error::{check_argument, check_valid_dims, order_check, ArrayError, Result, NDIM_MAX};
use crate::gufunc::{CoreDim, GufuncSignature};
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

pub type Shape = Vec<usize>;

/// Number of elements in an array of `shape`.
pub fn shape_size(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// The shape `shapes` broadcast to, or `None` if they are incompatible.
pub fn broadcast_shapes<'a, I>(shapes: I) -> Option<Shape>
where
    I: IntoIterator<Item = &'a [usize]>,
{
    let mut result: Vec<usize> = Vec::new();
    for shape in shapes {
        for (i, &side) in shape.iter().rev().enumerate() {
            if i == result.len() {
                result.push(side);
            } else if result[i] == 1 {
                result[i] = side;
            } else if side != 1 && side != result[i] {
                return None;
            }
        }
    }
    result.reverse();
    Some(result)
}

/// Rank and side bounds; `None` maxima are resolved by each strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeBounds {
    pub min_dims: usize,
    pub max_dims: Option<usize>,
    pub min_side: usize,
    pub max_side: Option<usize>,
}

impl Default for ShapeBounds {
    fn default() -> Self {
        ShapeBounds {
            min_dims: 0,
            max_dims: None,
            min_side: 1,
            max_side: None,
        }
    }
}

impl ShapeBounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dims(mut self, min_dims: usize, max_dims: usize) -> Self {
        self.min_dims = min_dims;
        self.max_dims = Some(max_dims);
        self
    }

    pub fn sides(mut self, min_side: usize, max_side: usize) -> Self {
        self.min_side = min_side;
        self.max_side = Some(max_side);
        self
    }

    pub fn min_dims(mut self, min_dims: usize) -> Self {
        self.min_dims = min_dims;
        self
    }

    pub fn max_dims(mut self, max_dims: usize) -> Self {
        self.max_dims = Some(max_dims);
        self
    }

    pub fn min_side(mut self, min_side: usize) -> Self {
        self.min_side = min_side;
        self
    }

    pub fn max_side(mut self, max_side: usize) -> Self {
        self.max_side = Some(max_side);
        self
    }
}

/// Anything arrays can take their shapes from.
pub trait ShapeSource: Send + Sync + fmt::Debug {
    fn draw_shape(&self, data: &mut ConjectureData) -> Shape;

    /// Whether `shape` is one this source could have drawn.
    fn admits(&self, shape: &[usize]) -> bool;

    /// An upper bound on the number of elements of any drawn shape, if known.
    fn max_size(&self) -> Option<usize> {
        None
    }
}

/// Half of all sides come from the low end of the range.
fn draw_side(data: &mut ConjectureData, min_side: usize, max_side: usize) -> usize {
    if max_side > min_side && data.draw_boolean(0.5) {
        data.draw_usize(min_side, max_side.min(min_side + 2))
    } else {
        data.draw_usize(min_side, max_side)
    }
}

/// Single-shape reductions: fewer axes first, then smaller sides.
fn shape_candidates(shape: &[usize], min_side: usize) -> Vec<Shape> {
    let mut out = Vec::new();
    for i in 0..shape.len() {
        let mut smaller = shape.to_vec();
        smaller.remove(i);
        out.push(smaller);
    }
    for (i, &side) in shape.iter().enumerate() {
        let mut targets = vec![min_side, side / 2, side.saturating_sub(1)];
        targets.retain(|t| *t >= min_side && *t < side);
        targets.dedup();
        for target in targets {
            let mut smaller = shape.to_vec();
            smaller[i] = target;
            out.push(smaller);
        }
    }
    out
}

/// The shape given, and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedShape(pub Shape);

impl ShapeSource for FixedShape {
    fn draw_shape(&self, _data: &mut ConjectureData) -> Shape {
        self.0.clone()
    }

    fn admits(&self, shape: &[usize]) -> bool {
        self.0 == shape
    }

    fn max_size(&self) -> Option<usize> {
        Some(shape_size(&self.0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayShapes {
    min_dims: usize,
    max_dims: usize,
    min_side: usize,
    max_side: usize,
}

impl ArrayShapes {
    /// `max_dims` defaults to `min_dims + 3` and `max_side` to `min_side + 5`.
    pub fn new(bounds: ShapeBounds) -> Result<ArrayShapes> {
        check_valid_dims(bounds.min_dims, "min_dims")?;
        let max_dims = bounds.max_dims.unwrap_or((bounds.min_dims + 3).min(NDIM_MAX));
        check_valid_dims(max_dims, "max_dims")?;
        let max_side = bounds.max_side.unwrap_or(bounds.min_side + 5);
        order_check("dims", 0, bounds.min_dims, max_dims)?;
        order_check("side", 0, bounds.min_side, max_side)?;
        Ok(ArrayShapes {
            min_dims: bounds.min_dims,
            max_dims,
            min_side: bounds.min_side,
            max_side,
        })
    }

    pub fn min_dims(&self) -> usize {
        self.min_dims
    }

    pub fn max_dims(&self) -> usize {
        self.max_dims
    }

    pub fn min_side(&self) -> usize {
        self.min_side
    }

    pub fn max_side(&self) -> usize {
        self.max_side
    }
}

impl ShapeSource for ArrayShapes {
    fn draw_shape(&self, data: &mut ConjectureData) -> Shape {
        let expected = (self.min_dims + 2).min(self.max_dims) as f64;
        let mut repeat = Repeat::new(self.min_dims as u64, self.max_dims as u64, expected);
        let mut shape = Vec::new();
        while repeat.should_continue(data) {
            shape.push(draw_side(data, self.min_side, self.max_side));
        }
        shape
    }

    fn admits(&self, shape: &[usize]) -> bool {
        (self.min_dims..=self.max_dims).contains(&shape.len())
            && shape.iter().all(|s| (self.min_side..=self.max_side).contains(s))
    }

    fn max_size(&self) -> Option<usize> {
        self.max_side.checked_pow(self.max_dims as u32)
    }
}

impl Strategy for ArrayShapes {
    type Value = Shape;

    fn draw(&self, data: &mut ConjectureData) -> Result<Shape> {
        Ok(self.draw_shape(data))
    }

    fn shrink(&self, value: &Shape) -> Box<dyn Iterator<Item = Shape> + '_> {
        let candidates = shape_candidates(value, self.min_side);
        Box::new(candidates.into_iter().filter(move |c| self.admits(c)))
    }
}

/// A group of mutually broadcastable shapes and the shape they broadcast to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BroadcastableShapes {
    pub input_shapes: Vec<Shape>,
    pub result_shape: Shape,
}

#[derive(Debug, Clone)]
pub struct MutuallyBroadcastableShapes {
    num_shapes: usize,
    signature: Option<GufuncSignature>,
    base_shape: Shape,
    min_dims: usize,
    max_dims: usize,
    min_side: usize,
    max_side: usize,
    reuse_bias: f64,
}

impl MutuallyBroadcastableShapes {
    /// `num_shapes` shapes that broadcast with each other and with `base_shape`.
    pub fn new(num_shapes: usize, base_shape: &[usize], bounds: ShapeBounds) -> Result<Self> {
        check_argument(num_shapes >= 1, || format!("num_shapes={} must be at least 1", num_shapes))?;
        Self::resolve(num_shapes, None, base_shape, bounds)
    }

    /// Input shapes for a generalised ufunc: core dimensions follow
    /// `signature`, loop dimensions broadcast.
    pub fn with_signature(signature: &str, base_shape: &[usize], bounds: ShapeBounds) -> Result<Self> {
        let parsed = GufuncSignature::parse(signature)?;
        Self::resolve(parsed.num_inputs(), Some(parsed), base_shape, bounds)
    }

    fn resolve(
        num_shapes: usize,
        signature: Option<GufuncSignature>,
        base_shape: &[usize],
        bounds: ShapeBounds,
    ) -> Result<Self> {
        let min_dims = bounds.min_dims;
        let min_side = bounds.min_side;
        check_valid_dims(min_dims, "min_dims")?;
        let sig_dims = signature.as_ref().map_or(0, |s| s.min_core_dims());
        let strict = bounds.max_dims.is_some();

        let mut max_dims = bounds
            .max_dims
            .unwrap_or_else(|| (base_shape.len().max(min_dims) + 2).min(NDIM_MAX - sig_dims));
        check_valid_dims(max_dims, "max_dims")?;

        let max_side = bounds.max_side.unwrap_or_else(|| {
            base_shape
                .iter()
                .rev()
                .take(max_dims)
                .copied()
                .chain(std::iter::once(min_side))
                .max()
                .unwrap_or(min_side)
                + 2
        });
        order_check("dims", 0, min_dims, max_dims)?;
        order_check("side", 0, min_side, max_side)?;

        if let Some(sig) = &signature {
            if max_dims > NDIM_MAX - sig_dims {
                return Err(ArrayError::configuration(format!(
                    "max_dims={} would exceed the {}-dimension limit on array shapes, given signature={}",
                    max_dims, NDIM_MAX, sig
                )));
            }
        }

        let (dims, bound_name) = if strict { (max_dims, "max_dims") } else { (min_dims, "min_dims") };
        let aligned: Vec<usize> = base_shape.iter().rev().take(dims).copied().collect();
        if !aligned.iter().all(|&s| s == 1 || min_side <= s) {
            return Err(ArrayError::configuration(format!(
                "Given base_shape={:?}, there are no broadcast-compatible shapes that satisfy: {}={} and min_side={}",
                base_shape, bound_name, dims, min_side
            )));
        }
        let size_one_allowed = min_side <= 1 && 1 <= max_side;
        if !(size_one_allowed || aligned.iter().all(|&s| s <= max_side)) {
            return Err(ArrayError::configuration(format!(
                "Given base_shape={:?}, there are no broadcast-compatible shapes that satisfy all of {}={}, min_side={}, and max_side={}",
                base_shape, bound_name, dims, min_side, max_side
            )));
        }
        if !strict {
            for (n, &s) in base_shape.iter().rev().take(max_dims).enumerate() {
                if (s < min_side && s != 1) || !(size_one_allowed || s <= max_side) {
                    log::debug!("Reducing max_dims from {} to {} to fit base_shape={:?}", max_dims, n, base_shape);
                    max_dims = n;
                    break;
                }
            }
        }

        Ok(MutuallyBroadcastableShapes {
            num_shapes,
            signature,
            base_shape: base_shape.to_vec(),
            min_dims,
            max_dims,
            min_side,
            max_side,
            reuse_bias: 0.5,
        })
    }

    /// Probability that a shape reuses the size of an axis aligned with the
    /// base shape rather than taking 1 there.
    pub fn with_reuse_bias(mut self, reuse_bias: f64) -> Result<Self> {
        check_argument((0.0..=1.0).contains(&reuse_bias), || {
            format!("reuse_bias={} must be between 0 and 1", reuse_bias)
        })?;
        self.reuse_bias = reuse_bias;
        Ok(self)
    }

    pub fn num_shapes(&self) -> usize {
        self.num_shapes
    }

    pub fn base_shape(&self) -> &[usize] {
        &self.base_shape
    }

    pub fn max_dims(&self) -> usize {
        self.max_dims
    }

    pub fn max_side(&self) -> usize {
        self.max_side
    }

    fn size_one_allowed(&self) -> bool {
        self.min_side <= 1 && 1 <= self.max_side
    }

    pub fn draw_group(&self, data: &mut ConjectureData) -> BroadcastableShapes {
        match &self.signature {
            None => self.draw_loop_dimensions(data, vec![true; self.num_shapes]),
            Some(signature) => self.draw_with_signature(signature, data),
        }
    }

    fn draw_with_signature(&self, signature: &GufuncSignature, data: &mut ConjectureData) -> BroadcastableShapes {
        let mut sizes: HashMap<(String, bool), Option<usize>> = HashMap::new();
        let mut core: Vec<Vec<Option<usize>>> = Vec::new();
        let shapes = signature.inputs().iter().map(Vec::as_slice).chain(std::iter::once(signature.output()));
        for shape in shapes {
            let mut dims = Vec::with_capacity(shape.len());
            for dim in shape {
                match dim {
                    CoreDim::Frozen(n) => dims.push(Some(*n)),
                    CoreDim::Named { name, optional } => {
                        if !sizes.contains_key(&(name.clone(), false)) {
                            let side = draw_side(data, self.min_side, self.max_side);
                            // optional dims are only dropped when rank 0 is allowed
                            let omitted = self.min_dims == 0 && data.draw_bits(3) == 0;
                            sizes.insert((name.clone(), false), Some(side));
                            sizes.insert((name.clone(), true), if omitted { None } else { Some(side) });
                        }
                        dims.push(sizes.get(&(name.clone(), *optional)).copied().flatten());
                    }
                }
            }
            core.push(dims);
        }
        let core_result = core.pop().unwrap_or_default();
        let use_loop = core.iter().map(|dims| dims.iter().all(Option::is_some)).collect();
        let loops = self.draw_loop_dimensions(data, use_loop);

        let join = |loop_dims: &[usize], core_dims: &[Option<usize>]| -> Shape {
            let joined: Vec<Option<usize>> = loop_dims.iter().map(|s| Some(*s)).chain(core_dims.iter().copied()).collect();
            let start = joined.len().saturating_sub(NDIM_MAX);
            joined[start..].iter().filter_map(|s| *s).collect()
        };
        BroadcastableShapes {
            input_shapes: loops
                .input_shapes
                .iter()
                .zip(core.iter())
                .map(|(l, c)| join(l, c))
                .collect(),
            result_shape: join(&loops.result_shape, &core_result),
        }
    }

    /// Draws loop dimensions from the trailing axis outwards. At each axis a
    /// single side is chosen and each shape either takes it or, where the
    /// base shape pins the axis, may take 1 instead.
    fn draw_loop_dimensions(&self, data: &mut ConjectureData, mut use_shape: Vec<bool>) -> BroadcastableShapes {
        let base: Vec<usize> = self.base_shape.iter().rev().copied().collect();
        let mut result: Vec<usize> = base.clone();
        let mut shapes: Vec<Shape> = vec![Vec::new(); self.num_shapes];

        for dim_count in 1..=self.max_dims {
            let dim = dim_count - 1;
            let dim_side = if base.len() < dim_count || base[dim] == 1 {
                draw_side(data, self.min_side, self.max_side)
            } else if base[dim] <= self.max_side {
                base[dim]
            } else {
                1
            };

            for (id, shape) in shapes.iter_mut().enumerate() {
                let side = if dim_count <= base.len() && self.size_one_allowed() {
                    if data.draw_boolean(self.reuse_bias) {
                        dim_side
                    } else {
                        1
                    }
                } else {
                    dim_side
                };
                // the coin is tossed even for finished shapes to keep draws stable
                if self.min_dims < dim_count {
                    let keep_growing = biased_coin(data, 1.0 - 1.0 / (1 + self.max_dims - dim) as f64);
                    use_shape[id] &= keep_growing;
                }
                if use_shape[id] {
                    shape.push(side);
                    if result.len() < shape.len() {
                        result.push(side);
                    } else if side != 1 && result[dim] == 1 {
                        result[dim] = side;
                    }
                }
            }
            if !use_shape.iter().any(|u| *u) {
                break;
            }
        }

        let keep = shapes.iter().map(Vec::len).chain(std::iter::once(base.len())).max().unwrap_or(0);
        result.truncate(keep);
        result.reverse();
        for shape in shapes.iter_mut() {
            shape.reverse();
        }
        BroadcastableShapes {
            input_shapes: shapes,
            result_shape: result,
        }
    }

    fn admits_loop_shape(&self, shape: &[usize]) -> bool {
        (self.min_dims..=self.max_dims).contains(&shape.len())
            && shape.iter().all(|s| (self.min_side..=self.max_side).contains(s))
    }

    /// Whether `group` is one this strategy could have drawn. Groups drawn
    /// from a signature are only admitted unchanged.
    pub fn admits(&self, group: &BroadcastableShapes) -> bool {
        if self.signature.is_some() || group.input_shapes.len() != self.num_shapes {
            return false;
        }
        if !group.input_shapes.iter().all(|s| self.admits_loop_shape(s)) {
            return false;
        }
        let all = std::iter::once(self.base_shape.as_slice()).chain(group.input_shapes.iter().map(Vec::as_slice));
        broadcast_shapes(all).as_ref() == Some(&group.result_shape)
    }

    fn regroup(&self, input_shapes: Vec<Shape>) -> Option<BroadcastableShapes> {
        let all = std::iter::once(self.base_shape.as_slice()).chain(input_shapes.iter().map(Vec::as_slice));
        let result_shape = broadcast_shapes(all)?;
        let group = BroadcastableShapes {
            input_shapes,
            result_shape,
        };
        if self.admits(&group) {
            Some(group)
        } else {
            None
        }
    }

    fn group_candidates(&self, group: &BroadcastableShapes) -> Vec<BroadcastableShapes> {
        let mut out = Vec::new();
        for (i, shape) in group.input_shapes.iter().enumerate() {
            for axis in 0..shape.len() {
                let mut shapes = group.input_shapes.clone();
                shapes[i].remove(axis);
                out.extend(self.regroup(shapes));
            }
        }
        // A side shared by several shapes at one trailing position shrinks
        // for all of them together.
        let rank = group.input_shapes.iter().map(Vec::len).max().unwrap_or(0);
        for k in 0..rank {
            let sides: HashSet<usize> = group
                .input_shapes
                .iter()
                .filter_map(|s| s.len().checked_sub(k + 1).map(|j| s[j]))
                .collect();
            let mut sides: Vec<usize> = sides.into_iter().filter(|s| *s > self.min_side).collect();
            sides.sort_unstable();
            for side in sides {
                let mut targets = vec![self.min_side, 1, side / 2, side - 1];
                targets.retain(|t| *t >= self.min_side && *t < side);
                targets.sort_unstable();
                targets.dedup();
                for target in targets {
                    let shapes: Vec<Shape> = group
                        .input_shapes
                        .iter()
                        .map(|s| {
                            let mut s = s.clone();
                            if let Some(j) = s.len().checked_sub(k + 1) {
                                if s[j] == side {
                                    s[j] = target;
                                }
                            }
                            s
                        })
                        .collect();
                    out.extend(self.regroup(shapes));
                }
            }
        }
        out.retain(|c| c != group);
        out
    }
}

impl Strategy for MutuallyBroadcastableShapes {
    type Value = BroadcastableShapes;

    fn draw(&self, data: &mut ConjectureData) -> Result<BroadcastableShapes> {
        Ok(self.draw_group(data))
    }

    fn shrink(&self, value: &BroadcastableShapes) -> Box<dyn Iterator<Item = BroadcastableShapes> + '_> {
        Box::new(self.group_candidates(value).into_iter())
    }
}

/// Shapes that broadcast against a fixed base shape.
#[derive(Debug, Clone)]
pub struct BroadcastableShapeStrategy {
    inner: MutuallyBroadcastableShapes,
}

pub fn broadcastable_shapes(base_shape: &[usize], bounds: ShapeBounds) -> Result<BroadcastableShapeStrategy> {
    Ok(BroadcastableShapeStrategy {
        inner: MutuallyBroadcastableShapes::resolve(1, None, base_shape, bounds)?,
    })
}

pub fn mutually_broadcastable_shapes(
    num_shapes: usize,
    base_shape: &[usize],
    bounds: ShapeBounds,
) -> Result<MutuallyBroadcastableShapes> {
    MutuallyBroadcastableShapes::new(num_shapes, base_shape, bounds)
}

impl BroadcastableShapeStrategy {
    pub fn with_reuse_bias(self, reuse_bias: f64) -> Result<Self> {
        Ok(BroadcastableShapeStrategy {
            inner: self.inner.with_reuse_bias(reuse_bias)?,
        })
    }

    pub fn base_shape(&self) -> &[usize] {
        self.inner.base_shape()
    }
}

impl ShapeSource for BroadcastableShapeStrategy {
    fn draw_shape(&self, data: &mut ConjectureData) -> Shape {
        let mut group = self.inner.draw_group(data);
        group.input_shapes.pop().unwrap_or_default()
    }

    fn admits(&self, shape: &[usize]) -> bool {
        self.inner.admits_loop_shape(shape) && broadcast_shapes([self.inner.base_shape(), shape]).is_some()
    }

    fn max_size(&self) -> Option<usize> {
        let side = self.inner.base_shape().iter().copied().max().unwrap_or(0).max(self.inner.max_side());
        side.checked_pow(self.inner.max_dims() as u32)
    }
}

impl Strategy for BroadcastableShapeStrategy {
    type Value = Shape;

    fn draw(&self, data: &mut ConjectureData) -> Result<Shape> {
        Ok(self.draw_shape(data))
    }

    fn shrink(&self, value: &Shape) -> Box<dyn Iterator<Item = Shape> + '_> {
        let mut candidates = shape_candidates(value, self.inner.min_side);
        if self.inner.size_one_allowed() {
            for i in 0..value.len() {
                if value[i] > 1 {
                    let mut ones = value.clone();
                    ones[i] = 1;
                    candidates.insert(0, ones);
                }
            }
        }
        Box::new(candidates.into_iter().filter(move |c| self.admits(c)))
    }
}

/// Tuples of distinct axes of an `ndim`-dimensional array, each either
/// non-negative or counted from the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTupleAxes {
    ndim: usize,
    min_size: usize,
    max_size: usize,
}

pub fn valid_tuple_axes(ndim: usize, min_size: usize, max_size: Option<usize>) -> Result<ValidTupleAxes> {
    let max_size = max_size.unwrap_or(ndim);
    order_check("size", 0, min_size, max_size)?;
    check_argument(max_size <= ndim, || format!("max_size={} cannot exceed ndim={}", max_size, ndim))?;
    Ok(ValidTupleAxes {
        ndim,
        min_size,
        max_size,
    })
}

impl ValidTupleAxes {
    fn normalise(&self, axis: isize) -> usize {
        axis.rem_euclid(self.ndim.max(1) as isize) as usize
    }

    pub fn admits(&self, axes: &[isize]) -> bool {
        let n = self.ndim as isize;
        let distinct: HashSet<usize> = axes.iter().map(|a| self.normalise(*a)).collect();
        (self.min_size..=self.max_size).contains(&axes.len())
            && axes.iter().all(|a| -n <= *a && *a < n)
            && distinct.len() == axes.len()
    }
}

impl Strategy for ValidTupleAxes {
    type Value = Vec<isize>;

    fn draw(&self, data: &mut ConjectureData) -> Result<Vec<isize>> {
        let average = ((self.min_size * 2).max(self.min_size + 5) as f64).min(0.5 * (self.min_size + self.max_size) as f64);
        let mut repeat = Repeat::new(self.min_size as u64, self.max_size as u64, average);
        let mut seen = HashSet::new();
        let mut axes = Vec::new();
        let n = self.ndim as isize;
        while repeat.should_continue(data) {
            let x = data.draw_integer(0, (2 * n - 1).max(0) as i128) as isize;
            let mut axis = if x < n { x } else { x - 2 * n };
            if seen.contains(&self.normalise(axis)) {
                if repeat.rejections() < 2 * self.ndim as u64 {
                    repeat.reject();
                    continue;
                }
                match (0..n).find(|a| !seen.contains(&(*a as usize))) {
                    Some(free) => axis = free,
                    None => break,
                }
            }
            seen.insert(self.normalise(axis));
            axes.push(axis);
        }
        Ok(axes)
    }

    fn shrink(&self, value: &Vec<isize>) -> Box<dyn Iterator<Item = Vec<isize>> + '_> {
        let mut candidates = Vec::new();
        for i in 0..value.len() {
            let mut fewer = value.clone();
            fewer.remove(i);
            candidates.push(fewer);
        }
        for (i, axis) in value.iter().enumerate() {
            if *axis < 0 {
                let mut positive = value.clone();
                positive[i] = axis + self.ndim as isize;
                candidates.push(positive);
            }
        }
        Box::new(candidates.into_iter().filter(move |c| self.admits(c)))
    }
}
