//! Basic indices: integers, slices, `...` and new axes, as accepted by the
//! basic-indexing rules of an array module.
//!
//! `BasicIndices` first picks one integer or slice per dimension, then
//! inserts new axes and an ellipsis. The number of dimensions the index
//! leaves behind is brought inside `[min_dims, max_dims]` while drawing, by
//! turning slices into integers or the other way round.

use crate::data::ConjectureData;
use crate::error::{check_argument, check_valid_dims, order_check, Result, NDIM_MAX};
use crate::shapes::Shape;
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `start:stop:step` slice. Missing parts take their usual defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl Slice {
    /// `:`, selecting a whole dimension.
    pub const FULL: Slice = Slice {
        start: None,
        stop: None,
        step: None,
    };

    pub fn new(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Slice { start, stop, step }
    }

    /// Number of positions selected from a dimension of `size`, or `None` for
    /// a zero step.
    pub fn len_for(&self, size: usize) -> Option<usize> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return None;
        }
        let n = size as isize;
        let (lower, upper) = if step < 0 { (-1, n - 1) } else { (0, n) };
        let clamp = |bound: Option<isize>, default: isize| match bound {
            None => default,
            Some(v) if v < 0 => (v + n).max(lower),
            Some(v) => v.min(upper),
        };
        let (start, stop) = if step < 0 {
            (clamp(self.start, upper), clamp(self.stop, lower))
        } else {
            (clamp(self.start, lower), clamp(self.stop, upper))
        };
        let len = if step > 0 && start < stop {
            (stop - start - 1) / step + 1
        } else if step < 0 && stop < start {
            (start - stop - 1) / -step + 1
        } else {
            0
        };
        Some(len as usize)
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{}", start)?;
        }
        f.write_str(":")?;
        if let Some(stop) = self.stop {
            write!(f, "{}", stop)?;
        }
        if let Some(step) = self.step {
            write!(f, ":{}", step)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexItem {
    Integer(isize),
    Slice(Slice),
    Ellipsis,
    NewAxis,
}

impl IndexItem {
    fn is_full_slice(&self) -> bool {
        *self == IndexItem::Slice(Slice::FULL)
    }
}

impl fmt::Display for IndexItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexItem::Integer(i) => write!(f, "{}", i),
            IndexItem::Slice(slice) => write!(f, "{}", slice),
            IndexItem::Ellipsis => f.write_str("..."),
            IndexItem::NewAxis => f.write_str("None"),
        }
    }
}

/// A bare index item, or a tuple of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicIndex {
    Single(IndexItem),
    Tuple(Vec<IndexItem>),
}

impl BasicIndex {
    pub fn items(&self) -> &[IndexItem] {
        match self {
            BasicIndex::Single(item) => std::slice::from_ref(item),
            BasicIndex::Tuple(items) => items,
        }
    }

    /// Shape of the result of indexing an array of `shape` with this index,
    /// or `None` if the index is not valid for it.
    pub fn result_shape(&self, shape: &[usize]) -> Option<Shape> {
        let items = self.items();
        let ellipses = items.iter().filter(|item| **item == IndexItem::Ellipsis).count();
        let consumed = items
            .iter()
            .filter(|item| matches!(item, IndexItem::Integer(_) | IndexItem::Slice(_)))
            .count();
        if ellipses > 1 || consumed > shape.len() {
            return None;
        }
        let implied = shape.len() - consumed;

        let mut result = Vec::new();
        let mut sides = shape.iter();
        let mut ellipsis_seen = false;
        for item in items {
            match item {
                IndexItem::Integer(i) => {
                    let side = *sides.next()? as isize;
                    if *i < -side || *i >= side {
                        return None;
                    }
                }
                IndexItem::Slice(slice) => result.push(slice.len_for(*sides.next()?)?),
                IndexItem::NewAxis => result.push(1),
                IndexItem::Ellipsis => {
                    ellipsis_seen = true;
                    result.extend(sides.by_ref().take(implied));
                }
            }
        }
        if !ellipsis_seen {
            result.extend(sides);
        }
        Some(result)
    }
}

impl fmt::Display for BasicIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasicIndex::Single(item) => write!(f, "{}", item),
            BasicIndex::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    pub min_dims: usize,
    pub max_dims: Option<usize>,
    pub allow_newaxis: bool,
    pub allow_ellipsis: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions {
            min_dims: 0,
            max_dims: None,
            allow_newaxis: false,
            allow_ellipsis: true,
        }
    }
}

impl IndexOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dims(mut self, min_dims: usize, max_dims: usize) -> Self {
        self.min_dims = min_dims;
        self.max_dims = Some(max_dims);
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

    pub fn allow_newaxis(mut self, allow: bool) -> Self {
        self.allow_newaxis = allow;
        self
    }

    pub fn allow_ellipsis(mut self, allow: bool) -> Self {
        self.allow_ellipsis = allow;
        self
    }
}

/// Valid basic indices for arrays of one shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicIndices {
    shape: Shape,
    min_dims: usize,
    max_dims: usize,
    allow_newaxis: bool,
    allow_ellipsis: bool,
}

fn cannot_add_dimensions(name: &str, dims: usize, ndim: usize) -> String {
    format!(
        "{}={} is larger than len(shape)={}, but allow_newaxis=False makes it impossible for an \
         indexing operation to add dimensions.",
        name, dims, ndim
    )
}

pub fn basic_indices(shape: &[usize], options: IndexOptions) -> Result<BasicIndices> {
    let ndim = shape.len();
    check_argument(ndim != 0, || "No valid indices for zero-dimensional arrays".to_string())?;
    let min_dims = options.min_dims;
    if !options.allow_newaxis {
        check_argument(min_dims <= ndim, || cannot_add_dimensions("min_dims", min_dims, ndim))?;
    }
    check_valid_dims(min_dims, "min_dims")?;

    let max_dims = match options.max_dims {
        Some(max_dims) => {
            if !options.allow_newaxis {
                check_argument(max_dims <= ndim, || cannot_add_dimensions("max_dims", max_dims, ndim))?;
            }
            max_dims
        }
        None if options.allow_newaxis => (ndim.max(min_dims) + 2).min(NDIM_MAX),
        None => ndim.min(NDIM_MAX),
    };
    check_valid_dims(max_dims, "max_dims")?;
    order_check("dims", 0, min_dims, max_dims)?;

    let empty_sides = shape.iter().filter(|&&side| side == 0).count();
    check_argument(empty_sides <= max_dims, || {
        format!(
            "shape={:?} has {} zero-sized dimensions, which can only be indexed by slices, but max_dims={}",
            shape, empty_sides, max_dims
        )
    })?;

    Ok(BasicIndices {
        shape: shape.to_vec(),
        min_dims,
        max_dims,
        allow_newaxis: options.allow_newaxis,
        allow_ellipsis: options.allow_ellipsis,
    })
}

/// A slice of a dimension of `size`, biased towards short steps.
fn draw_slice(data: &mut ConjectureData, size: usize) -> Slice {
    let n = size as isize;
    let start = if data.draw_boolean(0.5) {
        Some(data.draw_integer(0, n as i128 - 1) as isize)
    } else {
        None
    };
    let stop = if data.draw_boolean(0.5) {
        Some(data.draw_integer(0, n as i128) as isize)
    } else {
        None
    };
    let max_step = match (start, stop) {
        (None, None) => n,
        (None, Some(stop)) => stop,
        (Some(start), None) => start,
        (Some(start), Some(stop)) => (start - stop).abs(),
    };
    let mut step = data.draw_integer(1, max_step.max(1) as i128) as isize;
    if (data.draw_boolean(0.5) && start == stop) || stop.unwrap_or(0) < start.unwrap_or(0) {
        step = -step;
    }
    let start = match start {
        Some(start) if data.draw_boolean(0.5) => Some(start - n),
        start => start,
    };
    let stop = match stop {
        Some(stop) if data.draw_boolean(0.5) => Some(stop - n),
        stop => stop,
    };
    let step = if step == 1 && data.draw_boolean(0.5) { None } else { Some(step) };
    Slice { start, stop, step }
}

fn draw_integer_index(data: &mut ConjectureData, side: usize) -> IndexItem {
    IndexItem::Integer(data.draw_integer(-(side as i128), side as i128 - 1) as isize)
}

impl BasicIndices {
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn min_dims(&self) -> usize {
        self.min_dims
    }

    pub fn max_dims(&self) -> usize {
        self.max_dims
    }

    pub fn admits(&self, index: &BasicIndex) -> bool {
        let items = index.items();
        if !self.allow_newaxis && items.contains(&IndexItem::NewAxis) {
            return false;
        }
        if !self.allow_ellipsis && items.contains(&IndexItem::Ellipsis) {
            return false;
        }
        match index.result_shape(&self.shape) {
            Some(result) => (self.min_dims..=self.max_dims).contains(&result.len()),
            None => false,
        }
    }

    /// Turns slices into integers, or integers into slices, until the number
    /// of slices is one the remaining steps can work with.
    fn settle_dims(&self, data: &mut ConjectureData, items: &mut [IndexItem]) {
        let is_slice = |item: &IndexItem| matches!(item, IndexItem::Slice(_));
        let mut dims = items.iter().filter(|item| is_slice(item)).count();
        while dims > self.max_dims {
            let narrowable: Vec<usize> = (0..items.len())
                .filter(|&i| is_slice(&items[i]) && self.shape[i] > 0)
                .collect();
            let at = narrowable[data.draw_index(narrowable.len())];
            items[at] = draw_integer_index(data, self.shape[at]);
            dims -= 1;
        }
        while !self.allow_newaxis && dims < self.min_dims {
            let widenable: Vec<usize> = (0..items.len()).filter(|&i| !is_slice(&items[i])).collect();
            let at = widenable[data.draw_index(widenable.len())];
            items[at] = IndexItem::Slice(draw_slice(data, self.shape[at]));
            dims += 1;
        }
    }
}

impl Strategy for BasicIndices {
    type Value = BasicIndex;

    fn draw(&self, data: &mut ConjectureData) -> Result<BasicIndex> {
        let mut items: Vec<IndexItem> = self
            .shape
            .iter()
            .map(|&side| {
                if side == 0 {
                    IndexItem::Slice(Slice::FULL)
                } else if data.draw_boolean(0.5) {
                    draw_integer_index(data, side)
                } else {
                    IndexItem::Slice(draw_slice(data, side))
                }
            })
            .collect();
        self.settle_dims(data, &mut items);

        let mut dims = items.iter().filter(|item| matches!(item, IndexItem::Slice(_))).count();
        while self.allow_newaxis && dims < self.max_dims && (dims < self.min_dims || data.draw_boolean(0.5)) {
            let at = data.draw_usize(0, items.len());
            items.insert(at, IndexItem::NewAxis);
            dims += 1;
        }

        if self.allow_ellipsis && data.draw_boolean(0.5) {
            let at = data.draw_usize(0, items.len());
            let (mut start, mut end) = (at, at);
            while start > 0 && items[start - 1].is_full_slice() {
                start -= 1;
            }
            while end < items.len() && items[end].is_full_slice() {
                end += 1;
            }
            items.splice(start..end, std::iter::once(IndexItem::Ellipsis));
        } else {
            while items.last().map_or(false, IndexItem::is_full_slice) && data.draw_integer(0, 7) != 0 {
                items.pop();
            }
        }

        if items.len() == 1 && data.draw_boolean(0.5) {
            if let Some(item) = items.pop() {
                return Ok(BasicIndex::Single(item));
            }
        }
        Ok(BasicIndex::Tuple(items))
    }

    fn shrink(&self, value: &BasicIndex) -> Box<dyn Iterator<Item = BasicIndex> + '_> {
        let items = value.items().to_vec();
        let rebuild = |items: Vec<IndexItem>| match value {
            BasicIndex::Single(_) if items.len() == 1 => BasicIndex::Single(items[0]),
            _ => BasicIndex::Tuple(items),
        };

        let mut candidates = Vec::new();
        for (i, item) in items.iter().enumerate() {
            if *item == IndexItem::NewAxis {
                let mut fewer = items.clone();
                fewer.remove(i);
                candidates.push(rebuild(fewer));
            }
        }
        for (i, item) in items.iter().enumerate() {
            let simpler = match item {
                IndexItem::Integer(v) if *v != 0 => IndexItem::Integer(0),
                IndexItem::Slice(slice) if *slice != Slice::FULL => IndexItem::Slice(Slice::FULL),
                _ => continue,
            };
            let mut replaced = items.clone();
            replaced[i] = simpler;
            candidates.push(rebuild(replaced));
        }
        Box::new(candidates.into_iter().filter(move |c| self.admits(c)))
    }
}
