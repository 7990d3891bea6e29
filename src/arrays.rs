//! Array strategies: a shape source, a set of allowed dtypes and one element
//! domain per dtype, assembled into module arrays.
//!
//! Everything that can be wrong with a configuration is checked by
//! `ArrayStrategyBuilder::build`. Once a strategy exists, every draw it makes
//! is constructible; the only errors a draw can still return come from a
//! module that breaks its contract.

use crate::assembler::{assemble, GeneratedArray};
use crate::data::ConjectureData;
use crate::distributions::Repeat;
use crate::dtypes::{Dtype, DtypeCatalog, DtypeFilter, DtypeKind};
use crate::elements::{ElementDomain, ElementsConfig};
use crate::error::{check_argument, check_valid_dims, ArrayError, Result};
use crate::module::ArrayModule;
use crate::scalar::{Scalar, UniqueKey};
use crate::shapes::{shape_size, ArrayShapes, FixedShape, Shape, ShapeBounds, ShapeSource};
use crate::shrinking::{element_reductions, shape_reductions, ArrayShrinker, ShrinkCandidate, ShrinkPhase, ShrinkReport};
use crate::strategy::Strategy;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Where array shapes come from.
#[derive(Debug, Clone)]
pub enum ShapeSpec {
    Fixed(Shape),
    Bounds(ShapeBounds),
    Source(Arc<dyn ShapeSource>),
}

impl Default for ShapeSpec {
    fn default() -> Self {
        ShapeSpec::Bounds(ShapeBounds::default())
    }
}

impl From<usize> for ShapeSpec {
    fn from(size: usize) -> Self {
        ShapeSpec::Fixed(vec![size])
    }
}

impl From<Shape> for ShapeSpec {
    fn from(shape: Shape) -> Self {
        ShapeSpec::Fixed(shape)
    }
}

impl From<&[usize]> for ShapeSpec {
    fn from(shape: &[usize]) -> Self {
        ShapeSpec::Fixed(shape.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for ShapeSpec {
    fn from(shape: [usize; N]) -> Self {
        ShapeSpec::Fixed(shape.to_vec())
    }
}

impl From<ShapeBounds> for ShapeSpec {
    fn from(bounds: ShapeBounds) -> Self {
        ShapeSpec::Bounds(bounds)
    }
}

impl<S: ShapeSource + 'static> From<Arc<S>> for ShapeSpec {
    fn from(source: Arc<S>) -> Self {
        ShapeSpec::Source(source)
    }
}

/// Which dtypes arrays may have. A fixed dtype is never shrunk; the other
/// forms make the dtype part of the draw.
#[derive(Debug, Clone, PartialEq)]
pub enum DtypeChoice {
    Fixed(Dtype),
    Filter(DtypeFilter),
    OneOf(Vec<Dtype>),
}

impl From<Dtype> for DtypeChoice {
    fn from(dtype: Dtype) -> Self {
        DtypeChoice::Fixed(dtype)
    }
}

impl From<DtypeFilter> for DtypeChoice {
    fn from(filter: DtypeFilter) -> Self {
        DtypeChoice::Filter(filter)
    }
}

impl From<Vec<Dtype>> for DtypeChoice {
    fn from(dtypes: Vec<Dtype>) -> Self {
        DtypeChoice::OneOf(dtypes)
    }
}

/// How the background of an array is filled.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    /// Fill from the element domain, unless the array is unique.
    Auto,
    /// Draw every element independently.
    Disabled,
    Value(Scalar),
    Elements(ElementsConfig),
}

impl Default for Fill {
    fn default() -> Self {
        Fill::Auto
    }
}

#[derive(Debug, Clone)]
enum FillSource {
    Value(Scalar),
    Domain(ElementDomain),
}

impl FillSource {
    fn draw(&self, data: &mut ConjectureData) -> Scalar {
        match self {
            FillSource::Value(value) => *value,
            FillSource::Domain(domain) => domain.draw_value(data),
        }
    }

    fn admits(&self, value: &Scalar) -> bool {
        match self {
            FillSource::Value(fill) => fill.same_as(value),
            FillSource::Domain(domain) => domain.contains(value),
        }
    }

    /// Whether every value this fill produces is NaN.
    fn only_nan(&self) -> bool {
        match self {
            FillSource::Value(value) => value.is_nan(),
            FillSource::Domain(domain) => domain.only_nan(),
        }
    }
}

/// Everything the strategy knows about one allowed dtype.
#[derive(Debug, Clone)]
struct DtypeSlot {
    dtype: Dtype,
    elements: ElementDomain,
    fill: Option<FillSource>,
}

pub struct ArrayStrategyBuilder<M: ArrayModule> {
    module: Arc<M>,
    dtype: Option<DtypeChoice>,
    shape: ShapeSpec,
    elements: ElementsConfig,
    fill: Fill,
    unique: bool,
}

impl<M: ArrayModule> ArrayStrategyBuilder<M> {
    pub fn new(module: Arc<M>) -> Self {
        ArrayStrategyBuilder {
            module,
            dtype: None,
            shape: ShapeSpec::default(),
            elements: ElementsConfig::default(),
            fill: Fill::Auto,
            unique: false,
        }
    }

    pub fn dtype(mut self, dtype: impl Into<DtypeChoice>) -> Self {
        self.dtype = Some(dtype.into());
        self
    }

    pub fn shape(mut self, shape: impl Into<ShapeSpec>) -> Self {
        self.shape = shape.into();
        self
    }

    pub fn elements(mut self, elements: ElementsConfig) -> Self {
        self.elements = elements;
        self
    }

    pub fn fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn build(mut self) -> Result<ArrayStrategy<M>> {
        let catalog = DtypeCatalog::of(&self.module);
        let (mut dtypes, dtype_variable) = match self.dtype.take() {
            Some(DtypeChoice::Fixed(dtype)) => (vec![catalog.require(dtype)?], false),
            Some(DtypeChoice::Filter(filter)) => (catalog.filter(&filter)?, true),
            Some(DtypeChoice::OneOf(choices)) => {
                check_argument(!choices.is_empty(), || "at least one dtype must be given".to_string())?;
                let dtypes = choices
                    .into_iter()
                    .map(|dtype| catalog.require(dtype))
                    .collect::<Result<Vec<_>>>()?;
                (dtypes, true)
            }
            None => (catalog.filter(&DtypeFilter::any())?, true),
        };
        dtypes.sort_by_key(|d| (d.bits(), d.kind()));
        dtypes.dedup();

        let shape: Arc<dyn ShapeSource> = match std::mem::take(&mut self.shape) {
            ShapeSpec::Fixed(shape) => {
                check_valid_dims(shape.len(), "len(shape)")?;
                Arc::new(FixedShape(shape))
            }
            ShapeSpec::Bounds(bounds) => Arc::new(ArrayShapes::new(bounds)?),
            ShapeSpec::Source(source) => source,
        };

        let slots = dtypes
            .into_iter()
            .map(|dtype| self.resolve_slot(dtype, shape.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(ArrayStrategy {
            module: self.module,
            shape,
            slots,
            dtype_variable,
            unique: self.unique,
        })
    }

    fn resolve_slot(&self, dtype: Dtype, shape: &dyn ShapeSource) -> Result<DtypeSlot> {
        let module = self.module.as_ref();
        let elements = ElementDomain::for_module(module, dtype, &self.elements)?;
        let fill = match &self.fill {
            Fill::Auto if self.unique => None,
            Fill::Auto => Some(FillSource::Domain(elements.clone())),
            Fill::Disabled => None,
            Fill::Value(value) => {
                let converted = value.convert_to(dtype).ok_or_else(|| {
                    ArrayError::configuration(format!("fill={} cannot be represented as {}", value, dtype))
                })?;
                let subnormal = dtype
                    .float_width()
                    .map_or(false, |width| match converted {
                        Scalar::Float(v) => width.is_subnormal(v),
                        Scalar::Complex(re, im) => width.is_subnormal(re) || width.is_subnormal(im),
                        _ => false,
                    });
                check_argument(!(subnormal && module.flushes_subnormals(dtype)), || {
                    format!("fill={} is subnormal, but {} flushes subnormal {} values", value, module.name(), dtype)
                })?;
                Some(FillSource::Value(converted))
            }
            Fill::Elements(config) => Some(FillSource::Domain(ElementDomain::for_module(module, dtype, config)?)),
        };

        if self.unique {
            if let Some(fill) = &fill {
                check_argument(fill.only_nan(), || {
                    format!(
                        "Cannot fill unique array with non-NaN values (dtype={}); only NaN never collides",
                        dtype
                    )
                })?;
            }
            if let (Some(distinct), Some(max_size)) = (elements.cardinality(), shape.max_size()) {
                check_argument((max_size as u128) <= distinct, || {
                    format!(
                        "unique arrays of up to {} elements were requested, but {} has only {} distinct values \
                         under the given element bounds",
                        max_size, dtype, distinct
                    )
                })?;
            }
        }

        Ok(DtypeSlot { dtype, elements, fill })
    }
}

/// Draws arrays from one module.
pub struct ArrayStrategy<M: ArrayModule> {
    module: Arc<M>,
    shape: Arc<dyn ShapeSource>,
    /// Ordered narrowest dtype first.
    slots: Vec<DtypeSlot>,
    dtype_variable: bool,
    unique: bool,
}

impl<M: ArrayModule> fmt::Debug for ArrayStrategy<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayStrategy")
            .field("module", &self.module.name())
            .field("shape", &self.shape)
            .field("dtypes", &self.dtypes())
            .field("unique", &self.unique)
            .finish()
    }
}

impl<M: ArrayModule> ArrayStrategy<M> {
    pub fn builder(module: Arc<M>) -> ArrayStrategyBuilder<M> {
        ArrayStrategyBuilder::new(module)
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn dtypes(&self) -> Vec<Dtype> {
        self.slots.iter().map(|slot| slot.dtype).collect()
    }

    pub fn dtype_is_variable(&self) -> bool {
        self.dtype_variable
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn shape_source(&self) -> &dyn ShapeSource {
        self.shape.as_ref()
    }

    /// The element domain arrays of `dtype` draw from.
    pub fn elements(&self, dtype: Dtype) -> Option<&ElementDomain> {
        self.slot(dtype).map(|slot| &slot.elements)
    }

    fn slot(&self, dtype: Dtype) -> Option<&DtypeSlot> {
        self.slots.iter().find(|slot| slot.dtype == dtype)
    }

    fn draw_values(&self, data: &mut ConjectureData, slot: &DtypeSlot, size: usize) -> Result<Vec<Scalar>> {
        match &slot.fill {
            None if self.unique => draw_unique(data, &slot.elements, size),
            None => Ok((0..size).map(|_| slot.elements.draw_value(data)).collect()),
            Some(fill) => Ok(self.draw_sparse(data, slot, fill, size)),
        }
    }

    /// One background value plus roughly `sqrt(size)` fresh elements at
    /// distinct positions.
    fn draw_sparse(&self, data: &mut ConjectureData, slot: &DtypeSlot, fill: &FillSource, size: usize) -> Vec<Scalar> {
        let mut values = vec![fill.draw(data); size];
        let mut assigned = vec![false; size];
        let mut seen: HashSet<UniqueKey> = HashSet::new();
        let mut repeat = Repeat::new(0, size as u64, (size as f64).sqrt());
        while repeat.should_continue(data) {
            let index = data.draw_index(size);
            if assigned[index] {
                repeat.reject();
                continue;
            }
            let value = slot.elements.draw_value(data);
            if self.unique {
                if let Some(key) = value.unique_key() {
                    if !seen.insert(key) {
                        repeat.reject();
                        continue;
                    }
                }
            }
            values[index] = value;
            assigned[index] = true;
        }
        values
    }

    /// Whether `candidate` is something this strategy could have drawn.
    pub(crate) fn admits(&self, candidate: &ShrinkCandidate) -> bool {
        let slot = match self.slot(candidate.dtype) {
            Some(slot) => slot,
            None => return false,
        };
        if candidate.values.len() != shape_size(&candidate.shape) || !self.shape.admits(&candidate.shape) {
            return false;
        }
        let in_domain = candidate.values.iter().all(|value| {
            slot.elements.contains(value) || slot.fill.as_ref().map_or(false, |fill| fill.admits(value))
        });
        if !in_domain {
            return false;
        }
        if self.unique {
            let mut seen = HashSet::new();
            return candidate
                .values
                .iter()
                .filter_map(Scalar::unique_key)
                .all(|key| seen.insert(key));
        }
        true
    }

    /// Narrower allowed dtypes holding every value of `current`. Dtypes of
    /// the same kind come first, then other kinds; each group narrowest first.
    /// A float array of integral values can therefore end up with an integer
    /// dtype when the strategy allows one.
    fn dtype_reductions(&self, current: &ShrinkCandidate) -> Vec<ShrinkCandidate> {
        let kind = current.dtype.kind();
        let rank = (current.dtype.bits(), kind);
        let mut narrower: Vec<Dtype> = self
            .slots
            .iter()
            .map(|slot| slot.dtype)
            .filter(|dtype| (dtype.bits(), dtype.kind()) < rank)
            .collect();
        narrower.sort_by_key(|dtype| (dtype.kind() != kind, dtype.bits(), dtype.kind()));
        narrower
            .into_iter()
            .filter_map(|dtype| {
                let values = current
                    .values
                    .iter()
                    .map(|value| value.convert_to(dtype))
                    .collect::<Option<Vec<_>>>()?;
                Some(ShrinkCandidate {
                    shape: current.shape.clone(),
                    dtype,
                    values,
                })
            })
            .collect()
    }

    /// Admissible reductions of `current` along one axis, most aggressive first.
    pub(crate) fn candidates(
        &self,
        phase: ShrinkPhase,
        current: &ShrinkCandidate,
    ) -> Box<dyn Iterator<Item = ShrinkCandidate> + '_> {
        let proposed: Box<dyn Iterator<Item = ShrinkCandidate> + '_> = match phase {
            ShrinkPhase::Shape => shape_reductions(current),
            ShrinkPhase::Dtype if self.dtype_variable => Box::new(self.dtype_reductions(current).into_iter()),
            ShrinkPhase::Elements => match self.elements(current.dtype) {
                Some(domain) => element_reductions(current, domain),
                None => Box::new(std::iter::empty()),
            },
            _ => Box::new(std::iter::empty()),
        };
        Box::new(proposed.filter(move |candidate| self.admits(candidate)))
    }

    pub(crate) fn build_candidate(&self, candidate: ShrinkCandidate) -> Result<GeneratedArray<M::Array>> {
        assemble(self.module.as_ref(), &candidate.shape, candidate.dtype, candidate.values)
    }
}

/// Distinct elements, rejecting duplicates for a while and then taking the
/// first unused domain value.
fn draw_unique(data: &mut ConjectureData, elements: &ElementDomain, size: usize) -> Result<Vec<Scalar>> {
    let patience = 2 * size as u64 + 10;
    let mut seen: HashSet<UniqueKey> = HashSet::new();
    let mut values = Vec::with_capacity(size);
    let mut repeat = Repeat::new(size as u64, size as u64, size as f64);
    while repeat.should_continue(data) {
        let mut value = elements.draw_value(data);
        if let Some(key) = value.unique_key() {
            if seen.contains(&key) {
                if repeat.rejections() < patience {
                    repeat.reject();
                    continue;
                }
                value = first_unused(elements, &seen)?;
            }
            if let Some(key) = value.unique_key() {
                seen.insert(key);
            }
        }
        values.push(value);
    }
    Ok(values)
}

fn first_unused(elements: &ElementDomain, seen: &HashSet<UniqueKey>) -> Result<Scalar> {
    let mut index = 0u128;
    while let Some(value) = elements.value_at(index) {
        match value.unique_key() {
            Some(key) if seen.contains(&key) => index += 1,
            _ => return Ok(value),
        }
    }
    if elements.allows_nan() {
        return Ok(match elements.dtype().kind() {
            DtypeKind::Complex => Scalar::Complex(f64::NAN, f64::NAN),
            _ => Scalar::Float(f64::NAN),
        });
    }
    Err(ArrayError::configuration(format!(
        "ran out of distinct {} values for a unique array of {} elements",
        elements.dtype(),
        seen.len() + 1
    )))
}

impl<M: ArrayModule> Strategy for ArrayStrategy<M> {
    type Value = GeneratedArray<M::Array>;

    fn draw(&self, data: &mut ConjectureData) -> Result<Self::Value> {
        let shape = self.shape.draw_shape(data);
        let slot = if self.slots.len() == 1 {
            &self.slots[0]
        } else {
            data.choose(&self.slots)
        };
        let size = shape_size(&shape);
        let values = if size == 0 {
            Vec::new()
        } else {
            self.draw_values(data, slot, size)?
        };
        assemble(self.module.as_ref(), &shape, slot.dtype, values)
    }

    fn shrink(&self, value: &Self::Value) -> Box<dyn Iterator<Item = Self::Value> + '_> {
        let base = value.candidate();
        let variable = self.dtype_variable;
        Box::new(
            ShrinkPhase::AXES
                .into_iter()
                .filter(move |phase| *phase != ShrinkPhase::Dtype || variable)
                .flat_map(move |phase| self.candidates(phase, &base))
                .filter_map(move |candidate| self.build_candidate(candidate).ok()),
        )
    }

    fn minimize(
        &self,
        value: Self::Value,
        still_fails: &mut dyn FnMut(&Self::Value) -> bool,
        max_calls: usize,
    ) -> (Self::Value, ShrinkReport) {
        ArrayShrinker::new(self, value, still_fails, max_calls).shrink()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceModule;

    fn module(name: &str) -> Arc<ReferenceModule> {
        Arc::new(ReferenceModule::named(name))
    }

    #[test]
    fn test_fixed_shape_and_dtype() {
        let strategy = ArrayStrategy::builder(module("arrays-fixed"))
            .dtype(Dtype::INT16)
            .shape([2usize, 3])
            .build()
            .unwrap();
        assert!(!strategy.dtype_is_variable());
        for array in strategy.samples(1).take(50) {
            let array = array.unwrap();
            assert_eq!(array.array.shape(), &[2, 3]);
            assert_eq!(array.array.dtype(), Dtype::INT16);
            assert_eq!(array.values.len(), 6);
        }
    }

    #[test]
    fn test_integer_size_is_a_vector_shape() {
        let strategy = ArrayStrategy::builder(module("arrays-size"))
            .dtype(Dtype::BOOL)
            .shape(4usize)
            .build()
            .unwrap();
        let array = strategy.example_with_seed(3).unwrap();
        assert_eq!(array.shape, vec![4]);
    }

    #[test]
    fn test_zero_sized_shapes_draw_no_elements() {
        let strategy = ArrayStrategy::builder(module("arrays-empty"))
            .dtype(Dtype::FLOAT64)
            .shape(vec![3usize, 0, 2])
            .build()
            .unwrap();
        let mut data = ConjectureData::new(5);
        let array = strategy.draw(&mut data).unwrap();
        assert!(array.values.is_empty());
        assert_eq!(array.array.shape(), &[3, 0, 2]);
        assert_eq!(data.draw_count(), 0);
    }

    #[test]
    fn test_filtered_dtypes_are_variable() {
        let strategy = ArrayStrategy::builder(module("arrays-filter"))
            .dtype(DtypeFilter::kind(DtypeKind::Int))
            .build()
            .unwrap();
        assert!(strategy.dtype_is_variable());
        assert_eq!(strategy.dtypes(), vec![Dtype::INT8, Dtype::INT16, Dtype::INT32, Dtype::INT64]);
        let drawn: HashSet<Dtype> = strategy.samples(2).take(200).map(|a| a.unwrap().dtype).collect();
        assert_eq!(drawn.len(), 4);
    }

    #[test]
    fn test_unique_arrays_have_distinct_elements() {
        let strategy = ArrayStrategy::builder(module("arrays-unique"))
            .dtype(Dtype::INT8)
            .shape(ShapeBounds::new().dims(1, 2).sides(1, 10))
            .unique(true)
            .build()
            .unwrap();
        for array in strategy.samples(4).take(200) {
            let array = array.unwrap();
            let keys: HashSet<UniqueKey> = array.values.iter().filter_map(Scalar::unique_key).collect();
            assert_eq!(keys.len(), array.size());
        }
    }

    #[test]
    fn test_unique_arrays_may_exhaust_small_domains() {
        let strategy = ArrayStrategy::builder(module("arrays-exhaust"))
            .dtype(Dtype::INT8)
            .shape(5usize)
            .elements(ElementsConfig::new().min_value(0i64).max_value(4i64))
            .unique(true)
            .build()
            .unwrap();
        for array in strategy.samples(8).take(50) {
            let mut values: Vec<i128> = array.unwrap().values.iter().filter_map(Scalar::as_int).collect();
            values.sort_unstable();
            assert_eq!(values, vec![0, 1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_unique_arrays_larger_than_the_domain_are_rejected() {
        let err = ArrayStrategy::builder(module("arrays-too-unique"))
            .dtype(Dtype::BOOL)
            .shape(3usize)
            .unique(true)
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("distinct values"));
    }

    #[test]
    fn test_unique_arrays_can_only_be_filled_with_nan() {
        let err = ArrayStrategy::builder(module("arrays-unique-fill"))
            .dtype(Dtype::FLOAT32)
            .shape(10usize)
            .unique(true)
            .fill(Fill::Value(Scalar::Float(0.0)))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Cannot fill unique array with non-NaN values"));

        let strategy = ArrayStrategy::builder(module("arrays-unique-nan"))
            .dtype(Dtype::FLOAT32)
            .shape(10usize)
            .unique(true)
            .fill(Fill::Value(Scalar::Float(f64::NAN)))
            .build()
            .unwrap();
        for array in strategy.samples(6).take(100) {
            let array = array.unwrap();
            let mut seen = HashSet::new();
            for key in array.values.iter().filter_map(Scalar::unique_key) {
                assert!(seen.insert(key));
            }
        }
    }

    #[test]
    fn test_fill_value_is_the_background() {
        let strategy = ArrayStrategy::builder(module("arrays-fill"))
            .dtype(Dtype::INT32)
            .shape(100usize)
            .elements(ElementsConfig::new().min_value(1i64).max_value(9i64))
            .fill(Fill::Value(Scalar::Int(-1)))
            .build()
            .unwrap();
        let mut mostly_background = 0;
        for array in strategy.samples(7).take(50) {
            let array = array.unwrap();
            let background = array.values.iter().filter(|v| **v == Scalar::Int(-1)).count();
            if background > 50 {
                mostly_background += 1;
            }
            assert!(array
                .values
                .iter()
                .all(|v| *v == Scalar::Int(-1) || (1..=9).contains(&v.as_int().unwrap())));
        }
        assert!(mostly_background >= 40, "{}", mostly_background);
    }

    #[test]
    fn test_fill_values_must_fit_every_dtype() {
        let err = ArrayStrategy::builder(module("arrays-bad-fill"))
            .dtype(Dtype::UINT8)
            .fill(Fill::Value(Scalar::Int(-1)))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("cannot be represented as uint8"));
    }

    #[test]
    fn test_missing_dtype_is_a_configuration_error() {
        let module = Arc::new(ReferenceModule::named("arrays-no-int64").without(Dtype::INT64));
        let err = ArrayStrategy::builder(module).dtype(Dtype::INT64).build().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("does not have dtype int64"));
    }

    #[test]
    fn test_contradictory_elements_fail_at_build_time() {
        let err = ArrayStrategy::builder(module("arrays-bad-elements"))
            .dtype(Dtype::INT8)
            .elements(ElementsConfig::new().min_value(10i64).max_value(1i64))
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_upcasting_module_fails_on_draw() {
        let module = Arc::new(ReferenceModule::named("arrays-upcaster").upcasting(Dtype::FLOAT32, Dtype::FLOAT64));
        let strategy = ArrayStrategy::builder(module)
            .dtype(Dtype::FLOAT32)
            .shape(2usize)
            .build()
            .unwrap();
        let err = strategy.example_with_seed(0).unwrap_err();
        assert!(err.is_module_contract());
    }

    #[test]
    fn test_candidates_stay_inside_the_strategy() {
        let strategy = ArrayStrategy::builder(module("arrays-candidates"))
            .dtype(Dtype::INT32)
            .shape(ShapeBounds::new().dims(1, 2).sides(2, 4))
            .build()
            .unwrap();
        let array = strategy.example_with_seed(11).unwrap();
        for candidate in strategy.shrink(&array).take(200) {
            assert!(strategy.admits(&candidate.candidate()));
            assert!(candidate.shape.iter().all(|side| (2..=4).contains(side)));
        }
    }

    #[test]
    fn test_dtype_reductions_only_keep_representable_values() {
        let strategy = ArrayStrategy::builder(module("arrays-dtype-shrink"))
            .dtype(DtypeFilter::kind(DtypeKind::Int))
            .shape(2usize)
            .build()
            .unwrap();
        let current = ShrinkCandidate {
            shape: vec![2],
            dtype: Dtype::INT64,
            values: vec![Scalar::Int(1000), Scalar::Int(-3)],
        };
        let dtypes: Vec<Dtype> = strategy
            .candidates(ShrinkPhase::Dtype, &current)
            .map(|candidate| candidate.dtype)
            .collect();
        assert_eq!(dtypes, vec![Dtype::INT16, Dtype::INT32]);
    }

    #[test]
    fn test_dtype_reductions_try_the_same_kind_first() {
        let strategy = ArrayStrategy::builder(module("arrays-dtype-kinds"))
            .dtype(DtypeFilter::any())
            .shape(2usize)
            .build()
            .unwrap();
        let current = ShrinkCandidate {
            shape: vec![2],
            dtype: Dtype::FLOAT64,
            values: vec![Scalar::Float(1.0), Scalar::Float(2.0)],
        };
        let reductions: Vec<ShrinkCandidate> = strategy.candidates(ShrinkPhase::Dtype, &current).collect();
        let dtypes: Vec<Dtype> = reductions.iter().map(|candidate| candidate.dtype).collect();
        assert_eq!(
            dtypes,
            vec![
                Dtype::FLOAT32,
                Dtype::UINT8,
                Dtype::INT8,
                Dtype::UINT16,
                Dtype::INT16,
                Dtype::UINT32,
                Dtype::INT32,
                Dtype::UINT64,
                Dtype::INT64,
            ]
        );
        assert_eq!(reductions[2].values, vec![Scalar::Int(1), Scalar::Int(2)]);

        let fractional = ShrinkCandidate {
            values: vec![Scalar::Float(1.5), Scalar::Float(2.0)],
            ..current
        };
        let dtypes: Vec<Dtype> = strategy
            .candidates(ShrinkPhase::Dtype, &fractional)
            .map(|candidate| candidate.dtype)
            .collect();
        assert_eq!(dtypes, vec![Dtype::FLOAT32]);
    }
}
