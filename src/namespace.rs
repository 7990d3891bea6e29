//! Strategies bound to one array module.
//!
//! `XpStrategies` is the entry point most callers want: it owns the module,
//! resolves its dtype catalog once and hands out every strategy this crate
//! provides with the module already filled in.

use crate::arrays::{ArrayStrategyBuilder, DtypeChoice, ShapeSpec};
use crate::dtypes::{Dtype, DtypeCatalog, DtypeFilter, DtypeKind};
use crate::elements::{ElementDomain, ElementsConfig};
use crate::error::Result;
use crate::indices::{BasicIndices, IndexOptions};
use crate::module::ArrayModule;
use crate::shapes::{
    ArrayShapes, BroadcastableShapeStrategy, MutuallyBroadcastableShapes, ShapeBounds, ValidTupleAxes,
};
use crate::strategy::{DtypeStrategy, SampledFrom};
use std::sync::Arc;

pub struct XpStrategies<M: ArrayModule> {
    module: Arc<M>,
    catalog: Arc<DtypeCatalog>,
}

impl<M: ArrayModule> Clone for XpStrategies<M> {
    fn clone(&self) -> Self {
        XpStrategies {
            module: Arc::clone(&self.module),
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<M: ArrayModule> XpStrategies<M> {
    pub fn new(module: M) -> Self {
        Self::shared(Arc::new(module))
    }

    pub fn shared(module: Arc<M>) -> Self {
        let catalog = DtypeCatalog::of(&module);
        XpStrategies { module, catalog }
    }

    pub fn module(&self) -> &Arc<M> {
        &self.module
    }

    pub fn catalog(&self) -> &DtypeCatalog {
        &self.catalog
    }

    /// Scalars of `dtype` under `config`.
    pub fn from_dtype(&self, dtype: Dtype, config: &ElementsConfig) -> Result<ElementDomain> {
        let dtype = self.catalog.require(dtype)?;
        ElementDomain::for_module(self.module.as_ref(), dtype, config)
    }

    /// Starts an array strategy; finish it with `build()`.
    pub fn arrays(&self, dtype: impl Into<DtypeChoice>, shape: impl Into<ShapeSpec>) -> ArrayStrategyBuilder<M> {
        ArrayStrategyBuilder::new(Arc::clone(&self.module))
            .dtype(dtype)
            .shape(shape)
    }

    pub fn array_shapes(&self, bounds: ShapeBounds) -> Result<ArrayShapes> {
        ArrayShapes::new(bounds)
    }

    fn dtypes(&self, filter: DtypeFilter) -> Result<DtypeStrategy> {
        SampledFrom::new(self.catalog.filter(&filter)?)
    }

    /// Boolean, integer, unsigned and floating dtypes.
    pub fn scalar_dtypes(&self) -> Result<DtypeStrategy> {
        self.dtypes(DtypeFilter::kinds(&[
            DtypeKind::Bool,
            DtypeKind::UInt,
            DtypeKind::Int,
            DtypeKind::Float,
        ]))
    }

    pub fn boolean_dtypes(&self) -> Result<DtypeStrategy> {
        self.dtypes(DtypeFilter::kind(DtypeKind::Bool))
    }

    /// Every numeric dtype, complex included.
    pub fn numeric_dtypes(&self) -> Result<DtypeStrategy> {
        self.dtypes(DtypeFilter::kinds(&[
            DtypeKind::UInt,
            DtypeKind::Int,
            DtypeKind::Float,
            DtypeKind::Complex,
        ]))
    }

    /// Signed integer dtypes of the given bit widths, all of them when `None`.
    pub fn integer_dtypes(&self, sizes: Option<&[u32]>) -> Result<DtypeStrategy> {
        self.sized(DtypeKind::Int, sizes)
    }

    pub fn unsigned_integer_dtypes(&self, sizes: Option<&[u32]>) -> Result<DtypeStrategy> {
        self.sized(DtypeKind::UInt, sizes)
    }

    /// Floating dtypes; `None` means 32 and 64 bits.
    pub fn floating_dtypes(&self, sizes: Option<&[u32]>) -> Result<DtypeStrategy> {
        self.sized(DtypeKind::Float, sizes)
    }

    pub fn complex_dtypes(&self, sizes: Option<&[u32]>) -> Result<DtypeStrategy> {
        self.sized(DtypeKind::Complex, sizes)
    }

    fn sized(&self, kind: DtypeKind, sizes: Option<&[u32]>) -> Result<DtypeStrategy> {
        let filter = match sizes {
            Some(sizes) => DtypeFilter::kind(kind).with_sizes(sizes),
            None => DtypeFilter::kind(kind),
        };
        self.dtypes(filter)
    }

    pub fn valid_tuple_axes(&self, ndim: usize, min_size: usize, max_size: Option<usize>) -> Result<ValidTupleAxes> {
        crate::shapes::valid_tuple_axes(ndim, min_size, max_size)
    }

    /// Basic indices (integers, slices, `...` and, if allowed, new axes) into
    /// arrays of `shape`.
    pub fn indices(&self, shape: &[usize], options: IndexOptions) -> Result<BasicIndices> {
        crate::indices::basic_indices(shape, options)
    }

    pub fn broadcastable_shapes(&self, base_shape: &[usize], bounds: ShapeBounds) -> Result<BroadcastableShapeStrategy> {
        crate::shapes::broadcastable_shapes(base_shape, bounds)
    }

    pub fn mutually_broadcastable_shapes(
        &self,
        num_shapes: usize,
        base_shape: &[usize],
        bounds: ShapeBounds,
    ) -> Result<MutuallyBroadcastableShapes> {
        crate::shapes::mutually_broadcastable_shapes(num_shapes, base_shape, bounds)
    }

    /// Shape groups for a generalised ufunc, e.g. `(m,n),(n,p)->(m,p)`.
    pub fn mutually_broadcastable_shapes_with_signature(
        &self,
        signature: &str,
        base_shape: &[usize],
        bounds: ShapeBounds,
    ) -> Result<MutuallyBroadcastableShapes> {
        MutuallyBroadcastableShapes::with_signature(signature, base_shape, bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceModule;
    use crate::strategy::Strategy;

    #[test]
    fn test_dtype_strategies_follow_the_catalog() {
        let xp = XpStrategies::new(ReferenceModule::named("namespace-full"));
        assert_eq!(
            xp.integer_dtypes(None).unwrap().values(),
            &[Dtype::INT8, Dtype::INT16, Dtype::INT32, Dtype::INT64]
        );
        assert_eq!(xp.floating_dtypes(None).unwrap().values(), &[Dtype::FLOAT32, Dtype::FLOAT64]);
        assert_eq!(
            xp.floating_dtypes(Some(&[16][..])).unwrap().values(),
            &[Dtype::FLOAT16]
        );
        assert_eq!(xp.boolean_dtypes().unwrap().values(), &[Dtype::BOOL]);
        assert!(!xp.scalar_dtypes().unwrap().values().iter().any(|d| d.kind() == DtypeKind::Complex));
        assert!(xp.numeric_dtypes().unwrap().values().contains(&Dtype::COMPLEX128));
    }

    #[test]
    fn test_invalid_sizes_are_rejected() {
        let xp = XpStrategies::new(ReferenceModule::named("namespace-sizes"));
        let err = xp.integer_dtypes(Some(&[12][..])).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("valid sizes"));
    }

    #[test]
    fn test_from_dtype_requires_the_dtype() {
        let xp = XpStrategies::new(ReferenceModule::named("namespace-no-float16").without(Dtype::FLOAT16));
        assert!(xp.from_dtype(Dtype::FLOAT16, &ElementsConfig::new()).is_err());
        let domain = xp.from_dtype(Dtype::UINT8, &ElementsConfig::new()).unwrap();
        assert_eq!(domain.cardinality(), Some(256));
    }

    #[test]
    fn test_arrays_use_the_bound_module() {
        let xp = XpStrategies::new(ReferenceModule::named("namespace-arrays"));
        let strategy = xp.arrays(Dtype::UINT16, vec![2usize, 2]).build().unwrap();
        let array = strategy.example_with_seed(4).unwrap();
        assert_eq!(array.array.shape(), &[2, 2]);
        assert_eq!(array.array.dtype(), Dtype::UINT16);
    }
}
