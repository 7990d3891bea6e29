// The capability interface an array library has to provide.
//
// Libraries that do not speak this interface natively get a small adapter
// type implementing `ArrayModule`; `ReferenceModule` is one such adapter over
// an in-memory buffer.

use crate::dtypes::Dtype;
use crate::error::Result;
use crate::scalar::Scalar;
use std::fmt;

pub trait ArrayModule: Send + Sync + 'static {
    type Array: Clone + fmt::Debug;

    /// Identifies the module in logs and error messages. Names need not be
    /// unique; dtype catalogs are cached per module handle.
    fn name(&self) -> &str;

    /// Every dtype the module exposes.
    fn dtypes(&self) -> Vec<Dtype>;

    /// Builds an array of `shape` and `dtype` from `values` in row-major
    /// order. `values.len()` is always the product of `shape`.
    fn asarray(&self, shape: &[usize], dtype: Dtype, values: &[Scalar]) -> Result<Self::Array>;

    fn shape_of(&self, array: &Self::Array) -> Vec<usize>;

    fn dtype_of(&self, array: &Self::Array) -> Dtype;

    /// Reads the elements back in row-major order, if the module supports it.
    fn read_flat(&self, _array: &Self::Array) -> Option<Vec<Scalar>> {
        None
    }

    /// Whether the module flushes subnormal values of `dtype` to zero.
    fn flushes_subnormals(&self, _dtype: Dtype) -> bool {
        false
    }
}

impl<M: ArrayModule + ?Sized> ArrayModule for std::sync::Arc<M> {
    type Array = M::Array;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn dtypes(&self) -> Vec<Dtype> {
        (**self).dtypes()
    }

    fn asarray(&self, shape: &[usize], dtype: Dtype, values: &[Scalar]) -> Result<Self::Array> {
        (**self).asarray(shape, dtype, values)
    }

    fn shape_of(&self, array: &Self::Array) -> Vec<usize> {
        (**self).shape_of(array)
    }

    fn dtype_of(&self, array: &Self::Array) -> Dtype {
        (**self).dtype_of(array)
    }

    fn read_flat(&self, array: &Self::Array) -> Option<Vec<Scalar>> {
        (**self).read_flat(array)
    }

    fn flushes_subnormals(&self, dtype: Dtype) -> bool {
        (**self).flushes_subnormals(dtype)
    }
}
