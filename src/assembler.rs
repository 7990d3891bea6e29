// Turns a shape, a dtype and row-major values into a module array, then
// checks the module built what was asked for.

use crate::dtypes::Dtype;
use crate::error::{ArrayError, Result};
use crate::module::ArrayModule;
use crate::scalar::Scalar;
use crate::shapes::{shape_size, Shape};
use crate::shrinking::ShrinkCandidate;

/// A module array together with the parameters it was built from.
#[derive(Debug, Clone)]
pub struct GeneratedArray<A> {
    pub array: A,
    pub shape: Shape,
    pub dtype: Dtype,
    pub values: Vec<Scalar>,
}

impl<A> GeneratedArray<A> {
    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// The construction parameters, detached from the array.
    pub fn candidate(&self) -> ShrinkCandidate {
        ShrinkCandidate {
            shape: self.shape.clone(),
            dtype: self.dtype,
            values: self.values.clone(),
        }
    }
}

/// Builds one array through `module.asarray`.
///
/// Asking for the wrong number of values is a configuration error. An array
/// whose shape, dtype or (when the module can read it back) contents differ
/// from the request is a module contract error: nothing generated from such
/// a module can be trusted.
pub fn assemble<M: ArrayModule + ?Sized>(
    module: &M,
    shape: &[usize],
    dtype: Dtype,
    values: Vec<Scalar>,
) -> Result<GeneratedArray<M::Array>> {
    let size = shape_size(shape);
    if values.len() != size {
        return Err(ArrayError::configuration(format!(
            "shape {:?} holds {} elements but {} values were given",
            shape,
            size,
            values.len()
        )));
    }

    let array = module.asarray(shape, dtype, &values)?;

    let got_dtype = module.dtype_of(&array);
    if got_dtype != dtype {
        return Err(ArrayError::contract(
            module.name(),
            format!("requested dtype {} but got {}", dtype, got_dtype),
        ));
    }
    let got_shape = module.shape_of(&array);
    if got_shape != shape {
        return Err(ArrayError::contract(
            module.name(),
            format!("requested shape {:?} but got {:?}", shape, got_shape),
        ));
    }

    if let Some(stored) = module.read_flat(&array) {
        if stored.len() != values.len() {
            return Err(ArrayError::contract(
                module.name(),
                format!("array of shape {:?} reads back {} elements", shape, stored.len()),
            ));
        }
        if let Some((index, (want, got))) = values
            .iter()
            .zip(stored.iter())
            .enumerate()
            .find(|(_, (want, got))| !want.same_as(got))
        {
            return Err(ArrayError::contract(
                module.name(),
                format!("element {} was set to {} but reads back as {}", index, want, got),
            ));
        }
    }

    Ok(GeneratedArray {
        array,
        shape: shape.to_vec(),
        dtype,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceModule;

    #[test]
    fn test_builds_row_major_arrays() {
        let module = ReferenceModule::new();
        let values: Vec<Scalar> = (0..6).map(|i| Scalar::Int(i)).collect();
        let built = assemble(&module, &[2, 3], Dtype::INT16, values.clone()).unwrap();
        assert_eq!(built.array.shape(), &[2, 3]);
        assert_eq!(built.array.dtype(), Dtype::INT16);
        assert_eq!(built.array.to_vec().unwrap(), values);
        assert_eq!(built.size(), 6);
        assert_eq!(built.ndim(), 2);
    }

    #[test]
    fn test_scalar_and_empty_shapes() {
        let module = ReferenceModule::new();
        let scalar = assemble(&module, &[], Dtype::FLOAT32, vec![Scalar::Float(1.5)]).unwrap();
        assert_eq!(scalar.size(), 1);

        let empty = assemble(&module, &[3, 0], Dtype::BOOL, Vec::new()).unwrap();
        assert_eq!(empty.array.shape(), &[3, 0]);
        assert!(empty.values.is_empty());
    }

    #[test]
    fn test_wrong_value_count_is_a_configuration_error() {
        let module = ReferenceModule::new();
        let err = assemble(&module, &[2, 2], Dtype::INT8, vec![Scalar::Int(1)]).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_upcasting_module_breaks_the_contract() {
        let module = ReferenceModule::named("upcaster").upcasting(Dtype::INT32, Dtype::INT64);
        let err = assemble(&module, &[1], Dtype::INT32, vec![Scalar::Int(3)]).unwrap_err();
        assert!(err.is_module_contract());
        assert!(err.to_string().contains("requested dtype int32 but got int64"), "{}", err);
    }

    #[test]
    fn test_flushed_values_break_the_contract() {
        let module = ReferenceModule::new().flushing_subnormals(Dtype::FLOAT64);
        let tiny = f64::from_bits(1);
        let err = assemble(&module, &[1], Dtype::FLOAT64, vec![Scalar::Float(tiny)]).unwrap_err();
        assert!(err.is_module_contract());
        assert!(err.to_string().contains("reads back"));
    }
}
