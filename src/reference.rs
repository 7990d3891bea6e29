//! An in-memory array module.
//!
//! `ReferenceModule` stores every array as a flat little-endian byte buffer
//! and supports all known dtypes. Its knobs reproduce the ways real libraries
//! fall short of the standard: dtypes left out of the namespace, dtypes that
//! are silently upcast on construction, and subnormals flushed to zero.

use crate::dtypes::{Dtype, DtypeKind};
use crate::error::{ArrayError, Result};
use crate::module::ArrayModule;
use crate::scalar::Scalar;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use half::f16;
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceArray {
    shape: Vec<usize>,
    dtype: Dtype,
    data: Vec<u8>,
}

impl ReferenceArray {
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Elements in row-major order.
    pub fn to_vec(&self) -> Result<Vec<Scalar>> {
        decode(self.dtype, self.size(), &self.data)
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceModule {
    name: String,
    excluded: Vec<Dtype>,
    upcasts: Vec<(Dtype, Dtype)>,
    flushed: Vec<Dtype>,
}

impl Default for ReferenceModule {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceModule {
    pub fn new() -> Self {
        Self::named("reference")
    }

    pub fn named(name: impl Into<String>) -> Self {
        ReferenceModule {
            name: name.into(),
            excluded: Vec::new(),
            upcasts: Vec::new(),
            flushed: Vec::new(),
        }
    }

    /// Leaves `dtype` out of the module's namespace.
    pub fn without(mut self, dtype: Dtype) -> Self {
        self.excluded.push(dtype);
        self
    }

    /// Stores arrays requested as `from` with dtype `to` instead.
    pub fn upcasting(mut self, from: Dtype, to: Dtype) -> Self {
        self.upcasts.push((from, to));
        self
    }

    pub fn flushing_subnormals(mut self, dtype: Dtype) -> Self {
        self.flushed.push(dtype);
        self
    }

    fn storage_dtype(&self, requested: Dtype) -> Dtype {
        self.upcasts
            .iter()
            .find(|(from, _)| *from == requested)
            .map_or(requested, |(_, to)| *to)
    }

    fn flush(&self, dtype: Dtype, value: Scalar) -> Scalar {
        if !self.flushes_subnormals(dtype) {
            return value;
        }
        let width = match dtype.float_width() {
            Some(width) => width,
            None => return value,
        };
        let flush = |v: f64| if width.is_subnormal(v) { 0.0f64.copysign(v) } else { v };
        match value {
            Scalar::Float(v) => Scalar::Float(flush(v)),
            Scalar::Complex(re, im) => Scalar::Complex(flush(re), flush(im)),
            other => other,
        }
    }
}

impl ArrayModule for ReferenceModule {
    type Array = ReferenceArray;

    fn name(&self) -> &str {
        &self.name
    }

    fn dtypes(&self) -> Vec<Dtype> {
        Dtype::KNOWN
            .iter()
            .copied()
            .filter(|d| !self.excluded.contains(d))
            .collect()
    }

    fn asarray(&self, shape: &[usize], dtype: Dtype, values: &[Scalar]) -> Result<ReferenceArray> {
        let size: usize = shape.iter().product();
        if size != values.len() {
            return Err(ArrayError::contract(
                &self.name,
                format!("shape {:?} needs {} values but got {}", shape, size, values.len()),
            ));
        }
        let storage = self.storage_dtype(dtype);
        let mut data = Vec::with_capacity(size * storage.itemsize());
        for value in values {
            let stored = value.convert_to(storage).ok_or_else(|| {
                ArrayError::contract(&self.name, format!("cannot store {} as {}", value, storage))
            })?;
            encode(&mut data, storage, self.flush(storage, stored))
                .map_err(|e| ArrayError::contract(&self.name, format!("buffer write error: {}", e)))?;
        }
        Ok(ReferenceArray {
            shape: shape.to_vec(),
            dtype: storage,
            data,
        })
    }

    fn shape_of(&self, array: &ReferenceArray) -> Vec<usize> {
        array.shape.clone()
    }

    fn dtype_of(&self, array: &ReferenceArray) -> Dtype {
        array.dtype
    }

    fn read_flat(&self, array: &ReferenceArray) -> Option<Vec<Scalar>> {
        match array.to_vec() {
            Ok(values) => Some(values),
            Err(e) => {
                log::warn!("Could not read back array from {}: {}", self.name, e);
                None
            }
        }
    }

    fn flushes_subnormals(&self, dtype: Dtype) -> bool {
        self.flushed.contains(&dtype)
    }
}

fn encode(buffer: &mut Vec<u8>, dtype: Dtype, value: Scalar) -> std::io::Result<()> {
    match (dtype.kind(), dtype.bits(), value) {
        (DtypeKind::Bool, _, Scalar::Bool(b)) => buffer.write_u8(b as u8),
        (DtypeKind::Int, 8, Scalar::Int(v)) => buffer.write_i8(v as i8),
        (DtypeKind::Int, 16, Scalar::Int(v)) => buffer.write_i16::<LittleEndian>(v as i16),
        (DtypeKind::Int, 32, Scalar::Int(v)) => buffer.write_i32::<LittleEndian>(v as i32),
        (DtypeKind::Int, _, Scalar::Int(v)) => buffer.write_i64::<LittleEndian>(v as i64),
        (DtypeKind::UInt, 8, Scalar::Int(v)) => buffer.write_u8(v as u8),
        (DtypeKind::UInt, 16, Scalar::Int(v)) => buffer.write_u16::<LittleEndian>(v as u16),
        (DtypeKind::UInt, 32, Scalar::Int(v)) => buffer.write_u32::<LittleEndian>(v as u32),
        (DtypeKind::UInt, _, Scalar::Int(v)) => buffer.write_u64::<LittleEndian>(v as u64),
        (DtypeKind::Float, 16, Scalar::Float(v)) => {
            buffer.write_u16::<LittleEndian>(f16::from_f64(v).to_bits())
        }
        (DtypeKind::Float, 32, Scalar::Float(v)) => buffer.write_f32::<LittleEndian>(v as f32),
        (DtypeKind::Float, _, Scalar::Float(v)) => buffer.write_f64::<LittleEndian>(v),
        (DtypeKind::Complex, 64, Scalar::Complex(re, im)) => {
            buffer.write_f32::<LittleEndian>(re as f32)?;
            buffer.write_f32::<LittleEndian>(im as f32)
        }
        (DtypeKind::Complex, _, Scalar::Complex(re, im)) => {
            buffer.write_f64::<LittleEndian>(re)?;
            buffer.write_f64::<LittleEndian>(im)
        }
        (_, _, value) => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a {} value", value, dtype),
        )),
    }
}

fn decode(dtype: Dtype, size: usize, data: &[u8]) -> Result<Vec<Scalar>> {
    let mut cursor = Cursor::new(data);
    let mut values = Vec::with_capacity(size);
    let read_error = |e: std::io::Error| ArrayError::contract("reference", format!("buffer read error: {}", e));
    for _ in 0..size {
        let value = match (dtype.kind(), dtype.bits()) {
            (DtypeKind::Bool, _) => Scalar::Bool(cursor.read_u8().map_err(read_error)? != 0),
            (DtypeKind::Int, 8) => Scalar::Int(cursor.read_i8().map_err(read_error)? as i128),
            (DtypeKind::Int, 16) => Scalar::Int(cursor.read_i16::<LittleEndian>().map_err(read_error)? as i128),
            (DtypeKind::Int, 32) => Scalar::Int(cursor.read_i32::<LittleEndian>().map_err(read_error)? as i128),
            (DtypeKind::Int, _) => Scalar::Int(cursor.read_i64::<LittleEndian>().map_err(read_error)? as i128),
            (DtypeKind::UInt, 8) => Scalar::Int(cursor.read_u8().map_err(read_error)? as i128),
            (DtypeKind::UInt, 16) => Scalar::Int(cursor.read_u16::<LittleEndian>().map_err(read_error)? as i128),
            (DtypeKind::UInt, 32) => Scalar::Int(cursor.read_u32::<LittleEndian>().map_err(read_error)? as i128),
            (DtypeKind::UInt, _) => Scalar::Int(cursor.read_u64::<LittleEndian>().map_err(read_error)? as i128),
            (DtypeKind::Float, 16) => {
                Scalar::Float(f16::from_bits(cursor.read_u16::<LittleEndian>().map_err(read_error)?).to_f64())
            }
            (DtypeKind::Float, 32) => Scalar::Float(cursor.read_f32::<LittleEndian>().map_err(read_error)? as f64),
            (DtypeKind::Float, _) => Scalar::Float(cursor.read_f64::<LittleEndian>().map_err(read_error)?),
            (DtypeKind::Complex, 64) => {
                let re = cursor.read_f32::<LittleEndian>().map_err(read_error)? as f64;
                let im = cursor.read_f32::<LittleEndian>().map_err(read_error)? as f64;
                Scalar::Complex(re, im)
            }
            (DtypeKind::Complex, _) => {
                let re = cursor.read_f64::<LittleEndian>().map_err(read_error)?;
                let im = cursor.read_f64::<LittleEndian>().map_err(read_error)?;
                Scalar::Complex(re, im)
            }
        };
        values.push(value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_back_what_was_stored() {
        let module = ReferenceModule::new();
        let cases = vec![
            (Dtype::BOOL, vec![Scalar::Bool(true), Scalar::Bool(false)]),
            (Dtype::INT8, vec![Scalar::Int(-128), Scalar::Int(127)]),
            (Dtype::UINT64, vec![Scalar::Int(u64::MAX as i128), Scalar::Int(0)]),
            (Dtype::FLOAT16, vec![Scalar::Float(65504.0), Scalar::Float(-0.0)]),
            (Dtype::FLOAT32, vec![Scalar::Float(0.5), Scalar::Float(f64::INFINITY)]),
            (Dtype::COMPLEX64, vec![Scalar::Complex(1.5, -2.0), Scalar::Complex(0.0, 0.25)]),
        ];
        for (dtype, values) in cases {
            let array = module.asarray(&[2], dtype, &values).unwrap();
            assert_eq!(array.dtype(), dtype);
            assert_eq!(array.as_bytes().len(), 2 * dtype.itemsize());
            let back = module.read_flat(&array).unwrap();
            for (a, b) in back.iter().zip(values.iter()) {
                assert!(a.same_as(b), "{} != {} for {}", a, b, dtype);
            }
        }
    }

    #[test]
    fn test_empty_shapes_have_empty_buffers() {
        let module = ReferenceModule::new();
        let array = module.asarray(&[3, 0], Dtype::FLOAT64, &[]).unwrap();
        assert_eq!(array.size(), 0);
        assert!(array.as_bytes().is_empty());
        assert_eq!(module.shape_of(&array), vec![3, 0]);
    }

    #[test]
    fn test_wrong_value_count_is_rejected() {
        let module = ReferenceModule::new();
        let err = module.asarray(&[2, 2], Dtype::INT32, &[Scalar::Int(1)]).unwrap_err();
        assert!(err.is_module_contract());
    }

    #[test]
    fn test_knobs() {
        let module = ReferenceModule::named("quirky")
            .without(Dtype::UINT16)
            .upcasting(Dtype::FLOAT32, Dtype::FLOAT64)
            .flushing_subnormals(Dtype::FLOAT64);
        assert!(!module.dtypes().contains(&Dtype::UINT16));
        assert_eq!(module.name(), "quirky");

        let array = module.asarray(&[1], Dtype::FLOAT32, &[Scalar::Float(0.5)]).unwrap();
        assert_eq!(module.dtype_of(&array), Dtype::FLOAT64);

        let tiny = Scalar::Float(-5e-324);
        let array = module.asarray(&[1], Dtype::FLOAT64, &[tiny]).unwrap();
        let back = module.read_flat(&array).unwrap();
        assert!(back[0].same_as(&Scalar::Float(-0.0)));
    }
}
