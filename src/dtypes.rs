//! Dtype descriptors and the per-module dtype catalog.
//!
//! A `Dtype` is a (kind, bit width) pair. The catalog records which of them an
//! array module reports, partitioned by kind, and answers filter queries such
//! as "every signed integer dtype of at most 32 bits". Catalogs are computed
//! once per module handle and shared by every clone of that handle.

use crate::error::{ArrayError, Result};
use crate::floats::FloatWidth;
use crate::module::ArrayModule;
use crate::scalar::Scalar;
use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Numeric kinds, ordered from simplest to most complex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DtypeKind {
    Bool,
    UInt,
    Int,
    Float,
    Complex,
}

impl DtypeKind {
    pub const ALL: [DtypeKind; 5] = [
        DtypeKind::Bool,
        DtypeKind::UInt,
        DtypeKind::Int,
        DtypeKind::Float,
        DtypeKind::Complex,
    ];

    /// Every bit width this kind can have.
    pub fn valid_sizes(self) -> &'static [u32] {
        match self {
            DtypeKind::Bool => &[8],
            DtypeKind::UInt | DtypeKind::Int => &[8, 16, 32, 64],
            DtypeKind::Float => &[16, 32, 64],
            DtypeKind::Complex => &[64, 128],
        }
    }

    /// Widths a category covers when no sizes are requested. float16 is
    /// outside the standard and only used when asked for.
    pub fn default_sizes(self) -> &'static [u32] {
        match self {
            DtypeKind::Float => &[32, 64],
            other => other.valid_sizes(),
        }
    }

    fn category(self) -> &'static str {
        match self {
            DtypeKind::Bool => "bool",
            DtypeKind::UInt => "uint",
            DtypeKind::Int => "int",
            DtypeKind::Float => "float",
            DtypeKind::Complex => "complex",
        }
    }
}

impl fmt::Display for DtypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dtype {
    kind: DtypeKind,
    bits: u32,
}

impl Dtype {
    pub const BOOL: Dtype = Dtype { kind: DtypeKind::Bool, bits: 8 };
    pub const INT8: Dtype = Dtype { kind: DtypeKind::Int, bits: 8 };
    pub const INT16: Dtype = Dtype { kind: DtypeKind::Int, bits: 16 };
    pub const INT32: Dtype = Dtype { kind: DtypeKind::Int, bits: 32 };
    pub const INT64: Dtype = Dtype { kind: DtypeKind::Int, bits: 64 };
    pub const UINT8: Dtype = Dtype { kind: DtypeKind::UInt, bits: 8 };
    pub const UINT16: Dtype = Dtype { kind: DtypeKind::UInt, bits: 16 };
    pub const UINT32: Dtype = Dtype { kind: DtypeKind::UInt, bits: 32 };
    pub const UINT64: Dtype = Dtype { kind: DtypeKind::UInt, bits: 64 };
    pub const FLOAT16: Dtype = Dtype { kind: DtypeKind::Float, bits: 16 };
    pub const FLOAT32: Dtype = Dtype { kind: DtypeKind::Float, bits: 32 };
    pub const FLOAT64: Dtype = Dtype { kind: DtypeKind::Float, bits: 64 };
    pub const COMPLEX64: Dtype = Dtype { kind: DtypeKind::Complex, bits: 64 };
    pub const COMPLEX128: Dtype = Dtype { kind: DtypeKind::Complex, bits: 128 };

    /// Every dtype this crate knows how to generate, in catalog order.
    pub const KNOWN: [Dtype; 14] = [
        Dtype::BOOL,
        Dtype::UINT8,
        Dtype::UINT16,
        Dtype::UINT32,
        Dtype::UINT64,
        Dtype::INT8,
        Dtype::INT16,
        Dtype::INT32,
        Dtype::INT64,
        Dtype::FLOAT16,
        Dtype::FLOAT32,
        Dtype::FLOAT64,
        Dtype::COMPLEX64,
        Dtype::COMPLEX128,
    ];

    pub fn new(kind: DtypeKind, bits: u32) -> Result<Dtype> {
        if kind.valid_sizes().contains(&bits) {
            Ok(Dtype { kind, bits })
        } else {
            Err(invalid_sizes_error(kind, &[bits]))
        }
    }

    pub fn from_name(name: &str) -> Result<Dtype> {
        Dtype::KNOWN
            .iter()
            .copied()
            .find(|dtype| dtype.name() == name)
            .ok_or_else(|| {
                let valid: Vec<String> = Dtype::KNOWN.iter().map(|d| d.name()).collect();
                ArrayError::configuration(format!(
                    "{} is not a valid data type (pick from: {})",
                    name,
                    valid.join(", ")
                ))
            })
    }

    pub fn kind(&self) -> DtypeKind {
        self.kind
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn name(&self) -> String {
        match self.kind {
            DtypeKind::Bool => "bool".to_string(),
            kind => format!("{}{}", kind.category(), self.bits),
        }
    }

    /// Width of the float format used for this dtype's values, or for each
    /// part of a complex value.
    pub fn float_width(&self) -> Option<FloatWidth> {
        match self.kind {
            DtypeKind::Float => FloatWidth::from_bits(self.bits),
            DtypeKind::Complex => FloatWidth::from_bits(self.bits / 2),
            _ => None,
        }
    }

    /// Inclusive representable range of an integer dtype.
    pub fn int_bounds(&self) -> Option<(i128, i128)> {
        match self.kind {
            DtypeKind::Int => {
                let half = 1i128 << (self.bits - 1);
                Some((-half, half - 1))
            }
            DtypeKind::UInt => Some((0, (1i128 << self.bits) - 1)),
            _ => None,
        }
    }

    /// Whether `value` is a value of this dtype, exactly as stated.
    pub fn can_hold(&self, value: &Scalar) -> bool {
        match (self.kind, value) {
            (DtypeKind::Bool, Scalar::Bool(_)) => true,
            (DtypeKind::Int, Scalar::Int(v)) | (DtypeKind::UInt, Scalar::Int(v)) => {
                let (min, max) = self.int_bounds().unwrap_or((0, 0));
                min <= *v && *v <= max
            }
            (DtypeKind::Float, Scalar::Float(v)) => {
                self.float_width().map_or(false, |w| w.is_representable(*v))
            }
            (DtypeKind::Complex, Scalar::Complex(re, im)) => self
                .float_width()
                .map_or(false, |w| w.is_representable(*re) && w.is_representable(*im)),
            _ => false,
        }
    }

    /// The value every element shrinks towards when nothing else constrains it.
    pub fn zero(&self) -> Scalar {
        match self.kind {
            DtypeKind::Bool => Scalar::Bool(false),
            DtypeKind::Int | DtypeKind::UInt => Scalar::Int(0),
            DtypeKind::Float => Scalar::Float(0.0),
            DtypeKind::Complex => Scalar::Complex(0.0, 0.0),
        }
    }

    /// Size of one element in bytes.
    pub fn itemsize(&self) -> usize {
        (self.bits / 8) as usize
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

fn invalid_sizes_error(kind: DtypeKind, sizes: &[u32]) -> ArrayError {
    let join = |sizes: &[u32]| sizes.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ");
    ArrayError::configuration(format!(
        "The following sizes are not valid for {} dtypes: {} (valid sizes: {})",
        kind,
        join(sizes),
        join(kind.valid_sizes())
    ))
}

fn names(dtypes: &[Dtype]) -> String {
    dtypes.iter().map(|d| d.name()).collect::<Vec<_>>().join(", ")
}

/// Selects a subset of a catalog by kind and width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DtypeFilter {
    kinds: Option<Vec<DtypeKind>>,
    sizes: Option<Vec<u32>>,
    min_bits: Option<u32>,
    max_bits: Option<u32>,
}

impl DtypeFilter {
    /// Every standard dtype.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn kinds(kinds: &[DtypeKind]) -> Self {
        Self {
            kinds: Some(kinds.to_vec()),
            ..Self::default()
        }
    }

    pub fn kind(kind: DtypeKind) -> Self {
        Self::kinds(&[kind])
    }

    pub fn with_sizes(mut self, sizes: &[u32]) -> Self {
        self.sizes = Some(sizes.to_vec());
        self
    }

    pub fn with_min_bits(mut self, bits: u32) -> Self {
        self.min_bits = Some(bits);
        self
    }

    pub fn with_max_bits(mut self, bits: u32) -> Self {
        self.max_bits = Some(bits);
        self
    }

    fn selected_kinds(&self) -> Vec<DtypeKind> {
        match &self.kinds {
            Some(kinds) => kinds.clone(),
            None => DtypeKind::ALL.to_vec(),
        }
    }

    fn validate(&self) -> Result<()> {
        let kinds = self.selected_kinds();
        if kinds.is_empty() {
            return Err(ArrayError::configuration("dtype filter selects no kinds"));
        }
        if let (Some(min), Some(max)) = (self.min_bits, self.max_bits) {
            if min > max {
                return Err(ArrayError::configuration(format!(
                    "min_bits={} is larger than max_bits={}",
                    min, max
                )));
            }
        }
        if let Some(sizes) = &self.sizes {
            for kind in &kinds {
                let invalid: Vec<u32> = sizes
                    .iter()
                    .copied()
                    .filter(|s| !kind.valid_sizes().contains(s))
                    .collect();
                if !invalid.is_empty() && (kinds.len() == 1 || invalid.len() == sizes.len()) {
                    return Err(invalid_sizes_error(*kind, &invalid));
                }
            }
        }
        Ok(())
    }

    fn width_ok(&self, bits: u32) -> bool {
        self.min_bits.map_or(true, |min| bits >= min) && self.max_bits.map_or(true, |max| bits <= max)
    }

    /// The dtypes this filter asks a module for.
    pub fn requested(&self) -> Vec<Dtype> {
        let mut requested = Vec::new();
        for kind in self.selected_kinds() {
            let sizes: &[u32] = match &self.sizes {
                Some(sizes) => sizes,
                None => kind.default_sizes(),
            };
            for &bits in sizes {
                if let Ok(dtype) = Dtype::new(kind, bits) {
                    if self.width_ok(bits) && !requested.contains(&dtype) {
                        requested.push(dtype);
                    }
                }
            }
        }
        requested.sort();
        requested
    }

    pub fn matches(&self, dtype: &Dtype) -> bool {
        self.requested().contains(dtype)
    }
}

/// The dtypes one array module supports.
#[derive(Debug, Clone)]
pub struct DtypeCatalog {
    module: String,
    dtypes: Vec<Dtype>,
    /// Missing dtypes already reported, so each is warned about once.
    warned: Arc<Mutex<BTreeSet<Dtype>>>,
}

impl PartialEq for DtypeCatalog {
    fn eq(&self, other: &Self) -> bool {
        self.module == other.module && self.dtypes == other.dtypes
    }
}

/// A cached catalog together with a weak handle on the module it describes.
/// The weak handle keeps the module's allocation, and so its address, from
/// being reused while the entry exists.
struct CatalogEntry {
    alive: Box<dyn Fn() -> bool + Send + Sync>,
    cell: Arc<OnceCell<Arc<DtypeCatalog>>>,
}

static CATALOGS: Lazy<Mutex<HashMap<usize, CatalogEntry>>> = Lazy::new(|| Mutex::new(HashMap::new()));

impl DtypeCatalog {
    pub fn from_reported(module: impl Into<String>, reported: impl IntoIterator<Item = Dtype>) -> Self {
        let mut dtypes: Vec<Dtype> = reported.into_iter().collect();
        dtypes.sort();
        dtypes.dedup();
        Self {
            module: module.into(),
            dtypes,
            warned: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    /// The catalog for the module behind `module`, computed on first use and
    /// then shared by every clone of that handle.
    ///
    /// Catalogs are keyed by handle, not by name: two separately created
    /// modules never share one, whatever they are called. Concurrent first
    /// calls for the same handle query the module once; the other callers
    /// block until that single initialisation finishes.
    pub fn of<M: ArrayModule + ?Sized>(module: &Arc<M>) -> Arc<DtypeCatalog> {
        let key = Arc::as_ptr(module) as *const () as usize;
        let cell = {
            let mut catalogs = match CATALOGS.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            catalogs.retain(|_, entry| (entry.alive)());
            let entry = catalogs.entry(key).or_insert_with(|| {
                let weak = Arc::downgrade(module);
                CatalogEntry {
                    alive: Box::new(move || weak.strong_count() > 0),
                    cell: Arc::new(OnceCell::new()),
                }
            });
            Arc::clone(&entry.cell)
        };
        cell.get_or_init(|| {
            log::debug!("Building dtype catalog for array module {}", module.name());
            Arc::new(DtypeCatalog::from_reported(module.name(), module.dtypes()))
        })
        .clone()
    }

    pub fn module_name(&self) -> &str {
        &self.module
    }

    pub fn all(&self) -> &[Dtype] {
        &self.dtypes
    }

    pub fn contains(&self, dtype: &Dtype) -> bool {
        self.dtypes.contains(dtype)
    }

    pub fn of_kind(&self, kind: DtypeKind) -> Vec<Dtype> {
        self.dtypes.iter().copied().filter(|d| d.kind() == kind).collect()
    }

    pub fn partition(&self) -> BTreeMap<DtypeKind, Vec<Dtype>> {
        let mut by_kind: BTreeMap<DtypeKind, Vec<Dtype>> = BTreeMap::new();
        for dtype in &self.dtypes {
            by_kind.entry(dtype.kind()).or_default().push(*dtype);
        }
        by_kind
    }

    /// The catalog dtypes selected by `filter`.
    ///
    /// Fails when none of the requested dtypes exist in the module, and warns
    /// when only some of them do.
    pub fn filter(&self, filter: &DtypeFilter) -> Result<Vec<Dtype>> {
        filter.validate()?;
        let requested = filter.requested();
        let (present, missing): (Vec<Dtype>, Vec<Dtype>) =
            requested.iter().copied().partition(|d| self.contains(d));
        if present.is_empty() {
            return Err(ArrayError::configuration(format!(
                "Array module {} does not have the following required dtypes in its namespace: {}",
                self.module,
                names(&requested)
            )));
        }
        if !missing.is_empty() {
            let unreported: Vec<Dtype> = {
                let mut warned = match self.warned.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                missing.iter().copied().filter(|d| warned.insert(*d)).collect()
            };
            if unreported.is_empty() {
                log::debug!(
                    "Array module {} does not have the following dtypes in its namespace: {}",
                    self.module,
                    names(&missing)
                );
            } else {
                log::warn!(
                    "Array module {} does not have the following dtypes in its namespace: {}",
                    self.module,
                    names(&unreported)
                );
            }
        }
        Ok(present)
    }

    /// Looks an explicitly requested dtype up in the catalog.
    pub fn require(&self, dtype: Dtype) -> Result<Dtype> {
        if self.contains(&dtype) {
            Ok(dtype)
        } else {
            Err(ArrayError::configuration(format!(
                "Array module {} does not have dtype {} in its namespace",
                self.module, dtype
            )))
        }
    }
}
