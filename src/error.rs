//! Error types for array, shape and dtype strategies.
//!
//! Two failure classes exist. Configuration errors are raised eagerly while a
//! strategy is being built, before any sampling happens. Module contract errors
//! are raised right after the external array module constructs an array whose
//! reported shape, dtype or elements differ from what was requested.

use std::fmt;

/// Hypothesis does not generate arrays with more dimensions than this.
pub const NDIM_MAX: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayError {
    /// Caller-supplied bounds are contradictory or unsatisfiable
    Configuration(String),
    /// The array module returned something other than what was requested
    ModuleContract { module: String, message: String },
}

impl ArrayError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ArrayError::Configuration(message.into())
    }

    pub fn contract(module: impl Into<String>, message: impl Into<String>) -> Self {
        ArrayError::ModuleContract {
            module: module.into(),
            message: message.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, ArrayError::Configuration(_))
    }

    pub fn is_module_contract(&self) -> bool {
        matches!(self, ArrayError::ModuleContract { .. })
    }
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayError::Configuration(msg) => write!(f, "Invalid configuration: {}", msg),
            ArrayError::ModuleContract { module, message } => {
                write!(f, "Array module {} broke its contract: {}", module, message)
            }
        }
    }
}

impl std::error::Error for ArrayError {}

pub type Result<T> = std::result::Result<T, ArrayError>;

/// Fails unless `condition` holds.
pub fn check_argument(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(ArrayError::Configuration(message()))
    }
}

/// Checks `floor <= min <= max` for a pair of `min_<name>` / `max_<name>` bounds.
pub fn order_check(name: &str, floor: usize, min: usize, max: usize) -> Result<()> {
    if floor > min {
        return Err(ArrayError::configuration(format!(
            "min_{} must be at least {} but was {}",
            name, floor, min
        )));
    }
    if min > max {
        return Err(ArrayError::configuration(format!(
            "min_{}={} is larger than max_{}={}",
            name, min, name, max
        )));
    }
    Ok(())
}

pub fn check_valid_dims(dims: usize, name: &str) -> Result<()> {
    if dims > NDIM_MAX {
        return Err(ArrayError::configuration(format!(
            "{}={}, but arrays with more than {} dimensions are not supported",
            name, dims, NDIM_MAX
        )));
    }
    Ok(())
}
