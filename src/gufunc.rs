// Generalised ufunc signatures such as `(m?,n),(n,p?)->(m?,p?)`.
//
// A signature lists the core dimensions of every input and of the single
// output. Dimensions are either frozen sizes (`3`) or names shared between
// shapes; a trailing `?` marks a named dimension that may be omitted.

use crate::error::{ArrayError, Result, NDIM_MAX};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CoreDim {
    Frozen(usize),
    Named { name: String, optional: bool },
}

impl fmt::Display for CoreDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreDim::Frozen(n) => write!(f, "{}", n),
            CoreDim::Named { name, optional: true } => write!(f, "{}?", name),
            CoreDim::Named { name, .. } => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GufuncSignature {
    text: String,
    inputs: Vec<Vec<CoreDim>>,
    output: Vec<CoreDim>,
}

fn is_word(dim: &str) -> bool {
    !dim.is_empty() && dim.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn parse_dim_text(dim: &str) -> Option<&str> {
    let name = dim.strip_suffix('?').unwrap_or(dim);
    if is_word(name) {
        Some(dim)
    } else {
        None
    }
}

/// Splits `(a,b),(c)` into its shapes, or `None` if it is malformed.
fn parse_shapes(text: &str) -> Option<Vec<Vec<&str>>> {
    let mut shapes = Vec::new();
    let mut rest = text;
    loop {
        rest = rest.strip_prefix('(')?;
        let close = rest.find(')')?;
        let inner = &rest[..close];
        let dims = if inner.is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(parse_dim_text).collect::<Option<Vec<_>>>()?
        };
        shapes.push(dims);
        rest = &rest[close + 1..];
        if rest.is_empty() {
            return Some(shapes);
        }
        rest = rest.strip_prefix(',')?;
    }
}

impl GufuncSignature {
    pub fn parse(signature: &str) -> Result<GufuncSignature> {
        let invalid = || ArrayError::configuration(format!("{:?} is not a valid gufunc signature", signature));
        let sides: Vec<&str> = signature.split("->").collect();
        if sides.len() != 2 {
            return Err(invalid());
        }
        let inputs = parse_shapes(sides[0]).ok_or_else(invalid)?;
        let outputs = parse_shapes(sides[1]).ok_or_else(invalid)?;
        if outputs.len() != 1 {
            return Err(ArrayError::configuration(format!(
                "generalised ufunc signatures with multiple output arrays are not supported (signature={:?})",
                signature
            )));
        }
        if inputs.iter().chain(outputs.iter()).any(|shape| shape.len() > NDIM_MAX) {
            return Err(ArrayError::configuration(format!(
                "signature={:?} contains shapes with more than {} dimensions and is thus invalid",
                signature, NDIM_MAX
            )));
        }

        let names_in: HashSet<&str> = inputs
            .iter()
            .flatten()
            .copied()
            .map(|d| d.trim_end_matches('?'))
            .collect();

        let convert = |dim: &str| -> Result<CoreDim> {
            let optional = dim.ends_with('?');
            let name = dim.trim_end_matches('?');
            if name.chars().all(|c| c.is_ascii_digit()) {
                if optional {
                    return Err(ArrayError::configuration(format!(
                        "got dimension {:?}, but handling of frozen optional dimensions is ambiguous (signature={:?})",
                        dim, signature
                    )));
                }
                let size = name.parse::<usize>().map_err(|_| invalid())?;
                return Ok(CoreDim::Frozen(size));
            }
            if !names_in.contains(name) {
                return Err(ArrayError::configuration(format!(
                    "the {:?} dimension only appears in the output shape, and is not frozen, so the size is not determined (signature={:?})",
                    dim, signature
                )));
            }
            Ok(CoreDim::Named {
                name: name.to_string(),
                optional,
            })
        };

        let inputs = inputs
            .into_iter()
            .map(|shape| shape.into_iter().map(&convert).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;
        let output = outputs[0].iter().copied().map(&convert).collect::<Result<Vec<_>>>()?;

        Ok(GufuncSignature {
            text: signature.to_string(),
            inputs,
            output,
        })
    }

    pub fn inputs(&self) -> &[Vec<CoreDim>] {
        &self.inputs
    }

    pub fn output(&self) -> &[CoreDim] {
        &self.output
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// The fewest core dimensions any shape in the signature has; loop
    /// dimensions may use at most `NDIM_MAX` minus this.
    pub fn min_core_dims(&self) -> usize {
        self.inputs
            .iter()
            .chain(std::iter::once(&self.output))
            .map(|shape| shape.len())
            .min()
            .unwrap_or(0)
    }
}

impl FromStr for GufuncSignature {
    type Err = ArrayError;

    fn from_str(s: &str) -> Result<Self> {
        GufuncSignature::parse(s)
    }
}

impl fmt::Display for GufuncSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
