//! # conjecture-arrays
//!
//! Strategies for generating arrays, shapes and dtypes for array-API style
//! modules, with a shrinker that reduces failing arrays shape first, then
//! dtype, then elements.
//!
//! Basic indices into arrays of a given shape come from `indices`.
//!
//! An array library plugs in by implementing `ArrayModule`. `XpStrategies`
//! binds a module and hands out every strategy; `ConjectureRunner` runs a
//! property against one and shrinks the first failure.

pub mod arrays;
pub mod assembler;
pub mod data;
pub mod distributions;
pub mod dtypes;
pub mod elements;
pub mod engine;
pub mod error;
pub mod floats;
pub mod gufunc;
pub mod indices;
pub mod module;
pub mod namespace;
pub mod reference;
pub mod scalar;
pub mod shapes;
pub mod shrinking;
pub mod strategy;

// Re-export core types for easy access
pub use arrays::{ArrayStrategy, ArrayStrategyBuilder, DtypeChoice, Fill, ShapeSpec};
pub use assembler::{assemble, GeneratedArray};
pub use data::ConjectureData;
pub use dtypes::{Dtype, DtypeCatalog, DtypeFilter, DtypeKind};
pub use elements::{ElementDomain, ElementsConfig, IntervalSet};
pub use engine::{ConjectureRunner, RunResult, RunnerConfig, RunnerStats};
pub use error::{ArrayError, Result, NDIM_MAX};
pub use floats::FloatWidth;
pub use gufunc::{CoreDim, GufuncSignature};
pub use indices::{basic_indices, BasicIndex, BasicIndices, IndexItem, IndexOptions, Slice};
pub use module::ArrayModule;
pub use namespace::XpStrategies;
pub use reference::{ReferenceArray, ReferenceModule};
pub use scalar::{Scalar, UniqueKey};
pub use shapes::{
    broadcast_shapes, broadcastable_shapes, mutually_broadcastable_shapes, valid_tuple_axes, ArrayShapes,
    BroadcastableShapeStrategy, BroadcastableShapes, FixedShape, MutuallyBroadcastableShapes, Shape, ShapeBounds,
    ShapeSource, ValidTupleAxes,
};
pub use shrinking::{greedy_minimize, ArrayShrinker, ShrinkCandidate, ShrinkPhase, ShrinkReport, ShrinkStep};
pub use strategy::{example_seed, DtypeStrategy, Just, SampledFrom, Samples, Strategy};
