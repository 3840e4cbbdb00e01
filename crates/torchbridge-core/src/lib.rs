//! `torchbridge-core`: the tensor engine behind the torchbridge catalogue.
//!
//! Provides a dense row-major [`Tensor<T>`](tensor::Tensor), the dynamically
//! typed [`Array`] handle, and the primitive operations that source-API calls
//! are translated onto: reshaping, flipping, rolling, padding, cumulative
//! scans, triangular masks, broadcasting arithmetic, grouped N-d convolution,
//! einsum, and vector norms.
//!
//! # Design
//!
//! - Generic over element types via the [`Element`] / [`Scalar`] / [`Float`]
//!   trait hierarchy; `bool` tensors share every structural primitive.
//! - [`Array`] carries a runtime [`DType`] for callers that only learn the
//!   element type at runtime.
//! - Convolution parallelises over `(batch, out_channel)` planes with `rayon`
//!   when the `rayon` feature is enabled (the default).

pub mod array;
pub mod conv;
pub mod dtype;
pub mod error;
pub mod linalg;
pub mod math;
pub mod tensor;

// Re-export key types at crate root for convenience.
pub use array::Array;
pub use dtype::{DType, Element, Float, Integer, Real, Scalar};
pub use error::{CoreError, Result};

/// Items intended for glob-import: `use torchbridge_core::prelude::*;`
pub mod prelude {
    pub use crate::array::Array;
    pub use crate::conv::{ConvParams, DataFormat, PaddingMode};
    pub use crate::dtype::{DType, Element, Float, Integer, Real, Scalar};
    pub use crate::error::{CoreError, Result};
    pub use crate::tensor::{MeshIndexing, SliceRange, Tensor};
}
