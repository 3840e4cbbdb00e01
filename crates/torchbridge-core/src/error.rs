use thiserror::Error;

use crate::dtype::DType;

/// All errors returned by `torchbridge-core`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Operand shapes do not match the required layout.
    #[error("dimension mismatch: expected {expected:?}, got {got:?}")]
    DimensionMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// A shape or stride specification is invalid.
    #[error("invalid shape {shape:?}: {reason}")]
    InvalidShape {
        shape: Vec<usize>,
        reason: &'static str,
    },

    /// An axis index is out of bounds for the tensor's rank.
    #[error("axis {axis} out of bounds for tensor with {ndim} dimensions")]
    AxisOutOfBounds { axis: isize, ndim: usize },

    /// A flat or multi-dimensional index is out of bounds.
    #[error("index {index:?} out of bounds for shape {shape:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        shape: Vec<usize>,
    },

    /// The operation is not supported for the given input.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Shapes cannot be broadcast together.
    #[error("cannot broadcast shapes {shape_a:?} and {shape_b:?}")]
    BroadcastError {
        shape_a: Vec<usize>,
        shape_b: Vec<usize>,
    },

    /// The element type cannot take part in the operation.
    #[error("unsupported dtype {dtype} for {op}")]
    UnsupportedDType { dtype: DType, op: &'static str },

    /// Two operands were expected to share a dtype.
    #[error("dtype mismatch: {lhs} vs {rhs}")]
    DTypeMismatch { lhs: DType, rhs: DType },
}

impl CoreError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn axis_out_of_bounds(axis: usize, ndim: usize) -> Self {
        Self::AxisOutOfBounds {
            axis: axis as isize,
            ndim,
        }
    }
}

/// Convenience alias used throughout `torchbridge-core`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Resolve a possibly negative axis against `ndim`.
///
/// Negative values count from the last axis, so `-1` is the final axis.
pub fn normalize_axis(axis: isize, ndim: usize) -> Result<usize> {
    let n = ndim as isize;
    let resolved = if axis < 0 { axis + n } else { axis };
    if resolved < 0 || resolved >= n {
        return Err(CoreError::AxisOutOfBounds { axis, ndim });
    }
    Ok(resolved as usize)
}
