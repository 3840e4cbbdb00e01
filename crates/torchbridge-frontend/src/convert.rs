//! The conversion boundary between a caller's tensor representation and the
//! engine's [`Array`].

use serde::{Deserialize, Serialize};
use torchbridge_core::{Array, DType};

use crate::error::{FrontendError, Result};

/// Moves tensors across the boundary in both directions.
///
/// Every catalogue call made through [`Frontend`](crate::Frontend) converts
/// its tensor arguments with [`to_array`](Self::to_array) and its tensor
/// results with [`from_array`](Self::from_array).
pub trait TensorConverter {
    /// The caller-side tensor type.
    type Native: Clone;

    fn to_array(&self, native: &Self::Native) -> Result<Array>;

    fn from_array(&self, array: Array) -> Result<Self::Native>;
}

/// Identity conversion for callers that already hold engine arrays.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayConverter;

impl TensorConverter for ArrayConverter {
    type Native = Array;

    fn to_array(&self, native: &Array) -> Result<Array> {
        Ok(native.clone())
    }

    fn from_array(&self, array: Array) -> Result<Array> {
        Ok(array)
    }
}

/// Wire-level tensor: a dtype tag, a shape, and little-endian element bytes
/// in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostTensor {
    pub dtype: DType,
    pub shape: Vec<usize>,
    pub bytes: Vec<u8>,
}

impl HostTensor {
    /// Number of bytes the shape and dtype call for.
    pub fn expected_len(&self) -> usize {
        self.shape.iter().product::<usize>() * self.dtype.size_in_bytes()
    }
}

/// Decodes [`HostTensor`] buffers into arrays and encodes results back.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferConverter;

impl TensorConverter for BufferConverter {
    type Native = HostTensor;

    fn to_array(&self, native: &HostTensor) -> Result<Array> {
        if native.bytes.len() != native.expected_len() {
            return Err(FrontendError::conversion(format!(
                "{} buffer of shape {:?} needs {} bytes, got {}",
                native.dtype,
                native.shape,
                native.expected_len(),
                native.bytes.len()
            )));
        }
        Array::from_le_bytes(native.dtype, native.shape.clone(), &native.bytes)
            .map_err(|e| FrontendError::conversion(e.to_string()))
    }

    fn from_array(&self, array: Array) -> Result<HostTensor> {
        Ok(HostTensor {
            dtype: array.dtype(),
            shape: array.shape().to_vec(),
            bytes: array.to_le_bytes(),
        })
    }
}
