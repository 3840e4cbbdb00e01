//! Dynamically typed tensor handle.
//!
//! [`Array`] wraps a [`Tensor<T>`] for every supported element type so that
//! callers can hold tensors whose dtype is only known at runtime. Structural
//! operations work for every dtype; arithmetic requires a numeric dtype and
//! reports [`CoreError::UnsupportedDType`] otherwise.

use core::any::Any;
use core::fmt;

use half::{bf16, f16};

use crate::dtype::{DType, Element};
use crate::error::{CoreError, Result};
use crate::tensor::{MeshIndexing, Tensor};

/// A tensor whose element type is carried as a runtime [`DType`] tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    Bool(Tensor<bool>),
    U8(Tensor<u8>),
    U16(Tensor<u16>),
    U32(Tensor<u32>),
    U64(Tensor<u64>),
    I8(Tensor<i8>),
    I16(Tensor<i16>),
    I32(Tensor<i32>),
    I64(Tensor<i64>),
    F16(Tensor<f16>),
    BF16(Tensor<bf16>),
    F32(Tensor<f32>),
    F64(Tensor<f64>),
}

// ======================================================================
// Dispatch macros
// ======================================================================

/// Match the listed variants, binding the inner tensor to `$t`.
macro_rules! match_variants {
    ($arr:expr, [$($v:ident),+], $t:ident => $body:expr) => {
        match $arr {
            $(Array::$v($t) => $body,)+
        }
    };
    ($arr:expr, [$($v:ident),+], $t:ident => $body:expr, else $other:pat => $fallback:expr) => {
        match $arr {
            $(Array::$v($t) => $body,)+
            #[allow(unreachable_patterns)]
            $other => $fallback,
        }
    };
}

/// Like `match_variants!`, re-wrapping the body in the same variant.
macro_rules! map_variants {
    ($arr:expr, [$($v:ident),+], $t:ident => $body:expr) => {
        match $arr {
            $(Array::$v($t) => Array::$v($body),)+
        }
    };
    ($arr:expr, [$($v:ident),+], $t:ident => $body:expr, else $other:pat => $fallback:expr) => {
        match $arr {
            $(Array::$v($t) => Array::$v($body),)+
            #[allow(unreachable_patterns)]
            $other => $fallback,
        }
    };
}

macro_rules! with_all {
    ($arr:expr, $t:ident => $body:expr) => {
        match_variants!(
            $arr,
            [Bool, U8, U16, U32, U64, I8, I16, I32, I64, F16, BF16, F32, F64],
            $t => $body
        )
    };
}

macro_rules! map_all {
    ($arr:expr, $t:ident => $body:expr) => {
        map_variants!(
            $arr,
            [Bool, U8, U16, U32, U64, I8, I16, I32, I64, F16, BF16, F32, F64],
            $t => $body
        )
    };
}

macro_rules! map_numeric {
    ($arr:expr, $op:expr, $t:ident => $body:expr) => {
        map_variants!(
            $arr,
            [U8, U16, U32, U64, I8, I16, I32, I64, F16, BF16, F32, F64],
            $t => $body,
            else other => return Err(CoreError::UnsupportedDType { dtype: other.dtype(), op: $op })
        )
    };
}

macro_rules! map_float {
    ($arr:expr, $op:expr, $t:ident => $body:expr) => {
        map_variants!(
            $arr,
            [F16, BF16, F32, F64],
            $t => $body,
            else other => return Err(CoreError::UnsupportedDType { dtype: other.dtype(), op: $op })
        )
    };
}

/// Pair two arrays of the same dtype; mismatched dtypes are an error.
macro_rules! zip_variants {
    ($a:expr, $b:expr, $op:expr, [$($v:ident),+], |$x:ident, $y:ident| $body:expr) => {
        match ($a, $b) {
            $((Array::$v($x), Array::$v($y)) => Array::$v($body),)+
            (lhs, rhs) if lhs.dtype() != rhs.dtype() => {
                return Err(CoreError::DTypeMismatch { lhs: lhs.dtype(), rhs: rhs.dtype() })
            }
            (lhs, _) => return Err(CoreError::UnsupportedDType { dtype: lhs.dtype(), op: $op }),
        }
    };
}

/// Bind `$T` to the element type named by a runtime dtype and evaluate
/// `$body` once per arm.
macro_rules! for_dtype {
    ($dtype:expr, $T:ident => $body:expr) => {
        match $dtype {
            $crate::dtype::DType::Bool => { type $T = bool; $body }
            $crate::dtype::DType::U8 => { type $T = u8; $body }
            $crate::dtype::DType::U16 => { type $T = u16; $body }
            $crate::dtype::DType::U32 => { type $T = u32; $body }
            $crate::dtype::DType::U64 => { type $T = u64; $body }
            $crate::dtype::DType::I8 => { type $T = i8; $body }
            $crate::dtype::DType::I16 => { type $T = i16; $body }
            $crate::dtype::DType::I32 => { type $T = i32; $body }
            $crate::dtype::DType::I64 => { type $T = i64; $body }
            $crate::dtype::DType::F16 => { type $T = ::half::f16; $body }
            $crate::dtype::DType::BF16 => { type $T = ::half::bf16; $body }
            $crate::dtype::DType::F32 => { type $T = f32; $body }
            $crate::dtype::DType::F64 => { type $T = f64; $body }
        }
    };
}

/// Numeric-only form of `for_dtype!`; `bool` is rejected for `$op`.
macro_rules! for_numeric_dtype {
    ($dtype:expr, $op:expr, $T:ident => $body:expr) => {
        match $dtype {
            $crate::dtype::DType::Bool => {
                return Err($crate::error::CoreError::UnsupportedDType {
                    dtype: $crate::dtype::DType::Bool,
                    op: $op,
                }
                .into())
            }
            $crate::dtype::DType::U8 => { type $T = u8; $body }
            $crate::dtype::DType::U16 => { type $T = u16; $body }
            $crate::dtype::DType::U32 => { type $T = u32; $body }
            $crate::dtype::DType::U64 => { type $T = u64; $body }
            $crate::dtype::DType::I8 => { type $T = i8; $body }
            $crate::dtype::DType::I16 => { type $T = i16; $body }
            $crate::dtype::DType::I32 => { type $T = i32; $body }
            $crate::dtype::DType::I64 => { type $T = i64; $body }
            $crate::dtype::DType::F16 => { type $T = ::half::f16; $body }
            $crate::dtype::DType::BF16 => { type $T = ::half::bf16; $body }
            $crate::dtype::DType::F32 => { type $T = f32; $body }
            $crate::dtype::DType::F64 => { type $T = f64; $body }
        }
    };
}

/// Float-only form of `for_dtype!`.
macro_rules! for_float_dtype {
    ($dtype:expr, $op:expr, $T:ident => $body:expr) => {
        match $dtype {
            $crate::dtype::DType::F16 => { type $T = ::half::f16; $body }
            $crate::dtype::DType::BF16 => { type $T = ::half::bf16; $body }
            $crate::dtype::DType::F32 => { type $T = f32; $body }
            $crate::dtype::DType::F64 => { type $T = f64; $body }
            other => {
                return Err($crate::error::CoreError::UnsupportedDType { dtype: other, op: $op }.into())
            }
        }
    };
}

pub(crate) use {for_dtype, for_float_dtype, for_numeric_dtype};

// ======================================================================
// Conversions
// ======================================================================

macro_rules! impl_from_tensor {
    ($($ty:ty => $v:ident),+ $(,)?) => {
        $(
            impl From<Tensor<$ty>> for Array {
                fn from(t: Tensor<$ty>) -> Self {
                    Array::$v(t)
                }
            }
        )+
    };
}

impl_from_tensor!(
    bool => Bool,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f16 => F16,
    bf16 => BF16,
    f32 => F32,
    f64 => F64,
);

fn cast_to<T: Element>(t: &Tensor<T>, dtype: DType) -> Array {
    for_dtype!(dtype, U => Array::from(t.cast::<U>()))
}

fn decode<T: Element>(bytes: &[u8], shape: Vec<usize>) -> Result<Tensor<T>> {
    let width = T::DTYPE.size_in_bytes();
    let numel: usize = shape.iter().product();
    if bytes.len() != numel * width {
        return Err(CoreError::invalid_argument(format!(
            "buffer of {} bytes cannot hold {numel} {} elements",
            bytes.len(),
            T::DTYPE
        )));
    }
    let data = bytes.chunks_exact(width).map(T::read_le).collect();
    Tensor::from_vec(data, shape)
}

impl Array {
    // ------------------------------------------------------------------
    // Construction and metadata
    // ------------------------------------------------------------------

    /// A zero-filled array of the given dtype.
    pub fn zeros(shape: Vec<usize>, dtype: DType) -> Array {
        for_dtype!(dtype, T => Array::from(Tensor::<T>::zeros(shape)))
    }

    /// A one-filled array of the given dtype.
    pub fn ones(shape: Vec<usize>, dtype: DType) -> Array {
        for_dtype!(dtype, T => Array::from(Tensor::<T>::ones(shape)))
    }

    /// A rank-0 array holding `value` converted to `dtype`.
    pub fn scalar(value: f64, dtype: DType) -> Array {
        for_dtype!(dtype, T => Array::from(Tensor::scalar(<T as Element>::from_f64(value))))
    }

    /// Decode little-endian element bytes into an array.
    pub fn from_le_bytes(dtype: DType, shape: Vec<usize>, bytes: &[u8]) -> Result<Array> {
        Ok(for_dtype!(dtype, T => Array::from(decode::<T>(bytes, shape)?)))
    }

    /// Little-endian encoding of every element in row-major order.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        with_all!(self, t => {
            let mut out = Vec::with_capacity(t.numel() * self.dtype().size_in_bytes());
            for &x in t.iter() {
                x.write_le(&mut out);
            }
            out
        })
    }

    pub fn dtype(&self) -> DType {
        with_all!(self, t => t.dtype())
    }

    pub fn shape(&self) -> &[usize] {
        with_all!(self, t => t.shape())
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn numel(&self) -> usize {
        with_all!(self, t => t.numel())
    }

    pub fn is_empty(&self) -> bool {
        self.numel() == 0
    }

    /// Convert to another dtype. Returns a clone when the dtype already
    /// matches.
    pub fn astype(&self, dtype: DType) -> Array {
        if self.dtype() == dtype {
            return self.clone();
        }
        with_all!(self, t => cast_to(t, dtype))
    }

    /// Copy out as a statically typed tensor, casting element-wise.
    pub fn cast<T: Element>(&self) -> Tensor<T> {
        with_all!(self, t => t.cast::<T>())
    }

    /// Borrow the inner tensor if its element type is exactly `T`.
    pub fn as_tensor<T: Element>(&self) -> Option<&Tensor<T>> {
        with_all!(self, t => (t as &dyn Any).downcast_ref::<Tensor<T>>())
    }

    /// Element values widened to `f64`, in row-major order.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_all!(self, t => t.iter().map(|&x| x.to_f64()).collect())
    }

    // ------------------------------------------------------------------
    // Structural operations (every dtype)
    // ------------------------------------------------------------------

    pub fn reshape(&self, shape: Vec<usize>) -> Result<Array> {
        Ok(map_all!(self, t => t.reshaped(shape)?))
    }

    pub fn flatten_range(&self, start: usize, end: usize) -> Result<Array> {
        Ok(map_all!(self, t => t.flatten_range(start, end)?))
    }

    pub fn permute(&self, axes: &[usize]) -> Result<Array> {
        Ok(map_all!(self, t => t.permute(axes)?))
    }

    pub fn swap_axes(&self, a: usize, b: usize) -> Result<Array> {
        Ok(map_all!(self, t => t.swap_axes(a, b)?))
    }

    pub fn expand_dims(&self, axes: &[usize]) -> Result<Array> {
        Ok(map_all!(self, t => t.expand_dims(axes)?))
    }

    pub fn flip(&self, axes: &[usize]) -> Result<Array> {
        Ok(map_all!(self, t => t.flip(axes)?))
    }

    pub fn roll(&self, shifts: &[isize], axes: &[usize]) -> Result<Array> {
        Ok(map_all!(self, t => t.roll(shifts, axes)?))
    }

    /// Pad with zeros; `pad_width[d] = (before, after)`.
    pub fn zero_pad(&self, pad_width: &[(usize, usize)]) -> Result<Array> {
        Ok(map_all!(self, t => t.pad(pad_width, Element::zero())?))
    }

    pub fn repeat_interleave(&self, repeats: &[usize], axis: usize) -> Result<Array> {
        Ok(map_all!(self, t => t.repeat_interleave(repeats, axis)?))
    }

    pub fn select(&self, axis: usize, index: usize) -> Result<Array> {
        Ok(map_all!(self, t => t.select(axis, index)?))
    }

    pub fn diagonal(&self, offset: isize, axis1: usize, axis2: usize) -> Result<Array> {
        Ok(map_all!(self, t => t.diagonal(offset, axis1, axis2)?))
    }

    pub fn tril(&self, k: isize) -> Result<Array> {
        Ok(map_all!(self, t => t.tril(k)?))
    }

    pub fn triu(&self, k: isize) -> Result<Array> {
        Ok(map_all!(self, t => t.triu(k)?))
    }

    pub fn nonzero(&self) -> Vec<Tensor<i64>> {
        with_all!(self, t => t.nonzero())
    }

    /// Stack equally shaped arrays of one dtype along a new axis.
    pub fn stack(arrays: &[&Array], axis: usize) -> Result<Array> {
        let dtype = common_dtype(arrays, "stack")?;
        if let Some(other) = arrays.iter().find(|a| a.dtype() != dtype) {
            return Err(CoreError::DTypeMismatch {
                lhs: dtype,
                rhs: other.dtype(),
            });
        }
        Ok(for_dtype!(dtype, T => {
            let tensors: Vec<&Tensor<T>> =
                arrays.iter().filter_map(|a| a.as_tensor::<T>()).collect();
            Array::from(Tensor::stack(&tensors, axis)?)
        }))
    }

    /// Coordinate grids of 0-D or 1-D arrays, promoted to a common dtype.
    pub fn meshgrid(arrays: &[&Array], indexing: MeshIndexing) -> Result<Vec<Array>> {
        let dtype = promote_all(arrays, "meshgrid")?;
        for_dtype!(dtype, T => meshgrid_as::<T>(arrays, indexing))
    }

    // ------------------------------------------------------------------
    // Numeric operations
    // ------------------------------------------------------------------

    pub fn cumsum(&self, axis: usize) -> Result<Array> {
        Ok(map_numeric!(self, "cumsum", t => t.cumsum_axis(axis)?))
    }

    pub fn cumprod(&self, axis: usize) -> Result<Array> {
        Ok(map_numeric!(self, "cumprod", t => t.cumprod_axis(axis)?))
    }

    pub fn logcumsumexp(&self, axis: usize) -> Result<Array> {
        Ok(map_float!(self, "logcumsumexp", t => t.logcumsumexp_axis(axis)?))
    }

    /// Sum of the main diagonal as a rank-0 array.
    pub fn trace(&self) -> Result<Array> {
        Ok(map_numeric!(self, "trace", t => Tensor::scalar(t.trace()?)))
    }

    pub fn vander(&self, n: usize, increasing: bool) -> Result<Array> {
        Ok(map_numeric!(self, "vander", t => t.vander(n, increasing)?))
    }

    /// Broadcasting addition of two arrays with the same numeric dtype.
    pub fn add(&self, other: &Array) -> Result<Array> {
        Ok(zip_variants!(
            self,
            other,
            "add",
            [U8, U16, U32, U64, I8, I16, I32, I64, F16, BF16, F32, F64],
            |a, b| a.add_checked(b)?
        ))
    }

    /// Broadcasting multiplication of two arrays with the same numeric dtype.
    pub fn mul(&self, other: &Array) -> Result<Array> {
        Ok(zip_variants!(
            self,
            other,
            "mul",
            [U8, U16, U32, U64, I8, I16, I32, I64, F16, BF16, F32, F64],
            |a, b| a.mul_checked(b)?
        ))
    }

    /// Element-wise least common multiple of two integer arrays.
    pub fn lcm(&self, other: &Array) -> Result<Array> {
        Ok(zip_variants!(
            self,
            other,
            "lcm",
            [U8, U16, U32, U64, I8, I16, I32, I64],
            |a, b| a.lcm(b)?
        ))
    }
}

fn meshgrid_as<T: Element>(arrays: &[&Array], indexing: MeshIndexing) -> Result<Vec<Array>>
where
    Array: From<Tensor<T>>,
{
    let tensors: Vec<Tensor<T>> = arrays.iter().map(|a| a.cast::<T>()).collect();
    let refs: Vec<&Tensor<T>> = tensors.iter().collect();
    Ok(Tensor::meshgrid(&refs, indexing)?
        .into_iter()
        .map(Array::from)
        .collect())
}

/// The dtype shared by `arrays`, or an error when the list is empty.
fn common_dtype(arrays: &[&Array], op: &'static str) -> Result<DType> {
    arrays
        .first()
        .map(|a| a.dtype())
        .ok_or_else(|| CoreError::invalid_argument(format!("{op} needs at least one array")))
}

/// Promote the dtypes of every array to a single result dtype.
pub fn promote_all(arrays: &[&Array], op: &'static str) -> Result<DType> {
    let first = common_dtype(arrays, op)?;
    Ok(arrays.iter().fold(first, |acc, a| acc.promote(a.dtype())))
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        with_all!(self, t => fmt::Display::fmt(t, f))
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata() {
        let a = Array::from(Tensor::<f32>::zeros(vec![2, 3]));
        assert_eq!(a.dtype(), DType::F32);
        assert_eq!(a.shape(), &[2, 3]);
        assert_eq!(a.ndim(), 2);
        assert_eq!(a.numel(), 6);
    }

    #[test]
    fn test_astype_and_cast() {
        let a = Array::from(Tensor::from_vec(vec![1.7_f64, -2.2, 0.0], vec![3]).unwrap());
        let b = a.astype(DType::I32);
        assert_eq!(b.dtype(), DType::I32);
        assert_eq!(b.as_tensor::<i32>().unwrap().as_slice(), &[1, -2, 0]);
        let flags = a.astype(DType::Bool);
        assert_eq!(flags.as_tensor::<bool>().unwrap().as_slice(), &[true, true, false]);
        assert_eq!(a.cast::<f32>().as_slice(), &[1.7_f32, -2.2, 0.0]);
        assert!(a.as_tensor::<f32>().is_none());
    }

    #[test]
    fn test_le_bytes_roundtrip_int16() {
        let a = Array::from(Tensor::from_vec(vec![1_i16, -2, 300], vec![3]).unwrap());
        let bytes = a.to_le_bytes();
        assert_eq!(bytes, vec![1, 0, 0xfe, 0xff, 0x2c, 0x01]);
        let back = Array::from_le_bytes(DType::I16, vec![3], &bytes).unwrap();
        assert_eq!(back, a);
        assert!(Array::from_le_bytes(DType::I16, vec![4], &bytes).is_err());
    }

    #[test]
    fn test_numeric_ops_reject_bool() {
        let a = Array::from(Tensor::from_vec(vec![true, false], vec![2]).unwrap());
        let err = a.cumsum(0).unwrap_err();
        assert_eq!(
            err,
            CoreError::UnsupportedDType {
                dtype: DType::Bool,
                op: "cumsum"
            }
        );
        assert!(a.flip(&[0]).is_ok());
    }

    #[test]
    fn test_add_dtype_mismatch() {
        let a = Array::from(Tensor::<f32>::ones(vec![2]));
        let b = Array::from(Tensor::<f64>::ones(vec![2]));
        assert!(matches!(a.add(&b), Err(CoreError::DTypeMismatch { .. })));
        let c = a.add(&a).unwrap();
        assert_eq!(c.as_tensor::<f32>().unwrap().as_slice(), &[2.0, 2.0]);
    }

    #[test]
    fn test_lcm_rejects_float() {
        let a = Array::from(Tensor::<f32>::ones(vec![2]));
        assert!(matches!(a.lcm(&a), Err(CoreError::UnsupportedDType { .. })));
    }

    #[test]
    fn test_stack_requires_same_dtype() {
        let a = Array::from(Tensor::<i64>::ones(vec![2]));
        let b = Array::from(Tensor::<i32>::ones(vec![2]));
        assert!(Array::stack(&[&a, &b], 0).is_err());
        let s = Array::stack(&[&a, &a], 0).unwrap();
        assert_eq!(s.shape(), &[2, 2]);
        assert!(Array::stack(&[], 0).is_err());
    }

    #[test]
    fn test_meshgrid_promotes() {
        let a = Array::from(Tensor::from_vec(vec![1_i32, 2], vec![2]).unwrap());
        let b = Array::from(Tensor::from_vec(vec![0.5_f64, 1.5, 2.5], vec![3]).unwrap());
        let grids = Array::meshgrid(&[&a, &b], MeshIndexing::Ij).unwrap();
        assert_eq!(grids.len(), 2);
        assert_eq!(grids[0].dtype(), DType::F64);
        assert_eq!(grids[0].shape(), &[2, 3]);
        assert_eq!(grids[0].to_f64_vec(), vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
        assert_eq!(grids[1].to_f64_vec(), vec![0.5, 1.5, 2.5, 0.5, 1.5, 2.5]);
    }

    #[test]
    fn test_trace_is_rank_zero() {
        let a = Array::from(Tensor::from_vec(vec![1_u8, 2, 3, 4], vec![2, 2]).unwrap());
        let t = a.trace().unwrap();
        assert_eq!(t.ndim(), 0);
        assert_eq!(t.as_tensor::<u8>().unwrap().as_slice(), &[5]);
    }

    #[test]
    fn test_zeros_scalar() {
        let z = Array::zeros(vec![0], DType::I8);
        assert!(z.is_empty());
        assert_eq!(z.dtype(), DType::I8);
        let s = Array::scalar(2.5, DType::F16);
        assert_eq!(s.to_f64_vec(), vec![2.5]);
    }
}
