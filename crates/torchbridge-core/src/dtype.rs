//! Element types and the runtime dtype tag.
//!
//! The trait hierarchy is:
//! ```text
//! Element            (anything storable: bool, integers, floats)
//!   └── Scalar       (supports arithmetic)
//!         ├── Integer
//!         └── Float
//!               └── Real  (f16, bf16, f32, f64)
//! ```
//!
//! [`DType`] is the runtime tag carried by [`Array`](crate::array::Array);
//! every [`Element`] names its tag through [`Element::DTYPE`].

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use core::str::FromStr;

use half::{bf16, f16};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// DType: runtime element tag
// ---------------------------------------------------------------------------

/// Element types a tensor can hold, named the way the source API names them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Bool,
    #[serde(rename = "uint8")]
    U8,
    #[serde(rename = "uint16")]
    U16,
    #[serde(rename = "uint32")]
    U32,
    #[serde(rename = "uint64")]
    U64,
    #[serde(rename = "int8")]
    I8,
    #[serde(rename = "int16")]
    I16,
    #[serde(rename = "int32")]
    I32,
    #[serde(rename = "int64")]
    I64,
    #[serde(rename = "float16")]
    F16,
    #[serde(rename = "bfloat16")]
    BF16,
    #[serde(rename = "float32")]
    F32,
    #[serde(rename = "float64")]
    F64,
}

impl DType {
    pub const ALL: [DType; 13] = [
        DType::Bool,
        DType::U8,
        DType::U16,
        DType::U32,
        DType::U64,
        DType::I8,
        DType::I16,
        DType::I32,
        DType::I64,
        DType::F16,
        DType::BF16,
        DType::F32,
        DType::F64,
    ];

    /// Size of one element in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 | Self::F16 | Self::BF16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F16 | Self::BF16 | Self::F32 | Self::F64)
    }

    #[inline]
    pub const fn is_signed_int(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    #[inline]
    pub const fn is_unsigned_int(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    #[inline]
    pub const fn is_int(self) -> bool {
        self.is_signed_int() || self.is_unsigned_int()
    }

    #[inline]
    pub const fn is_bool(self) -> bool {
        matches!(self, Self::Bool)
    }

    /// The source API's name for this dtype (`"float32"`, `"int64"`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::F16 => "float16",
            Self::BF16 => "bfloat16",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }

    /// Category rank used by [`promote`](Self::promote): bool < int < float.
    const fn category(self) -> u8 {
        if self.is_bool() {
            0
        } else if self.is_int() {
            1
        } else {
            2
        }
    }

    /// Result dtype of a binary operation between `self` and `other`.
    ///
    /// Follows the usual lattice: a higher category wins outright; within a
    /// category the wider type wins; mixing signed and unsigned integers
    /// widens to a signed type that holds both (`uint64` with a signed type
    /// becomes `int64`); `float16` with `bfloat16` becomes `float32`.
    pub fn promote(self, other: DType) -> DType {
        if self == other {
            return self;
        }
        match self.category().cmp(&other.category()) {
            core::cmp::Ordering::Greater => return self,
            core::cmp::Ordering::Less => return other,
            core::cmp::Ordering::Equal => {}
        }
        if self.is_float() {
            return match (self, other) {
                (Self::F16, Self::BF16) | (Self::BF16, Self::F16) => Self::F32,
                _ if self.size_in_bytes() >= other.size_in_bytes() => self,
                _ => other,
            };
        }
        if self.is_signed_int() == other.is_signed_int() {
            return if self.size_in_bytes() >= other.size_in_bytes() {
                self
            } else {
                other
            };
        }
        let (signed, unsigned) = if self.is_signed_int() {
            (self, other)
        } else {
            (other, self)
        };
        if signed.size_in_bytes() > unsigned.size_in_bytes() {
            return signed;
        }
        match unsigned.size_in_bytes() {
            1 => Self::I16,
            2 => Self::I32,
            _ => Self::I64,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().strip_prefix("torch.").unwrap_or(s.trim());
        DType::ALL
            .iter()
            .copied()
            .find(|d| d.name() == name)
            .or(match name {
                "float" => Some(DType::F32),
                "double" => Some(DType::F64),
                "half" => Some(DType::F16),
                "int" => Some(DType::I32),
                "long" => Some(DType::I64),
                "short" => Some(DType::I16),
                _ => None,
            })
            .ok_or_else(|| CoreError::invalid_argument(format!("unknown dtype '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Element: anything a tensor can store
// ---------------------------------------------------------------------------

/// Base trait for every type storable in a tensor, including `bool`.
///
/// Provides the dtype tag, identity values, lossless-where-possible casts,
/// and little-endian byte (de)serialisation used at conversion boundaries.
pub trait Element:
    Copy
    + Clone
    + fmt::Debug
    + fmt::Display
    + PartialEq
    + PartialOrd
    + Default
    + Send
    + Sync
    + 'static
{
    /// Runtime tag for this element type.
    const DTYPE: DType;

    /// The additive identity (`0` / `false`).
    fn zero() -> Self;

    /// The multiplicative identity (`1` / `true`).
    fn one() -> Self;

    fn to_f64(self) -> f64;
    fn from_f64(v: f64) -> Self;
    fn to_i128(self) -> i128;
    fn from_i128(v: i128) -> Self;

    /// Append the little-endian encoding of `self` to `out`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode from exactly `DTYPE.size_in_bytes()` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;

    /// Convert to another element type with C-style cast semantics.
    ///
    /// Integer-to-integer casts go through `i128` so that `int64` values are
    /// not rounded through `f64`.
    #[inline]
    fn cast<U: Element>(self) -> U {
        if Self::DTYPE.is_float() || U::DTYPE.is_float() {
            U::from_f64(self.to_f64())
        } else {
            U::from_i128(self.to_i128())
        }
    }
}

// ---------------------------------------------------------------------------
// Scalar: elements supporting arithmetic
// ---------------------------------------------------------------------------

/// Numeric element types.
///
/// This intentionally does *not* require floating-point operations so that
/// integer tensors remain first-class citizens.
pub trait Scalar:
    Element
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + Sum
{
    /// Convert from `usize` (used for index / shape arithmetic).
    fn from_usize(v: usize) -> Self;
}

/// Marker trait for integer scalar types.
pub trait Integer: Scalar {
    /// Remainder after division.
    fn rem(self, rhs: Self) -> Self;
}

/// Trait for floating-point scalar types.
pub trait Float: Scalar + Neg<Output = Self> {
    fn pi() -> Self;
    fn epsilon() -> Self;
    fn infinity() -> Self;
    fn neg_infinity() -> Self;
    fn nan() -> Self;

    fn abs(self) -> Self;
    fn sqrt(self) -> Self;
    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn ln_1p(self) -> Self;
    fn powf(self, n: Self) -> Self;
    fn powi(self, n: i32) -> Self;
    fn recip(self) -> Self;
    fn is_nan(self) -> bool;
    fn is_finite(self) -> bool;
    fn min(self, other: Self) -> Self;
    fn max(self, other: Self) -> Self;
}

/// Real-valued floats.
pub trait Real: Float {}

// ===========================================================================
// Implementations
// ===========================================================================

macro_rules! impl_float_math {
    ($ty:ty) => {
        impl Float for $ty {
            #[inline]
            fn pi() -> Self {
                Self::from_f64(std::f64::consts::PI)
            }
            #[inline]
            fn epsilon() -> Self {
                <$ty>::EPSILON
            }
            #[inline]
            fn infinity() -> Self {
                <$ty>::INFINITY
            }
            #[inline]
            fn neg_infinity() -> Self {
                <$ty>::NEG_INFINITY
            }
            #[inline]
            fn nan() -> Self {
                <$ty>::NAN
            }
            #[inline]
            fn abs(self) -> Self {
                <$ty>::abs(self)
            }
            #[inline]
            fn sqrt(self) -> Self {
                <$ty>::sqrt(self)
            }
            #[inline]
            fn exp(self) -> Self {
                <$ty>::exp(self)
            }
            #[inline]
            fn ln(self) -> Self {
                <$ty>::ln(self)
            }
            #[inline]
            fn ln_1p(self) -> Self {
                <$ty>::ln_1p(self)
            }
            #[inline]
            fn powf(self, n: Self) -> Self {
                <$ty>::powf(self, n)
            }
            #[inline]
            fn powi(self, n: i32) -> Self {
                <$ty>::powi(self, n)
            }
            #[inline]
            fn recip(self) -> Self {
                <$ty>::recip(self)
            }
            #[inline]
            fn is_nan(self) -> bool {
                <$ty>::is_nan(self)
            }
            #[inline]
            fn is_finite(self) -> bool {
                <$ty>::is_finite(self)
            }
            #[inline]
            fn min(self, other: Self) -> Self {
                <$ty>::min(self, other)
            }
            #[inline]
            fn max(self, other: Self) -> Self {
                <$ty>::max(self, other)
            }
        }

        impl Real for $ty {}
    };
}

macro_rules! impl_element_float {
    ($ty:ty, $dtype:ident) => {
        impl Element for $ty {
            const DTYPE: DType = DType::$dtype;
            #[inline]
            fn zero() -> Self {
                0.0
            }
            #[inline]
            fn one() -> Self {
                1.0
            }
            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
            #[inline]
            fn from_f64(v: f64) -> Self {
                v as Self
            }
            #[inline]
            fn to_i128(self) -> i128 {
                self as i128
            }
            #[inline]
            fn from_i128(v: i128) -> Self {
                v as Self
            }
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }
            fn read_le(bytes: &[u8]) -> Self {
                let mut buf = [0u8; core::mem::size_of::<$ty>()];
                buf.copy_from_slice(bytes);
                <$ty>::from_le_bytes(buf)
            }
        }

        impl Scalar for $ty {
            #[inline]
            fn from_usize(v: usize) -> Self {
                v as Self
            }
        }

        impl_float_math!($ty);
    };
}

impl_element_float!(f32, F32);
impl_element_float!(f64, F64);

// Half-precision types compute through `f32`.
macro_rules! impl_element_half {
    ($ty:ty, $dtype:ident) => {
        impl Element for $ty {
            const DTYPE: DType = DType::$dtype;
            #[inline]
            fn zero() -> Self {
                <$ty>::ZERO
            }
            #[inline]
            fn one() -> Self {
                <$ty>::ONE
            }
            #[inline]
            fn to_f64(self) -> f64 {
                self.to_f64()
            }
            #[inline]
            fn from_f64(v: f64) -> Self {
                <$ty>::from_f64(v)
            }
            #[inline]
            fn to_i128(self) -> i128 {
                self.to_f32() as i128
            }
            #[inline]
            fn from_i128(v: i128) -> Self {
                <$ty>::from_f32(v as f32)
            }
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }
            fn read_le(bytes: &[u8]) -> Self {
                <$ty>::from_le_bytes([bytes[0], bytes[1]])
            }
        }

        impl Scalar for $ty {
            #[inline]
            fn from_usize(v: usize) -> Self {
                <$ty>::from_f32(v as f32)
            }
        }

        impl Float for $ty {
            #[inline]
            fn pi() -> Self {
                <$ty>::PI
            }
            #[inline]
            fn epsilon() -> Self {
                <$ty>::EPSILON
            }
            #[inline]
            fn infinity() -> Self {
                <$ty>::INFINITY
            }
            #[inline]
            fn neg_infinity() -> Self {
                <$ty>::NEG_INFINITY
            }
            #[inline]
            fn nan() -> Self {
                <$ty>::NAN
            }
            #[inline]
            fn abs(self) -> Self {
                <$ty>::from_f32(self.to_f32().abs())
            }
            #[inline]
            fn sqrt(self) -> Self {
                <$ty>::from_f32(self.to_f32().sqrt())
            }
            #[inline]
            fn exp(self) -> Self {
                <$ty>::from_f32(self.to_f32().exp())
            }
            #[inline]
            fn ln(self) -> Self {
                <$ty>::from_f32(self.to_f32().ln())
            }
            #[inline]
            fn ln_1p(self) -> Self {
                <$ty>::from_f32(self.to_f32().ln_1p())
            }
            #[inline]
            fn powf(self, n: Self) -> Self {
                <$ty>::from_f32(self.to_f32().powf(n.to_f32()))
            }
            #[inline]
            fn powi(self, n: i32) -> Self {
                <$ty>::from_f32(self.to_f32().powi(n))
            }
            #[inline]
            fn recip(self) -> Self {
                <$ty>::from_f32(self.to_f32().recip())
            }
            #[inline]
            fn is_nan(self) -> bool {
                <$ty>::is_nan(self)
            }
            #[inline]
            fn is_finite(self) -> bool {
                <$ty>::is_finite(self)
            }
            #[inline]
            fn min(self, other: Self) -> Self {
                <$ty>::min(self, other)
            }
            #[inline]
            fn max(self, other: Self) -> Self {
                <$ty>::max(self, other)
            }
        }

        impl Real for $ty {}
    };
}

impl_element_half!(f16, F16);
impl_element_half!(bf16, BF16);

macro_rules! impl_element_int {
    ($ty:ty, $dtype:ident) => {
        impl Element for $ty {
            const DTYPE: DType = DType::$dtype;
            #[inline]
            fn zero() -> Self {
                0
            }
            #[inline]
            fn one() -> Self {
                1
            }
            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
            #[inline]
            fn from_f64(v: f64) -> Self {
                v as Self
            }
            #[inline]
            fn to_i128(self) -> i128 {
                self as i128
            }
            #[inline]
            #[allow(clippy::cast_possible_truncation)]
            fn from_i128(v: i128) -> Self {
                v as Self
            }
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }
            fn read_le(bytes: &[u8]) -> Self {
                let mut buf = [0u8; core::mem::size_of::<$ty>()];
                buf.copy_from_slice(bytes);
                <$ty>::from_le_bytes(buf)
            }
        }

        impl Scalar for $ty {
            #[inline]
            #[allow(clippy::cast_possible_wrap)]
            fn from_usize(v: usize) -> Self {
                v as Self
            }
        }

        impl Integer for $ty {
            #[inline]
            fn rem(self, rhs: Self) -> Self {
                self % rhs
            }
        }
    };
}

impl_element_int!(i8, I8);
impl_element_int!(i16, I16);
impl_element_int!(i32, I32);
impl_element_int!(i64, I64);
impl_element_int!(u8, U8);
impl_element_int!(u16, U16);
impl_element_int!(u32, U32);
impl_element_int!(u64, U64);

impl Element for bool {
    const DTYPE: DType = DType::Bool;
    #[inline]
    fn zero() -> Self {
        false
    }
    #[inline]
    fn one() -> Self {
        true
    }
    #[inline]
    fn to_f64(self) -> f64 {
        if self { 1.0 } else { 0.0 }
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        v != 0.0
    }
    #[inline]
    fn to_i128(self) -> i128 {
        i128::from(self)
    }
    #[inline]
    fn from_i128(v: i128) -> Self {
        v != 0
    }
    fn write_le(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_one() {
        assert_eq!(f64::zero(), 0.0);
        assert_eq!(i32::one(), 1);
        assert!(!bool::zero());
        assert_eq!(f16::one().to_f32(), 1.0);
    }

    #[test]
    fn test_cast_int_paths_do_not_round() {
        let big: i64 = (1 << 60) + 1;
        let back: i64 = big.cast::<i64>();
        assert_eq!(back, big);
        let as_u8: u8 = 300_i32.cast();
        assert_eq!(as_u8, 44);
        let as_i32: i32 = 2.9_f64.cast();
        assert_eq!(as_i32, 2);
        let flag: bool = 0.5_f32.cast();
        assert!(flag);
    }

    #[test]
    fn test_le_roundtrip_half() {
        let mut buf = Vec::new();
        bf16::from_f32(1.5).write_le(&mut buf);
        assert_eq!(buf.len(), 2);
        assert_eq!(bf16::read_le(&buf).to_f32(), 1.5);
    }

    #[test]
    fn test_half_float_ops() {
        let x = f16::from_f32(4.0);
        assert_eq!(Float::sqrt(x).to_f32(), 2.0);
        assert!(Float::is_nan(f16::nan()));
    }

    #[test]
    fn test_dtype_parse_and_display() {
        assert_eq!("float16".parse::<DType>().unwrap(), DType::F16);
        assert_eq!("torch.int64".parse::<DType>().unwrap(), DType::I64);
        assert_eq!("double".parse::<DType>().unwrap(), DType::F64);
        assert!("complex64".parse::<DType>().is_err());
        assert_eq!(DType::BF16.to_string(), "bfloat16");
    }

    #[test]
    fn test_promote() {
        assert_eq!(DType::I32.promote(DType::F16), DType::F16);
        assert_eq!(DType::U8.promote(DType::I8), DType::I16);
        assert_eq!(DType::U64.promote(DType::I32), DType::I64);
        assert_eq!(DType::F16.promote(DType::BF16), DType::F32);
        assert_eq!(DType::Bool.promote(DType::U8), DType::U8);
        assert_eq!(DType::F32.promote(DType::F64), DType::F64);
    }
}
