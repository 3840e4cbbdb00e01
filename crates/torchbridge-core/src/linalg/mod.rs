//! Linear algebra: vector norms, cross products, and Einstein summation.

mod einsum;

pub use einsum::einsum;

use crate::array::{Array, for_numeric_dtype, promote_all};
use crate::error::{CoreError, Result, normalize_axis};
use crate::tensor::{Tensor, broadcast_shapes};
use crate::{Float, Scalar};

/// The `ord`-norm of all elements of `x`, treated as one vector.
///
/// `ord = inf` is the largest magnitude, `-inf` the smallest, `0` the number
/// of non-zero elements; any other value gives `(Σ|x|^ord)^(1/ord)`.
///
/// ```
/// # use torchbridge_core::tensor::Tensor;
/// # use torchbridge_core::linalg::vector_norm;
/// let x = Tensor::from_vec(vec![3.0_f64, -4.0], vec![2]).unwrap();
/// assert_eq!(vector_norm(&x, 2.0), 5.0);
/// assert_eq!(vector_norm(&x, f64::INFINITY), 4.0);
/// assert_eq!(vector_norm(&x, 1.0), 7.0);
/// ```
pub fn vector_norm<T: Float>(x: &Tensor<T>, ord: f64) -> T {
    let mags = x.iter().map(|&v| v.abs());
    if ord == f64::INFINITY {
        mags.fold(T::zero(), Float::max)
    } else if ord == f64::NEG_INFINITY {
        mags.reduce(Float::min).unwrap_or(T::infinity())
    } else if ord == 0.0 {
        T::from_usize(mags.filter(|&m| m != T::zero()).count())
    } else if ord == 1.0 {
        mags.sum()
    } else if ord == 2.0 {
        mags.map(|m| m * m).sum::<T>().sqrt()
    } else {
        let p = T::from_f64(ord);
        mags.map(|m| m.powf(p)).sum::<T>().powf(p.recip())
    }
}

/// Cross product of 3-vectors laid out along `axis` of the broadcast shape.
///
/// ```
/// # use torchbridge_core::tensor::Tensor;
/// # use torchbridge_core::linalg::cross;
/// let x = Tensor::from_vec(vec![1, 0, 0], vec![3]).unwrap();
/// let y = Tensor::from_vec(vec![0, 1, 0], vec![3]).unwrap();
/// assert_eq!(cross(&x, &y, 0).unwrap().as_slice(), &[0, 0, 1]);
/// ```
pub fn cross<T: Scalar>(a: &Tensor<T>, b: &Tensor<T>, axis: usize) -> Result<Tensor<T>> {
    let shape = broadcast_shapes(a.shape(), b.shape())?;
    if axis >= shape.len() {
        return Err(CoreError::axis_out_of_bounds(axis, shape.len()));
    }
    if shape[axis] != 3 {
        return Err(CoreError::invalid_argument(format!(
            "cross product needs size 3 along axis {axis}, got {}",
            shape[axis]
        )));
    }
    let a = a.broadcast_to(&shape)?;
    let b = b.broadcast_to(&shape)?;
    let step = a.strides()[axis];
    let (xa, xb) = (a.as_slice(), b.as_slice());
    Ok(Tensor::from_fn(shape, |ix| {
        let i = ix[axis];
        let base: usize = ix
            .iter()
            .zip(a.strides())
            .enumerate()
            .map(|(d, (&v, &s))| if d == axis { 0 } else { v * s })
            .sum();
        let (j, k) = ((i + 1) % 3, (i + 2) % 3);
        xa[base + j * step] * xb[base + k * step] - xa[base + k * step] * xb[base + j * step]
    }))
}

impl Array {
    /// Cross product after promoting both operands to a common dtype.
    /// `axis` may be negative and is resolved against the broadcast rank.
    pub fn cross(&self, other: &Array, axis: isize) -> Result<Array> {
        let dtype = promote_all(&[self, other], "cross")?;
        let rank = broadcast_shapes(self.shape(), other.shape())?.len();
        let axis = normalize_axis(axis, rank)?;
        Ok(for_numeric_dtype!(dtype, "cross", T => {
            Array::from(cross(&self.cast::<T>(), &other.cast::<T>(), axis)?)
        }))
    }

    /// Einstein summation after promoting every operand to a common dtype.
    pub fn einsum(equation: &str, operands: &[&Array]) -> Result<Array> {
        let dtype = promote_all(operands, "einsum")?;
        Ok(for_numeric_dtype!(dtype, "einsum", T => {
            let tensors: Vec<Tensor<T>> = operands.iter().map(|a| a.cast::<T>()).collect();
            let refs: Vec<&Tensor<T>> = tensors.iter().collect();
            Array::from(einsum(equation, &refs)?)
        }))
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::DType;

    #[test]
    fn test_vector_norm_orders() {
        let x = Tensor::from_vec(vec![1.0_f64, -2.0, 0.0, 2.0], vec![2, 2]).unwrap();
        assert_eq!(vector_norm(&x, 2.0), 3.0);
        assert_eq!(vector_norm(&x, 1.0), 5.0);
        assert_eq!(vector_norm(&x, 0.0), 3.0);
        assert_eq!(vector_norm(&x, f64::NEG_INFINITY), 0.0);
        assert_relative_eq!(vector_norm(&x, 3.0), 17.0_f64.cbrt(), max_relative = 1e-12);
    }

    #[test]
    fn test_vector_norm_empty() {
        let x = Tensor::<f64>::zeros(vec![0]);
        assert_eq!(vector_norm(&x, 2.0), 0.0);
        assert_eq!(vector_norm(&x, f64::INFINITY), 0.0);
    }

    #[test]
    fn test_cross_batched_with_broadcast() {
        let a = Tensor::from_vec(vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![2, 3]).unwrap();
        let b = Tensor::from_vec(vec![0.0, 0.0, 1.0], vec![3]).unwrap();
        let c = cross(&a, &b, 1).unwrap();
        assert_eq!(c.shape(), &[2, 3]);
        assert_eq!(c.as_slice(), &[0.0, -1.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cross_along_leading_axis() {
        // Vectors stored column-wise: a = [e_x, e_y], b = [e_y, e_z].
        let a = Tensor::from_vec(vec![1, 0, 0, 1, 0, 0], vec![3, 2]).unwrap();
        let b = Tensor::from_vec(vec![0, 0, 1, 0, 0, 1], vec![3, 2]).unwrap();
        let c = cross(&a, &b, 0).unwrap();
        // Columns of the result: e_z and e_x.
        assert_eq!(c.as_slice(), &[0, 1, 0, 0, 1, 0]);
        assert!(cross(&a, &b, 1).is_err());
    }

    #[test]
    fn test_array_cross_promotes() {
        let a = Array::from(Tensor::from_vec(vec![1_i32, 2, 3], vec![3]).unwrap());
        let b = Array::from(Tensor::from_vec(vec![4.0_f32, 5.0, 6.0], vec![3]).unwrap());
        let c = a.cross(&b, -1).unwrap();
        assert_eq!(c.dtype(), DType::F32);
        assert_eq!(c.to_f64_vec(), vec![-3.0, 6.0, -3.0]);
    }

    #[test]
    fn test_array_einsum_promotes() {
        let a = Array::from(Tensor::from_vec(vec![1_u8, 2], vec![2]).unwrap());
        let b = Array::from(Tensor::from_vec(vec![3_i64, 4], vec![2]).unwrap());
        let dot = Array::einsum("i,i->", &[&a, &b]).unwrap();
        assert_eq!(dot.dtype(), DType::I64);
        assert_eq!(dot.to_f64_vec(), vec![11.0]);
    }
}
