//! Entries that forward to a single engine routine after dtype promotion.

use torchbridge_core::array::promote_all;
use torchbridge_core::Array;

use super::write_out;
use crate::error::Result;

/// Element-wise least common multiple of two integer tensors.
///
/// Operands are promoted to a common dtype and broadcast. The result is
/// non-negative and `lcm(0, x) == 0`.
pub fn lcm(input: &Array, other: &Array, out: Option<&mut Array>) -> Result<Array> {
    let dtype = promote_all(&[input, other], "lcm")?;
    let ret = input.astype(dtype).lcm(&other.astype(dtype))?;
    Ok(write_out(out, ret))
}

/// Einstein summation over `operands`.
pub fn einsum(equation: &str, operands: &[&Array]) -> Result<Array> {
    Ok(Array::einsum(equation, operands)?)
}

/// Cross product of 3-vectors along `dim`, which defaults to the last axis.
pub fn cross(
    input: &Array,
    other: &Array,
    dim: Option<isize>,
    out: Option<&mut Array>,
) -> Result<Array> {
    let ret = input.cross(other, dim.unwrap_or(-1))?;
    Ok(write_out(out, ret))
}

#[cfg(test)]
mod tests {
    use torchbridge_core::tensor::Tensor;
    use torchbridge_core::DType;

    use super::*;
    use crate::error::FrontendError;

    #[test]
    fn test_lcm_promotes_and_broadcasts() {
        let a = Array::from(Tensor::from_vec(vec![4_i32, 6, 0, -3], vec![4]).unwrap());
        let b = Array::from(Tensor::scalar(6_i64));
        let r = lcm(&a, &b, None).unwrap();
        assert_eq!(r.dtype(), DType::I64);
        assert_eq!(r.to_f64_vec(), vec![12.0, 6.0, 0.0, 6.0]);
    }

    #[test]
    fn test_lcm_rejects_floats() {
        let a = Array::from(Tensor::from_vec(vec![1.0_f32], vec![1]).unwrap());
        assert!(matches!(lcm(&a, &a, None), Err(FrontendError::Engine(_))));
    }

    #[test]
    fn test_einsum_matmul() {
        let a = Array::from(Tensor::from_vec(vec![1_i64, 2, 3, 4], vec![2, 2]).unwrap());
        let b = Array::from(Tensor::from_vec(vec![1.0_f32, 0.0, 0.0, 1.0], vec![2, 2]).unwrap());
        let r = einsum("ij,jk->ik", &[&a, &b]).unwrap();
        assert_eq!(r.dtype(), DType::F32);
        assert_eq!(r.to_f64_vec(), vec![1.0, 2.0, 3.0, 4.0]);
        assert!(einsum("ij,jk->ik", &[&a]).is_err());
    }

    #[test]
    fn test_cross_default_dim_and_out() {
        let x = Array::from(Tensor::from_vec(vec![1_i64, 0, 0, 0, 1, 0], vec![2, 3]).unwrap());
        let y = Array::from(Tensor::from_vec(vec![0_i64, 1, 0, 0, 0, 1], vec![2, 3]).unwrap());
        let mut out = Array::zeros(vec![0], DType::I64);
        let r = cross(&x, &y, None, Some(&mut out)).unwrap();
        assert_eq!(out, r);
        assert_eq!(r.to_f64_vec(), vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
        assert!(cross(&x, &y, Some(0), None).is_err());
    }
}
