//! Diagonal and triangle entries.

use torchbridge_core::error::normalize_axis;
use torchbridge_core::tensor::Tensor;
use torchbridge_core::{Array, DType};

use super::write_out;
use crate::error::Result;

/// Diagonal at `offset` of the plane spanned by `dim1` and `dim2`, appended
/// as the last axis of the result.
pub fn diagonal(input: &Array, offset: isize, dim1: isize, dim2: isize) -> Result<Array> {
    let ndim = input.ndim();
    let a1 = normalize_axis(dim1, ndim)?;
    let a2 = normalize_axis(dim2, ndim)?;
    Ok(input.diagonal(offset, a1, a2)?)
}

/// Zero everything above the `diagonal`-th diagonal of the last two axes.
pub fn tril(input: &Array, diagonal: isize, out: Option<&mut Array>) -> Result<Array> {
    Ok(write_out(out, input.tril(diagonal)?))
}

/// Zero everything below the `diagonal`-th diagonal of the last two axes.
pub fn triu(input: &Array, diagonal: isize, out: Option<&mut Array>) -> Result<Array> {
    Ok(write_out(out, input.triu(diagonal)?))
}

/// Coordinates of the ones in a `row x col` mask, as a `(2, N)` tensor in
/// row-major order.
fn mask_indices(mask: Tensor<bool>, dtype: Option<DType>) -> Result<Array> {
    let coords = mask.nonzero();
    let refs: Vec<&Tensor<i64>> = coords.iter().collect();
    let stacked = Tensor::stack(&refs, 0)?;
    Ok(Array::from(stacked).astype(dtype.unwrap_or(DType::I64)))
}

/// Indices of the lower triangle of a `row x col` matrix.
///
/// ```
/// # use torchbridge_frontend::ops::tril_indices;
/// let idx = tril_indices(3, 3, 0, None).unwrap();
/// assert_eq!(idx.shape(), &[2, 6]);
/// assert_eq!(idx.to_f64_vec(), vec![0., 1., 1., 2., 2., 2., 0., 0., 1., 0., 1., 2.]);
/// ```
pub fn tril_indices(row: usize, col: usize, offset: isize, dtype: Option<DType>) -> Result<Array> {
    mask_indices(Tensor::<bool>::ones(vec![row, col]).tril(offset)?, dtype)
}

/// Indices of the upper triangle of a `row x col` matrix.
pub fn triu_indices(row: usize, col: usize, offset: isize, dtype: Option<DType>) -> Result<Array> {
    mask_indices(Tensor::<bool>::ones(vec![row, col]).triu(offset)?, dtype)
}

/// Vandermonde matrix of a 1-D tensor. `n` defaults to the input length,
/// and `Some(0)` yields an empty tensor of the input dtype.
pub fn vander(x: &Array, n: Option<usize>, increasing: bool) -> Result<Array> {
    match n {
        Some(0) => Ok(Array::zeros(vec![0], x.dtype())),
        Some(n) => Ok(x.vander(n, increasing)?),
        None => Ok(x.vander(x.numel(), increasing)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arange(n: usize, shape: Vec<usize>) -> Array {
        Array::from(Tensor::<i64>::arange(n).reshape(shape).unwrap())
    }

    #[test]
    fn test_diagonal_offsets() {
        let x = arange(9, vec![3, 3]);
        assert_eq!(diagonal(&x, 0, 0, 1).unwrap().to_f64_vec(), vec![0., 4., 8.]);
        assert_eq!(diagonal(&x, 1, 0, 1).unwrap().to_f64_vec(), vec![1., 5.]);
        assert_eq!(diagonal(&x, -1, -2, -1).unwrap().to_f64_vec(), vec![3., 7.]);
        assert!(diagonal(&x, 0, 0, 2).is_err());
    }

    #[test]
    fn test_diagonal_batched() {
        let x = arange(12, vec![2, 2, 3]);
        let d = diagonal(&x, 0, 1, 2).unwrap();
        assert_eq!(d.shape(), &[2, 2]);
        assert_eq!(d.to_f64_vec(), vec![0., 4., 6., 10.]);
    }

    #[test]
    fn test_tril_triu_with_out() {
        let x = arange(9, vec![3, 3]);
        let mut out = Array::zeros(vec![1], DType::I64);
        let lower = tril(&x, 0, Some(&mut out)).unwrap();
        assert_eq!(out, lower);
        assert_eq!(lower.to_f64_vec(), vec![0., 0., 0., 3., 4., 0., 6., 7., 8.]);
        let upper = triu(&x, 1, None).unwrap();
        assert_eq!(upper.to_f64_vec(), vec![0., 1., 2., 0., 0., 5., 0., 0., 0.]);
        assert!(tril(&arange(3, vec![3]), 0, None).is_err());
    }

    #[test]
    fn test_triu_indices_rectangular() {
        let idx = triu_indices(2, 3, 1, Some(DType::I32)).unwrap();
        assert_eq!(idx.dtype(), DType::I32);
        assert_eq!(idx.shape(), &[2, 3]);
        assert_eq!(idx.to_f64_vec(), vec![0., 0., 1., 1., 2., 2.]);
    }

    #[test]
    fn test_indices_empty() {
        let idx = tril_indices(0, 4, 0, None).unwrap();
        assert_eq!(idx.shape(), &[2, 0]);
        assert_eq!(idx.dtype(), DType::I64);
    }

    #[test]
    fn test_vander() {
        let x = Array::from(Tensor::from_vec(vec![1_i64, 2, 3], vec![3]).unwrap());
        let v = vander(&x, None, false).unwrap();
        assert_eq!(v.shape(), &[3, 3]);
        assert_eq!(v.to_f64_vec(), vec![1., 1., 1., 4., 2., 1., 9., 3., 1.]);
        let v = vander(&x, Some(2), true).unwrap();
        assert_eq!(v.to_f64_vec(), vec![1., 1., 1., 2., 1., 3.]);
        let empty = vander(&x, Some(0), false).unwrap();
        assert_eq!(empty.shape(), &[0]);
        assert_eq!(empty.dtype(), DType::I64);
    }
}
