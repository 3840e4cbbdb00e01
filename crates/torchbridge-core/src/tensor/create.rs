//! Tensor creation functions analogous to `zeros`, `ones`, `meshgrid`, etc.

use crate::error::{CoreError, Result};
use crate::{Element, Scalar};

use super::{Tensor, compute_strides};

/// Index ordering for [`Tensor::meshgrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshIndexing {
    /// Matrix indexing: output axis `i` follows input `i`.
    #[default]
    Ij,
    /// Cartesian indexing: the first two output axes are swapped.
    Xy,
}

impl<T: Element> Tensor<T> {
    /// Create a tensor filled with zeros.
    ///
    /// ```
    /// # use torchbridge_core::tensor::Tensor;
    /// let t = Tensor::<f64>::zeros(vec![2, 3]);
    /// assert_eq!(t.shape(), &[2, 3]);
    /// assert!(t.iter().all(|&x| x == 0.0));
    /// ```
    pub fn zeros(shape: Vec<usize>) -> Self {
        Self::full(shape, T::zero())
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: Vec<usize>) -> Self {
        Self::full(shape, T::one())
    }

    /// Create a tensor filled with a constant value.
    pub fn full(shape: Vec<usize>, value: T) -> Self {
        let numel: usize = shape.iter().product();
        let strides = compute_strides(&shape);
        Self {
            data: vec![value; numel],
            shape,
            strides,
        }
    }

    /// Coordinate grids from 1-D inputs.
    ///
    /// With [`MeshIndexing::Ij`] every output has shape
    /// `(len(x0), len(x1), ...)` and output `i` varies along axis `i`.
    ///
    /// ```
    /// # use torchbridge_core::tensor::{MeshIndexing, Tensor};
    /// let a = Tensor::from_vec(vec![1, 2], vec![2]).unwrap();
    /// let b = Tensor::from_vec(vec![7, 8, 9], vec![3]).unwrap();
    /// let grids = Tensor::meshgrid(&[&a, &b], MeshIndexing::Ij).unwrap();
    /// assert_eq!(grids[0].as_slice(), &[1, 1, 1, 2, 2, 2]);
    /// assert_eq!(grids[1].as_slice(), &[7, 8, 9, 7, 8, 9]);
    /// ```
    pub fn meshgrid(inputs: &[&Tensor<T>], indexing: MeshIndexing) -> Result<Vec<Self>> {
        for t in inputs {
            if t.ndim() > 1 {
                return Err(CoreError::invalid_argument(
                    "meshgrid expects 0-D or 1-D inputs",
                ));
            }
        }
        let mut shape: Vec<usize> = inputs.iter().map(|t| t.numel()).collect();
        let swap = indexing == MeshIndexing::Xy && inputs.len() >= 2;
        if swap {
            shape.swap(0, 1);
        }
        let grids = inputs
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let axis = match (swap, i) {
                    (true, 0) => 1,
                    (true, 1) => 0,
                    _ => i,
                };
                Tensor::from_fn(shape.clone(), |ix| t.data[ix[axis]])
            })
            .collect();
        Ok(grids)
    }
}

impl<T: Scalar> Tensor<T> {
    /// Create a 1-D tensor with values `[0, 1, 2, ..., n-1]`.
    ///
    /// ```
    /// # use torchbridge_core::tensor::Tensor;
    /// let t = Tensor::<i32>::arange(5);
    /// assert_eq!(t.as_slice(), &[0, 1, 2, 3, 4]);
    /// ```
    pub fn arange(n: usize) -> Self {
        let data: Vec<T> = (0..n).map(T::from_usize).collect();
        Self {
            data,
            shape: vec![n],
            strides: vec![1],
        }
    }

    /// Vandermonde matrix of a 1-D tensor with `n` columns.
    ///
    /// Column `j` holds `x^(n-1-j)`, or `x^j` when `increasing` is set.
    pub fn vander(&self, n: usize, increasing: bool) -> Result<Self> {
        if self.ndim() != 1 {
            return Err(CoreError::invalid_argument(format!(
                "vander expects a 1-D tensor, got {}-D",
                self.ndim()
            )));
        }
        let rows = self.numel();
        let mut data = Vec::with_capacity(rows * n);
        for &x in &self.data {
            let mut powers = Vec::with_capacity(n);
            let mut acc = T::one();
            for _ in 0..n {
                powers.push(acc);
                acc *= x;
            }
            if !increasing {
                powers.reverse();
            }
            data.extend(powers);
        }
        Tensor::from_vec(data, vec![rows, n])
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_ones_full() {
        let t = Tensor::<f64>::zeros(vec![3, 4]);
        assert_eq!(t.numel(), 12);
        assert!(t.iter().all(|&x| x == 0.0));
        assert!(Tensor::<bool>::ones(vec![2]).iter().all(|&b| b));
        assert!(Tensor::full(vec![2, 3], 7_i32).iter().all(|&x| x == 7));
    }

    #[test]
    fn test_arange_zero() {
        let t = Tensor::<i32>::arange(0);
        assert!(t.is_empty());
        assert_eq!(t.shape(), &[0]);
    }

    #[test]
    fn test_meshgrid_xy_swaps_leading_axes() {
        let a = Tensor::from_vec(vec![1, 2], vec![2]).unwrap();
        let b = Tensor::from_vec(vec![7, 8, 9], vec![3]).unwrap();
        let grids = Tensor::meshgrid(&[&a, &b], MeshIndexing::Xy).unwrap();
        assert_eq!(grids[0].shape(), &[3, 2]);
        assert_eq!(grids[0].as_slice(), &[1, 2, 1, 2, 1, 2]);
        assert_eq!(grids[1].as_slice(), &[7, 7, 8, 8, 9, 9]);
    }

    #[test]
    fn test_vander() {
        let x = Tensor::from_vec(vec![1, 2, 3], vec![3]).unwrap();
        let v = x.vander(3, false).unwrap();
        assert_eq!(v.as_slice(), &[1, 1, 1, 4, 2, 1, 9, 3, 1]);
        let v = x.vander(3, true).unwrap();
        assert_eq!(v.as_slice(), &[1, 1, 1, 1, 2, 4, 1, 3, 9]);
    }

    #[test]
    fn test_vander_rejects_matrix() {
        let x = Tensor::<f32>::zeros(vec![2, 2]);
        assert!(x.vander(2, false).is_err());
    }
}
