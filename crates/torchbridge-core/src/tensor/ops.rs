//! Element-wise arithmetic and broadcasting for [`Tensor`].
//!
//! `Tensor<T> op T` applies a scalar to every element. Tensor-tensor
//! arithmetic goes through the `*_checked` methods, which broadcast their
//! operands and return `Err` on incompatible shapes.

use core::ops::{Add, Div, Mul, Sub};

use crate::error::{CoreError, Result};
use crate::{Element, Scalar};

use super::Tensor;

// ======================================================================
// Tensor + scalar  (broadcast scalar to every element)
// ======================================================================

macro_rules! impl_scalar_binop {
    ($trait:ident, $method:ident, $op:tt) => {
        impl<T: Scalar> $trait<T> for Tensor<T> {
            type Output = Tensor<T>;

            fn $method(self, rhs: T) -> Tensor<T> {
                let data = self.data.iter().map(|&a| a $op rhs).collect();
                Tensor {
                    data,
                    shape: self.shape,
                    strides: self.strides,
                }
            }
        }

        impl<T: Scalar> $trait<T> for &Tensor<T> {
            type Output = Tensor<T>;

            fn $method(self, rhs: T) -> Tensor<T> {
                let data = self.data.iter().map(|&a| a $op rhs).collect();
                Tensor {
                    data,
                    shape: self.shape.clone(),
                    strides: self.strides.clone(),
                }
            }
        }
    };
}

impl_scalar_binop!(Add, add, +);
impl_scalar_binop!(Sub, sub, -);
impl_scalar_binop!(Mul, mul, *);
impl_scalar_binop!(Div, div, /);

// ======================================================================
// Broadcasting
// ======================================================================

/// Result shape of broadcasting `a` against `b` (trailing axes aligned).
pub fn broadcast_shapes(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let mut out = vec![0usize; ndim];
    for i in 0..ndim {
        let da = if i < ndim - a.len() { 1 } else { a[i - (ndim - a.len())] };
        let db = if i < ndim - b.len() { 1 } else { b[i - (ndim - b.len())] };
        out[i] = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => {
                return Err(CoreError::BroadcastError {
                    shape_a: a.to_vec(),
                    shape_b: b.to_vec(),
                });
            }
        };
    }
    Ok(out)
}

impl<T: Element> Tensor<T> {
    /// Materialise this tensor broadcast to `shape`.
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Tensor<T>> {
        let target = broadcast_shapes(&self.shape, shape)?;
        if target != shape {
            return Err(CoreError::BroadcastError {
                shape_a: self.shape.clone(),
                shape_b: shape.to_vec(),
            });
        }
        if self.shape == shape {
            return Ok(self.clone());
        }
        let lead = shape.len() - self.ndim();
        Ok(Tensor::from_fn(shape.to_vec(), |ix| {
            let flat: usize = (0..self.ndim())
                .map(|d| {
                    let i = if self.shape[d] == 1 { 0 } else { ix[lead + d] };
                    i * self.strides[d]
                })
                .sum();
            self.data[flat]
        }))
    }

    /// Apply `f` element-wise after broadcasting both operands.
    pub fn zip_map_broadcast<U, F>(&self, other: &Tensor<T>, f: F) -> Result<Tensor<U>>
    where
        U: Element,
        F: Fn(T, T) -> U,
    {
        if self.shape == other.shape {
            return self.zip_map(other, f);
        }
        let shape = broadcast_shapes(&self.shape, &other.shape)?;
        let a = self.broadcast_to(&shape)?;
        let b = other.broadcast_to(&shape)?;
        a.zip_map(&b, f)
    }
}

impl<T: Scalar> Tensor<T> {
    /// Broadcasting addition, returning `Err` on incompatible shapes.
    pub fn add_checked(&self, other: &Tensor<T>) -> Result<Tensor<T>> {
        self.zip_map_broadcast(other, |a, b| a + b)
    }

    /// Broadcasting multiplication, returning `Err` on incompatible shapes.
    pub fn mul_checked(&self, other: &Tensor<T>) -> Result<Tensor<T>> {
        self.zip_map_broadcast(other, |a, b| a * b)
    }
}

// ======================================================================
// Reductions
// ======================================================================

impl<T: Scalar> Tensor<T> {
    /// Sum of the main diagonal of a 2-D tensor.
    pub fn trace(&self) -> Result<T> {
        if self.ndim() != 2 {
            return Err(CoreError::invalid_argument(format!(
                "trace expects a 2-D tensor, got {}-D",
                self.ndim()
            )));
        }
        let n = self.shape[0].min(self.shape[1]);
        Ok((0..n).map(|i| self.data[i * self.strides[0] + i]).sum())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_scalar() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0], vec![3]).unwrap();
        let c = a * 10.0;
        assert_eq!(c.as_slice(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_div_sub_scalar_by_ref() {
        let a = Tensor::from_vec(vec![10.0, 20.0, 30.0], vec![3]).unwrap();
        assert_eq!((&a / 10.0).as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!((&a - 5.0).as_slice(), &[5.0, 15.0, 25.0]);
        assert_eq!((a + 1.0).as_slice(), &[11.0, 21.0, 31.0]);
    }

    #[test]
    fn test_broadcast_shapes() {
        assert_eq!(broadcast_shapes(&[2, 3], &[3]).unwrap(), vec![2, 3]);
        assert_eq!(broadcast_shapes(&[1, 4, 1], &[2, 1, 5]).unwrap(), vec![2, 4, 5]);
        assert!(broadcast_shapes(&[2, 3], &[2]).is_err());
    }

    #[test]
    fn test_broadcast_to() {
        let row = Tensor::from_vec(vec![1, 2, 3], vec![3]).unwrap();
        let b = row.broadcast_to(&[2, 3]).unwrap();
        assert_eq!(b.as_slice(), &[1, 2, 3, 1, 2, 3]);
        assert!(row.broadcast_to(&[3, 2]).is_err());
        assert!(b.broadcast_to(&[3]).is_err());
    }

    #[test]
    fn test_add_checked_broadcasts_channel_bias() {
        let x = Tensor::<f64>::zeros(vec![1, 2, 3]);
        let bias = Tensor::from_vec(vec![1.0, 2.0], vec![2])
            .unwrap()
            .expand_dims(&[0, 2])
            .unwrap();
        let y = x.add_checked(&bias).unwrap();
        assert_eq!(y.shape(), &[1, 2, 3]);
        assert_eq!(y.as_slice(), &[1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_mul_checked() {
        let a = Tensor::from_vec(vec![1, 2, 3, 4], vec![2, 2]).unwrap();
        let b = Tensor::from_vec(vec![10, 100], vec![2, 1]).unwrap();
        assert_eq!(a.mul_checked(&b).unwrap().as_slice(), &[10, 20, 300, 400]);
    }

    #[test]
    fn test_checked_add_mismatch() {
        let a = Tensor::from_vec(vec![1.0, 2.0], vec![2]).unwrap();
        let b = Tensor::from_vec(vec![1.0, 2.0, 3.0], vec![3]).unwrap();
        assert!(a.add_checked(&b).is_err());
    }

    #[test]
    fn test_trace() {
        let t = Tensor::from_vec(vec![1, 2, 3, 4, 5, 6], vec![2, 3]).unwrap();
        assert_eq!(t.trace().unwrap(), 6);
        let tall = Tensor::from_vec(vec![1.5, 0.0, 0.0, 2.5, 9.0, 9.0], vec![3, 2]).unwrap();
        assert_eq!(tall.trace().unwrap(), 4.0);
        assert!(Tensor::<i32>::arange(3).trace().is_err());
    }
}
