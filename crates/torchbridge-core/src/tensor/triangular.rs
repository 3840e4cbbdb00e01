//! Triangular masks over the last two axes.

use crate::Element;
use crate::error::{CoreError, Result};

use super::Tensor;

impl<T: Element> Tensor<T> {
    fn keep_where<F>(&self, keep: F) -> Result<Tensor<T>>
    where
        F: Fn(isize, isize) -> bool,
    {
        let ndim = self.ndim();
        if ndim < 2 {
            return Err(CoreError::invalid_argument(format!(
                "triangular mask needs at least 2 dimensions, got {ndim}"
            )));
        }
        let rows = self.shape[ndim - 2];
        let cols = self.shape[ndim - 1];
        let mut data = self.data.clone();
        for (flat, v) in data.iter_mut().enumerate() {
            let c = (flat % cols) as isize;
            let r = ((flat / cols) % rows) as isize;
            if !keep(r, c) {
                *v = T::zero();
            }
        }
        Tensor::from_vec(data, self.shape.clone())
    }

    /// Keep elements on and below the `k`-th diagonal, zero the rest.
    pub fn tril(&self, k: isize) -> Result<Tensor<T>> {
        self.keep_where(|r, c| c - r <= k)
    }

    /// Keep elements on and above the `k`-th diagonal, zero the rest.
    pub fn triu(&self, k: isize) -> Result<Tensor<T>> {
        self.keep_where(|r, c| c - r >= k)
    }
}
