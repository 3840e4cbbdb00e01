//! Slicing, diagonals, and coordinate queries for [`Tensor`].

use crate::Element;
use crate::error::{CoreError, Result};

use super::{Tensor, advance, compute_strides};

/// A range specification for one axis when slicing a tensor.
///
/// Mirrors Python's `start:stop:step` slice notation.
#[derive(Debug, Clone, Copy)]
pub struct SliceRange {
    pub start: usize,
    pub stop: usize,
    pub step: usize,
}

impl SliceRange {
    /// Create a new slice range.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `step == 0`.
    #[allow(clippy::similar_names)]
    pub fn new(start: usize, stop: usize, step: usize) -> Self {
        debug_assert!(step > 0, "slice step must be > 0");
        Self { start, stop, step }
    }

    /// Shorthand for `start..stop` with step 1.
    pub fn range(start: usize, stop: usize) -> Self {
        Self::new(start, stop, 1)
    }

    /// Select the full extent of an axis. Requires knowing the axis length.
    pub fn full(len: usize) -> Self {
        Self::new(0, len, 1)
    }

    /// The number of elements this range selects.
    fn len(&self) -> usize {
        if self.stop <= self.start {
            0
        } else {
            (self.stop - self.start).div_ceil(self.step)
        }
    }
}

impl<T: Element> Tensor<T> {
    /// Extract a sub-tensor by slicing along each axis.
    ///
    /// `ranges` must have exactly `ndim` elements. Each [`SliceRange`]
    /// specifies which indices to take along that axis.
    ///
    /// Returns a new tensor with copied data.
    pub fn slice(&self, ranges: &[SliceRange]) -> Result<Self> {
        if ranges.len() != self.ndim() {
            return Err(CoreError::invalid_argument(
                "number of slice ranges must match tensor rank",
            ));
        }

        // Validate ranges
        for (d, r) in ranges.iter().enumerate() {
            if r.stop > self.shape[d] {
                return Err(CoreError::IndexOutOfBounds {
                    index: vec![r.stop],
                    shape: self.shape.clone(),
                });
            }
            if r.step == 0 {
                return Err(CoreError::invalid_argument("slice step must be > 0"));
            }
        }

        let new_shape: Vec<usize> = ranges.iter().map(SliceRange::len).collect();
        let new_numel: usize = new_shape.iter().product();

        if new_numel == 0 {
            return Tensor::from_vec(vec![], new_shape);
        }

        let mut data = Vec::with_capacity(new_numel);
        let mut index = vec![0usize; self.ndim()];

        // Initialize index to start positions
        for (d, r) in ranges.iter().enumerate() {
            index[d] = r.start;
        }

        // Iterate over all output elements (odometer on the sliced indices)
        for _ in 0..new_numel {
            let flat = index
                .iter()
                .zip(self.strides.iter())
                .map(|(&i, &s)| i * s)
                .sum::<usize>();
            data.push(self.data[flat]);

            // Advance the odometer
            for d in (0..self.ndim()).rev() {
                index[d] += ranges[d].step;
                if index[d] < ranges[d].stop {
                    break;
                }
                index[d] = ranges[d].start;
            }
        }

        Tensor::from_vec(data, new_shape)
    }

    /// Select a single index along the given axis, reducing dimensionality by 1.
    ///
    /// For a 2-D tensor, `select(0, i)` returns row `i` as a 1-D tensor.
    pub fn select(&self, axis: usize, index: usize) -> Result<Self> {
        if axis >= self.ndim() {
            return Err(CoreError::axis_out_of_bounds(axis, self.ndim()));
        }
        if index >= self.shape[axis] {
            return Err(CoreError::IndexOutOfBounds {
                index: vec![index],
                shape: self.shape.clone(),
            });
        }

        let mut ranges: Vec<SliceRange> = self
            .shape
            .iter()
            .map(|&len| SliceRange::full(len))
            .collect();
        ranges[axis] = SliceRange::new(index, index + 1, 1);

        let sliced = self.slice(&ranges)?;
        // Remove the axis that was selected (it has size 1)
        let mut new_shape: Vec<usize> = sliced.shape().to_vec();
        new_shape.remove(axis);
        if new_shape.is_empty() {
            Ok(Tensor::scalar(sliced.data[0]))
        } else {
            let strides = compute_strides(&new_shape);
            Ok(Tensor {
                data: sliced.data,
                shape: new_shape,
                strides,
            })
        }
    }

    /// Extract the diagonal formed by `axis1` and `axis2`.
    ///
    /// Both axes are removed and the diagonal is appended as the last axis.
    /// A positive `offset` selects a diagonal above the main one (towards
    /// higher `axis2` indices), a negative one below it.
    pub fn diagonal(&self, offset: isize, axis1: usize, axis2: usize) -> Result<Self> {
        let ndim = self.ndim();
        if axis1 >= ndim {
            return Err(CoreError::axis_out_of_bounds(axis1, ndim));
        }
        if axis2 >= ndim {
            return Err(CoreError::axis_out_of_bounds(axis2, ndim));
        }
        if axis1 == axis2 {
            return Err(CoreError::invalid_argument(
                "diagonal axes must be different",
            ));
        }
        let (n1, n2) = (self.shape[axis1] as isize, self.shape[axis2] as isize);
        let (row0, col0) = if offset >= 0 { (0, offset) } else { (-offset, 0) };
        let diag_len = (n1 - row0).min(n2 - col0).max(0) as usize;

        let rest: Vec<usize> = (0..ndim).filter(|&d| d != axis1 && d != axis2).collect();
        let mut new_shape: Vec<usize> = rest.iter().map(|&d| self.shape[d]).collect();
        new_shape.push(diag_len);

        Ok(Tensor::from_fn(new_shape, |ix| {
            let k = ix[rest.len()] as isize;
            let mut flat = (row0 + k) as usize * self.strides[axis1]
                + (col0 + k) as usize * self.strides[axis2];
            for (pos, &d) in rest.iter().enumerate() {
                flat += ix[pos] * self.strides[d];
            }
            self.data[flat]
        }))
    }

    /// Coordinates of every element not equal to zero, one 1-D tensor per
    /// axis, in row-major order.
    pub fn nonzero(&self) -> Vec<Tensor<i64>> {
        let ndim = self.ndim();
        let mut coords: Vec<Vec<i64>> = vec![Vec::new(); ndim];
        let mut index = vec![0usize; ndim];
        for &v in &self.data {
            if v != T::zero() {
                for (axis, &i) in index.iter().enumerate() {
                    coords[axis].push(i as i64);
                }
            }
            advance(&mut index, &self.shape);
        }
        coords
            .into_iter()
            .map(|c| {
                let n = c.len();
                Tensor {
                    data: c,
                    shape: vec![n],
                    strides: vec![1],
                }
            })
            .collect()
    }
}
