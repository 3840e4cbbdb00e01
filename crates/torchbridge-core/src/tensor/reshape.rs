//! Shape manipulation: reshape, permute, flip, roll, pad, repeat,
//! concatenate, and stack.

use crate::Element;
use crate::error::{CoreError, Result};

use super::{Tensor, advance, compute_strides};

impl<T: Element> Tensor<T> {
    /// Reshape the tensor to a new shape without copying data.
    ///
    /// The total number of elements must remain the same.
    pub fn reshape(mut self, new_shape: Vec<usize>) -> Result<Self> {
        let new_numel: usize = new_shape.iter().product();
        if new_numel != self.numel() {
            return Err(CoreError::InvalidShape {
                shape: new_shape,
                reason: "new shape has different number of elements",
            });
        }
        self.strides = compute_strides(&new_shape);
        self.shape = new_shape;
        Ok(self)
    }

    /// Return a reshaped copy without consuming the tensor.
    pub fn reshaped(&self, new_shape: Vec<usize>) -> Result<Self> {
        self.clone().reshape(new_shape)
    }

    /// Merge axes `start..=end` into a single axis.
    ///
    /// A 0-D tensor flattens to shape `[1]`.
    pub fn flatten_range(&self, start: usize, end: usize) -> Result<Self> {
        if self.ndim() == 0 {
            return self.reshaped(vec![1]);
        }
        if start >= self.ndim() {
            return Err(CoreError::axis_out_of_bounds(start, self.ndim()));
        }
        if end >= self.ndim() {
            return Err(CoreError::axis_out_of_bounds(end, self.ndim()));
        }
        if start > end {
            return Err(CoreError::invalid_argument(
                "flatten start axis must not come after end axis",
            ));
        }
        let merged: usize = self.shape[start..=end].iter().product();
        let mut new_shape = self.shape[..start].to_vec();
        new_shape.push(merged);
        new_shape.extend_from_slice(&self.shape[end + 1..]);
        self.reshaped(new_shape)
    }

    /// Permute the dimensions of the tensor according to the given axes.
    ///
    /// `axes` must be a permutation of `0..ndim`.
    pub fn permute(&self, axes: &[usize]) -> Result<Self> {
        if axes.len() != self.ndim() {
            return Err(CoreError::invalid_argument(
                "axes length must match tensor rank",
            ));
        }

        let mut seen = vec![false; self.ndim()];
        for &a in axes {
            if a >= self.ndim() {
                return Err(CoreError::axis_out_of_bounds(a, self.ndim()));
            }
            if seen[a] {
                return Err(CoreError::invalid_argument(
                    "duplicate axis in permutation",
                ));
            }
            seen[a] = true;
        }

        let new_shape: Vec<usize> = axes.iter().map(|&a| self.shape[a]).collect();
        let new_strides = compute_strides(&new_shape);
        let new_numel: usize = new_shape.iter().product();
        let mut data = Vec::with_capacity(new_numel);

        // Walk the output in order and gather from the input
        let mut out_index = vec![0usize; self.ndim()];
        for _ in 0..new_numel {
            let flat_in: usize = axes
                .iter()
                .enumerate()
                .map(|(out_ax, &in_ax)| out_index[out_ax] * self.strides[in_ax])
                .sum();
            data.push(self.data[flat_in]);
            advance(&mut out_index, &new_shape);
        }

        Ok(Tensor {
            data,
            shape: new_shape,
            strides: new_strides,
        })
    }

    /// Exchange two axes, leaving every other axis in place.
    pub fn swap_axes(&self, a: usize, b: usize) -> Result<Self> {
        let ndim = self.ndim();
        if a >= ndim {
            return Err(CoreError::axis_out_of_bounds(a, ndim));
        }
        if b >= ndim {
            return Err(CoreError::axis_out_of_bounds(b, ndim));
        }
        let mut axes: Vec<usize> = (0..ndim).collect();
        axes.swap(a, b);
        self.permute(&axes)
    }

    /// Insert a dimension of size 1 at the given axis.
    pub fn unsqueeze(mut self, axis: usize) -> Result<Self> {
        if axis > self.ndim() {
            return Err(CoreError::axis_out_of_bounds(axis, self.ndim()));
        }
        self.shape.insert(axis, 1);
        self.strides = compute_strides(&self.shape);
        Ok(self)
    }

    /// Insert size-1 dimensions so that each of `axes` is a singleton in
    /// the result. Axes refer to positions in the *output* shape.
    pub fn expand_dims(&self, axes: &[usize]) -> Result<Self> {
        let out_ndim = self.ndim() + axes.len();
        let mut sorted = axes.to_vec();
        sorted.sort_unstable();
        for w in sorted.windows(2) {
            if w[0] == w[1] {
                return Err(CoreError::invalid_argument("repeated axis in expand_dims"));
            }
        }
        let mut out = self.clone();
        for &axis in &sorted {
            if axis >= out_ndim {
                return Err(CoreError::axis_out_of_bounds(axis, out_ndim));
            }
            out = out.unsqueeze(axis)?;
        }
        Ok(out)
    }

    /// Reverse the order of elements along every axis in `axes`.
    pub fn flip(&self, axes: &[usize]) -> Result<Self> {
        let ndim = self.ndim();
        let mut flipped = vec![false; ndim];
        for &a in axes {
            if a >= ndim {
                return Err(CoreError::axis_out_of_bounds(a, ndim));
            }
            if flipped[a] {
                return Err(CoreError::invalid_argument("repeated axis in flip"));
            }
            flipped[a] = true;
        }
        let shape = &self.shape;
        Ok(Tensor::from_fn(shape.clone(), |ix| {
            let flat: usize = (0..ndim)
                .map(|d| {
                    let i = if flipped[d] { shape[d] - 1 - ix[d] } else { ix[d] };
                    i * self.strides[d]
                })
                .sum();
            self.data[flat]
        }))
    }

    /// Circularly shift elements along each axis by the paired amount.
    ///
    /// Positive shifts move elements towards higher indices.
    pub fn roll(&self, shifts: &[isize], axes: &[usize]) -> Result<Self> {
        if shifts.len() != axes.len() {
            return Err(CoreError::invalid_argument(format!(
                "roll expects one shift per axis, got {} shifts and {} axes",
                shifts.len(),
                axes.len()
            )));
        }
        let ndim = self.ndim();
        let mut offset = vec![0isize; ndim];
        for (&s, &a) in shifts.iter().zip(axes) {
            if a >= ndim {
                return Err(CoreError::axis_out_of_bounds(a, ndim));
            }
            // Offsets stay reduced to `0..len` so they never overflow.
            let len = self.shape[a].max(1) as isize;
            offset[a] = (offset[a] + s.rem_euclid(len)) % len;
        }
        let shape = &self.shape;
        Ok(Tensor::from_fn(shape.clone(), |ix| {
            let flat: usize = (0..ndim)
                .map(|d| {
                    let len = shape[d].max(1) as isize;
                    let src = (ix[d] as isize - offset[d]).rem_euclid(len);
                    src as usize * self.strides[d]
                })
                .sum();
            self.data[flat]
        }))
    }

    /// Pad every axis with `value`; `pad_width[d] = (before, after)`.
    pub fn pad(&self, pad_width: &[(usize, usize)], value: T) -> Result<Self> {
        if pad_width.len() != self.ndim() {
            return Err(CoreError::invalid_argument(format!(
                "pad width has {} entries for a {}-D tensor",
                pad_width.len(),
                self.ndim()
            )));
        }
        let new_shape: Vec<usize> = self
            .shape
            .iter()
            .zip(pad_width)
            .map(|(&n, &(lo, hi))| n + lo + hi)
            .collect();
        Ok(Tensor::from_fn(new_shape, |ix| {
            let mut flat = 0;
            for (d, &(lo, _)) in pad_width.iter().enumerate() {
                if ix[d] < lo || ix[d] - lo >= self.shape[d] {
                    return value;
                }
                flat += (ix[d] - lo) * self.strides[d];
            }
            self.data[flat]
        }))
    }

    /// Repeat each slice along `axis` by the matching count in `repeats`.
    ///
    /// `repeats` has either one entry (applied to every index) or exactly
    /// `shape[axis]` entries.
    pub fn repeat_interleave(&self, repeats: &[usize], axis: usize) -> Result<Self> {
        if axis >= self.ndim() {
            return Err(CoreError::axis_out_of_bounds(axis, self.ndim()));
        }
        let axis_len = self.shape[axis];
        let counts: Vec<usize> = match repeats.len() {
            1 => vec![repeats[0]; axis_len],
            n if n == axis_len => repeats.to_vec(),
            n => {
                return Err(CoreError::invalid_argument(format!(
                    "repeats has {n} entries but axis {axis} has length {axis_len}"
                )));
            }
        };
        let outer: usize = self.shape[..axis].iter().product();
        let inner: usize = self.shape[axis + 1..].iter().product();
        let total: usize = counts.iter().sum();

        let mut data = Vec::with_capacity(outer * total * inner);
        for o in 0..outer {
            for (k, &count) in counts.iter().enumerate() {
                let start = (o * axis_len + k) * inner;
                for _ in 0..count {
                    data.extend_from_slice(&self.data[start..start + inner]);
                }
            }
        }
        let mut new_shape = self.shape.clone();
        new_shape[axis] = total;
        Tensor::from_vec(data, new_shape)
    }

    /// Concatenate a list of tensors along the given axis.
    ///
    /// All tensors must have the same shape except along the concatenation axis.
    pub fn concat(tensors: &[&Tensor<T>], axis: usize) -> Result<Self> {
        if tensors.is_empty() {
            return Err(CoreError::invalid_argument(
                "cannot concatenate zero tensors",
            ));
        }

        let ndim = tensors[0].ndim();
        if axis >= ndim {
            return Err(CoreError::axis_out_of_bounds(axis, ndim));
        }

        for t in &tensors[1..] {
            let compatible = t.ndim() == ndim
                && tensors[0]
                    .shape
                    .iter()
                    .zip(t.shape.iter())
                    .enumerate()
                    .all(|(d, (&a, &b))| d == axis || a == b);
            if !compatible {
                return Err(CoreError::DimensionMismatch {
                    expected: tensors[0].shape.clone(),
                    got: t.shape.clone(),
                });
            }
        }

        let mut new_shape = tensors[0].shape.clone();
        new_shape[axis] = tensors.iter().map(|t| t.shape[axis]).sum();

        let outer: usize = new_shape[..axis].iter().product();
        let inner: usize = new_shape[axis + 1..].iter().product();
        let total: usize = new_shape.iter().product();

        let mut data = Vec::with_capacity(total);

        for o in 0..outer {
            for t in tensors {
                let axis_len = t.shape[axis];
                let src_start = o * axis_len * inner;
                let src_end = src_start + axis_len * inner;
                data.extend_from_slice(&t.data[src_start..src_end]);
            }
        }

        Tensor::from_vec(data, new_shape)
    }

    /// Stack tensors along a new axis inserted at position `axis`.
    ///
    /// All tensors must have identical shapes.
    pub fn stack(tensors: &[&Tensor<T>], axis: usize) -> Result<Self> {
        if tensors.is_empty() {
            return Err(CoreError::invalid_argument("cannot stack zero tensors"));
        }

        let base_shape = &tensors[0].shape;
        if axis > base_shape.len() {
            return Err(CoreError::axis_out_of_bounds(axis, base_shape.len() + 1));
        }

        for t in &tensors[1..] {
            if t.shape != *base_shape {
                return Err(CoreError::DimensionMismatch {
                    expected: base_shape.clone(),
                    got: t.shape.clone(),
                });
            }
        }

        let expanded = tensors
            .iter()
            .map(|t| (*t).clone().unsqueeze(axis))
            .collect::<Result<Vec<_>>>()?;
        let refs: Vec<&Tensor<T>> = expanded.iter().collect();
        Tensor::concat(&refs, axis)
    }
}
