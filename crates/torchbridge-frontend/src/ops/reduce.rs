//! Scans and reductions: cumulative sums and products, `logcumsumexp`,
//! `trace`, and `renorm`.

use torchbridge_core::error::normalize_axis;
use torchbridge_core::linalg::vector_norm;
use torchbridge_core::tensor::Tensor;
use torchbridge_core::{Array, DType};

use super::write_out;
use crate::error::{Result, ensure};

/// Added to every slice norm before dividing, matching torch.
const RENORM_EPS: f64 = 1e-7;

/// The dtype a cumulative op accumulates in when none is requested: bool and
/// integer inputs widen to int64, floats keep their own width.
fn accumulate_dtype(input: DType, requested: Option<DType>) -> DType {
    requested.unwrap_or(if input.is_float() { input } else { DType::I64 })
}

/// Run an axis scan on `input`, treating a 0-D tensor as one element long.
fn scan<F>(input: &Array, dim: isize, f: F) -> Result<Array>
where
    F: FnOnce(&Array, usize) -> torchbridge_core::Result<Array>,
{
    if input.ndim() == 0 {
        normalize_axis(dim, 1)?;
        let ret = f(&input.reshape(vec![1])?, 0)?;
        return Ok(ret.reshape(Vec::new())?);
    }
    let axis = normalize_axis(dim, input.ndim())?;
    Ok(f(input, axis)?)
}

/// Cumulative sum along `dim`, optionally accumulating in `dtype`.
pub fn cumsum(
    input: &Array,
    dim: isize,
    dtype: Option<DType>,
    out: Option<&mut Array>,
) -> Result<Array> {
    let dtype = accumulate_dtype(input.dtype(), dtype);
    let ret = scan(&input.astype(dtype), dim, |x, axis| x.cumsum(axis))?;
    Ok(write_out(out, ret))
}

/// Cumulative product along `dim`, optionally accumulating in `dtype`.
pub fn cumprod(
    input: &Array,
    dim: isize,
    dtype: Option<DType>,
    out: Option<&mut Array>,
) -> Result<Array> {
    let dtype = accumulate_dtype(input.dtype(), dtype);
    let ret = scan(&input.astype(dtype), dim, |x, axis| x.cumprod(axis))?;
    Ok(write_out(out, ret))
}

/// Running `log(sum(exp(x)))` along `dim`.
///
/// The scan runs in double precision and the result is cast back to the
/// input dtype. A 0-D input is returned as is.
pub fn logcumsumexp(input: &Array, dim: isize, out: Option<&mut Array>) -> Result<Array> {
    if input.ndim() == 0 {
        return Ok(write_out(out, input.clone()));
    }
    let axis = normalize_axis(dim, input.ndim())?;
    let ret = input
        .astype(DType::F64)
        .logcumsumexp(axis)?
        .astype(input.dtype());
    Ok(write_out(out, ret))
}

/// Sum of the main diagonal of a 2-D tensor. Integer and bool inputs sum in
/// int64.
pub fn trace(input: &Array) -> Result<Array> {
    ensure(input.ndim() == 2, "trace", || {
        format!("expected a matrix, but got tensor with dim {}", input.ndim())
    })?;
    let dtype = accumulate_dtype(input.dtype(), None);
    Ok(input.astype(dtype).trace()?)
}

/// Rescale each slice along `dim` whose `p`-norm exceeds `maxnorm` so that
/// its norm becomes `maxnorm`.
///
/// Slices are the sub-tensors `input.select(dim, i)`. Norms are computed in
/// double precision; a slice is multiplied by
/// `min(maxnorm / (norm + 1e-7), 1)`, so slices already within the bound
/// pass through unchanged. Integer inputs are rescaled in double precision
/// and rounded to the nearest integer on the way back.
pub fn renorm(
    input: &Array,
    p: f64,
    dim: isize,
    maxnorm: f64,
    out: Option<&mut Array>,
) -> Result<Array> {
    ensure(!input.dtype().is_bool(), "renorm", || {
        format!("expected a numeric tensor, got {}", input.dtype())
    })?;
    ensure(p > 0.0, "renorm", || format!("non-positive norm not supported, got p = {p}"))?;
    ensure(maxnorm >= 0.0, "renorm", || {
        format!("expected maxnorm to be non-negative, got {maxnorm}")
    })?;
    ensure(input.ndim() >= 1, "renorm", || {
        "input needs at least 1 dimension".into()
    })?;
    let axis = normalize_axis(dim, input.ndim())?;

    let swapped = input.cast::<f64>().swap_axes(0, axis)?;
    let slices = swapped.shape()[0];
    if slices == 0 {
        return Ok(write_out(out, input.clone()));
    }
    let mut scaled = Vec::with_capacity(slices);
    for i in 0..slices {
        let slice = swapped.select(0, i)?;
        let norm = vector_norm(&slice, p);
        let multiplier = (maxnorm / (norm + RENORM_EPS)).min(1.0);
        tracing::trace!(slice = i, norm, multiplier, "renorm");
        scaled.push(&slice * multiplier);
    }
    let refs: Vec<&Tensor<f64>> = scaled.iter().collect();
    let mut restored = Tensor::stack(&refs, 0)?.swap_axes(0, axis)?;
    if input.dtype().is_int() {
        restored = restored.map(f64::round);
    }
    let ret = Array::from(restored).astype(input.dtype());
    Ok(write_out(out, ret))
}
