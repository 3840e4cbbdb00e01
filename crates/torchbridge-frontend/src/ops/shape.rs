//! Reordering and reshaping entries: flip, roll, rot90, flatten, and
//! friends.

use torchbridge_core::error::normalize_axis;
use torchbridge_core::tensor::MeshIndexing;
use torchbridge_core::Array;

use crate::error::{Result, ensure};

fn normalize_all(dims: &[isize], ndim: usize) -> Result<Vec<usize>> {
    Ok(dims
        .iter()
        .map(|&d| normalize_axis(d, ndim))
        .collect::<torchbridge_core::Result<Vec<_>>>()?)
}

/// Reverse the order of elements along each of `dims`.
pub fn flip(input: &Array, dims: &[isize]) -> Result<Array> {
    let axes = normalize_all(dims, input.ndim())?;
    Ok(input.flip(&axes)?)
}

/// Flip the last axis of a tensor with at least two dimensions.
pub fn fliplr(input: &Array) -> Result<Array> {
    ensure(input.ndim() >= 2, "fliplr", || {
        "requires tensor to be at least 2D".into()
    })?;
    flip(input, &[-1])
}

/// Circularly shift elements.
///
/// Without `dims` the tensor is rolled as if flattened and then restored to
/// its shape; exactly one shift is accepted in that case.
pub fn roll(input: &Array, shifts: &[isize], dims: Option<&[isize]>) -> Result<Array> {
    match dims {
        None => {
            ensure(shifts.len() == 1, "roll", || {
                format!("expected one shift without dims, got {}", shifts.len())
            })?;
            let flat = input.reshape(vec![input.numel()])?;
            Ok(flat.roll(shifts, &[0])?.reshape(input.shape().to_vec())?)
        }
        Some(dims) => {
            ensure(shifts.len() == dims.len(), "roll", || {
                format!(
                    "shifts and dims must align, got {} shifts and {} dims",
                    shifts.len(),
                    dims.len()
                )
            })?;
            let axes = normalize_all(dims, input.ndim())?;
            Ok(input.roll(shifts, &axes)?)
        }
    }
}

/// Merge the axes `start_dim..=end_dim` into one. A 0-D input becomes 1-D.
pub fn flatten(input: &Array, start_dim: isize, end_dim: isize) -> Result<Array> {
    if input.ndim() == 0 {
        return Ok(input.reshape(vec![1])?);
    }
    let start = normalize_axis(start_dim, input.ndim())?;
    let end = normalize_axis(end_dim, input.ndim())?;
    ensure(start <= end, "flatten", || {
        format!("start_dim {start_dim} cannot come after end_dim {end_dim}")
    })?;
    Ok(input.flatten_range(start, end)?)
}

/// Reshape to 1-D.
pub fn ravel(input: &Array) -> Result<Array> {
    Ok(input.reshape(vec![input.numel()])?)
}

/// Rotate by 90 degrees `k` times in the plane spanned by `dims`, from the
/// first axis towards the second.
///
/// ```
/// # use torchbridge_core::{Array, tensor::Tensor};
/// # use torchbridge_frontend::ops::rot90;
/// let x = Array::from(Tensor::from_vec(vec![1, 2, 3, 4], vec![2, 2]).unwrap());
/// let r = rot90(&x, 1, &[0, 1]).unwrap();
/// assert_eq!(r.to_f64_vec(), vec![2.0, 4.0, 1.0, 3.0]);
/// ```
pub fn rot90(input: &Array, k: i64, dims: &[isize]) -> Result<Array> {
    let ndim = input.ndim();
    let rank = ndim as isize;
    ensure(ndim >= 2, "rot90", || {
        format!("expected total dims >= 2, but got total dims = {ndim}")
    })?;
    ensure(dims.len() == 2, "rot90", || {
        format!("expected total rotation dims == 2, but got dims = {}", dims.len())
    })?;
    let (d0, d1) = (dims[0], dims[1]);
    ensure(d0 != d1 && d0.abs_diff(d1) != ndim, "rot90", || {
        format!("expected rotation dims to be different, but got dim0 = {d0} and dim1 = {d1}")
    })?;
    ensure((-rank..rank).contains(&d0), "rot90", || {
        format!("Rotation dim0 out of range, dim0 = {d0}")
    })?;
    ensure((-rank..rank).contains(&d1), "rot90", || {
        format!("Rotation dim1 out of range, dim1 = {d1}")
    })?;
    let a0 = normalize_axis(d0, ndim)?;
    let a1 = normalize_axis(d1, ndim)?;

    match k.rem_euclid(4) {
        1 => Ok(input.flip(&[a1])?.swap_axes(a0, a1)?),
        2 => Ok(input.flip(&[a0, a1])?),
        3 => Ok(input.flip(&[a0])?.swap_axes(a0, a1)?),
        _ => Ok(input.clone()),
    }
}

/// Repeat counts for [`repeat_interleave`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repeats {
    /// Every element is repeated the same number of times.
    Scalar(usize),
    /// One count per index along the repeated axis.
    PerIndex(Vec<usize>),
}

impl From<usize> for Repeats {
    fn from(n: usize) -> Self {
        Self::Scalar(n)
    }
}

impl From<Vec<usize>> for Repeats {
    fn from(counts: Vec<usize>) -> Self {
        Self::PerIndex(counts)
    }
}

/// Repeat elements along `dim`, or along the flattened tensor when `dim` is
/// `None`. `output_size`, when given, must match the repeated length.
pub fn repeat_interleave(
    input: &Array,
    repeats: impl Into<Repeats>,
    dim: Option<isize>,
    output_size: Option<usize>,
) -> Result<Array> {
    let (source, axis) = match dim {
        Some(d) => (input.clone(), normalize_axis(d, input.ndim())?),
        None => (ravel(input)?, 0),
    };
    let counts = match repeats.into() {
        Repeats::Scalar(n) => vec![n],
        Repeats::PerIndex(v) => v,
    };
    let ret = source.repeat_interleave(&counts, axis)?;
    if let Some(expected) = output_size {
        let got = ret.shape()[axis];
        ensure(got == expected, "repeat_interleave", || {
            format!("output_size is {expected} but the repeated length is {got}")
        })?;
    }
    Ok(ret)
}

/// Cartesian product of 1-D tensors as rows of an `(N, len(tensors))`
/// tensor. A single input is returned unchanged.
pub fn cartesian_prod(tensors: &[&Array]) -> Result<Array> {
    ensure(!tensors.is_empty(), "cartesian_prod", || {
        "expects at least one tensor".into()
    })?;
    for t in tensors {
        ensure(t.ndim() == 1, "cartesian_prod", || {
            format!("expects 1-D tensors, got {}-D", t.ndim())
        })?;
    }
    if tensors.len() == 1 {
        return Ok(tensors[0].clone());
    }
    let n = tensors.len();
    let grids = Array::meshgrid(tensors, MeshIndexing::Ij)?;
    let refs: Vec<&Array> = grids.iter().collect();
    let stacked = Array::stack(&refs, n)?;
    let rows = stacked.numel() / n;
    Ok(stacked.reshape(vec![rows, n])?)
}

#[cfg(test)]
mod tests {
    use torchbridge_core::tensor::Tensor;
    use torchbridge_core::DType;

    use super::*;
    use crate::error::FrontendError;

    fn arange(n: usize, shape: Vec<usize>) -> Array {
        Array::from(Tensor::<i64>::arange(n).reshape(shape).unwrap())
    }

    fn values(a: &Array) -> Vec<i64> {
        a.cast::<i64>().into_vec()
    }

    #[test]
    fn test_flip_negative_dims() {
        let x = arange(6, vec![2, 3]);
        assert_eq!(values(&flip(&x, &[-1]).unwrap()), vec![2, 1, 0, 5, 4, 3]);
        assert!(flip(&x, &[2]).is_err());
    }

    #[test]
    fn test_fliplr_requires_2d() {
        let x = arange(3, vec![3]);
        let err = fliplr(&x).unwrap_err();
        assert!(matches!(err, FrontendError::Argument { op: "fliplr", .. }));
        let x = arange(4, vec![2, 2]);
        assert_eq!(values(&fliplr(&x).unwrap()), vec![1, 0, 3, 2]);
    }

    #[test]
    fn test_roll_flat_and_dims() {
        let x = arange(6, vec![2, 3]);
        let r = roll(&x, &[1], None).unwrap();
        assert_eq!(r.shape(), &[2, 3]);
        assert_eq!(values(&r), vec![5, 0, 1, 2, 3, 4]);
        let r = roll(&x, &[1], Some(&[-1])).unwrap();
        assert_eq!(values(&r), vec![2, 0, 1, 5, 3, 4]);
        assert!(roll(&x, &[1, 1], None).is_err());
        assert!(roll(&x, &[1], Some(&[0, 1])).is_err());
    }

    #[test]
    fn test_roll_extreme_shifts() {
        let x = arange(6, vec![2, 3]);
        let r = roll(&x, &[isize::MIN], None).unwrap();
        let expected = roll(&x, &[isize::MIN.rem_euclid(6)], None).unwrap();
        assert_eq!(r, expected);
        let r = roll(&x, &[isize::MAX, isize::MIN], Some(&[1, 0])).unwrap();
        let expected = roll(
            &x,
            &[isize::MAX.rem_euclid(3), isize::MIN.rem_euclid(2)],
            Some(&[1, 0]),
        )
        .unwrap();
        assert_eq!(r, expected);
    }

    #[test]
    fn test_flatten_and_ravel() {
        let x = arange(24, vec![2, 3, 4]);
        assert_eq!(flatten(&x, 0, -1).unwrap().shape(), &[24]);
        assert_eq!(flatten(&x, 1, -1).unwrap().shape(), &[2, 12]);
        assert_eq!(flatten(&x, -3, -2).unwrap().shape(), &[6, 4]);
        assert!(flatten(&x, 2, 1).is_err());
        assert_eq!(ravel(&x).unwrap().shape(), &[24]);
        let s = Array::scalar(3.0, DType::F32);
        assert_eq!(flatten(&s, 0, -1).unwrap().shape(), &[1]);
    }

    #[test]
    fn test_rot90_quarter_turns() {
        let x = arange(6, vec![2, 3]);
        // [[0,1,2],[3,4,5]] rotated counter-clockwise: [[2,5],[1,4],[0,3]]
        let r1 = rot90(&x, 1, &[0, 1]).unwrap();
        assert_eq!(r1.shape(), &[3, 2]);
        assert_eq!(values(&r1), vec![2, 5, 1, 4, 0, 3]);
        let r3 = rot90(&x, -1, &[0, 1]).unwrap();
        assert_eq!(values(&r3), vec![3, 0, 4, 1, 5, 2]);
        assert_eq!(rot90(&x, 3, &[1, 0]).unwrap(), r1);
    }

    #[test]
    fn test_rot90_periodicity() {
        let x = arange(24, vec![2, 3, 4]);
        for k in -5..6 {
            assert_eq!(
                rot90(&x, k, &[0, 2]).unwrap(),
                rot90(&x, k + 4, &[0, 2]).unwrap()
            );
        }
        assert_eq!(rot90(&x, 0, &[1, 2]).unwrap(), x);
        let twice = rot90(&rot90(&x, 2, &[1, -1]).unwrap(), 2, &[1, -1]).unwrap();
        assert_eq!(twice, x);
    }

    #[test]
    fn test_rot90_validation() {
        let x = arange(6, vec![2, 3]);
        assert!(rot90(&arange(3, vec![3]), 1, &[0, 1]).is_err());
        assert!(rot90(&x, 1, &[0]).is_err());
        assert!(rot90(&x, 1, &[1, 1]).is_err());
        assert!(rot90(&x, 1, &[-1, 1]).is_err());
        assert!(rot90(&x, 1, &[-1, 0]).is_ok());
        assert!(rot90(&x, 1, &[0, 2]).is_err());
        assert!(rot90(&x, 1, &[-3, 0]).is_err());
        let err = rot90(&x, 1, &[-2, 0]).unwrap_err();
        assert!(matches!(err, FrontendError::Argument { op: "rot90", .. }));
    }

    #[test]
    fn test_rot90_extreme_dims() {
        let x = arange(6, vec![2, 3]);
        for dims in [[isize::MIN, 0], [isize::MIN, 1], [0, isize::MAX], [isize::MAX, isize::MIN]] {
            let err = rot90(&x, 1, &dims).unwrap_err();
            assert!(matches!(err, FrontendError::Argument { op: "rot90", .. }));
        }
    }

    #[test]
    fn test_repeat_interleave() {
        let x = arange(4, vec![2, 2]);
        let flat = repeat_interleave(&x, 2, None, None).unwrap();
        assert_eq!(values(&flat), vec![0, 0, 1, 1, 2, 2, 3, 3]);
        let rows = repeat_interleave(&x, vec![1, 2], Some(0), Some(3)).unwrap();
        assert_eq!(values(&rows), vec![0, 1, 2, 3, 2, 3]);
        assert!(repeat_interleave(&x, vec![1, 2], Some(0), Some(4)).is_err());
        assert!(repeat_interleave(&x, vec![1, 2, 3], Some(1), None).is_err());
    }

    #[test]
    fn test_cartesian_prod() {
        let a = Array::from(Tensor::from_vec(vec![1_i64, 2], vec![2]).unwrap());
        let b = Array::from(Tensor::from_vec(vec![3_i64, 4, 5], vec![3]).unwrap());
        let p = cartesian_prod(&[&a, &b]).unwrap();
        assert_eq!(p.shape(), &[6, 2]);
        assert_eq!(values(&p), vec![1, 3, 1, 4, 1, 5, 2, 3, 2, 4, 2, 5]);
        assert_eq!(cartesian_prod(&[&a]).unwrap(), a);
        assert!(cartesian_prod(&[]).is_err());
        assert!(cartesian_prod(&[&arange(4, vec![2, 2]), &a]).is_err());
    }
}
