//! Inclusive scans along an axis: cumulative sum, product, and
//! log-sum-exp.

use crate::error::{CoreError, Result};
use crate::{Float, Scalar};

use super::Tensor;

impl<T: Scalar> Tensor<T> {
    /// Run `step(acc, x)` along `axis`, writing every intermediate
    /// accumulator. The first element of each lane seeds the accumulator.
    fn scan_axis<F>(&self, axis: usize, step: F) -> Result<Tensor<T>>
    where
        F: Fn(T, T) -> T,
    {
        if axis >= self.ndim() {
            return Err(CoreError::axis_out_of_bounds(axis, self.ndim()));
        }
        let outer: usize = self.shape[..axis].iter().product();
        let axis_len = self.shape[axis];
        let inner: usize = self.shape[axis + 1..].iter().product();

        let mut out = self.data.clone();
        for o in 0..outer {
            for i in 0..inner {
                let base = o * axis_len * inner + i;
                for k in 1..axis_len {
                    let prev = out[base + (k - 1) * inner];
                    let cur = &mut out[base + k * inner];
                    *cur = step(prev, *cur);
                }
            }
        }
        Tensor::from_vec(out, self.shape.clone())
    }

    /// Inclusive prefix sum along `axis`.
    ///
    /// ```
    /// # use torchbridge_core::tensor::Tensor;
    /// let t = Tensor::from_vec(vec![1, 2, 3, 4], vec![2, 2]).unwrap();
    /// assert_eq!(t.cumsum_axis(0).unwrap().as_slice(), &[1, 2, 4, 6]);
    /// assert_eq!(t.cumsum_axis(1).unwrap().as_slice(), &[1, 3, 3, 7]);
    /// ```
    pub fn cumsum_axis(&self, axis: usize) -> Result<Tensor<T>> {
        self.scan_axis(axis, |acc, x| acc + x)
    }

    /// Inclusive prefix product along `axis`.
    pub fn cumprod_axis(&self, axis: usize) -> Result<Tensor<T>> {
        self.scan_axis(axis, |acc, x| acc * x)
    }
}

impl<T: Float> Tensor<T> {
    /// Running `log(cumsum(exp(x)))` along `axis`.
    ///
    /// Uses the `logaddexp` recurrence, so inputs whose exponentials would
    /// overflow still produce finite results.
    pub fn logcumsumexp_axis(&self, axis: usize) -> Result<Tensor<T>> {
        self.scan_axis(axis, log_add_exp)
    }
}

/// `log(exp(a) + exp(b))` without forming either exponential.
fn log_add_exp<T: Float>(a: T, b: T) -> T {
    if a.is_nan() || b.is_nan() {
        return T::nan();
    }
    let hi = a.max(b);
    let lo = a.min(b);
    // Both infinite with the same sign, or the larger is +inf / the smaller -inf.
    if !hi.is_finite() || lo == T::neg_infinity() {
        return hi;
    }
    hi + (lo - hi).exp().ln_1p()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_cumsum_3d_middle_axis() {
        let t = Tensor::<i64>::arange(12).reshape(vec![2, 3, 2]).unwrap();
        let c = t.cumsum_axis(1).unwrap();
        assert_eq!(c.as_slice(), &[0, 1, 2, 4, 6, 9, 6, 7, 14, 16, 24, 27]);
    }

    #[test]
    fn test_cumprod() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], vec![4]).unwrap();
        assert_eq!(t.cumprod_axis(0).unwrap().as_slice(), &[1.0, 2.0, 6.0, 24.0]);
    }

    #[test]
    fn test_scan_axis_oob() {
        let t = Tensor::from_vec(vec![1, 2], vec![2]).unwrap();
        assert!(t.cumsum_axis(1).is_err());
    }

    #[test]
    fn test_logcumsumexp_matches_direct() {
        let xs = [0.5_f64, -1.0, 2.0, 0.0];
        let t = Tensor::from_vec(xs.to_vec(), vec![4]).unwrap();
        let got = t.logcumsumexp_axis(0).unwrap();
        let mut acc = 0.0;
        for (i, &x) in xs.iter().enumerate() {
            acc += x.exp();
            assert_abs_diff_eq!(got.as_slice()[i], acc.ln(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_logcumsumexp_large_inputs_stay_finite() {
        let t = Tensor::from_vec(vec![1000.0_f64, 1000.0], vec![2]).unwrap();
        let got = t.logcumsumexp_axis(0).unwrap();
        assert_abs_diff_eq!(got.as_slice()[0], 1000.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            got.as_slice()[1],
            1000.0 + std::f64::consts::LN_2,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_log_add_exp_infinities() {
        assert_eq!(log_add_exp(f64::NEG_INFINITY, 1.0), 1.0);
        assert_eq!(log_add_exp(f64::NEG_INFINITY, f64::NEG_INFINITY), f64::NEG_INFINITY);
        assert_eq!(log_add_exp(f64::INFINITY, 3.0), f64::INFINITY);
        assert!(log_add_exp(f64::NAN, 0.0).is_nan());
    }
}
