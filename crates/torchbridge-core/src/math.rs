//! Integer number theory over tensors.

use crate::Integer;
use crate::error::Result;
use crate::tensor::Tensor;

impl<T: Integer> Tensor<T> {
    /// Element-wise least common multiple with broadcasting.
    ///
    /// `lcm(0, x) == 0`. Results that do not fit `T` wrap around in two's
    /// complement like native integer arithmetic, so only those can be
    /// negative.
    ///
    /// ```
    /// # use torchbridge_core::tensor::Tensor;
    /// let a = Tensor::from_vec(vec![4_i32, -6, 0], vec![3]).unwrap();
    /// let b = Tensor::from_vec(vec![6_i32, 4, 5], vec![3]).unwrap();
    /// assert_eq!(a.lcm(&b).unwrap().as_slice(), &[12, 12, 0]);
    /// ```
    pub fn lcm(&self, other: &Tensor<T>) -> Result<Tensor<T>> {
        self.zip_map_broadcast(other, |a, b| wrap_abs::<T>(lcm_i128(a.to_i128(), b.to_i128())))
    }
}

/// Narrow to `T` by truncation, then take the absolute value in `T`.
fn wrap_abs<T: Integer>(v: i128) -> T {
    let narrowed = T::from_i128(v).to_i128();
    T::from_i128(if narrowed < 0 { narrowed.wrapping_neg() } else { narrowed })
}

fn gcd_i128(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm_i128(a: i128, b: i128) -> i128 {
    if a == 0 || b == 0 {
        return 0;
    }
    // Operands come from at most 64-bit types, so the low 64 bits of the
    // wrapped product are exact.
    (a.abs() / gcd_i128(a, b)).wrapping_mul(b.abs())
}
