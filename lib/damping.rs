//! Jackson-kernel damping of Chebyshev moments.

use std::f64::consts::PI;
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::Arr1;

/// Jackson-kernel factor for moment `k` of a series truncated at
/// `number_of_moments` terms:
/// ```text
/// g_k = (1 - k / (M + 1)) cos(k π / (M + 1))
///     + sin(k π / (M + 1)) cot(π / (M + 1)) / (M + 1)
/// ```
pub fn jackson_factor(k: usize, number_of_moments: usize) -> f64 {
    let a = (number_of_moments + 1) as f64;
    let theta = PI * k as f64 / a;
    (1.0 - k as f64 / a) * theta.cos() + theta.sin() * (PI / a).tan().recip() / a
}

/// Multiply each moment in place by its Jackson-kernel factor.
///
/// The truncation order is taken to be the length of `moments`; real and
/// imaginary parts are damped identically.
pub fn apply_damping<S>(moments: &mut Arr1<S>)
where S: nd::DataMut<Elem = C64>
{
    let number_of_moments = moments.len();
    moments.indexed_iter_mut()
        .for_each(|(k, mu)| { *mu *= jackson_factor(k, number_of_moments); });
}
