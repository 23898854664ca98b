//! Reconstruction of a spectral function from damped Chebyshev moments.

use std::f64::consts::PI;
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::Arr1;

// μ_0 + 2 Σ_{m ≥ 1} μ_m T_m(x), with T_m generated on the fly
fn chebyshev_series<S>(moments: &Arr1<S>, x: f64) -> f64
where S: nd::Data<Elem = C64>
{
    let number_of_moments = moments.len();
    if number_of_moments == 0 { return 0.0; }
    let mut sum: f64 = 0.0;
    let mut t0: f64 = 1.0;
    let mut t1: f64 = x;
    let mut t2: f64;
    if number_of_moments > 1 { sum += moments[1].re * t1; }
    for mu in moments.iter().skip(2) {
        t2 = 2.0 * x * t1 - t0;
        sum += mu.re * t2;
        t0 = t1;
        t1 = t2;
    }
    moments[0].re + 2.0 * sum
}

/// Evaluate the correlation function on an energy grid:
/// ```text
///           2    μ_0 + 2 Σ_{m=1}^{M-1} μ_m T_m(x)
/// f(E) = ----- · --------------------------------,   x = E / energy_max
///        π V       √(1 - x²) energy_max
/// ```
///
/// Only the real parts of the moments contribute. Every grid point must lie
/// strictly inside `(-energy_max, energy_max)`; this is not checked here.
pub fn chebyshev_summation<S, T>(
    moments: &Arr1<S>,
    energy: &Arr1<T>,
    energy_max: f64,
    volume: f64,
) -> nd::Array1<f64>
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = f64>,
{
    let prefactor = 2.0 / (PI * volume);
    energy.mapv(|e| {
        let x = e / energy_max;
        prefactor * chebyshev_series(moments, x)
            / ((1.0 - x * x).sqrt() * energy_max)
    })
}
