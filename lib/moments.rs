//! Chebyshev moments `μ_m = <left| T_m(H̃) |right>` by the three-term
//! recursion.

use log::debug;
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    error::{ KpmError, LengthError },
    hamiltonian::Hamiltonian,
    vector::{ KResult, Partials, State, Window },
};

/// Compute the first `number_of_moments` Chebyshev moments between `left`
/// and `right`.
///
/// Order `m` is reached from orders `m - 1` and `m - 2` with one application
/// of the Hamiltonian; each order is reduced against `left` into its own row of
/// partial sums, and all rows are collapsed together at the end.
pub fn find_moments_chebyshev(
    h: &Hamiltonian,
    number_of_moments: usize,
    left: &State,
    right: &State,
) -> KResult<nd::Array1<C64>>
{
    KpmError::check_moments(number_of_moments)?;
    LengthError::check(left.as_array(), right.as_array())?;
    let mut partials = Partials::new(number_of_moments, right.len());
    let mut w = Window::new(right.clone());

    // <left|right>
    w.t0.inner_product_1(left, &mut partials, 0)?;
    if number_of_moments > 1 {
        // <left|H|right>
        h.apply(&w.t0, &mut w.t1)?;
        w.t1.inner_product_1(left, &mut partials, 1)?;
    }
    for m in 2..number_of_moments {
        h.kernel_polynomial(&w.t0, &w.t1, &mut w.t2)?;
        w.t2.inner_product_1(left, &mut partials, m)?;
        w.shift();
    }
    debug!("computed {} chebyshev moments", number_of_moments);
    Ok(partials.inner_product_2())
}
