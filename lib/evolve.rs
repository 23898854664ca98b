//! Time evolution by Chebyshev-Bessel expansion of the propagator.
//!
//! With `τ = t · energy_max` and the rescaled Hamiltonian `H̃`,
//! ```text
//! U(τ) = J_0(τ) + 2 Σ_{m ≥ 1} i^m J_m(τ) T_m(H̃)
//! ```
//! [`evolve`] applies `U(τ)` ([`Direction::Forward`]) or `U(-τ)`
//! ([`Direction::Backward`]) to a state in place; [`evolvex`] computes the
//! commutator of the same propagator with the position operator by carrying
//! `[X, T_m(H̃)]|ψ>` alongside `T_m(H̃)|ψ>`. Either series is summed until
//! `|J_m(τ)|` drops below [`BESSEL_EPSILON`], which happens quickly once `m`
//! exceeds `τ`.
//!
//! See [`docs`][crate::docs] for background.

use log::debug;
use crate::{
    error::KpmError,
    hamiltonian::{ Hamiltonian, Phase },
    vector::{ KResult, State, Window },
    BESSEL_EPSILON,
    MAX_ORDERS,
};

/// Sign of the time argument of the propagator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// `+1`
    Forward,
    /// `-1`
    Backward,
}

impl Direction {
    /// `+1.0` or `-1.0`.
    pub fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }

    // phase of the order-1 term of U(±τ), i.e. ±i
    pub(crate) fn order_one_phase(self) -> Phase {
        match self {
            Self::Forward => Phase::I,
            Self::Backward => Phase::MinusI,
        }
    }
}

/// Phase with which order `m` enters the series for `U(±τ)`.
pub fn plain_phase(m: usize, direction: Direction) -> Phase {
    use Direction::*;
    match (m % 4, direction) {
        (0, _) => Phase::One,
        (2, _) => Phase::MinusOne,
        (1, Forward) | (3, Backward) => Phase::I,
        _ => Phase::MinusI,
    }
}

/// Phase with which order `m` enters the commutator series, `[X, U(τ)]` for
/// [`Direction::Forward`] and `[U(-τ), X]` for [`Direction::Backward`].
///
/// The leading term of this series is order 1, so the pattern is shifted by
/// one order relative to [`plain_phase`].
pub fn commutator_phase(m: usize, direction: Direction) -> Phase {
    use Direction::*;
    match (m % 4, direction) {
        (1, _) => Phase::I,
        (3, _) => Phase::MinusI,
        (0, Forward) | (2, Backward) => Phase::One,
        _ => Phase::MinusOne,
    }
}

// 2 J_m(τ), or `None` once the series can be truncated
fn bessel_weight(m: usize, tau: f64) -> Option<f64> {
    let j = libm::jn(m as i32, tau);
    (j.abs() >= BESSEL_EPSILON).then_some(2.0 * j)
}

/// Overwrite `state` with `U(±τ)|state>`.
///
/// Returns the number of Chebyshev orders summed. Fails with
/// [`KpmError::BadTime`] for a non-finite `tau`, and with
/// [`KpmError::SeriesUnconverged`] if the Bessel coefficients have not
/// dropped below threshold after [`MAX_ORDERS`] orders.
pub fn evolve(h: &Hamiltonian, direction: Direction, tau: f64, state: &mut State)
    -> KResult<usize>
{
    evolve_capped(h, direction, tau, state, MAX_ORDERS)
}

pub(crate) fn evolve_capped(
    h: &Hamiltonian,
    direction: Direction,
    tau: f64,
    state: &mut State,
    max_orders: usize,
) -> KResult<usize>
{
    KpmError::check_time(tau)?;
    let mut w = Window::new(state.clone());
    h.apply(&w.t0, &mut w.t1)?;
    let b0 = libm::j0(tau);
    let b1 = 2.0 * libm::j1(tau);
    h.chebyshev_01(&w.t0, &w.t1, state, b0, b1, direction)?;
    for m in 2..max_orders {
        let Some(b) = bessel_weight(m, tau) else {
            debug!("evolve: tau = {tau}, truncated after {m} orders");
            return Ok(m);
        };
        h.chebyshev_2(&w.t0, &w.t1, &mut w.t2, state, b, plain_phase(m, direction))?;
        w.shift();
    }
    Err(KpmError::SeriesUnconverged { tau, orders: max_orders })
}

/// Write `[X, U(τ)]|input>` ([`Direction::Forward`]) or
/// `[U(-τ), X]|input>` ([`Direction::Backward`]) into `out`.
///
/// Returns the number of Chebyshev orders summed; fails under the same
/// conditions as [`evolve`].
pub fn evolvex(
    h: &Hamiltonian,
    direction: Direction,
    tau: f64,
    input: &State,
    out: &mut State,
) -> KResult<usize>
{
    evolvex_capped(h, direction, tau, input, out, MAX_ORDERS)
}

pub(crate) fn evolvex_capped(
    h: &Hamiltonian,
    direction: Direction,
    tau: f64,
    input: &State,
    out: &mut State,
    max_orders: usize,
) -> KResult<usize>
{
    KpmError::check_time(tau)?;
    let n = input.len();
    // T_m(H̃)|ψ>
    let mut w = Window::new(input.clone());
    // [X, T_m(H̃)]|ψ>; zero at order 0
    let mut wx = Window::zeros(n);
    h.apply(input, &mut w.t1)?;
    h.apply_commutator(input, &mut wx.t1)?;
    h.chebyshev_1x(&wx.t1, out, 2.0 * libm::j1(tau))?;
    for m in 2..max_orders {
        let Some(b) = bessel_weight(m, tau) else {
            debug!("evolvex: tau = {tau}, truncated after {m} orders");
            return Ok(m);
        };
        h.chebyshev_2x(
            &w.t0, &wx.t0,
            &w.t1, &wx.t1,
            &mut w.t2, &mut wx.t2,
            out, b, commutator_phase(m, direction),
        )?;
        w.shift();
        wx.shift();
    }
    Err(KpmError::SeriesUnconverged { tau, orders: max_orders })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray as nd;
    use num_complex::Complex64 as C64;

    const N: usize = 12;
    const EMAX: f64 = 2.5;

    // open chain at x_i = i with a weak potential and complex hopping
    fn chain() -> Hamiltonian {
        let neighbors: Vec<Vec<usize>>
            = (0..N).map(|i| {
                let mut nb = Vec::new();
                if i > 0 { nb.push(i - 1); }
                if i + 1 < N { nb.push(i + 1); }
                nb
            })
            .collect();
        let t = C64::from_polar(1.0, 0.3);
        let (hopping, xx): (Vec<C64>, Vec<f64>)
            = neighbors.iter().enumerate()
            .flat_map(|(i, nb)| {
                nb.iter().map(move |&j| {
                    let tij = if j > i { t } else { t.conj() };
                    (-tij, j as f64 - i as f64)
                })
            })
            .unzip();
        let potential: Vec<f64>
            = (0..N).map(|i| 0.2 * ((i as f64) * 1.7).sin()).collect();
        Hamiltonian::new(&neighbors, &hopping, &xx, &potential, EMAX).unwrap()
    }

    fn packet() -> State {
        let psi: nd::Array1<C64>
            = (0..N).map(|k| {
                let x = k as f64 - 5.0;
                C64::from_polar((-x * x / 4.0).exp(), 0.8 * x)
            })
            .collect();
        psi.into()
    }

    fn position(psi: &State) -> State {
        let mut out = psi.clone();
        out.as_array_mut().indexed_iter_mut()
            .for_each(|(i, z)| { *z *= i as f64; });
        out
    }

    fn distance(a: &State, b: &State) -> f64 {
        a.as_array().iter().zip(b.as_array())
            .map(|(x, y)| (x - y).norm_sqr())
            .sum::<f64>()
            .sqrt()
    }

    #[test]
    fn phase_tables() {
        use Direction::*;
        use Phase::*;
        let plain_fwd: Vec<Phase> = (0..8).map(|m| plain_phase(m, Forward)).collect();
        let plain_bwd: Vec<Phase> = (0..8).map(|m| plain_phase(m, Backward)).collect();
        assert_eq!(plain_fwd, vec![One, I, MinusOne, MinusI, One, I, MinusOne, MinusI]);
        assert_eq!(plain_bwd, vec![One, MinusI, MinusOne, I, One, MinusI, MinusOne, I]);
        let comm_fwd: Vec<Phase> = (0..4).map(|m| commutator_phase(m, Forward)).collect();
        let comm_bwd: Vec<Phase> = (0..4).map(|m| commutator_phase(m, Backward)).collect();
        assert_eq!(comm_fwd, vec![One, I, MinusOne, MinusI]);
        assert_eq!(comm_bwd, vec![MinusOne, I, One, MinusI]);
        assert_eq!(Forward.order_one_phase(), plain_phase(1, Forward));
        assert_eq!(Backward.order_one_phase(), plain_phase(1, Backward));
    }

    #[test]
    fn zero_time_is_identity() {
        let h = chain();
        let psi0 = packet();
        let mut psi = psi0.clone();
        let orders = evolve(&h, Direction::Forward, 0.0, &mut psi).unwrap();
        assert_eq!(orders, 2);
        assert!(distance(&psi, &psi0) < 1e-15);

        let mut out = State::zeros(N);
        evolvex(&h, Direction::Forward, 0.0, &psi0, &mut out).unwrap();
        assert!(out.norm_sqr() < 1e-28);
    }

    #[test]
    fn norm_is_preserved() {
        let h = chain();
        let psi0 = packet();
        for &tau in [0.3, 2.0, 7.5, 20.0].iter() {
            for direction in [Direction::Forward, Direction::Backward] {
                let mut psi = psi0.clone();
                evolve(&h, direction, tau, &mut psi).unwrap();
                assert!(
                    (psi.norm_sqr() - psi0.norm_sqr()).abs() < 1e-12,
                    "tau = {tau}: {} vs {}", psi.norm_sqr(), psi0.norm_sqr(),
                );
            }
        }
    }

    #[test]
    fn forward_then_backward_round_trips() {
        let h = chain();
        let psi0 = packet();
        let mut psi = psi0.clone();
        evolve(&h, Direction::Forward, 6.0, &mut psi).unwrap();
        assert!(distance(&psi, &psi0) > 1e-2);
        evolve(&h, Direction::Backward, 6.0, &mut psi).unwrap();
        assert!(distance(&psi, &psi0) < 1e-12);
    }

    #[test]
    fn steps_compose() {
        let h = chain();
        let mut once = packet();
        evolve(&h, Direction::Forward, 3.0, &mut once).unwrap();
        let mut twice = packet();
        evolve(&h, Direction::Forward, 1.2, &mut twice).unwrap();
        evolve(&h, Direction::Forward, 1.8, &mut twice).unwrap();
        assert!(distance(&once, &twice) < 1e-12);
    }

    #[test]
    fn single_site_phase() {
        // H̃ = e on one site: U(τ) = exp(i e τ)
        let e = 0.4;
        let h = Hamiltonian::new(&[vec![]], &[], &[], &[e], 1.0).unwrap();
        let mut psi = State::from_array(nd::array![C64::new(1.0, 0.0)]);
        evolve(&h, Direction::Forward, 2.0, &mut psi).unwrap();
        assert!((psi.as_array()[0] - C64::cis(e * 2.0)).norm() < 1e-13);
        evolve(&h, Direction::Backward, 5.0, &mut psi).unwrap();
        assert!((psi.as_array()[0] - C64::cis(-e * 3.0)).norm() < 1e-13);
    }

    #[test]
    fn commutator_matches_explicit() {
        let h = chain();
        let psi0 = packet();
        let tau = 4.0;
        for direction in [Direction::Forward, Direction::Backward] {
            // X U ψ - U X ψ
            let mut u_psi = psi0.clone();
            evolve(&h, direction, tau, &mut u_psi).unwrap();
            let x_u_psi = position(&u_psi);
            let mut u_x_psi = position(&psi0);
            evolve(&h, direction, tau, &mut u_x_psi).unwrap();
            let xu: nd::Array1<C64> = x_u_psi.as_array() - u_x_psi.as_array();
            let expected = match direction {
                Direction::Forward => xu,
                Direction::Backward => -xu,
            };
            let mut out = State::zeros(N);
            evolvex(&h, direction, tau, &psi0, &mut out).unwrap();
            let err = distance(&out, &State::from_array(expected));
            assert!(err < 1e-11, "{direction:?}: error {err}");
        }
    }

    #[test]
    fn nonfinite_time_is_rejected() {
        let h = chain();
        let psi0 = packet();
        for tau in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut psi = psi0.clone();
            assert!(matches!(
                evolve(&h, Direction::Backward, tau, &mut psi),
                Err(KpmError::BadTime(_)),
            ));
            assert_eq!(psi, psi0);
            let mut out = State::zeros(N);
            assert!(matches!(
                evolvex(&h, Direction::Forward, tau, &psi0, &mut out),
                Err(KpmError::BadTime(_)),
            ));
        }
    }

    #[test]
    fn cap_is_reported() {
        let h = chain();
        let mut psi = packet();
        let res = evolve_capped(&h, Direction::Forward, 50.0, &mut psi, 10);
        assert!(matches!(
            res,
            Err(KpmError::SeriesUnconverged { orders: 10, .. }),
        ));
        let mut out = State::zeros(N);
        let res = evolvex_capped(&h, Direction::Backward, 50.0, &packet(), &mut out, 10);
        assert!(res.is_err());
    }
}
