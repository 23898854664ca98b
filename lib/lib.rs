//! Provides the numerical core of linear-scaling quantum transport for
//! tight-binding lattices: stochastic-trace Chebyshev expansion (the kernel
//! polynomial method[^1]) of spectral quantities, combined with a
//! Chebyshev-Bessel expansion of the time-evolution operator[^2].
//!
//! Provides implementations for the following:
//! - Chebyshev moments by three-term recursion ([`moments`])
//! - Jackson-kernel damping ([`damping`])
//! - Chebyshev summation on an energy grid ([`summation`])
//! - Time evolution, plain and commutator-coupled ([`evolve`])
//! - Observables: density of states, velocity autocorrelation, and
//!   mean-square displacement ([`observables`])
//!
//! See [`docs`] for theoretical background.
//!
//! [^1]: A. Weiße, G. Wellein, A. Alvermann, and H. Fehske, "The kernel
//! polynomial method." Rev. Mod. Phys. **78**, 275 (2006).
//!
//! [^2]: Z. Fan, A. Uppstu, T. Siro, and A. Harju, "Efficient linear-scaling
//! quantum transport calculations on graphics processing units and
//! applications on electron transport in graphene." Comput. Phys. Commun.
//! **185**, 28 (2014).

pub mod error;
pub mod vector;
pub mod hamiltonian;
pub mod model;
pub mod moments;
pub mod damping;
pub mod summation;
pub mod evolve;
pub mod observables;
pub mod output;

pub mod docs;

/// Number of lattice sites per block in the two-phase inner-product reduction.
pub const BLOCK_SIZE: usize = 512;

/// The evolution series is truncated at the first order `m` with
/// `|J_m(τ)| < BESSEL_EPSILON`.
pub const BESSEL_EPSILON: f64 = 1e-15;

/// Hard cap on the number of orders in the evolution series.
pub const MAX_ORDERS: usize = 1_000_000;

pub type Arr1<S> = ndarray::ArrayBase<S, ndarray::Ix1>;
pub type Arr2<S> = ndarray::ArrayBase<S, ndarray::Ix2>;
