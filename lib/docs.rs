//! Theoretical background.
//!
//! # Contents
//! - [Background](#background)
//! - [Moments](#moments)
//! - [Damping and summation](#damping-and-summation)
//! - [Time evolution](#time-evolution)
//! - [Observables](#observables)
//!
//! # Background
//! Transport in a disordered tight-binding system of *N* sites is governed by
//! spectral quantities of the form
//! ```text
//! Tr[ δ(E - H) A ]
//! ```
//! for some operator *A*. For large *N* neither the trace nor the δ-function
//! can be evaluated exactly. Instead, the trace is replaced by an expectation
//! over a random-phase vector |φ⟩ (with φ_k = exp(iθ_k), θ_k uniform), whose
//! error falls off as 1/√*N*, and δ(E - H) is expanded in Chebyshev
//! polynomials *T*_m. Both steps need only sparse matrix-vector products, so
//! the cost is linear in *N*.
//!
//! Chebyshev polynomials live on [-1, 1], so the Hamiltonian is first
//! rescaled,
//! ```text
//! H̃ = H / E_max
//! ```
//! with *E*_max chosen larger than the spectral radius of *H*. Energies are
//! rescaled the same way, *x* = *E* / *E*_max.
//!
//! # Moments
//! The moments between two states are
//! ```text
//! μ_m = ⟨L| T_m(H̃) |R⟩
//! ```
//! and follow from the recursion
//! ```text
//! T_0(H̃)|R⟩ = |R⟩
//! T_1(H̃)|R⟩ = H̃|R⟩
//! T_m(H̃)|R⟩ = 2 H̃ T_{m-1}(H̃)|R⟩ - T_{m-2}(H̃)|R⟩
//! ```
//! which only ever needs the two previous orders.
//!
//! # Damping and summation
//! Truncating the expansion at *M* terms produces Gibbs oscillations; these are
//! suppressed by multiplying each moment by the Jackson kernel
//! ```text
//!       (M + 1 - m) cos(π m / (M + 1)) + sin(π m / (M + 1)) cot(π / (M + 1))
//! g_m = ---------------------------------------------------------------------
//!                                      M + 1
//! ```
//! after which the correlation function at energy *E* is
//! ```text
//!           2     μ_0 g_0 + 2 Σ_{m ≥ 1} μ_m g_m T_m(x)
//! C(E) = ----- · -------------------------------------
//!        π Ω         √(1 - x²) E_max
//! ```
//! for system volume Ω. The factor 2 counts spin.
//!
//! # Time evolution
//! The generating function of the Bessel functions *J*_m gives
//! ```text
//! exp(i τ x) = J_0(τ) + 2 Σ_{m ≥ 1} i^m J_m(τ) T_m(x)
//! ```
//! so that, with τ = *t* *E*_max,
//! ```text
//! U(τ) = J_0(τ) + 2 Σ_{m ≥ 1} i^m J_m(τ) T_m(H̃)
//! ```
//! and `U(-τ)` follows from `J_m(-τ) = (-1)^m J_m(τ)`. Because |*J*_m(τ)|
//! decays faster than exponentially once *m* > τ, the sum is cut off at the
//! first order whose Bessel coefficient is negligible. The factor `i^m` cycles
//! with period 4, so each order enters the running sum with one of the four
//! phases ±1, ±i, depending on *m* mod 4 and the sign of the time argument.
//!
//! Commutators with the position operator *X* follow from the same recursion,
//! since
//! ```text
//! [X, T_0] = 0
//! [X, T_1] = [X, H̃]
//! [X, T_m] = 2 [X, H̃] T_{m-1} + 2 H̃ [X, T_{m-1}] - [X, T_{m-2}]
//! ```
//! and `[X, H̃]` is itself sparse, with elements `(x_i - x_j) H̃_ij`. The
//! commutator series starts at order 1, which shifts its phase pattern by one
//! order relative to the plain series.
//!
//! # Observables
//! - Density of states: `⟨φ| δ(E - H) |φ⟩`.
//! - Velocity autocorrelation[^1], with velocity `V = i[H, X]`:
//!   `Re ⟨φ| U†(t) V U(t) δ(E - H) V |φ⟩`, carried forward in time by evolving
//!   `|φ⟩` and `V|φ⟩` once per correlation step.
//! - Mean-square displacement[^1]:
//!   `⟨φ| [X, U(t)]† δ(E - H) [X, U(t)] |φ⟩`, where
//!   `[X, U(t + Δt)] = U(Δt) [X, U(t)] + [X, U(Δt)] U(t)` avoids recomputing
//!   the commutator from the start at every step.
//!
//! [^1]: Z. Fan, A. Uppstu, T. Siro, and A. Harju, "Efficient linear-scaling
//! quantum transport calculations on graphics processing units and
//! applications on electron transport in graphene." Comput. Phys. Commun.
//! **185**, 28 (2014).
