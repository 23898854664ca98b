//! Sparse tight-binding Hamiltonian in compressed-row form, together with the
//! fused kernels driven by the Chebyshev recursions.
//!
//! Hopping amplitudes and on-site energies are divided by `energy_max` on
//! construction, so every kernel here acts with the rescaled operator
//! `H̃ = H / energy_max` whose spectrum lies in `[-1, 1]`. Each pair `(i, j)` also
//! carries the displacement `xx = x_j - x_i` used for commutators with the
//! position operator `X`.
//!
//! All kernels are data-parallel over rows; nothing here depends on the order
//! in which rows are visited.

use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::Zero;
use crate::{
    error::{ LengthError, ModelError },
    evolve::Direction,
    vector::{ KResult, State },
};

/// One of the four unit phases by which a weighted Chebyshev term is folded
/// into an accumulating state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// `+1`
    One,
    /// `-1`
    MinusOne,
    /// `+i`
    I,
    /// `-i`
    MinusI,
}

impl Phase {
    /// Multiply `z` by the phase.
    #[inline]
    pub fn apply(self, z: C64) -> C64 {
        match self {
            Self::One => z,
            Self::MinusOne => -z,
            Self::I => C64::new(-z.im, z.re),
            Self::MinusI => C64::new(z.im, -z.re),
        }
    }
}

const HERMITIAN_EPSILON: f64 = 1e-12;

// every stored t_ij needs a partner t_ji = conj(t_ij)
fn check_hermitian(row_ptr: &[usize], col_idx: &[usize], hopping: &[C64])
    -> Result<(), ModelError>
{
    for atom in 0..row_ptr.len() - 1 {
        for p in row_ptr[atom]..row_ptr[atom + 1] {
            let neighbor = col_idx[p];
            let t = hopping[p].conj();
            let tol = HERMITIAN_EPSILON * t.norm().max(1.0);
            (row_ptr[neighbor]..row_ptr[neighbor + 1])
                .any(|q| col_idx[q] == atom && (hopping[q] - t).norm() <= tol)
                .then_some(())
                .ok_or(ModelError::NonHermitian { atom, neighbor })?;
        }
    }
    Ok(())
}

/// A Hermitian tight-binding Hamiltonian stored by neighbor lists.
#[derive(Clone, Debug)]
pub struct Hamiltonian {
    n: usize,
    energy_max: f64,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    hopping: Vec<C64>,
    xx: Vec<f64>,
    potential: Vec<f64>,
}

impl Hamiltonian {
    /// Build from per-atom neighbor lists.
    ///
    /// `hopping` and `xx` hold one entry per pair, in the order obtained by
    /// concatenating the neighbor lists. `potential` holds one on-site energy
    /// per atom. Every pair `(i, j)` must be matched by a pair `(j, i)` with
    /// hopping `conj(t_ij)`.
    pub fn new(
        neighbors: &[Vec<usize>],
        hopping: &[C64],
        xx: &[f64],
        potential: &[f64],
        energy_max: f64,
    ) -> Result<Self, ModelError>
    {
        ModelError::check_energy_max(energy_max)?;
        let n = neighbors.len();
        if potential.len() != n {
            return Err(ModelError::Count {
                file: "potential".into(),
                what: "on-site energies",
                expected: n,
                got: potential.len(),
            });
        }
        let mut row_ptr: Vec<usize> = Vec::with_capacity(n + 1);
        let mut col_idx: Vec<usize> = Vec::new();
        row_ptr.push(0);
        for (atom, nbrs) in neighbors.iter().enumerate() {
            for &neighbor in nbrs.iter() {
                if neighbor >= n {
                    return Err(ModelError::BadNeighbor {
                        atom, neighbor, atoms: n });
                }
                col_idx.push(neighbor);
            }
            row_ptr.push(col_idx.len());
        }
        let pairs = col_idx.len();
        for (what, got) in [("hoppings", hopping.len()), ("displacements", xx.len())] {
            if got != pairs {
                return Err(ModelError::Count {
                    file: "hopping".into(),
                    what,
                    expected: pairs,
                    got,
                });
            }
        }
        check_hermitian(&row_ptr, &col_idx, hopping)?;
        Ok(Self {
            n,
            energy_max,
            row_ptr,
            col_idx,
            hopping: hopping.iter().map(|&t| t / energy_max).collect(),
            xx: xx.to_vec(),
            potential: potential.iter().map(|v| v / energy_max).collect(),
        })
    }

    /// Number of lattice sites.
    pub fn number_of_atoms(&self) -> usize { self.n }

    /// Total number of stored (directed) pairs.
    pub fn number_of_pairs(&self) -> usize { self.col_idx.len() }

    /// Energy scale used to rescale the spectrum into `[-1, 1]`.
    pub fn energy_max(&self) -> f64 { self.energy_max }

    fn check(&self, state: &State) -> KResult<()> {
        (state.len() == self.n).then_some(())
            .ok_or(LengthError(self.n, state.len()).into())
    }

    // Σ_j t̃_ij v_j
    #[inline]
    fn hop_row(&self, i: usize, v: &nd::ArrayView1<C64>) -> C64 {
        (self.row_ptr[i]..self.row_ptr[i + 1])
            .fold(C64::zero(), |acc, p| acc + self.hopping[p] * v[self.col_idx[p]])
    }

    // (H̃ v)_i
    #[inline]
    fn h_row(&self, i: usize, v: &nd::ArrayView1<C64>) -> C64 {
        self.potential[i] * v[i] + self.hop_row(i, v)
    }

    // ([X, H̃] v)_i = Σ_j (x_i - x_j) t̃_ij v_j
    #[inline]
    fn x_row(&self, i: usize, v: &nd::ArrayView1<C64>) -> C64 {
        (self.row_ptr[i]..self.row_ptr[i + 1])
            .fold(C64::zero(), |acc, p| {
                acc - self.xx[p] * self.hopping[p] * v[self.col_idx[p]]
            })
    }

    /// `out = H̃ input`.
    pub fn apply(&self, input: &State, out: &mut State) -> KResult<()> {
        self.check(input)?;
        self.check(out)?;
        let v = input.as_array().view();
        nd::Zip::indexed(out.as_array_mut())
            .par_for_each(|i, o| { *o = self.h_row(i, &v); });
        Ok(())
    }

    /// `out = [X, H̃] input`.
    pub fn apply_commutator(&self, input: &State, out: &mut State)
        -> KResult<()>
    {
        self.check(input)?;
        self.check(out)?;
        let v = input.as_array().view();
        nd::Zip::indexed(out.as_array_mut())
            .par_for_each(|i, o| { *o = self.x_row(i, &v); });
        Ok(())
    }

    /// `out = V input` with the velocity operator `V = i[H, X]` in physical
    /// (unscaled) energy units.
    pub fn apply_current(&self, input: &State, out: &mut State)
        -> KResult<()>
    {
        self.check(input)?;
        self.check(out)?;
        let v = input.as_array().view();
        let scale = -self.energy_max;
        nd::Zip::indexed(out.as_array_mut())
            .par_for_each(|i, o| {
                *o = Phase::I.apply(scale * self.x_row(i, &v));
            });
        Ok(())
    }

    /// One step of the Chebyshev recursion: `s2 = 2 H̃ s1 - s0`.
    pub fn kernel_polynomial(&self, s0: &State, s1: &State, s2: &mut State)
        -> KResult<()>
    {
        self.check(s0)?;
        self.check(s1)?;
        self.check(s2)?;
        let v0 = s0.as_array().view();
        let v1 = s1.as_array().view();
        nd::Zip::indexed(s2.as_array_mut())
            .par_for_each(|i, o| { *o = 2.0 * self.h_row(i, &v1) - v0[i]; });
        Ok(())
    }

    /// Fold the order-0 and order-1 terms of the evolution series:
    /// `out = b0 s0 + (i direction) b1 s1`.
    pub fn chebyshev_01(
        &self,
        s0: &State,
        s1: &State,
        out: &mut State,
        b0: f64,
        b1: f64,
        direction: Direction,
    ) -> KResult<()>
    {
        self.check(s0)?;
        self.check(s1)?;
        self.check(out)?;
        let phase = direction.order_one_phase();
        nd::Zip::from(out.as_array_mut()).and(s0.as_array()).and(s1.as_array())
            .par_for_each(|o, a0, a1| {
                *o = b0 * *a0 + phase.apply(b1 * *a1);
            });
        Ok(())
    }

    /// Advance the recursion by one order and fold the new term into `out`:
    /// `s2 = 2 H̃ s1 - s0`, then `out += phase b s2`.
    #[allow(clippy::too_many_arguments)]
    pub fn chebyshev_2(
        &self,
        s0: &State,
        s1: &State,
        s2: &mut State,
        out: &mut State,
        b: f64,
        phase: Phase,
    ) -> KResult<()>
    {
        self.check(s0)?;
        self.check(s1)?;
        self.check(s2)?;
        self.check(out)?;
        let v0 = s0.as_array().view();
        let v1 = s1.as_array().view();
        nd::Zip::indexed(s2.as_array_mut()).and(out.as_array_mut())
            .par_for_each(|i, t, o| {
                *t = 2.0 * self.h_row(i, &v1) - v0[i];
                *o += phase.apply(b * *t);
            });
        Ok(())
    }

    /// Fold the order-1 commutator term: `out = i b1 s1x`.
    pub fn chebyshev_1x(&self, s1x: &State, out: &mut State, b1: f64)
        -> KResult<()>
    {
        self.check(s1x)?;
        self.check(out)?;
        nd::Zip::from(out.as_array_mut()).and(s1x.as_array())
            .par_for_each(|o, a| { *o = Phase::I.apply(b1 * *a); });
        Ok(())
    }

    /// Advance the coupled recursion by one order and fold the new commutator
    /// term into `out`:
    /// ```text
    /// s2  = 2 H̃ s1 - s0
    /// s2x = 2 H̃ s1x + 2 [X, H̃] s1 - s0x
    /// out += phase b s2x
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn chebyshev_2x(
        &self,
        s0: &State,
        s0x: &State,
        s1: &State,
        s1x: &State,
        s2: &mut State,
        s2x: &mut State,
        out: &mut State,
        b: f64,
        phase: Phase,
    ) -> KResult<()>
    {
        for s in [s0, s0x, s1, s1x] { self.check(s)?; }
        self.check(s2)?;
        self.check(s2x)?;
        self.check(out)?;
        let v0 = s0.as_array().view();
        let v0x = s0x.as_array().view();
        let v1 = s1.as_array().view();
        let v1x = s1x.as_array().view();
        nd::Zip::indexed(s2.as_array_mut())
            .and(s2x.as_array_mut())
            .and(out.as_array_mut())
            .par_for_each(|i, t, tx, o| {
                *t = 2.0 * self.h_row(i, &v1) - v0[i];
                *tx = 2.0 * (self.h_row(i, &v1x) + self.x_row(i, &v1)) - v0x[i];
                *o += phase.apply(b * *tx);
            });
        Ok(())
    }
}
