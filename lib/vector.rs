//! Complex-valued state vectors over lattice sites, plus the two-phase
//! (per-block, then global) inner-product reduction used to accumulate
//! Chebyshev moments.

use std::mem;
use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::Zero;
use crate::{
    error::{ KpmError, LengthError },
    BLOCK_SIZE,
};

pub type KResult<T> = Result<T, KpmError>;

/// A complex field over all lattice sites.
///
/// Every recursion buffer is an owned `State`; [`State::swap`] exchanges the
/// roles of two buffers without touching their contents.
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    data: nd::Array1<C64>,
}

impl State {
    /// Create a state of `n` zeros.
    pub fn zeros(n: usize) -> Self {
        Self { data: nd::Array1::zeros(n) }
    }

    /// Wrap an existing array of amplitudes.
    pub fn from_array(data: nd::Array1<C64>) -> Self { Self { data } }

    /// Number of lattice sites.
    pub fn len(&self) -> usize { self.data.len() }

    /// Return `true` if the state has no sites.
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// Borrow the amplitudes.
    pub fn as_array(&self) -> &nd::Array1<C64> { &self.data }

    pub(crate) fn as_array_mut(&mut self) -> &mut nd::Array1<C64> {
        &mut self.data
    }

    /// Add `other` into `self` in place.
    pub fn add(&mut self, other: &Self) -> KResult<()> {
        LengthError::check(&self.data, &other.data)?;
        nd::Zip::from(&mut self.data).and(&other.data)
            .for_each(|a, b| { *a += b; });
        Ok(())
    }

    /// Overwrite `self` with the contents of `other`.
    pub fn copy_from(&mut self, other: &Self) -> KResult<()> {
        LengthError::check(&self.data, &other.data)?;
        self.data.assign(&other.data);
        Ok(())
    }

    /// Exchange the contents of two states without copying amplitudes.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.data, &mut other.data);
    }

    /// Return `Σ |ψ_i|²`.
    pub fn norm_sqr(&self) -> f64 {
        self.data.iter().map(|z| z.norm_sqr()).sum()
    }

    /// Return `<reference|self> = Σ conj(reference_i) self_i` in one pass.
    pub fn inner_product(&self, reference: &Self) -> KResult<C64> {
        LengthError::check(&self.data, &reference.data)?;
        Ok(
            nd::Zip::from(&reference.data).and(&self.data)
                .fold(C64::zero(), |acc, r, s| acc + r.conj() * s)
        )
    }

    /// First phase of the moment reduction: write the per-block partial sums
    /// of `<reference|self>` into row `index` of `partials`.
    pub fn inner_product_1(
        &self,
        reference: &Self,
        partials: &mut Partials,
        index: usize,
    ) -> KResult<()>
    {
        LengthError::check(&self.data, &reference.data)?;
        let n = self.data.len();
        let blocks = Partials::number_of_blocks(n);
        if partials.number_of_blocks_allocated() != blocks {
            return Err(
                LengthError(partials.number_of_blocks_allocated(), blocks)
                    .into()
            );
        }
        let rows = partials.number_of_rows();
        if index >= rows {
            return Err(KpmError::MomentIndex { index, rows });
        }
        let state = self.data.view();
        let refr = reference.data.view();
        nd::Zip::indexed(partials.sums.row_mut(index))
            .par_for_each(|b, p| {
                let lo = b * BLOCK_SIZE;
                let hi = (lo + BLOCK_SIZE).min(n);
                *p = nd::Zip::from(refr.slice(nd::s![lo..hi]))
                    .and(state.slice(nd::s![lo..hi]))
                    .fold(C64::zero(), |acc, r, s| acc + r.conj() * s);
            });
        Ok(())
    }

    /// Split the amplitudes into separate real and imaginary arrays.
    pub fn copy_to_host(&self) -> (Vec<f64>, Vec<f64>) {
        self.data.iter().map(|z| (z.re, z.im)).unzip()
    }
}

impl From<nd::Array1<C64>> for State {
    fn from(data: nd::Array1<C64>) -> Self { Self::from_array(data) }
}

/// Partial sums of the moment reduction, one row per moment index and one
/// column per block of [`BLOCK_SIZE`] sites.
#[derive(Clone, Debug)]
pub struct Partials {
    sums: nd::Array2<C64>,
}

impl Partials {
    /// Allocate zeroed partial sums for `number_of_moments` rows over a
    /// lattice of `number_of_atoms` sites.
    pub fn new(number_of_moments: usize, number_of_atoms: usize) -> Self {
        let blocks = Self::number_of_blocks(number_of_atoms);
        Self { sums: nd::Array2::zeros((number_of_moments, blocks)) }
    }

    /// Number of blocks needed to cover `number_of_atoms` sites.
    pub fn number_of_blocks(number_of_atoms: usize) -> usize {
        number_of_atoms.div_ceil(BLOCK_SIZE)
    }

    fn number_of_blocks_allocated(&self) -> usize { self.sums.ncols() }

    fn number_of_rows(&self) -> usize { self.sums.nrows() }

    /// Second phase of the moment reduction: collapse each row into a single
    /// complex scalar.
    pub fn inner_product_2(&self) -> nd::Array1<C64> {
        let mut out: nd::Array1<C64> = nd::Array1::zeros(self.sums.nrows());
        nd::Zip::from(&mut out).and(self.sums.rows())
            .par_for_each(|o, row| { *o = row.sum(); });
        out
    }
}

/// Three recursion buffers holding orders `m - 2`, `m - 1`, and `m`.
#[derive(Clone, Debug)]
pub(crate) struct Window {
    pub(crate) t0: State,
    pub(crate) t1: State,
    pub(crate) t2: State,
}

impl Window {
    /// Seed order 0 with `t0`; the other two buffers start zeroed.
    pub(crate) fn new(t0: State) -> Self {
        let n = t0.len();
        Self { t0, t1: State::zeros(n), t2: State::zeros(n) }
    }

    pub(crate) fn zeros(n: usize) -> Self { Self::new(State::zeros(n)) }

    // m-1 -> m-2, m -> m-1; the stale m-2 buffer is recycled for the next
    // order
    pub(crate) fn shift(&mut self) {
        self.t0.swap(&mut self.t1);
        self.t1.swap(&mut self.t2);
    }
}
