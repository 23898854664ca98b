//! Collection of all error types.
//!
//! All errors derive [`thiserror::Error`], making them composable when allowed
//! and compatible with application code using [`anyhow`][anyhow].
//!
//! [anyhow]: https://crates.io/crates/anyhow

use std::{ io, path::PathBuf };
use ndarray as nd;
use thiserror::Error;

/// Returned when an operation requiring equal-length arrays encounters arrays
/// with unequal length.
#[derive(Debug, Error)]
#[error("encountered arrays with incompatible lengths; got {0} and {1}")]
pub struct LengthError(pub usize, pub usize);

impl LengthError {
    pub(crate) fn check<S, A, T, B>(
        a: &nd::ArrayBase<S, nd::Ix1>,
        b: &nd::ArrayBase<T, nd::Ix1>,
    ) -> Result<(), Self>
    where
        S: nd::Data<Elem = A>,
        T: nd::Data<Elem = B>,
    {
        let na = a.len();
        let nb = b.len();
        (na == nb).then_some(()).ok_or(Self(na, nb))
    }
}

/// Returned from the recursion engine (moments and time evolution).
#[derive(Debug, Error)]
pub enum KpmError {
    /// Returned when zero moments are requested.
    #[error("number of moments must be greater than 0; got {0}")]
    BadMoments(usize),

    /// Returned when a partial-sum buffer is addressed outside its rows.
    #[error("moment index {index} out of range for {rows} rows")]
    MomentIndex { index: usize, rows: usize },

    /// Returned when the Chebyshev-Bessel series fails to drop below the
    /// truncation threshold within the maximum number of orders.
    #[error("evolution series did not converge for scaled time {tau} within {orders} orders")]
    SeriesUnconverged { tau: f64, orders: usize },

    /// Returned when the evolution series is asked for a non-finite time.
    #[error("scaled evolution time must be finite; got {0}")]
    BadTime(f64),

    /// [`LengthError`]
    #[error("array length error: {0}")]
    Length(#[from] LengthError),
}

impl KpmError {
    pub(crate) fn check_moments(number_of_moments: usize) -> Result<(), Self> {
        (number_of_moments != 0).then_some(())
            .ok_or(Self::BadMoments(number_of_moments))
    }

    pub(crate) fn check_time(tau: f64) -> Result<(), Self> {
        tau.is_finite().then_some(()).ok_or(Self::BadTime(tau))
    }
}

/// Returned while reading or validating a model input directory.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Returned when an input file cannot be read.
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    /// Returned when a token cannot be parsed as the expected type.
    #[error("{file}: cannot parse {what} from {token:?}")]
    Parse { file: String, what: &'static str, token: String },

    /// Returned when a file ends before all expected values are read.
    #[error("{file}: unexpected end of file while reading {what}")]
    Truncated { file: String, what: &'static str },

    /// Returned for an unrecognized keyword in `para.in`.
    #[error("para.in: unknown keyword {0:?}")]
    UnknownKeyword(String),

    /// Returned when a count read from a file disagrees with the model.
    #[error("{file}: expected {expected} {what}; got {got}")]
    Count { file: String, what: &'static str, expected: usize, got: usize },

    /// Returned when a neighbor index points outside the lattice.
    #[error("neighbor.in: atom {atom} lists neighbor {neighbor} but there are only {atoms} atoms")]
    BadNeighbor { atom: usize, neighbor: usize, atoms: usize },

    /// Returned when an atom lists more neighbors than `max_neighbor`.
    #[error("neighbor.in: atom {atom} has {count} neighbors, above the maximum {max}")]
    TooManyNeighbors { atom: usize, count: usize, max: usize },

    /// Returned when a pair has no partner `(j, i)` carrying the conjugate
    /// hopping.
    #[error("hopping from atom {atom} to {neighbor} has no Hermitian partner")]
    NonHermitian { atom: usize, neighbor: usize },

    /// Returned when a correlation time increment is not finite.
    #[error("time_step.in: increment {index} must be finite; got {value}")]
    BadTimeStep { index: usize, value: f64 },

    /// Returned when `energy_max` is not strictly positive.
    #[error("energy_max must be greater than 0; got {0}")]
    BadEnergyMax(f64),

    /// Returned when an energy grid point lies outside `(-energy_max, energy_max)`.
    #[error("energy {energy} lies outside the open interval (-{energy_max}, {energy_max})")]
    EnergyOutOfRange { energy: f64, energy_max: f64 },

    /// Returned when the system volume is not strictly positive.
    #[error("volume must be greater than 0; got {0}")]
    BadVolume(f64),

    /// Returned when a time-dependent observable is requested without time
    /// steps.
    #[error("calculate_vac/calculate_msd require at least one time step")]
    MissingTimeSteps,

    /// [`KpmError`]
    #[error("{0}")]
    Kpm(#[from] KpmError),
}

impl ModelError {
    pub(crate) fn check_energy_max(energy_max: f64) -> Result<(), Self> {
        (energy_max > 0.0).then_some(()).ok_or(Self::BadEnergyMax(energy_max))
    }

    pub(crate) fn check_volume(volume: f64) -> Result<(), Self> {
        (volume > 0.0).then_some(()).ok_or(Self::BadVolume(volume))
    }

    pub(crate) fn check_time_step(index: usize, value: f64)
        -> Result<(), Self>
    {
        value.is_finite().then_some(())
            .ok_or(Self::BadTimeStep { index, value })
    }

    pub(crate) fn check_energy(energy: f64, energy_max: f64)
        -> Result<(), Self>
    {
        (energy.abs() < energy_max).then_some(())
            .ok_or(Self::EnergyOutOfRange { energy, energy_max })
    }
}

/// Returned when writing observable curves to disk.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Returned when an output file cannot be opened for appending.
    #[error("cannot open {path} for appending: {source}")]
    Open { path: PathBuf, source: io::Error },

    /// Returned when writing to an already-open output file fails.
    #[error("cannot write to {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Returned from the top-level run loop.
#[derive(Debug, Error)]
pub enum RunError {
    /// [`ModelError`]
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// [`KpmError`]
    #[error("kpm error: {0}")]
    Kpm(#[from] KpmError),

    /// [`OutputError`]
    #[error("output error: {0}")]
    Output(#[from] OutputError),
}
