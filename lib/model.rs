//! Model description: run parameters, lattice, energy grid, correlation time
//! steps, and the random-phase initial state.
//!
//! A model is either assembled in code via [`Model::new`] or read from an
//! input directory via [`Model::from_dir`]. The directory holds plain-text,
//! whitespace-separated files:
//!
//! | file            | contents                                                       |
//! |-----------------|----------------------------------------------------------------|
//! | `para.in`       | keyword lines (see [`Parameters::parse`])                      |
//! | `energy.in`     | `Ne`, then `Ne` energies                                       |
//! | `time_step.in`  | `Nt`, then `Nt` finite time increments (VAC/MSD only)          |
//! | `neighbor.in`   | `N max_neighbor`, then per atom a count and that many indices  |
//! | `position.in`   | `box volume`, then `N` x-coordinates                           |
//! | `potential.in`  | optional; `N` on-site energies (default 0)                     |
//! | `hopping.in`    | optional; `P`, then `P` Hermitian lines `re im` (default `-1`) |

use std::{
    f64::consts::TAU,
    fs,
    path::Path,
    str::{ FromStr, SplitWhitespace },
};
use log::{ debug, info };
use ndarray as nd;
use num_complex::Complex64 as C64;
use rand::{ rngs::StdRng, Rng, SeedableRng };
use crate::{
    error::{ KpmError, ModelError },
    hamiltonian::Hamiltonian,
    vector::State,
};

pub type MResult<T> = Result<T, ModelError>;

/// Run parameters, as read from `para.in`.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    /// Number of random vectors in the stochastic trace.
    pub number_of_random_vectors: usize,
    /// Number of Chebyshev moments.
    pub number_of_moments: usize,
    /// Energy scale; the spectrum must lie within `[-energy_max, energy_max]`.
    pub energy_max: f64,
    /// Compute the velocity autocorrelation.
    pub calculate_vac: bool,
    /// Compute the mean-square displacement.
    pub calculate_msd: bool,
    /// Seed for the random-phase generator; drawn from the OS if absent.
    pub seed: Option<u64>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            number_of_random_vectors: 1,
            number_of_moments: 1000,
            energy_max: 10.0,
            calculate_vac: false,
            calculate_msd: false,
            seed: None,
        }
    }
}

impl Parameters {
    /// Parse the contents of `para.in`.
    ///
    /// Recognized lines, in any order (everything after `#` is ignored):
    /// ```text
    /// number_of_random_vectors <usize>
    /// number_of_moments <usize>
    /// energy_max <f64>
    /// calculate_vac
    /// calculate_msd
    /// seed <u64>
    /// ```
    pub fn parse(text: &str) -> MResult<Self> {
        let mut params = Self::default();
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or("");
            let mut tokens = Tokens::new("para.in", line);
            let Some(keyword) = tokens.keyword() else { continue; };
            match keyword {
                "number_of_random_vectors" => {
                    params.number_of_random_vectors
                        = tokens.next("number_of_random_vectors")?;
                },
                "number_of_moments" => {
                    params.number_of_moments = tokens.next("number_of_moments")?;
                },
                "energy_max" => {
                    params.energy_max = tokens.next("energy_max")?;
                },
                "calculate_vac" => { params.calculate_vac = true; },
                "calculate_msd" => { params.calculate_msd = true; },
                "seed" => { params.seed = Some(tokens.next("seed")?); },
                other => {
                    return Err(ModelError::UnknownKeyword(other.to_string()));
                },
            }
        }
        Ok(params)
    }
}

/// Geometry and couplings of a lattice.
#[derive(Clone, Debug, PartialEq)]
pub struct Lattice {
    /// Neighbor indices of each atom.
    pub neighbors: Vec<Vec<usize>>,
    /// x-coordinate of each atom.
    pub positions: Vec<f64>,
    /// Periodic box length along x; non-positive disables wrapping.
    pub box_length: f64,
    /// System volume.
    pub volume: f64,
    /// On-site energy of each atom.
    pub potential: Vec<f64>,
    /// Hopping of each pair, in neighbor-list order.
    pub hopping: Vec<C64>,
}

impl Lattice {
    /// Total number of pairs across all neighbor lists.
    pub fn number_of_pairs(&self) -> usize {
        self.neighbors.iter().map(|nb| nb.len()).sum()
    }

    /// Pair displacements `x_j - x_i` in neighbor-list order, wrapped to the
    /// nearest periodic image when the box length is positive.
    pub fn displacements(&self) -> MResult<Vec<f64>> {
        let n = self.neighbors.len();
        if self.positions.len() != n {
            return Err(ModelError::Count {
                file: "position.in".into(),
                what: "coordinates",
                expected: n,
                got: self.positions.len(),
            });
        }
        let mut xx: Vec<f64> = Vec::with_capacity(self.number_of_pairs());
        for (i, nb) in self.neighbors.iter().enumerate() {
            for &j in nb.iter() {
                let xj = *self.positions.get(j)
                    .ok_or(ModelError::BadNeighbor { atom: i, neighbor: j, atoms: n })?;
                let mut d = xj - self.positions[i];
                if self.box_length > 0.0 {
                    d -= self.box_length * (d / self.box_length).round();
                }
                xx.push(d);
            }
        }
        Ok(xx)
    }
}

/// Everything needed to run the observable drivers.
#[derive(Debug)]
pub struct Model {
    /// Number of random vectors in the stochastic trace.
    pub number_of_random_vectors: usize,
    /// Number of Chebyshev moments.
    pub number_of_moments: usize,
    /// Energy scale of the rescaled Hamiltonian.
    pub energy_max: f64,
    /// Energy grid.
    pub energy: nd::Array1<f64>,
    /// Correlation time increments.
    pub time_step: nd::Array1<f64>,
    /// System volume.
    pub volume: f64,
    /// Compute the velocity autocorrelation.
    pub calculate_vac: bool,
    /// Compute the mean-square displacement.
    pub calculate_msd: bool,
    /// The (rescaled) Hamiltonian.
    pub hamiltonian: Hamiltonian,
    rng: StdRng,
}

impl Model {
    /// Assemble and validate a model.
    pub fn new(
        params: Parameters,
        lattice: Lattice,
        energy: nd::Array1<f64>,
        time_step: nd::Array1<f64>,
    ) -> MResult<Self>
    {
        KpmError::check_moments(params.number_of_moments)?;
        ModelError::check_energy_max(params.energy_max)?;
        ModelError::check_volume(lattice.volume)?;
        energy.iter()
            .try_for_each(|&e| ModelError::check_energy(e, params.energy_max))?;
        time_step.iter().enumerate()
            .try_for_each(|(k, &dt)| ModelError::check_time_step(k, dt))?;
        if (params.calculate_vac || params.calculate_msd) && time_step.is_empty() {
            return Err(ModelError::MissingTimeSteps);
        }
        let xx = lattice.displacements()?;
        let hamiltonian = Hamiltonian::new(
            &lattice.neighbors,
            &lattice.hopping,
            &xx,
            &lattice.potential,
            params.energy_max,
        )?;
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            number_of_random_vectors: params.number_of_random_vectors,
            number_of_moments: params.number_of_moments,
            energy_max: params.energy_max,
            energy,
            time_step,
            volume: lattice.volume,
            calculate_vac: params.calculate_vac,
            calculate_msd: params.calculate_msd,
            hamiltonian,
            rng,
        })
    }

    /// Read a model from an input directory.
    pub fn from_dir<P>(dir: P) -> MResult<Self>
    where P: AsRef<Path>
    {
        let dir = dir.as_ref();
        info!("reading model from {}", dir.display());
        let params = Parameters::parse(&read(dir, "para.in")?)?;
        debug!("{:?}", params);
        let energy = read_list(dir, "energy.in", "energies")?;
        let time_step
            = if params.calculate_vac || params.calculate_msd {
                read_list(dir, "time_step.in", "time steps")?
            } else {
                nd::Array1::zeros(0)
            };
        let neighbors = read_neighbors(dir)?;
        let n = neighbors.len();
        let (box_length, volume, positions) = read_positions(dir, n)?;
        let potential
            = match read_optional(dir, "potential.in")? {
                Some(text) => {
                    let mut tokens = Tokens::new("potential.in", &text);
                    (0..n).map(|_| tokens.next("on-site energy"))
                        .collect::<MResult<Vec<f64>>>()?
                },
                None => vec![0.0; n],
            };
        let pairs: usize = neighbors.iter().map(|nb| nb.len()).sum();
        let hopping
            = match read_optional(dir, "hopping.in")? {
                Some(text) => read_hopping(&text, pairs)?,
                None => vec![C64::new(-1.0, 0.0); pairs],
            };
        info!(
            "{} atoms, {} pairs, {} energies, {} time steps, {} moments",
            n, pairs, energy.len(), time_step.len(), params.number_of_moments,
        );
        let lattice = Lattice {
            neighbors, positions, box_length, volume, potential, hopping };
        Self::new(params, lattice, energy, time_step)
    }

    /// Number of lattice sites.
    pub fn number_of_atoms(&self) -> usize { self.hamiltonian.number_of_atoms() }

    /// Number of energy grid points.
    pub fn number_of_energy_points(&self) -> usize { self.energy.len() }

    /// Number of correlation time steps.
    pub fn number_of_steps_correlation(&self) -> usize { self.time_step.len() }

    /// Reseed the random-phase generator.
    pub fn reseed(&mut self, seed: u64) { self.rng = StdRng::seed_from_u64(seed); }

    /// Draw a random-phase state `e^{iφ_k}` with `φ_k` uniform in `[0, 2π)`.
    pub fn initialize_state(&mut self) -> State {
        let n = self.number_of_atoms();
        let phases: nd::Array1<C64>
            = (0..n).map(|_| C64::cis(self.rng.gen_range(0.0..TAU))).collect();
        State::from_array(phases)
    }
}

// whitespace tokenizer that names its source file in errors
struct Tokens<'a> {
    file: &'a str,
    iter: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(file: &'a str, text: &'a str) -> Self {
        Self { file, iter: text.split_whitespace() }
    }

    fn keyword(&mut self) -> Option<&'a str> { self.iter.next() }

    fn next<T>(&mut self, what: &'static str) -> MResult<T>
    where T: FromStr
    {
        let token = self.iter.next()
            .ok_or_else(|| ModelError::Truncated { file: self.file.into(), what })?;
        token.parse()
            .map_err(|_| ModelError::Parse {
                file: self.file.into(),
                what,
                token: token.to_string(),
            })
    }
}

fn read(dir: &Path, name: &str) -> MResult<String> {
    let path = dir.join(name);
    fs::read_to_string(&path)
        .map_err(|source| ModelError::Read { path, source })
}

fn read_optional(dir: &Path, name: &str) -> MResult<Option<String>> {
    if dir.join(name).exists() { read(dir, name).map(Some) } else { Ok(None) }
}

// a count followed by that many values
fn read_list(dir: &Path, name: &'static str, what: &'static str)
    -> MResult<nd::Array1<f64>>
{
    let text = read(dir, name)?;
    let mut tokens = Tokens::new(name, &text);
    let count: usize = tokens.next("count")?;
    (0..count).map(|_| tokens.next(what)).collect()
}

fn read_neighbors(dir: &Path) -> MResult<Vec<Vec<usize>>> {
    let text = read(dir, "neighbor.in")?;
    let mut tokens = Tokens::new("neighbor.in", &text);
    let n: usize = tokens.next("number of atoms")?;
    let max: usize = tokens.next("max_neighbor")?;
    (0..n).map(|atom| {
        let count: usize = tokens.next("neighbor count")?;
        if count > max {
            return Err(ModelError::TooManyNeighbors { atom, count, max });
        }
        (0..count).map(|_| {
            let neighbor: usize = tokens.next("neighbor index")?;
            (neighbor < n).then_some(neighbor)
                .ok_or(ModelError::BadNeighbor { atom, neighbor, atoms: n })
        })
        .collect::<MResult<Vec<usize>>>()
    })
    .collect()
}

fn read_positions(dir: &Path, n: usize) -> MResult<(f64, f64, Vec<f64>)> {
    let text = read(dir, "position.in")?;
    let mut tokens = Tokens::new("position.in", &text);
    let box_length: f64 = tokens.next("box length")?;
    let volume: f64 = tokens.next("volume")?;
    let positions
        = (0..n).map(|_| tokens.next("x-coordinate"))
        .collect::<MResult<Vec<f64>>>()?;
    Ok((box_length, volume, positions))
}

fn read_hopping(text: &str, pairs: usize) -> MResult<Vec<C64>> {
    let mut tokens = Tokens::new("hopping.in", text);
    let count: usize = tokens.next("count")?;
    if count != pairs {
        return Err(ModelError::Count {
            file: "hopping.in".into(),
            what: "hoppings",
            expected: pairs,
            got: count,
        });
    }
    (0..count).map(|_| {
        let re: f64 = tokens.next("hopping (real part)")?;
        let im: f64 = tokens.next("hopping (imaginary part)")?;
        Ok(C64::new(re, im))
    })
    .collect()
}
