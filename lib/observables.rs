//! Observable drivers: density of states (DOS), velocity autocorrelation
//! (VAC), and mean-square displacement (MSD).
//!
//! Each driver takes one random-phase state and returns its curves; the
//! VAC and MSD curves are indexed `[time_step, energy_index]`. [`run`] loops
//! over random vectors and appends everything to the output files.
//!
//! Time evolution between correlation steps uses [`Direction::Backward`],
//! i.e. the physical propagator `exp(-i H t)`.

use std::path::Path;
use log::info;
use ndarray as nd;
use crate::{
    damping::apply_damping,
    error::RunError,
    evolve::{ evolve, evolvex, Direction },
    model::Model,
    moments::find_moments_chebyshev,
    output::{ append_row, append_rows, DOS_FILE, MSD_FILE, VAC_FILE },
    summation::chebyshev_summation,
    vector::{ KResult, State },
};

// moments between two states -> damping -> summation
fn correlation(model: &Model, left: &State, right: &State)
    -> KResult<nd::Array1<f64>>
{
    let mut moments = find_moments_chebyshev(
        &model.hamiltonian, model.number_of_moments, left, right)?;
    apply_damping(&mut moments);
    Ok(chebyshev_summation(&moments, &model.energy, model.energy_max, model.volume))
}

/// Density of states from a single random vector.
pub fn find_dos(model: &Model, random_state: &State)
    -> KResult<nd::Array1<f64>>
{
    correlation(model, random_state, random_state)
}

/// Velocity autocorrelation at every correlation step.
///
/// Step `k` uses the moments `<V φ(t_k)| T_m(H̃) |U(t_k) V φ>` where
/// `φ(t_k) = U(t_k) φ`; both states are carried from one step to the next by
/// a single evolution over that step's time increment.
pub fn find_vac(model: &Model, random_state: &State)
    -> KResult<nd::Array2<f64>>
{
    let h = &model.hamiltonian;
    let n = random_state.len();
    let nt = model.number_of_steps_correlation();
    let mut state_left = random_state.clone();
    let mut state_left_copy = State::zeros(n);
    let mut state_right = State::zeros(n);
    h.apply_current(random_state, &mut state_right)?;
    let mut vac: nd::Array2<f64>
        = nd::Array2::zeros((nt, model.number_of_energy_points()));
    let iter
        = vac.axis_iter_mut(nd::Axis(0)).zip(&model.time_step).enumerate();
    for (step, (mut row, &dt)) in iter {
        info!("vac: correlation step {}/{}", step + 1, nt);
        h.apply_current(&state_left, &mut state_left_copy)?;
        row.assign(&correlation(model, &state_left_copy, &state_right)?);
        if step + 1 < nt {
            let tau = dt * model.energy_max;
            evolve(h, Direction::Backward, tau, &mut state_left)?;
            evolve(h, Direction::Backward, tau, &mut state_right)?;
        }
    }
    Ok(vac)
}

/// Mean-square displacement at every correlation step.
///
/// Tracks `ψ_k = U_k ⋯ U_1 φ` and `S_k = [U_k ⋯ U_1, X] φ` with the update
/// ```text
/// S_{k+1} = U_{k+1} S_k + [U_{k+1}, X] ψ_k
/// ψ_{k+1} = U_{k+1} ψ_k
/// ```
/// so each step costs a fixed number of evolutions. Step `k` uses the moments
/// `<S_k| T_m(H̃) |S_k>`.
pub fn find_msd(model: &Model, random_state: &State)
    -> KResult<nd::Array2<f64>>
{
    let h = &model.hamiltonian;
    let n = random_state.len();
    let nt = model.number_of_steps_correlation();
    let mut msd: nd::Array2<f64>
        = nd::Array2::zeros((nt, model.number_of_energy_points()));
    if nt == 0 { return Ok(msd); }
    let mut state = random_state.clone();
    let mut state_x = State::zeros(n);
    let mut state_copy = State::zeros(n);
    let tau0 = model.time_step[0] * model.energy_max;
    evolvex(h, Direction::Backward, tau0, random_state, &mut state_x)?;
    evolve(h, Direction::Backward, tau0, &mut state)?;
    for (step, mut row) in msd.axis_iter_mut(nd::Axis(0)).enumerate() {
        info!("msd: correlation step {}/{}", step + 1, nt);
        row.assign(&correlation(model, &state_x, &state_x)?);
        if step + 1 < nt {
            let tau = model.time_step[step + 1] * model.energy_max;
            evolve(h, Direction::Backward, tau, &mut state_x)?;
            evolvex(h, Direction::Backward, tau, &state, &mut state_copy)?;
            state_x.add(&state_copy)?;
            evolve(h, Direction::Backward, tau, &mut state)?;
        }
    }
    Ok(msd)
}

/// Compute every requested observable for each random vector, appending the
/// curves to `dos.out`, `vac.out`, and `msd.out` under `output_dir`.
///
/// Any failure aborts the run; curves already written are left in place.
pub fn run<P>(model: &mut Model, output_dir: P) -> Result<(), RunError>
where P: AsRef<Path>
{
    let output_dir = output_dir.as_ref();
    let nvec = model.number_of_random_vectors;
    for k in 0..nvec {
        info!("random vector {}/{}", k + 1, nvec);
        let random_state = model.initialize_state();

        let dos = find_dos(model, &random_state)?;
        append_row(output_dir.join(DOS_FILE), &dos)?;

        if model.calculate_vac {
            let vac = find_vac(model, &random_state)?;
            append_rows(output_dir.join(VAC_FILE), &vac)?;
        }

        if model.calculate_msd {
            let msd = find_msd(model, &random_state)?;
            append_rows(output_dir.join(MSD_FILE), &msd)?;
        }
    }
    info!("finished {} random vector(s)", nvec);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use num_complex::Complex64 as C64;
    use crate::model::{ Lattice, Parameters };

    fn chain_model(n: usize, calculate: bool, hopping: f64) -> Model {
        ring_model(n, calculate, hopping, vec![0.0; n])
    }

    fn ring_model(n: usize, calculate: bool, hopping: f64, potential: Vec<f64>)
        -> Model
    {
        let params = Parameters {
            number_of_moments: 40,
            energy_max: 2.5,
            calculate_vac: calculate,
            calculate_msd: calculate,
            seed: Some(11),
            ..Default::default()
        };
        let lattice = Lattice {
            neighbors: (0..n).map(|i| vec![(i + n - 1) % n, (i + 1) % n]).collect(),
            positions: (0..n).map(|i| i as f64).collect(),
            box_length: n as f64,
            volume: n as f64,
            potential,
            hopping: vec![C64::new(hopping, 0.0); 2 * n],
        };
        Model::new(
            params,
            lattice,
            nd::Array1::linspace(-2.0, 2.0, 9),
            nd::array![0.5, 0.5, 0.5],
        )
        .unwrap()
    }

    #[test]
    fn dos_integrates_to_two() {
        let mut model = chain_model(64, false, -1.0);
        model.energy = nd::Array1::linspace(-2.45, 2.45, 981);
        let psi = model.initialize_state();
        let dos = find_dos(&model, &psi).unwrap();
        let de = model.energy[1] - model.energy[0];
        // spin-degenerate: ∫ ρ(E) dE = 2 <φ|φ> / V = 2
        let integral: f64 = dos.sum() * de;
        assert!((integral - 2.0).abs() < 0.05, "integral = {integral}");
        assert!(dos.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn single_site_dos() {
        let params = Parameters {
            number_of_moments: 2,
            energy_max: 1.0,
            seed: Some(0),
            ..Default::default()
        };
        let lattice = Lattice {
            neighbors: vec![vec![]],
            positions: vec![0.0],
            box_length: 0.0,
            volume: 1.0,
            potential: vec![1.0],
            hopping: vec![],
        };
        let mut model = Model::new(params, lattice, nd::array![0.0], nd::Array1::zeros(0))
            .unwrap();
        let psi = model.initialize_state();
        let dos = find_dos(&model, &psi).unwrap();
        assert_eq!(dos.len(), 1);
        assert!((dos[0] - 2.0 / PI).abs() < 1e-12);
    }

    #[test]
    fn vac_vanishes_without_current() {
        let mut model = chain_model(16, true, 0.0);
        let psi = model.initialize_state();
        let vac = find_vac(&model, &psi).unwrap();
        assert_eq!(vac.dim(), (3, 9));
        assert!(vac.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn vac_is_positive_at_zero_time() {
        let mut model = chain_model(32, true, -1.0);
        let psi = model.initialize_state();
        let vac = find_vac(&model, &psi).unwrap();
        // band interior: <v²> > 0
        assert!(vac[[0, 4]] > 0.0);
    }

    #[test]
    fn msd_grows_from_zero() {
        let mut model = chain_model(48, true, -1.0);
        let psi = model.initialize_state();
        let msd = find_msd(&model, &psi).unwrap();
        assert_eq!(msd.dim(), (3, 9));
        // ballistic spreading at the band centre
        assert!(msd[[0, 4]] > 0.0);
        assert!(msd[[2, 4]] > msd[[0, 4]]);
    }

    #[test]
    fn msd_incremental_matches_direct() {
        let mut model = chain_model(24, true, -1.0);
        let psi = model.initialize_state();
        let h = &model.hamiltonian;
        // [U(3Δt), X] ψ directly, against three incremental steps
        let tau = 1.5 * model.energy_max;
        let mut direct = State::zeros(psi.len());
        evolvex(h, Direction::Backward, tau, &psi, &mut direct).unwrap();
        let msd = find_msd(&model, &psi).unwrap();
        let expected = correlation(&model, &direct, &direct).unwrap();
        for (a, b) in msd.row(2).iter().zip(&expected) {
            assert!((a - b).abs() < 1e-8 * (1.0 + b.abs()), "{a} vs {b}");
        }
    }

    fn assert_rows_close(a: nd::ArrayView1<f64>, b: &nd::Array1<f64>) {
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-8 * (1.0 + y.abs()), "{x} vs {y}");
        }
    }

    #[test]
    fn uneven_steps_match_direct_evolution() {
        // disorder, so that the velocity is not conserved; |H| <= 2.4
        let potential: Vec<f64>
            = (0..24).map(|i| 0.4 * ((i * i) as f64 * 0.37).sin()).collect();
        let mut model = ring_model(24, true, -1.0, potential);
        model.time_step = nd::array![0.3, 0.7, 1.1];
        let psi = model.initialize_state();
        let h = &model.hamiltonian;
        let n = psi.len();
        let vac = find_vac(&model, &psi).unwrap();
        let msd = find_msd(&model, &psi).unwrap();

        // vac row k sits at Σ_{j<k} dt_j; msd row k at Σ_{j≤k} dt_j
        let mut v_psi = State::zeros(n);
        h.apply_current(&psi, &mut v_psi).unwrap();
        let mut t_prev = 0.0;
        for (k, &dt) in model.time_step.iter().enumerate() {
            let t_next = t_prev + dt;

            let mut left = psi.clone();
            let mut right = v_psi.clone();
            evolve(h, Direction::Backward, t_prev * model.energy_max, &mut left)
                .unwrap();
            evolve(h, Direction::Backward, t_prev * model.energy_max, &mut right)
                .unwrap();
            let mut v_left = State::zeros(n);
            h.apply_current(&left, &mut v_left).unwrap();
            let expected = correlation(&model, &v_left, &right).unwrap();
            assert_rows_close(vac.row(k), &expected);

            let mut comm = State::zeros(n);
            evolvex(h, Direction::Backward, t_next * model.energy_max, &psi, &mut comm)
                .unwrap();
            let expected = correlation(&model, &comm, &comm).unwrap();
            assert_rows_close(msd.row(k), &expected);

            t_prev = t_next;
        }
        // the steps are distinguishable
        assert!((vac[[1, 4]] - vac[[2, 4]]).abs() > 1e-6);
    }

    #[test]
    fn run_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = chain_model(16, true, -1.0);
        model.number_of_random_vectors = 2;
        run(&mut model, dir.path()).unwrap();
        let count = |name: &str| {
            std::fs::read_to_string(dir.path().join(name)).unwrap().lines().count()
        };
        assert_eq!(count(DOS_FILE), 2);
        assert_eq!(count(VAC_FILE), 6);
        assert_eq!(count(MSD_FILE), 6);
    }
}
