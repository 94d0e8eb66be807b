use crate::excited_states::solvers::SolverKind;
use crate::utils::Timer;
use log::{debug, info};
use ndarray::prelude::*;
use ndarray_linalg::c64;

pub fn print_bse_init(
    momentum: ArrayView1<f64>,
    n_k: usize,
    n_g: usize,
    n_valence: usize,
    n_conduction: usize,
    n_spin: usize,
) {
    info!("{:^80}", "");
    info!("{: ^80}", "Bethe-Salpeter Hamiltonian");
    info!("{:-^80}", "");
    info!(
        "{: <25} [{:.3e}, {:.3e}, {:.3e}] 1/A",
        "excitonic momentum:", momentum[0], momentum[1], momentum[2]
    );
    info!("{: <25} {}", "number of k-points:", n_k);
    info!("{: <25} {}", "number of G-vectors:", n_g);
    info!("{: <25} {} / {}", "valence / conduction:", n_valence, n_conduction);
    info!("{: <25} {}", "spin channels:", n_spin);
}

pub fn print_hamiltonian_end(timer: Timer, dimension: usize, tamm_dancoff: bool) {
    info!("{: <25} {}", "dimension of A:", dimension);
    info!("{: <25} {}", "Tamm-Dancoff:", tamm_dancoff);
    info!("{}", timer);
    info!("{:-^80}", "");
}

pub fn print_screening(eps_inv: ArrayView2<c64>, g0: usize) {
    debug!(
        "{: <25} {:>12.6} {:>12.6}",
        "eps^-1(G0, G0):", eps_inv[[g0, g0]].re, eps_inv[[g0, g0]].im
    );
}

pub fn print_states(energies: ArrayView1<f64>, strengths: ArrayView1<f64>, n_states: usize) {
    info!("{:^80}", "");
    info!("{: ^80}", "Exciton states");
    info!("{:-^80}", "");
    info!("{: >8} {: >18} {: >22}", "state", "energy / eV", "|f|^2");
    for (idx, (e, f)) in energies
        .iter()
        .zip(strengths.iter())
        .take(n_states)
        .enumerate()
    {
        info!("{: >8} {:>18.8} {:>22.10e}", idx + 1, e, f);
    }
    info!("{:-^80}", "");
}

pub fn print_solver(mode: &str, n_states: usize, timer: Timer) {
    info!("{: <25} {}", "eigensolver:", mode);
    info!("{: <25} {}", "number of states:", n_states);
    info!("{}", timer);
}

pub fn print_sum_rule(total_strength: f64, bound: f64) {
    debug!(
        "{: <25} {:.8e} <= {:.8e}",
        "oscillator sum rule:", total_strength, bound
    );
}

pub fn print_spectrum_init(n_omegas: usize, lorentzian: f64, solver: SolverKind) {
    info!("{:^80}", "");
    info!("{: ^80}", "Macroscopic dielectric tensor");
    info!("{:-^80}", "");
    info!("{: <25} {}", "number of frequencies:", n_omegas);
    info!("{: <25} {:.4} eV", "Lorentzian broadening:", lorentzian);
    info!("{: <25} {:?}", "solver:", solver);
}

pub fn print_rpa_init(n_omegas: usize, eta: f64) {
    info!("{:^80}", "");
    info!("{: ^80}", "RPA macroscopic dielectric function");
    info!("{:-^80}", "");
    info!("{: <25} {}", "number of frequencies:", n_omegas);
    info!("{: <25} {:.4e} eV", "broadening:", eta);
}
