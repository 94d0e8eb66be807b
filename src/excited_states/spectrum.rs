use crate::constants::{COULOMB_CONSTANT, Q_MIN};
use crate::excited_states::bse::{BseHamiltonian, BseHamiltonianBuilder, BseOptions};
use crate::excited_states::logging::{print_spectrum_init, print_sum_rule};
use crate::excited_states::solvers::{ExcitonStates, SolverKind};
use crate::initialization::ExcitonSystem;
use crate::utils::Timer;
use anyhow::{Context, Result};
use log::info;
use ndarray::prelude::*;
use ndarray::Zip;
use ndarray_linalg::c64;
use std::f64::consts::PI;

/// f_l = sum_a conj(rho_cv,a(G0)) X_l,a over the resonant part of every state.
pub fn oscillator_strengths(states: &ExcitonStates, rho_g0: ArrayView1<c64>) -> Array1<c64> {
    states.resonant().t().dot(&rho_g0.mapv(|x| x.conj()))
}

/// Total oscillator strength sum_l |f_l|^2 and its upper bound sum_a |rho_cv,a(G0)|^2.
pub fn sum_rule(strengths: ArrayView1<c64>, rho_g0: ArrayView1<c64>) -> (f64, f64) {
    let total: f64 = strengths.iter().map(|f| f.norm_sqr()).sum();
    let bound: f64 = rho_g0.iter().map(|r| r.norm_sqr()).sum();
    (total, bound)
}

/// Macroscopic dielectric tensor from the solutions of the excitonic Hamiltonian at the three
/// optical probes Q = q_min e_i.
pub struct DielectricTensor<'a> {
    system: &'a ExcitonSystem,
    builder: BseHamiltonianBuilder<'a>,
    solver: SolverKind,
    eta: f64,
}

impl<'a> DielectricTensor<'a> {
    pub fn new(system: &'a ExcitonSystem, options: BseOptions, solver: SolverKind, eta: f64) -> Self {
        Self {
            system,
            builder: BseHamiltonianBuilder::new(system, options),
            solver,
            eta,
        }
    }

    fn probe(direction: usize) -> Array1<f64> {
        let mut momentum: Array1<f64> = Array1::zeros(3);
        momentum[direction] = Q_MIN;
        momentum
    }

    /// 4 pi g e^2 / (4 pi eps_0) / (q_min^2 N_k V_cell)
    pub fn prefactor(&self) -> f64 {
        4.0 * PI * self.system.spin_degeneracy() * COULOMB_CONSTANT
            / (Q_MIN.powi(2) * self.system.crystal_volume())
    }

    /// eps_ij(omega) = delta_ij - prefactor sum_l conj(f_l^(i)) f_l^(j) / (omega - E_l + i lorentzian)
    /// with the states of probe i and f^(j) their oscillator strengths with the density of
    /// probe j. Returns an array of shape [n_omegas, 3, 3].
    pub fn compute(&self, omegas: ArrayView1<f64>, lorentzian: f64) -> Result<Array3<c64>> {
        let timer: Timer = Timer::start();
        print_spectrum_init(omegas.len(), lorentzian, self.solver);
        let g0: usize = self.system.g0;

        // The optical densities come with the Hamiltonians of the three directions.
        let mut probes: Vec<(ExcitonStates, Array1<c64>)> = Vec::with_capacity(3);
        for i in 0..3 {
            let momentum: Array1<f64> = Self::probe(i);
            let hamiltonian: BseHamiltonian = self
                .builder
                .build(momentum.view(), self.eta, self.solver.layout())
                .with_context(|| format!("The BSE Hamiltonian of probe {} could not be built", i))?;
            let states: ExcitonStates = self.solver.solve(&hamiltonian)?;
            let density: Array1<c64> = hamiltonian.rho_cv.column(g0).to_owned();
            probes.push((states, density));
        }

        let prefactor: f64 = self.prefactor();
        let mut tensor: Array3<c64> = Array3::zeros([omegas.len(), 3, 3]);
        for i in 0..3 {
            tensor
                .slice_mut(s![.., i, i])
                .fill(c64::new(1.0, 0.0));
        }

        for (i, (states, density)) in probes.iter().enumerate() {
            let strengths: Vec<Array1<c64>> = probes
                .iter()
                .map(|(_, rho)| oscillator_strengths(states, rho.view()))
                .collect();
            let (total, bound) = sum_rule(strengths[i].view(), density.view());
            print_sum_rule(total, bound);

            for j in 0..3 {
                let weights: Array1<c64> = strengths[i].mapv(|f| f.conj()) * &strengths[j];
                Zip::from(tensor.slice_mut(s![.., i, j]))
                    .and(omegas)
                    .par_for_each(|eps, omega| {
                        let response: c64 = weights
                            .iter()
                            .zip(states.energies.iter())
                            .map(|(w, e)| w / c64::new(omega - e, lorentzian))
                            .sum();
                        *eps -= prefactor * response;
                    });
            }
        }
        info!("{}", timer);
        Ok(tensor)
    }
}
