use crate::constants::{PLASMON_POLE_TOLERANCE, Q_MIN};
use crate::excited_states::transition_densities::{
    flatten_density, TransitionDensities, TransitionDensityEngine,
};
use crate::excited_states::logging::print_rpa_init;
use crate::initialization::ExcitonSystem;
use crate::utils::Timer;
use anyhow::{Context, Result};
use log::info;
use ndarray::prelude::*;
use ndarray_linalg::{c64, Inverse};
use tbbse_model::ModelError;

/// Correlation part of one element of eps^-1 in the plasmon-pole model, fitted to its static
/// value `c0` and to its value `cp` at the imaginary frequency i omega_p. Elements whose
/// correlation part, or whose change between the two frequencies, is negligible relative to
/// `c0` have no pole.
fn plasmon_pole_element(
    c0: c64,
    cp: c64,
    omega: c64,
    i_eta: c64,
    plasmon_frequency: f64,
) -> c64 {
    let scale: f64 = c0.norm();
    let difference: c64 = c0 - cp;
    if scale < PLASMON_POLE_TOLERANCE || difference.norm() < PLASMON_POLE_TOLERANCE * scale {
        return c64::new(0.0, 0.0);
    }
    // pole frequency and residue of the element
    let pole: c64 = plasmon_frequency * (cp / difference).sqrt();
    let residue: c64 = -0.5 * c0 * pole;
    residue * (1.0 / (omega - pole + i_eta) - 1.0 / (omega + pole - i_eta))
}

/// Inverse dielectric matrix eps^-1_GG'(Q, omega) in the random phase approximation.
pub struct ScreeningEngine<'a> {
    system: &'a ExcitonSystem,
    densities: TransitionDensityEngine<'a>,
}

impl<'a> ScreeningEngine<'a> {
    pub fn new(system: &'a ExcitonSystem, n_valence: usize, n_conduction: usize) -> Self {
        Self {
            system,
            densities: TransitionDensityEngine::new(system, n_valence, n_conduction),
        }
    }

    /// eps^-1_ij = delta_ij + g / N_k V(Q + G_i) sum_{s,c,v,k} conj(rho_i) rho_j
    ///             [1 / (omega - dE + i eta) - 1 / (omega + dE - i eta)]
    /// with the resonant densities rho_cv(k) and dE = eps_c(k) - eps_v(k - Q).
    pub fn inverse_dielectric(
        &self,
        momentum: ArrayView1<f64>,
        omega: c64,
        eta: f64,
    ) -> Result<Array2<c64>, ModelError> {
        let densities: TransitionDensities = self.densities.resonant(momentum)?;
        Ok(self.inverse_dielectric_from(&densities, momentum, omega, eta))
    }

    /// Same as [inverse_dielectric](Self::inverse_dielectric) for already computed resonant
    /// densities at the momentum `momentum`.
    pub fn inverse_dielectric_from(
        &self,
        densities: &TransitionDensities,
        momentum: ArrayView1<f64>,
        omega: c64,
        eta: f64,
    ) -> Array2<c64> {
        let n_g: usize = self.system.n_g();
        let prefactor: f64 = self.system.spin_degeneracy() / self.system.n_k() as f64;
        let i_eta: c64 = c64::new(0.0, eta);

        // rows (s, c, v, k) in the same order as the energies
        let rho: Array2<c64> = flatten_density(densities.cv());
        let factors: Array1<c64> = densities
            .resonant_energies()
            .iter()
            .map(|de| prefactor * (1.0 / (omega - *de + i_eta) - 1.0 / (omega + *de - i_eta)))
            .collect();
        let weighted: Array2<c64> = &rho * &factors.insert_axis(Axis(1));
        let chi: Array2<c64> = rho.t().mapv(|x| x.conj()).dot(&weighted);

        let potential: Array1<f64> = self.system.coulomb_potential(momentum);
        let mut eps_inv: Array2<c64> = Array2::eye(n_g);
        for ((mut row, chi_row), v) in eps_inv
            .outer_iter_mut()
            .zip(chi.outer_iter())
            .zip(potential.iter())
        {
            row.scaled_add(c64::new(*v, 0.0), &chi_row);
        }
        eps_inv
    }

    /// Plasmon-pole model of the inverse dielectric matrix. The pole frequencies and residues
    /// are fitted to the RPA values at omega = 0 and at the imaginary frequency
    /// i * `plasmon_frequency`.
    pub fn inverse_dielectric_ppa(
        &self,
        momentum: ArrayView1<f64>,
        omega: c64,
        eta: f64,
        plasmon_frequency: f64,
    ) -> Result<Array2<c64>, ModelError> {
        let densities: TransitionDensities = self.densities.resonant(momentum)?;
        Ok(self.ppa_from(&densities, momentum, omega, eta, plasmon_frequency))
    }

    pub fn ppa_from(
        &self,
        densities: &TransitionDensities,
        momentum: ArrayView1<f64>,
        omega: c64,
        eta: f64,
        plasmon_frequency: f64,
    ) -> Array2<c64> {
        let n_g: usize = self.system.n_g();
        let identity: Array2<c64> = Array2::eye(n_g);
        let static_part: Array2<c64> =
            self.inverse_dielectric_from(densities, momentum, c64::new(0.0, 0.0), eta) - &identity;
        let probe_part: Array2<c64> = self.inverse_dielectric_from(
            densities,
            momentum,
            c64::new(0.0, plasmon_frequency),
            eta,
        ) - &identity;

        let i_eta: c64 = c64::new(0.0, eta);
        let mut eps_inv: Array2<c64> = identity;
        ndarray::Zip::from(&mut eps_inv)
            .and(&static_part)
            .and(&probe_part)
            .for_each(|e, c0, cp| {
                *e += plasmon_pole_element(*c0, *cp, omega, i_eta, plasmon_frequency);
            });
        eps_inv
    }

    /// Macroscopic RPA dielectric function eps_M(omega) = [eps(q -> 0, omega)]_{G0,G0}, with eps
    /// the inverse of the inverse dielectric matrix at the momentum q_min along x.
    pub fn macroscopic_rpa(&self, omegas: ArrayView1<f64>, eta: f64) -> Result<Array1<c64>> {
        let timer: Timer = Timer::start();
        print_rpa_init(omegas.len(), eta);
        let momentum: Array1<f64> = array![Q_MIN, 0.0, 0.0];
        let densities: TransitionDensities = self.densities.resonant(momentum.view())?;
        let g0: usize = self.system.g0;

        let mut epsilon: Array1<c64> = Array1::zeros(omegas.len());
        for (eps_m, omega) in epsilon.iter_mut().zip(omegas.iter()) {
            let eps_inv: Array2<c64> = self.inverse_dielectric_from(
                &densities,
                momentum.view(),
                c64::new(*omega, 0.0),
                eta,
            );
            let eps: Array2<c64> = eps_inv.inv().with_context(|| {
                format!(
                    "The inverse dielectric matrix at omega = {} eV cannot be inverted",
                    omega
                )
            })?;
            *eps_m = eps[[g0, g0]];
        }
        info!("{}", timer);
        Ok(epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::max_abs_deviation;
    use crate::utils::test_models::*;
    use tbbse_model::{Coulomb, Dimensionality};

    #[test]
    fn zero_coulomb_gives_identity() {
        init_logger();
        let system = chain_system(3, chain_g_vectors(), Box::new(ConstantCoulomb(0.0)), false);
        let screening = ScreeningEngine::new(&system, 1, 1);
        let momentum: Array1<f64> = array![0.1, 0.0, 0.0];
        let eps_inv: Array2<c64> = screening
            .inverse_dielectric(momentum.view(), c64::new(0.5, 0.0), 0.01)
            .unwrap();
        assert_eq!(eps_inv, Array2::<c64>::eye(3));
    }

    #[test]
    fn static_screening_is_reproducible_and_reduces_the_interaction() {
        let system = chain_system(4, chain_g_vectors(), Box::new(chain_coulomb()), false);
        let screening = ScreeningEngine::new(&system, 1, 1);
        let momentum: Array1<f64> = array![0.2, 0.0, 0.0];
        let zero: c64 = c64::new(0.0, 0.0);
        let first: Array2<c64> = screening
            .inverse_dielectric(momentum.view(), zero, 1e-3)
            .unwrap();
        let second: Array2<c64> = screening
            .inverse_dielectric(momentum.view(), zero, 1e-3)
            .unwrap();
        assert_eq!(first, second);
        for i in 0..3 {
            assert!(first[[i, i]].re < 1.0);
        }
    }

    #[test]
    fn polarized_screening_has_the_same_structure() {
        let system = chain_system(2, chain_g_vectors(), Box::new(chain_coulomb()), true);
        let screening = ScreeningEngine::new(&system, 1, 1);
        let eps_inv: Array2<c64> = screening
            .inverse_dielectric(array![0.2, 0.0, 0.0].view(), c64::new(0.0, 0.0), 0.0)
            .unwrap();
        assert_eq!(eps_inv.dim(), (3, 3));
        assert!(eps_inv[[0, 0]].re < 1.0);
    }

    /// The plasmon-pole model reproduces the RPA at the two frequencies it is fitted to.
    #[test]
    fn plasmon_pole_matches_the_fit_frequencies() {
        let system = chain_system(3, chain_g_vectors(), Box::new(chain_coulomb()), false);
        let screening = ScreeningEngine::new(&system, 1, 1);
        let momentum: Array1<f64> = array![0.25, 0.0, 0.0];
        let plasmon_frequency: f64 = 5.0;

        let static_rpa: Array2<c64> = screening
            .inverse_dielectric(momentum.view(), c64::new(0.0, 0.0), 0.0)
            .unwrap();
        let static_ppa: Array2<c64> = screening
            .inverse_dielectric_ppa(momentum.view(), c64::new(0.0, 0.0), 0.0, plasmon_frequency)
            .unwrap();
        assert!(max_abs_deviation(static_rpa.view(), static_ppa.view()) < 1e-8);

        let probe: c64 = c64::new(0.0, plasmon_frequency);
        let probe_rpa: Array2<c64> = screening
            .inverse_dielectric(momentum.view(), probe, 0.0)
            .unwrap();
        let probe_ppa: Array2<c64> = screening
            .inverse_dielectric_ppa(momentum.view(), probe, 0.0, plasmon_frequency)
            .unwrap();
        assert!(max_abs_deviation(probe_rpa.view(), probe_ppa.view()) < 1e-8);
    }

    #[test]
    fn plasmon_pole_skips_negligible_correlation() {
        let zero: c64 = c64::new(0.0, 0.0);
        let omega: c64 = c64::new(1.0, 0.0);
        let i_eta: c64 = c64::new(0.0, 0.01);
        let tiny: c64 = c64::new(1e-16, 0.0);
        assert_eq!(plasmon_pole_element(tiny, 0.5 * tiny, omega, i_eta, 3.0), zero);
        let c0: c64 = c64::new(-0.3, 0.0);
        let cp: c64 = c0 * (1.0 - 1e-14);
        assert_eq!(plasmon_pole_element(c0, cp, omega, i_eta, 3.0), zero);
        // a regular element reproduces its static value
        let cp: c64 = c64::new(-0.1, 0.0);
        let static_value: c64 = plasmon_pole_element(c0, cp, zero, zero, 3.0);
        assert!((static_value - c0).norm() < 1e-12);
    }

    #[test]
    fn plasmon_pole_without_interaction_is_the_identity() {
        let system = chain_system(2, chain_g_vectors(), Box::new(ConstantCoulomb(0.0)), false);
        let screening = ScreeningEngine::new(&system, 1, 1);
        let eps_inv: Array2<c64> = screening
            .inverse_dielectric_ppa(array![0.1, 0.0, 0.0].view(), c64::new(1.0, 0.0), 0.01, 3.0)
            .unwrap();
        assert_eq!(eps_inv, Array2::<c64>::eye(3));
    }

    #[test]
    fn macroscopic_rpa_approaches_one_without_interaction() {
        let system = chain_system(2, chain_g_vectors(), Box::new(ConstantCoulomb(0.0)), false);
        let screening = ScreeningEngine::new(&system, 1, 1);
        let omegas: Array1<f64> = Array1::linspace(0.0, 4.0, 5);
        let epsilon: Array1<c64> = screening.macroscopic_rpa(omegas.view(), 0.05).unwrap();
        for eps in epsilon.iter() {
            assert!((eps - c64::new(1.0, 0.0)).norm() < 1e-12);
        }
    }

    #[test]
    fn macroscopic_rpa_keeps_the_coulomb_head() {
        let omegas: Array1<f64> = Array1::linspace(0.0, 4.0, 5);
        let system = chain_system(4, chain_g_vectors(), Box::new(chain_coulomb()), false);
        let epsilon: Array1<c64> = ScreeningEngine::new(&system, 1, 1)
            .macroscopic_rpa(omegas.view(), 0.05)
            .unwrap();
        assert!(epsilon.iter().all(|eps| eps.norm().is_finite()));
        assert!((epsilon[0] - c64::new(1.0, 0.0)).norm() > 1e-6);

        // a cutoff above q_min^2 removes V(q_min) and with it all macroscopic screening
        let cut = Coulomb::new(&chain_lattice(), Dimensionality::Bulk, 2, 2.0 * Q_MIN * Q_MIN);
        let system = chain_system(4, chain_g_vectors(), Box::new(cut), false);
        let flat: Array1<c64> = ScreeningEngine::new(&system, 1, 1)
            .macroscopic_rpa(omegas.view(), 0.05)
            .unwrap();
        for eps in flat.iter() {
            assert!((eps - c64::new(1.0, 0.0)).norm() < 1e-10);
        }
    }

    #[test]
    fn weak_interaction_gives_macroscopic_rpa_above_one_below_the_gap() {
        let system = chain_system(4, chain_g_vectors(), Box::new(ConstantCoulomb(0.1)), false);
        let screening = ScreeningEngine::new(&system, 1, 1);
        let epsilon: Array1<c64> = screening
            .macroscopic_rpa(array![0.0].view(), 1e-3)
            .unwrap();
        assert!(epsilon[0].re > 1.0);
    }
}
