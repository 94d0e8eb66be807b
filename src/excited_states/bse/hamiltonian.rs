use super::index::{ExcitonIndex, KernelIndexTable};
use super::kernel::{contract_kernel, exchange_block, screened_potential};
use crate::excited_states::logging::{print_bse_init, print_hamiltonian_end, print_screening};
use crate::excited_states::screening::ScreeningEngine;
use crate::excited_states::transition_densities::{
    flatten_density, DensityMode, TransitionDensities, TransitionDensityEngine,
};
use crate::initialization::ExcitonSystem;
use crate::utils::{hermitian_part, symmetric_part, Timer};
use derive_builder::Builder;
use ndarray::prelude::*;
use ndarray_linalg::c64;
use tbbse_model::ModelError;

/// Settings of the excitonic Hamiltonian.
#[derive(Builder, Clone, Debug)]
pub struct BseOptions {
    /// Number of valence bands below the Fermi energy.
    pub n_valence: usize,
    /// Number of conduction bands above the Fermi energy.
    pub n_conduction: usize,
    /// Screen the direct interaction with the RPA dielectric matrix.
    #[builder(default = "true")]
    pub screening: bool,
    /// Neglect the coupling between resonant and anti-resonant transitions.
    #[builder(default = "false")]
    pub tamm_dancoff: bool,
    /// Probe frequency of the plasmon-pole model. The static RPA is used if it is not set.
    #[builder(default = "None")]
    pub plasmon_pole: Option<f64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockLayout {
    /// H = [[A, B], [-conj(B), -conj(A)]]
    Combined,
    /// A and B as separate matrices.
    Separated,
}

#[derive(Clone, Debug)]
pub enum BseMatrix {
    Combined(Array2<c64>),
    Separated {
        resonant: Array2<c64>,
        coupling: Array2<c64>,
    },
}

impl BseMatrix {
    /// Dimension N of the resonant block.
    pub fn dimension(&self) -> usize {
        match self {
            BseMatrix::Combined(h) => h.nrows() / 2,
            BseMatrix::Separated { resonant, .. } => resonant.nrows(),
        }
    }

    /// The resonant block A and the coupling block B.
    pub fn blocks(&self) -> (Array2<c64>, Array2<c64>) {
        match self {
            BseMatrix::Combined(h) => {
                let n: usize = h.nrows() / 2;
                (
                    h.slice(s![..n, ..n]).to_owned(),
                    h.slice(s![..n, n..]).to_owned(),
                )
            }
            BseMatrix::Separated { resonant, coupling } => (resonant.clone(), coupling.clone()),
        }
    }

    pub fn combined(&self) -> Array2<c64> {
        match self {
            BseMatrix::Combined(h) => h.clone(),
            BseMatrix::Separated { resonant, coupling } => {
                combine_blocks(resonant.view(), coupling.view())
            }
        }
    }
}

/// [[A, B], [-conj(B), -conj(A)]]
pub fn combine_blocks(resonant: ArrayView2<c64>, coupling: ArrayView2<c64>) -> Array2<c64> {
    let n: usize = resonant.nrows();
    let mut h: Array2<c64> = Array2::zeros([2 * n, 2 * n]);
    h.slice_mut(s![..n, ..n]).assign(&resonant);
    h.slice_mut(s![..n, n..]).assign(&coupling);
    h.slice_mut(s![n.., ..n]).assign(&coupling.mapv(|x| -x.conj()));
    h.slice_mut(s![n.., n..]).assign(&resonant.mapv(|x| -x.conj()));
    h
}

/// The assembled excitonic Hamiltonian at one excitonic momentum.
#[derive(Clone, Debug)]
pub struct BseHamiltonian {
    pub matrix: BseMatrix,
    pub momentum: Array1<f64>,
    /// Resonant densities rho_cv(k, G) in the composite order, shape [N, n_g]. The rows of
    /// spin-flip sectors are zero.
    pub rho_cv: Array2<c64>,
    pub index: ExcitonIndex,
    pub tamm_dancoff: bool,
}

/// Assembles the excitonic Hamiltonian
/// A = diag(dE) + g v - w,  B = g v^c - w^c
/// from the transition densities and the screened interaction.
pub struct BseHamiltonianBuilder<'a> {
    system: &'a ExcitonSystem,
    options: BseOptions,
    densities: TransitionDensityEngine<'a>,
    screening: ScreeningEngine<'a>,
    index: ExcitonIndex,
}

impl<'a> BseHamiltonianBuilder<'a> {
    pub fn new(system: &'a ExcitonSystem, options: BseOptions) -> Self {
        let (nv, nc) = (options.n_valence, options.n_conduction);
        Self {
            system,
            densities: TransitionDensityEngine::new(system, nv, nc),
            screening: ScreeningEngine::new(system, nv, nc),
            index: ExcitonIndex::new(nv, nc, system.n_k(), system.n_spin() == 2),
            options,
        }
    }

    pub fn index(&self) -> ExcitonIndex {
        self.index
    }

    pub fn options(&self) -> &BseOptions {
        &self.options
    }

    /// Resonant densities rho_cv(k, G) at `momentum` in the composite order, shape [N, n_g].
    pub fn resonant_density(&self, momentum: ArrayView1<f64>) -> Result<Array2<c64>, ModelError> {
        let densities: TransitionDensities = self.densities.resonant(momentum)?;
        Ok(self.composite_resonant(&densities))
    }

    pub fn build(
        &self,
        momentum: ArrayView1<f64>,
        eta: f64,
        layout: BlockLayout,
    ) -> Result<BseHamiltonian, ModelError> {
        let timer: Timer = Timer::start();
        print_bse_init(
            momentum,
            self.system.n_k(),
            self.system.n_g(),
            self.options.n_valence,
            self.options.n_conduction,
            self.system.n_spin(),
        );
        let zero: Array1<f64> = Array1::zeros(3);
        let n_k: usize = self.system.n_k();
        let degeneracy: f64 = self.system.spin_degeneracy();

        let resonant_densities: TransitionDensities = self.densities.resonant(momentum)?;
        let eps_inv: Array2<c64> = self.static_screening(&resonant_densities, momentum, eta);
        print_screening(eps_inv.view(), self.system.g0);
        let w_potential: Array2<c64> = screened_potential(
            eps_inv.view(),
            self.system.coulomb_potential(momentum).view(),
        );
        // bare exchange potential V(G)
        let bare: Array1<f64> = self.system.coulomb_potential(zero.view());

        let rho_cv: Array2<c64> = self.composite_resonant(&resonant_densities);
        let energies: Array1<f64> = self.transition_energies(&resonant_densities);
        drop(resonant_densities);

        let mut resonant: Array2<c64> =
            exchange_block(rho_cv.view(), rho_cv.view(), bare.view(), n_k) * degeneracy;
        self.subtract_screened_exchange(&mut resonant, momentum, w_potential.view())?;
        for (a, e) in resonant.diag_mut().iter_mut().zip(energies.iter()) {
            *a += *e;
        }

        let n: usize = self.index.dimension();
        let coupling: Array2<c64> = if self.options.tamm_dancoff {
            Array2::zeros([n, n])
        } else {
            self.coupling_block(momentum, rho_cv.view(), bare.view(), w_potential.view())?
        };

        print_hamiltonian_end(timer, n, self.options.tamm_dancoff);
        let matrix: BseMatrix = match layout {
            BlockLayout::Combined => {
                BseMatrix::Combined(combine_blocks(resonant.view(), coupling.view()))
            }
            BlockLayout::Separated => BseMatrix::Separated { resonant, coupling },
        };
        Ok(BseHamiltonian {
            matrix,
            momentum: momentum.to_owned(),
            rho_cv,
            index: self.index,
            tamm_dancoff: self.options.tamm_dancoff,
        })
    }

    /// eps^-1(Q, omega = 0), the identity if the screening is switched off.
    fn static_screening(
        &self,
        densities: &TransitionDensities,
        momentum: ArrayView1<f64>,
        eta: f64,
    ) -> Array2<c64> {
        let omega: c64 = c64::new(0.0, 0.0);
        match (self.options.screening, self.options.plasmon_pole) {
            (false, _) => Array2::eye(self.system.n_g()),
            (true, None) => self
                .screening
                .inverse_dielectric_from(densities, momentum, omega, eta),
            (true, Some(frequency)) => self
                .screening
                .ppa_from(densities, momentum, omega, eta, frequency),
        }
    }

    /// Resonant densities of the same-spin sectors in the composite order.
    fn composite_resonant(&self, densities: &TransitionDensities) -> Array2<c64> {
        let m: usize = self.index.block_dimension();
        let mut rho: Array2<c64> = Array2::zeros([self.index.dimension(), self.system.n_g()]);
        for sector in self.index.same_spin_sectors() {
            let (spin, _) = self.index.spins(sector);
            let offset: usize = self.index.offset(sector);
            let block: ArrayView5<c64> = densities.cv().slice_move(s![spin..spin + 1, .., .., .., ..]);
            rho.slice_mut(s![offset..offset + m, ..])
                .assign(&flatten_density(block));
        }
        rho
    }

    /// Momentum-reversed densities rho_vc(v, c, k) reordered to the composite order (c, v, k).
    fn composite_coupling(&self, densities: &TransitionDensities) -> Array2<c64> {
        let m: usize = self.index.block_dimension();
        let mut rho: Array2<c64> = Array2::zeros([self.index.dimension(), self.system.n_g()]);
        for sector in self.index.same_spin_sectors() {
            let (spin, _) = self.index.spins(sector);
            let offset: usize = self.index.offset(sector);
            let block: ArrayView5<c64> = densities
                .vc()
                .slice_move(s![spin..spin + 1, .., .., .., ..])
                .permuted_axes([0, 2, 1, 3, 4]);
            rho.slice_mut(s![offset..offset + m, ..])
                .assign(&flatten_density(block));
        }
        rho
    }

    /// eps_c(k) - eps_v(k - Q) with the conduction band of spin_c and the valence band of
    /// spin_v of each sector.
    fn transition_energies(&self, densities: &TransitionDensities) -> Array1<f64> {
        let index: &ExcitonIndex = &self.index;
        let nv: usize = index.n_valence;
        let mut energies: Array1<f64> = Array1::zeros(index.dimension());
        for sector in 0..index.n_sectors {
            let (spin_v, spin_c) = index.spins(sector);
            let offset: usize = index.offset(sector);
            for a in 0..index.block_dimension() {
                let (c, v, k) = index.decompose(a);
                energies[offset + a] = densities.bra_energies[[spin_c, nv + c, k]]
                    - densities.ket_energies[[spin_v, v, k]];
            }
        }
        energies
    }

    /// A -= w with the Hermitian part of
    /// w[(c v k1), (c' v' k2)] = 1 / N_k sum_GG' conj(rho_cc(k1, k2, G)) W_GG' rho_vv(k1 - Q, k2 - Q, G')
    fn subtract_screened_exchange(
        &self,
        resonant: &mut Array2<c64>,
        momentum: ArrayView1<f64>,
        w_potential: ArrayView2<c64>,
    ) -> Result<(), ModelError> {
        let zero: Array1<f64> = Array1::zeros(3);
        let cc_screened: Array2<c64> = {
            let full: TransitionDensities =
                self.densities
                    .compute(momentum, zero.view(), zero.view(), DensityMode::Full)?;
            flatten_density(full.cc()).mapv(|x| x.conj()).dot(&w_potential)
        };
        let vv: Array2<c64> = {
            let full: TransitionDensities =
                self.densities
                    .compute(momentum, momentum, momentum, DensityMode::Full)?;
            flatten_density(full.vv())
        };

        let m: usize = self.index.block_dimension();
        for sector in 0..self.index.n_sectors {
            let table: KernelIndexTable = KernelIndexTable::screened_exchange(&self.index, sector);
            let w: Array2<c64> = contract_kernel(cc_screened.view(), vv.view(), &table, self.index.n_k);
            let offset: usize = self.index.offset(sector);
            let mut block = resonant.slice_mut(s![offset..offset + m, offset..offset + m]);
            block -= &hermitian_part(w.view());
        }
        Ok(())
    }

    /// B = g v^c - w^c with the momentum-reversed densities rho_vc = <v, k + Q| .. |c, k>,
    /// replaced by its symmetric part.
    fn coupling_block(
        &self,
        momentum: ArrayView1<f64>,
        rho_cv: ArrayView2<c64>,
        bare: ArrayView1<f64>,
        w_potential: ArrayView2<c64>,
    ) -> Result<Array2<c64>, ModelError> {
        let zero: Array1<f64> = Array1::zeros(3);
        let reversed: Array1<f64> = -&momentum;
        let n_k: usize = self.index.n_k;

        let rho_tilde: Array2<c64> = {
            let diagonal: TransitionDensities = self.densities.compute(
                momentum,
                reversed.view(),
                zero.view(),
                DensityMode::Diagonal,
            )?;
            self.composite_coupling(&diagonal)
        };
        let mut coupling: Array2<c64> =
            exchange_block(rho_cv, rho_tilde.view(), bare, n_k) * self.system.spin_degeneracy();

        let cv_screened: Array2<c64> = {
            let full: TransitionDensities =
                self.densities
                    .compute(momentum, zero.view(), momentum, DensityMode::Full)?;
            flatten_density(full.cv()).mapv(|x| x.conj()).dot(&w_potential)
        };
        let vc: Array2<c64> = {
            let full: TransitionDensities =
                self.densities
                    .compute(momentum, reversed.view(), zero.view(), DensityMode::Full)?;
            flatten_density(full.vc())
        };

        let m: usize = self.index.block_dimension();
        for sector in 0..self.index.n_sectors {
            let table: KernelIndexTable = KernelIndexTable::coupling(&self.index, sector);
            let w: Array2<c64> = contract_kernel(cv_screened.view(), vc.view(), &table, n_k);
            let row: usize = self.index.offset(sector);
            let column: usize = self.index.offset(self.index.partner(sector));
            let mut block = coupling.slice_mut(s![row..row + m, column..column + m]);
            block -= &w;
        }
        Ok(symmetric_part(coupling.view()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::max_abs_deviation;
    use crate::utils::test_models::*;

    fn options(screening: bool, tamm_dancoff: bool) -> BseOptions {
        BseOptionsBuilder::default()
            .n_valence(1)
            .n_conduction(1)
            .screening(screening)
            .tamm_dancoff(tamm_dancoff)
            .build()
            .unwrap()
    }

    #[test]
    fn unpolarized_dimension_is_not_doubled() {
        init_logger();
        let system = chain_system(3, chain_g_vectors(), Box::new(chain_coulomb()), false);
        let builder = BseHamiltonianBuilder::new(&system, options(true, false));
        let momentum: Array1<f64> = array![1e-3, 0.0, 0.0];
        let hamiltonian = builder
            .build(momentum.view(), 1e-3, BlockLayout::Combined)
            .unwrap();
        assert_eq!(hamiltonian.matrix.dimension(), 3);
        assert_eq!(hamiltonian.matrix.combined().dim(), (6, 6));
        assert_eq!(hamiltonian.rho_cv.dim(), (3, 3));
        let separated = builder
            .build(momentum.view(), 1e-3, BlockLayout::Separated)
            .unwrap();
        let (a, b) = separated.matrix.blocks();
        assert_eq!(a.dim(), (3, 3));
        assert!(max_abs_deviation(
            hamiltonian.matrix.combined().view(),
            combine_blocks(a.view(), b.view()).view()
        ) < 1e-12);
    }

    #[test]
    fn tamm_dancoff_resonant_block_is_hermitian() {
        let system = chain_system(4, chain_g_vectors(), Box::new(chain_coulomb()), false);
        let builder = BseHamiltonianBuilder::new(&system, options(true, true));
        let hamiltonian = builder
            .build(array![0.3, 0.0, 0.0].view(), 1e-2, BlockLayout::Separated)
            .unwrap();
        let (a, b) = hamiltonian.matrix.blocks();
        assert!(approx::abs_diff_eq!(a, a.t().mapv(|x| x.conj()), epsilon = 1e-10));
        assert!(b.iter().all(|x| *x == c64::new(0.0, 0.0)));
    }

    #[test]
    fn coupling_block_is_symmetric() {
        let system = chain_system(3, chain_g_vectors(), Box::new(chain_coulomb()), false);
        let builder = BseHamiltonianBuilder::new(&system, options(true, false));
        let hamiltonian = builder
            .build(array![0.2, 0.0, 0.0].view(), 1e-3, BlockLayout::Separated)
            .unwrap();
        let (_, b) = hamiltonian.matrix.blocks();
        assert!(approx::abs_diff_eq!(b, b.t(), epsilon = 1e-12));
        assert!(b.iter().any(|x| x.norm() > 1e-8));
    }

    #[test]
    fn single_transition_without_interaction() {
        let system = chain_system(1, chain_g_vectors(), Box::new(ConstantCoulomb(0.0)), false);
        let builder = BseHamiltonianBuilder::new(&system, options(false, true));
        let momentum: Array1<f64> = array![1e-4, 0.0, 0.0];
        let hamiltonian = builder
            .build(momentum.view(), 1e-3, BlockLayout::Combined)
            .unwrap();
        let h: Array2<c64> = hamiltonian.matrix.combined();

        let densities = TransitionDensityEngine::new(&system, 1, 1)
            .resonant(momentum.view())
            .unwrap();
        let de: f64 = densities.resonant_energies()[[0, 0, 0, 0]];
        assert!(de > 0.0);
        let reference: Array2<c64> = array![[de, 0.0], [0.0, -de]].mapv(|x| c64::new(x, 0.0));
        assert!(approx::abs_diff_eq!(h, reference, epsilon = 1e-12));
    }

    /// A = dE + g v - w for one transition and a constant interaction.
    #[test]
    fn single_transition_with_interaction_matches_hand_calculation() {
        let coupling_strength: f64 = 0.7;
        let system = chain_system(
            1,
            chain_g_vectors(),
            Box::new(ConstantCoulomb(coupling_strength)),
            false,
        );
        let builder = BseHamiltonianBuilder::new(&system, options(false, true));
        let momentum: Array1<f64> = array![0.05, 0.0, 0.0];
        let zero: Array1<f64> = Array1::zeros(3);
        let hamiltonian = builder
            .build(momentum.view(), 1e-3, BlockLayout::Separated)
            .unwrap();
        let (a, _) = hamiltonian.matrix.blocks();

        let engine = TransitionDensityEngine::new(&system, 1, 1);
        let resonant = engine.resonant(momentum.view()).unwrap();
        let de: f64 = resonant.resonant_energies()[[0, 0, 0, 0]];
        let rho_cv: ArrayView1<c64> = resonant.rho.slice(s![0, 1, 0, 0, ..]);
        let v: f64 = coupling_strength * rho_cv.iter().map(|x| x.norm_sqr()).sum::<f64>();
        let cc = engine
            .compute(momentum.view(), zero.view(), zero.view(), DensityMode::Full)
            .unwrap();
        let vv = engine
            .compute(momentum.view(), momentum.view(), momentum.view(), DensityMode::Full)
            .unwrap();
        let w: c64 = cc
            .rho
            .slice(s![0, 1, 1, 0, ..])
            .iter()
            .zip(vv.rho.slice(s![0, 0, 0, 0, ..]).iter())
            .map(|(c, v)| c.conj() * coupling_strength * v)
            .sum();

        let reference: f64 = de + 2.0 * v - w.re;
        assert!((a[[0, 0]].re - reference).abs() < 1e-10);
        assert!(a[[0, 0]].im.abs() < 1e-12);
    }

    #[test]
    fn spin_flip_sectors_have_no_exchange() {
        let system = chain_system(2, chain_g_vectors(), Box::new(chain_coulomb()), true);
        let builder = BseHamiltonianBuilder::new(&system, options(true, true));
        let hamiltonian = builder
            .build(array![0.1, 0.0, 0.0].view(), 1e-3, BlockLayout::Separated)
            .unwrap();
        let index: ExcitonIndex = hamiltonian.index;
        assert_eq!(index.dimension(), 8);
        let (a, _) = hamiltonian.matrix.blocks();
        let m: usize = index.block_dimension();
        // different sectors only couple through the exchange of same-spin sectors
        for (s1, s2) in itertools::iproduct!(0..4, 0..4) {
            if s1 == s2 || (index.is_same_spin(s1) && index.is_same_spin(s2)) {
                continue;
            }
            let block = a.slice(s![
                index.offset(s1)..index.offset(s1) + m,
                index.offset(s2)..index.offset(s2) + m
            ]);
            assert!(block.iter().all(|x| *x == c64::new(0.0, 0.0)));
        }
        // exchange between the two same-spin sectors
        let cross = a.slice(s![..m, 3 * m..]);
        assert!(cross.iter().any(|x| x.norm() > 1e-10));
        let spin_flip = hamiltonian.rho_cv.slice(s![m..3 * m, ..]);
        assert!(spin_flip.iter().all(|x| *x == c64::new(0.0, 0.0)));
    }
}
