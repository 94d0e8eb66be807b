use crate::initialization::ExcitonSystem;
use ndarray::prelude::*;
use ndarray_linalg::c64;
use rayon::prelude::*;
use tbbse_model::interface::BandStates;
use tbbse_model::ModelError;

/// Selection of the k-point pairs (k1, k2) of the bra and ket states.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DensityMode {
    /// Only k1 = k2, the pair index is the k-point index.
    Diagonal,
    /// All pairs, the pair index is k1 * n_k + k2.
    Full,
}

impl DensityMode {
    pub fn n_pairs(&self, n_k: usize) -> usize {
        match self {
            DensityMode::Diagonal => n_k,
            DensityMode::Full => n_k * n_k,
        }
    }

    /// (k1, k2) of a pair index.
    pub fn k_indices(&self, pair: usize, n_k: usize) -> (usize, usize) {
        match self {
            DensityMode::Diagonal => (pair, pair),
            DensityMode::Full => (pair / n_k, pair % n_k),
        }
    }
}

/// Generalized transition densities
/// rho(s, n1, n2, pair, G) = <n1, k1 - p| exp(i (momentum + G) r) |n2, k2 - q>
/// in the band subset of the valence (0..nv) and conduction (nv..nv+nc) bands.
#[derive(Clone, Debug)]
pub struct TransitionDensities {
    /// Shape [n_spin, n_bands, n_bands, n_pairs, n_g].
    pub rho: Array5<c64>,
    /// eps_n1(bra) - eps_n2(ket) with shape [n_spin, n_bands, n_bands, n_pairs].
    pub energies: Array4<f64>,
    /// Band energies of the bra states per pair, shape [n_spin, n_bands, n_pairs].
    pub bra_energies: Array3<f64>,
    /// Band energies of the ket states per pair, shape [n_spin, n_bands, n_pairs].
    pub ket_energies: Array3<f64>,
    pub n_valence: usize,
    pub mode: DensityMode,
}

impl TransitionDensities {
    pub fn n_pairs(&self) -> usize {
        self.rho.len_of(Axis(3))
    }

    /// Valence (bra) to conduction (ket) block.
    pub fn vc(&self) -> ArrayView5<c64> {
        let nv: usize = self.n_valence;
        self.rho.slice(s![.., ..nv, nv.., .., ..])
    }

    /// Conduction (bra) to valence (ket) block.
    pub fn cv(&self) -> ArrayView5<c64> {
        let nv: usize = self.n_valence;
        self.rho.slice(s![.., nv.., ..nv, .., ..])
    }

    pub fn cc(&self) -> ArrayView5<c64> {
        let nv: usize = self.n_valence;
        self.rho.slice(s![.., nv.., nv.., .., ..])
    }

    pub fn vv(&self) -> ArrayView5<c64> {
        let nv: usize = self.n_valence;
        self.rho.slice(s![.., ..nv, ..nv, .., ..])
    }

    /// eps_c(k1 - p) - eps_v(k2 - q) with shape [n_spin, nc, nv, n_pairs].
    pub fn resonant_energies(&self) -> ArrayView4<f64> {
        let nv: usize = self.n_valence;
        self.energies.slice(s![.., nv.., ..nv, ..])
    }
}

/// Copies a density block into a matrix with one row per (spin, n1, n2, pair) in C order and
/// one column per G-vector.
pub fn flatten_density(block: ArrayView5<c64>) -> Array2<c64> {
    let n_g: usize = block.len_of(Axis(4));
    let n_rows: usize = if n_g == 0 { 0 } else { block.len() / n_g };
    let mut flat: Array2<c64> = Array2::zeros([n_rows, n_g]);
    flat.iter_mut()
        .zip(block.iter())
        .for_each(|(f, value)| *f = *value);
    flat
}

/// Builds the transition densities from the band states of the model.
pub struct TransitionDensityEngine<'a> {
    system: &'a ExcitonSystem,
    n_valence: usize,
    n_conduction: usize,
}

impl<'a> TransitionDensityEngine<'a> {
    pub fn new(system: &'a ExcitonSystem, n_valence: usize, n_conduction: usize) -> Self {
        Self {
            system,
            n_valence,
            n_conduction,
        }
    }

    pub fn n_bands(&self) -> usize {
        self.n_valence + self.n_conduction
    }

    /// Band subsets at all k-points shifted by -shift.
    fn shifted_bandstates(&self, shift: ArrayView1<f64>) -> Result<Vec<BandStates>, ModelError> {
        let k_points: &Array2<f64> = &self.system.k_points;
        (0..k_points.nrows())
            .into_par_iter()
            .map(|ik| {
                let k: Array1<f64> = &k_points.row(ik) - &shift;
                self.system
                    .model
                    .bandstates_subset(k.view(), self.n_valence, self.n_conduction)
            })
            .collect()
    }

    /// exp(i (momentum + G) tau) for every Wannier centre tau, shape [n_spin, n_wann, n_g].
    fn phase_factors(&self, momentum: ArrayView1<f64>) -> Array3<c64> {
        let centres: ArrayView3<f64> = self.system.model.wannier_centers();
        let q_plus_g: Array2<f64> = &self.system.g_vectors + &momentum;
        let (n_spin, n_wann, _) = centres.dim();
        let mut phases: Array3<c64> = Array3::zeros([n_spin, n_wann, q_plus_g.nrows()]);
        for (mut phase, tau) in phases.outer_iter_mut().zip(centres.outer_iter()) {
            let arguments: Array2<f64> = tau.dot(&q_plus_g.t());
            phase.assign(&arguments.mapv(|x| c64::new(0.0, x).exp()));
        }
        phases
    }

    /// Computes rho(s, n1, n2, pair, G) = sum_a conj(psi_bra(n1, a)) exp(i (momentum + G) tau_a)
    /// psi_ket(n2, a), where the bra states are taken at k1 - p and the ket states at k2 - q.
    /// The sum over the orbitals a runs over the basis block of the spin channel s.
    pub fn compute(
        &self,
        momentum: ArrayView1<f64>,
        p: ArrayView1<f64>,
        q: ArrayView1<f64>,
        mode: DensityMode,
    ) -> Result<TransitionDensities, ModelError> {
        let n_k: usize = self.system.n_k();
        let n_g: usize = self.system.n_g();
        let n_spin: usize = self.system.n_spin();
        let n_bands: usize = self.n_bands();
        let n_pairs: usize = mode.n_pairs(n_k);

        let bra_states: Vec<BandStates> = self.shifted_bandstates(p)?;
        let ket_states: Vec<BandStates> = self.shifted_bandstates(q)?;
        let phases: Array3<c64> = self.phase_factors(momentum);
        let n_wann: usize = phases.len_of(Axis(1));

        let mut rho: Array5<c64> = Array5::zeros([n_spin, n_bands, n_bands, n_pairs, n_g]);
        rho.axis_iter_mut(Axis(3))
            .into_par_iter()
            .enumerate()
            .for_each(|(pair, mut rho_pair)| {
                let (k1, k2) = mode.k_indices(pair, n_k);
                let bra: &Array2<c64> = &bra_states[k1].1;
                let ket: &Array2<c64> = &ket_states[k2].1;
                for spin in 0..n_spin {
                    let basis = spin * n_wann..(spin + 1) * n_wann;
                    let bra_adjoint: Array2<c64> =
                        bra.slice(s![basis.clone(), ..]).t().mapv(|x| x.conj());
                    let ket_spin: ArrayView2<c64> = ket.slice(s![basis, ..]);
                    for (ig, phase) in phases.slice(s![spin, .., ..]).axis_iter(Axis(1)).enumerate()
                    {
                        let phased_ket: Array2<c64> = &ket_spin * &phase.insert_axis(Axis(1));
                        rho_pair
                            .slice_mut(s![spin, .., .., ig])
                            .assign(&bra_adjoint.dot(&phased_ket));
                    }
                }
            });

        let mut bra_energies: Array3<f64> = Array3::zeros([n_spin, n_bands, n_pairs]);
        let mut ket_energies: Array3<f64> = Array3::zeros([n_spin, n_bands, n_pairs]);
        for pair in 0..n_pairs {
            let (k1, k2) = mode.k_indices(pair, n_k);
            bra_energies
                .slice_mut(s![.., .., pair])
                .assign(&bra_states[k1].0.slice(s![..n_spin, ..]));
            ket_energies
                .slice_mut(s![.., .., pair])
                .assign(&ket_states[k2].0.slice(s![..n_spin, ..]));
        }
        let energies: Array4<f64> = Array4::from_shape_fn(
            [n_spin, n_bands, n_bands, n_pairs],
            |(s, n1, n2, pair)| bra_energies[[s, n1, pair]] - ket_energies[[s, n2, pair]],
        );

        Ok(TransitionDensities {
            rho,
            energies,
            bra_energies,
            ket_energies,
            n_valence: self.n_valence,
            mode,
        })
    }

    /// Densities rho_cv(k) = <c, k| exp(i (Q + G) r) |v, k - Q> of the resonant transitions.
    pub fn resonant(&self, momentum: ArrayView1<f64>) -> Result<TransitionDensities, ModelError> {
        let zero: Array1<f64> = Array1::zeros(3);
        self.compute(momentum, zero.view(), momentum, DensityMode::Diagonal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_models::*;
    use crate::utils::max_abs_deviation;

    #[test]
    fn zero_momentum_densities_are_overlaps() {
        init_logger();
        let system = chain_system(3, chain_g_vectors(), Box::new(ConstantCoulomb(0.0)), false);
        let engine = TransitionDensityEngine::new(&system, 1, 1);
        let zero: Array1<f64> = Array1::zeros(3);
        let densities = engine
            .compute(zero.view(), zero.view(), zero.view(), DensityMode::Diagonal)
            .unwrap();
        assert_eq!(densities.rho.dim(), (1, 2, 2, 3, 3));
        // G = 0 gives the overlap matrix of the band states
        for k in 0..3 {
            let overlap: Array2<c64> = densities.rho.slice(s![0, .., .., k, 0]).to_owned();
            assert!(approx::abs_diff_eq!(overlap, Array2::<c64>::eye(2), epsilon = 1e-10));
        }
        // the transition energies are positive in the cv block
        assert!(densities.resonant_energies().iter().all(|e| *e > 0.0));
    }

    #[test]
    fn full_mode_contains_the_diagonal_mode() {
        let system = chain_system(3, chain_g_vectors(), Box::new(ConstantCoulomb(0.0)), false);
        let engine = TransitionDensityEngine::new(&system, 1, 1);
        let momentum: Array1<f64> = array![0.2, 0.0, 0.0];
        let zero: Array1<f64> = Array1::zeros(3);
        let diagonal = engine
            .compute(momentum.view(), zero.view(), momentum.view(), DensityMode::Diagonal)
            .unwrap();
        let full = engine
            .compute(momentum.view(), zero.view(), momentum.view(), DensityMode::Full)
            .unwrap();
        assert_eq!(full.n_pairs(), 9);
        for k in 0..3 {
            let from_full = full.rho.slice(s![.., .., .., k * 3 + k, ..]);
            let from_diagonal = diagonal.rho.slice(s![.., .., .., k, ..]);
            assert!(max_abs_deviation(from_full, from_diagonal) < 1e-12);
        }
    }

    #[test]
    fn views_are_slices_of_the_same_tensor() {
        let system = chain_system(2, chain_g_vectors(), Box::new(ConstantCoulomb(0.0)), false);
        let engine = TransitionDensityEngine::new(&system, 1, 1);
        let densities = engine.resonant(array![0.1, 0.0, 0.0].view()).unwrap();
        assert_eq!(densities.cv()[[0, 0, 0, 1, 2]], densities.rho[[0, 1, 0, 1, 2]]);
        assert_eq!(densities.vc()[[0, 0, 0, 0, 1]], densities.rho[[0, 0, 1, 0, 1]]);
        assert_eq!(densities.cc()[[0, 0, 0, 1, 0]], densities.rho[[0, 1, 1, 1, 0]]);
        assert_eq!(densities.vv()[[0, 0, 0, 1, 0]], densities.rho[[0, 0, 0, 1, 0]]);
        let flat: Array2<c64> = flatten_density(densities.cv());
        assert_eq!(flat.dim(), (2, 3));
        assert_eq!(flat[[1, 2]], densities.rho[[0, 1, 0, 1, 2]]);
    }

    /// The coupling density <v, k + Q| exp(i (Q + G) r) |c, k> is the complex conjugate of the
    /// resonant density at the reversed momentum -Q with G -> -G.
    #[test]
    fn momentum_reversal_gives_the_conjugate_density() {
        let system = chain_system(2, chain_g_vectors(), Box::new(ConstantCoulomb(0.0)), false);
        let engine = TransitionDensityEngine::new(&system, 1, 1);
        let momentum: Array1<f64> = array![0.3, 0.0, 0.0];
        let reversed: Array1<f64> = -&momentum;
        let zero: Array1<f64> = Array1::zeros(3);

        let coupling = engine
            .compute(momentum.view(), reversed.view(), zero.view(), DensityMode::Diagonal)
            .unwrap();
        let reversed_resonant = engine.resonant(reversed.view()).unwrap();
        // G list [0, g, -g]
        let minus_g: [usize; 3] = [0, 2, 1];
        for k in 0..2 {
            for (ig, jg) in minus_g.iter().enumerate() {
                let vc: c64 = coupling.vc()[[0, 0, 0, k, ig]];
                let cv: c64 = reversed_resonant.cv()[[0, 0, 0, k, *jg]];
                assert!((vc - cv.conj()).norm() < 1e-12);
            }
        }
        assert!(coupling.vc().iter().any(|x| x.norm() > 1e-3));
    }

    #[test]
    fn polarized_densities_are_computed_per_spin_channel() {
        let system = chain_system(2, chain_g_vectors(), Box::new(ConstantCoulomb(0.0)), true);
        let engine = TransitionDensityEngine::new(&system, 1, 1);
        let densities = engine.resonant(Array1::zeros(3).view()).unwrap();
        assert_eq!(densities.rho.dim(), (2, 2, 2, 2, 3));
        // the spin-down channel is shifted rigidly, the states are the same
        let up = densities.rho.slice(s![0, .., .., .., ..]);
        let down = densities.rho.slice(s![1, .., .., .., ..]);
        let up_abs: Array4<f64> = up.mapv(|x| x.norm());
        let down_abs: Array4<f64> = down.mapv(|x| x.norm());
        assert!(approx::abs_diff_eq!(up_abs, down_abs, epsilon = 1e-10));
        let shift: f64 = densities.bra_energies[[1, 0, 0]] - densities.bra_energies[[0, 0, 0]];
        assert!((shift - 0.1).abs() < 1e-10);
    }
}
