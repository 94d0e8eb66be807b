//! Small tight-binding models that are built in memory for the unit tests.
use crate::initialization::ExcitonSystem;
use ndarray::prelude::*;
use ndarray_linalg::c64;
use std::f64::consts::PI;
use tbbse_model::defaults::MIN_MOMENTUM_MODULUS;
use tbbse_model::points::monkhorst_pack;
use tbbse_model::wannier::HoppingBlock;
use tbbse_model::{
    Coulomb, CoulombKernel, Dimensionality, Lattice, ModelOptions, WannierModel,
};

pub const CHAIN_LATTICE_CONSTANT: f64 = 3.0;

/// Coulomb interaction that does not depend on the momentum.
pub struct ConstantCoulomb(pub f64);

impl CoulombKernel for ConstantCoulomb {
    fn coulomb(&self, _q: ArrayView1<f64>) -> f64 {
        self.0
    }
}

pub fn chain_lattice() -> Lattice {
    Lattice::new(Array2::<f64>::eye(3) * CHAIN_LATTICE_CONSTANT).unwrap()
}

/// Length of the first reciprocal lattice vector of the chain.
pub fn chain_reciprocal_length() -> f64 {
    2.0 * PI / CHAIN_LATTICE_CONSTANT
}

/// Two orbitals per cell along x with on-site energies -1 + shift and 1 + shift, an intra-cell
/// hopping of 0.5 and an inter-cell hopping of 0.25.
fn chain_block(shift: f64) -> HoppingBlock {
    let cells: Array2<f64> = array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]];
    let mut hoppings: Array3<c64> = Array3::zeros([3, 2, 2]);
    hoppings[[0, 0, 0]] = c64::new(-1.0 + shift, 0.0);
    hoppings[[0, 1, 1]] = c64::new(1.0 + shift, 0.0);
    hoppings[[0, 0, 1]] = c64::new(0.5, 0.0);
    hoppings[[0, 1, 0]] = c64::new(0.5, 0.0);
    hoppings[[1, 1, 0]] = c64::new(0.25, 0.0);
    hoppings[[2, 0, 1]] = c64::new(0.25, 0.0);
    HoppingBlock {
        n_wann: 2,
        cells,
        weights: Array1::ones(3),
        hoppings,
    }
}

fn chain_centres(n_spin: usize) -> Array3<f64> {
    let mut centres: Array3<f64> = Array3::zeros([n_spin, 2, 3]);
    for mut channel in centres.outer_iter_mut() {
        channel[[1, 0]] = 0.5 * CHAIN_LATTICE_CONSTANT;
    }
    centres
}

/// Spin-unpolarized chain with one valence and one conduction band.
pub fn two_band_chain(scissor: f64) -> WannierModel {
    let options = ModelOptions {
        fermi_energy: 0.0,
        scissor,
        spin_polarized: false,
    };
    WannierModel::new(&chain_lattice(), &[chain_block(0.0)], chain_centres(1), options).unwrap()
}

/// Collinear chain whose spin-down channel is rigidly shifted by `splitting`.
pub fn polarized_chain(splitting: f64) -> WannierModel {
    let options = ModelOptions {
        fermi_energy: 0.0,
        scissor: 0.0,
        spin_polarized: true,
    };
    WannierModel::new(
        &chain_lattice(),
        &[chain_block(0.0), chain_block(splitting)],
        chain_centres(2),
        options,
    )
    .unwrap()
}

pub fn chain_coulomb() -> Coulomb {
    Coulomb::new(&chain_lattice(), Dimensionality::Bulk, 2, MIN_MOMENTUM_MODULUS)
}

/// G-vectors 0, b1 and -b1.
pub fn chain_g_vectors() -> Array2<f64> {
    let b: f64 = chain_reciprocal_length();
    array![[0.0, 0.0, 0.0], [b, 0.0, 0.0], [-b, 0.0, 0.0]]
}

/// Chain sampled with `n_k` k-points along x.
pub fn chain_system(
    n_k: usize,
    g_vectors: Array2<f64>,
    coulomb: Box<dyn CoulombKernel>,
    polarized: bool,
) -> ExcitonSystem {
    let lattice: Lattice = chain_lattice();
    let k_points: Array2<f64> = monkhorst_pack(&lattice, [n_k, 1, 1], Array1::zeros(3).view());
    let model: WannierModel = if polarized {
        polarized_chain(0.1)
    } else {
        two_band_chain(0.0)
    };
    ExcitonSystem::new(k_points, g_vectors, lattice.volume(), Box::new(model), coulomb).unwrap()
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
