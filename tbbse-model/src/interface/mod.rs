use crate::errors::ModelError;
use ndarray::prelude::*;
use ndarray_linalg::c64;

/// Band energies with shape [2, n_bands] (one row per spin channel, the row is duplicated for
/// spin-unpolarized models) and band eigenvectors with shape [basis_dimension, n_bands].
pub type BandStates = (Array2<f64>, Array2<c64>);

/// Interface to an electronic-structure model that provides the single particle states at
/// arbitrary k-points. The excitonic part of the program only relies on this trait.
pub trait BandStructure: Sync {
    /// Returns all band energies (ascending) and eigenvectors at the Cartesian k-point `k`.
    fn bandstates(&self, k: ArrayView1<f64>) -> Result<BandStates, ModelError>;

    /// Returns `n_valence` valence bands (starting from the highest one, descending in energy)
    /// followed by `n_conduction` conduction bands (ascending in energy). The scissor shift is
    /// already applied to the conduction energies.
    fn bandstates_subset(
        &self,
        k: ArrayView1<f64>,
        n_valence: usize,
        n_conduction: usize,
    ) -> Result<BandStates, ModelError>;

    /// Cartesian positions of the Wannier centres with shape [n_spin, n_wann, 3].
    fn wannier_centers(&self) -> ArrayView3<f64>;

    /// Dimension of the tight-binding basis (n_spin * n_wann).
    fn basis_dimension(&self) -> usize;

    /// Number of distinct spin channels, 1 for spin-unpolarized and 2 for collinear models.
    fn number_of_spin_channels(&self) -> usize;

    fn fermi_energy(&self) -> f64;
}

/// The long-range bare Coulomb interaction as a function of the momentum transfer.
pub trait CoulombKernel: Sync {
    /// Returns v(q) in eV for the Cartesian momentum `q` (1/Angstrom). Vanishes below the
    /// minimum-momentum cutoff.
    fn coulomb(&self, q: ArrayView1<f64>) -> f64;
}
