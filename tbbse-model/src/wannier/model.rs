use crate::errors::ModelError;
use crate::interface::{BandStates, BandStructure};
use crate::lattice::Lattice;
use crate::wannier::reader::{read_centres_file, read_hr_file, HoppingBlock};
use log::info;
use ndarray::prelude::*;
use ndarray_linalg::{c64, Eigh, UPLO};
use std::path::Path;

/// Settings of the single particle model that are not part of the Wannier90 files.
#[derive(Copy, Clone, Debug)]
pub struct ModelOptions {
    /// Bands with energies below or equal to the Fermi energy in all spin channels are valence
    /// bands.
    pub fermi_energy: f64,
    /// Rigid shift of the conduction band energies in eV.
    pub scissor: f64,
    /// Collinear spin-polarized model with one Hamiltonian per spin channel.
    pub spin_polarized: bool,
}

/// Tight-binding model in a basis of Wannier functions.
/// H_s(k) = sum_R exp(i k.R) H_s(R) / w_R for every spin channel s.
#[derive(Clone, Debug)]
pub struct WannierModel {
    n_wann: usize,
    n_spin: usize,
    /// Cartesian lattice translations R with shape [n_rpts, 3].
    translations: Array2<f64>,
    /// H_s(R) / w_R with shape [n_spin, n_rpts, n_wann, n_wann].
    hoppings: Array4<c64>,
    /// Wannier centres with shape [n_spin, n_wann, 3].
    centres: Array3<f64>,
    options: ModelOptions,
}

impl WannierModel {
    /// Creates the model from the hopping blocks of each spin channel. All channels must share
    /// the same Wigner-Seitz points.
    pub fn new(
        lattice: &Lattice,
        blocks: &[HoppingBlock],
        centres: Array3<f64>,
        options: ModelOptions,
    ) -> Result<Self, ModelError> {
        let n_spin: usize = if options.spin_polarized { 2 } else { 1 };
        if blocks.len() < n_spin {
            return Err(ModelError::Inconsistent(format!(
                "{} Hamiltonian blocks are required, {} were found",
                n_spin,
                blocks.len()
            )));
        }
        let reference: &HoppingBlock = &blocks[0];
        let n_wann: usize = reference.n_wann;
        let n_rpts: usize = reference.cells.nrows();
        for block in blocks.iter().take(n_spin) {
            if block.n_wann != n_wann || block.cells != reference.cells {
                return Err(ModelError::Inconsistent(String::from(
                    "the spin channels differ in the number of Wannier functions or in the lattice translations",
                )));
            }
        }
        if centres.dim() != (n_spin, n_wann, 3) {
            return Err(ModelError::Inconsistent(format!(
                "expected Wannier centres of shape {:?}, got {:?}",
                (n_spin, n_wann, 3),
                centres.dim()
            )));
        }

        let translations: Array2<f64> = reference.cells.dot(&lattice.vectors());
        let mut hoppings: Array4<c64> = Array4::zeros([n_spin, n_rpts, n_wann, n_wann]);
        for (mut h_spin, block) in hoppings.outer_iter_mut().zip(blocks.iter()) {
            for (mut h_r, (h_block, w)) in h_spin
                .outer_iter_mut()
                .zip(block.hoppings.outer_iter().zip(block.weights.iter()))
            {
                h_r.assign(&h_block.mapv(|x| x / *w));
            }
        }

        info!(
            "{:<25} {} Wannier functions, {} lattice translations, {} spin channel(s)",
            "Tight-binding model:", n_wann, n_rpts, n_spin
        );
        Ok(Self {
            n_wann,
            n_spin,
            translations,
            hoppings,
            centres,
            options,
        })
    }

    /// Reads the model from the Wannier90 hr and centres files.
    pub fn from_files(
        hr_file: &Path,
        centres_file: &Path,
        lattice: &Lattice,
        options: ModelOptions,
    ) -> Result<Self, ModelError> {
        let blocks: Vec<HoppingBlock> = read_hr_file(hr_file)?;
        let n_spin: usize = if options.spin_polarized { 2 } else { 1 };
        let n_wann: usize = blocks[0].n_wann;
        let centres: Array3<f64> = read_centres_file(centres_file, n_wann, n_spin)?;
        Self::new(lattice, &blocks, centres, options)
    }

    pub fn number_of_wannier_functions(&self) -> usize {
        self.n_wann
    }

    /// Fourier transform of the hopping matrices of spin channel `spin` to the k-point `k`.
    pub fn hamiltonian(&self, spin: usize, k: ArrayView1<f64>) -> Array2<c64> {
        let mut h_k: Array2<c64> = Array2::zeros([self.n_wann, self.n_wann]);
        for (h_r, r) in self
            .hoppings
            .slice(s![spin, .., .., ..])
            .outer_iter()
            .zip(self.translations.outer_iter())
        {
            let phase: c64 = c64::new(0.0, k.dot(&r)).exp();
            h_k.scaled_add(phase, &h_r);
        }
        h_k
    }

    /// Number of bands below or equal to the Fermi energy in all spin channels.
    fn number_of_valence_bands(&self, energies: ArrayView2<f64>) -> usize {
        energies
            .axis_iter(Axis(1))
            .filter(|e| e.iter().all(|x| *x <= self.options.fermi_energy))
            .count()
    }
}

impl BandStructure for WannierModel {
    fn bandstates(&self, k: ArrayView1<f64>) -> Result<BandStates, ModelError> {
        let mut energies: Array2<f64> = Array2::zeros([2, self.n_wann]);
        let mut states: Array2<c64> = Array2::zeros([self.basis_dimension(), self.n_wann]);

        for spin in 0..self.n_spin {
            let (e, v): (Array1<f64>, Array2<c64>) = self
                .hamiltonian(spin, k)
                .eigh(UPLO::Lower)
                .map_err(|err| ModelError::Diagonalization(err.to_string()))?;
            energies.row_mut(spin).assign(&e);
            states
                .slice_mut(s![spin * self.n_wann..(spin + 1) * self.n_wann, ..])
                .assign(&v);
        }
        // Both rows are used by the callers, the unpolarized case carries the same energies.
        if self.n_spin == 1 {
            let first: Array1<f64> = energies.row(0).to_owned();
            energies.row_mut(1).assign(&first);
        }
        Ok((energies, states))
    }

    fn bandstates_subset(
        &self,
        k: ArrayView1<f64>,
        n_valence: usize,
        n_conduction: usize,
    ) -> Result<BandStates, ModelError> {
        let (energies, states): BandStates = self.bandstates(k)?;
        let n_occ: usize = self.number_of_valence_bands(energies.view());
        if n_valence > n_occ || n_conduction > self.n_wann - n_occ {
            return Err(ModelError::BandSelection {
                requested_valence: n_valence,
                requested_conduction: n_conduction,
                available_valence: n_occ,
                available_conduction: self.n_wann - n_occ,
            });
        }

        // valence bands from the top of the valence band downwards, then conduction bands
        // from the bottom of the conduction band upwards
        let indices: Vec<usize> = (0..n_valence)
            .map(|i| n_occ - 1 - i)
            .chain((0..n_conduction).map(|i| n_occ + i))
            .collect();
        let mut subset_energies: Array2<f64> = energies.select(Axis(1), &indices);
        subset_energies
            .slice_mut(s![.., n_valence..])
            .mapv_inplace(|e| e + self.options.scissor);
        let subset_states: Array2<c64> = states.select(Axis(1), &indices);
        Ok((subset_energies, subset_states))
    }

    fn wannier_centers(&self) -> ArrayView3<f64> {
        self.centres.view()
    }

    fn basis_dimension(&self) -> usize {
        self.n_spin * self.n_wann
    }

    fn number_of_spin_channels(&self) -> usize {
        self.n_spin
    }

    fn fermi_energy(&self) -> f64 {
        self.options.fermi_energy
    }
}
