use crate::io::Configuration;
use anyhow::{anyhow, Context, Result};
use log::info;
use ndarray::prelude::*;
use std::path::{Path, PathBuf};
use tbbse_model::points::{g_vectors, k_points_from_spacing, monkhorst_pack, read_k_points, zero_index};
use tbbse_model::{
    BandStructure, Coulomb, CoulombKernel, Lattice, ModelOptions, WannierModel,
};

/// Periodic system for the excitonic calculations. It holds the sampling of the Brillouin zone,
/// the reciprocal lattice vectors that expand the interaction and the two providers of the
/// single particle model and of the bare Coulomb interaction.
pub struct ExcitonSystem {
    /// Cartesian k-points (1/Angstrom) with shape [n_k, 3].
    pub k_points: Array2<f64>,
    /// Cartesian reciprocal lattice vectors (1/Angstrom) with shape [n_g, 3].
    pub g_vectors: Array2<f64>,
    /// Index of the zero vector in `g_vectors`.
    pub g0: usize,
    /// Volume of the unit cell in Angstrom^3.
    pub cell_volume: f64,
    pub model: Box<dyn BandStructure>,
    pub coulomb: Box<dyn CoulombKernel>,
}

impl ExcitonSystem {
    pub fn new(
        k_points: Array2<f64>,
        g_vectors: Array2<f64>,
        cell_volume: f64,
        model: Box<dyn BandStructure>,
        coulomb: Box<dyn CoulombKernel>,
    ) -> Result<Self> {
        if k_points.nrows() == 0 || k_points.ncols() != 3 {
            return Err(anyhow!("at least one k-point with three components is required"));
        }
        let g0: usize = zero_index(g_vectors.view())
            .ok_or_else(|| anyhow!("the list of G-vectors does not contain the zero vector"))?;
        Ok(Self {
            k_points,
            g_vectors,
            g0,
            cell_volume,
            model,
            coulomb,
        })
    }

    /// Sets up the Wannier model, the k- and G-point lists and the Coulomb interaction from the
    /// hr file and the configuration.
    pub fn from_config(hr_file: &str, config: &Configuration) -> Result<Self> {
        let lattice_vectors: Array2<f64> = Array2::from_shape_fn((3, 3), |(i, j)| {
            config.geometry.lattice_vectors[i][j]
        });
        let lattice: Lattice = Lattice::new(lattice_vectors)?;

        let hr_path: &Path = Path::new(hr_file);
        let centres_path: PathBuf = if config.model.centres_file.is_empty() {
            centres_file_for(hr_path)
        } else {
            PathBuf::from(&config.model.centres_file)
        };
        let options = ModelOptions {
            fermi_energy: config.model.fermi_energy,
            scissor: config.model.scissor,
            spin_polarized: config.model.spin_polarized,
        };
        let model: WannierModel =
            WannierModel::from_files(hr_path, &centres_path, &lattice, options)
                .with_context(|| format!("Unable to set up the Wannier model from {}", hr_file))?;

        let shift: Array1<f64> = Array1::from(config.kpoints.shift.to_vec());
        let k_points: Array2<f64> = match (&config.kpoints.file, config.kpoints.spacing) {
            (Some(file), _) => read_k_points(Path::new(file))?,
            (None, Some(spacing)) => k_points_from_spacing(
                &lattice,
                spacing,
                config.geometry.dimension,
                config.geometry.cut_direction,
                shift.view(),
            ),
            (None, None) => monkhorst_pack(&lattice, config.kpoints.grid, shift.view()),
        };
        let g_list: Array2<f64> = g_vectors(
            &lattice,
            config.gvectors.cutoff,
            config.geometry.dimension,
            config.geometry.cut_direction,
        );
        let coulomb = Coulomb::new(
            &lattice,
            config.geometry.dimension,
            config.geometry.cut_direction,
            config.coulomb.min_modulus,
        );

        info!("{:<25} {}", "Number of k-points:", k_points.nrows());
        info!("{:<25} {}", "Number of G-vectors:", g_list.nrows());
        info!("{:<25} {:.4} A^3", "Cell volume:", lattice.volume());

        Self::new(
            k_points,
            g_list,
            lattice.volume(),
            Box::new(model),
            Box::new(coulomb),
        )
    }

    pub fn n_k(&self) -> usize {
        self.k_points.nrows()
    }

    pub fn n_g(&self) -> usize {
        self.g_vectors.nrows()
    }

    pub fn n_spin(&self) -> usize {
        self.model.number_of_spin_channels()
    }

    /// Spin degeneracy of the transitions, 2 for spin-unpolarized and 1 for collinear models.
    pub fn spin_degeneracy(&self) -> f64 {
        if self.n_spin() == 1 {
            2.0
        } else {
            1.0
        }
    }

    /// V(momentum + G) for every G-vector.
    pub fn coulomb_potential(&self, momentum: ArrayView1<f64>) -> Array1<f64> {
        self.g_vectors
            .outer_iter()
            .map(|g| self.coulomb.coulomb((&g + &momentum).view()))
            .collect()
    }

    /// Born-von Karman volume N_k * V_cell.
    pub fn crystal_volume(&self) -> f64 {
        self.n_k() as f64 * self.cell_volume
    }
}

/// seedname_hr.dat -> seedname_centres.xyz
fn centres_file_for(hr_path: &Path) -> PathBuf {
    let name: String = hr_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seedname: &str = name.strip_suffix("_hr.dat").unwrap_or(&name);
    hr_path.with_file_name(format!("{}_centres.xyz", seedname))
}
