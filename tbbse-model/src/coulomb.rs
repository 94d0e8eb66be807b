use crate::defaults::COULOMB_CONSTANT;
use crate::interface::CoulombKernel;
use crate::lattice::Lattice;
use ndarray::prelude::*;
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::f64::consts::PI;

/// Periodicity of the material. Slabs are periodic in two directions and truncated along the
/// lattice vector given by the cut direction.
#[derive(Serialize_repr, Deserialize_repr, Copy, Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum Dimensionality {
    Slab = 2,
    Bulk = 3,
}

/// Bare Coulomb interaction v(q) = 4 pi e^2 / (V |q|^2) with an optional slab truncation.
#[derive(Clone, Debug)]
pub struct Coulomb {
    dimensionality: Dimensionality,
    /// Squared momentum below which the interaction is set to zero.
    min_modulus: f64,
    /// 4 pi e^2 / (4 pi eps_0) / V_cell in eV * Angstrom^2.
    prefactor: f64,
    /// Unit vector along the truncated lattice direction.
    cut_axis: Array1<f64>,
    /// Length of the cell along the truncated direction.
    slab_length: f64,
}

impl Coulomb {
    pub fn new(
        lattice: &Lattice,
        dimensionality: Dimensionality,
        cut_direction: usize,
        min_modulus: f64,
    ) -> Self {
        let vectors: ArrayView2<f64> = lattice.vectors();
        let a_cut: ArrayView1<f64> = vectors.row(cut_direction.min(2));
        let slab_length: f64 = a_cut.dot(&a_cut).sqrt();
        Self {
            dimensionality,
            min_modulus,
            prefactor: 4.0 * PI * COULOMB_CONSTANT / lattice.volume(),
            cut_axis: &a_cut / slab_length,
            slab_length,
        }
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    /// Truncation factor of the slab geometry (S. Ismail-Beigi, PRB 73, 233103 (2006)).
    fn slab_factor(&self, q: ArrayView1<f64>) -> f64 {
        let q_z: f64 = q.dot(&self.cut_axis);
        let q_plane: Array1<f64> = &q - &(q_z * &self.cut_axis);
        let q_par: f64 = q_plane.dot(&q_plane).sqrt();
        let half_length: f64 = 0.5 * self.slab_length;

        // For q_par -> 0 the sine term vanishes on the reciprocal lattice of the slab.
        if q_par * q_par < self.min_modulus {
            return 1.0 - (q_z * half_length).cos();
        }
        1.0 + (-q_par * half_length).exp()
            * ((q_z / q_par) * (q_z * half_length).sin() - (q_z * half_length).cos())
    }
}

impl CoulombKernel for Coulomb {
    fn coulomb(&self, q: ArrayView1<f64>) -> f64 {
        let modulus: f64 = q.dot(&q);
        if modulus < self.min_modulus {
            return 0.0;
        }
        let bulk: f64 = self.prefactor / modulus;
        match self.dimensionality {
            Dimensionality::Bulk => bulk,
            Dimensionality::Slab => bulk * self.slab_factor(q),
        }
    }
}
