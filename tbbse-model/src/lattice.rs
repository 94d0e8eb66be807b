use crate::errors::ModelError;
use ndarray::prelude::*;
use std::f64::consts::PI;

/// Bravais lattice of the crystal. The lattice vectors are stored row-wise in Angstrom.
#[derive(Clone, Debug)]
pub struct Lattice {
    vectors: Array2<f64>,
    reciprocal: Array2<f64>,
    volume: f64,
}

fn cross(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Array1<f64> {
    array![
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0]
    ]
}

impl Lattice {
    pub fn new(vectors: Array2<f64>) -> Result<Self, ModelError> {
        if vectors.dim() != (3, 3) {
            return Err(ModelError::Inconsistent(format!(
                "three lattice vectors with three components are required, got shape {:?}",
                vectors.dim()
            )));
        }
        let a23: Array1<f64> = cross(vectors.row(1), vectors.row(2));
        let signed_volume: f64 = vectors.row(0).dot(&a23);
        if signed_volume.abs() < 1e-12 {
            return Err(ModelError::Inconsistent(String::from(
                "the lattice vectors are linearly dependent",
            )));
        }

        // b_i = 2 pi (a_j x a_k) / V
        let factor: f64 = 2.0 * PI / signed_volume;
        let mut reciprocal: Array2<f64> = Array2::zeros([3, 3]);
        reciprocal.row_mut(0).assign(&(factor * &a23));
        reciprocal
            .row_mut(1)
            .assign(&(factor * &cross(vectors.row(2), vectors.row(0))));
        reciprocal
            .row_mut(2)
            .assign(&(factor * &cross(vectors.row(0), vectors.row(1))));

        Ok(Self {
            vectors,
            reciprocal,
            volume: signed_volume.abs(),
        })
    }

    pub fn vectors(&self) -> ArrayView2<f64> {
        self.vectors.view()
    }

    /// Reciprocal lattice vectors (row-wise) in 1/Angstrom.
    pub fn reciprocal_vectors(&self) -> ArrayView2<f64> {
        self.reciprocal.view()
    }

    /// Volume of the unit cell in Angstrom^3.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Cartesian position of the lattice translation n1 * a1 + n2 * a2 + n3 * a3.
    pub fn to_cartesian(&self, n: ArrayView1<f64>) -> Array1<f64> {
        n.dot(&self.vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reciprocal_vectors_are_dual_to_lattice_vectors() {
        let lattice = Lattice::new(array![[0.0, 2.7, 2.7], [2.7, 0.0, 2.7], [2.7, 2.7, 0.0]])
            .unwrap();
        let products: Array2<f64> = lattice.vectors().dot(&lattice.reciprocal_vectors().t());
        let reference: Array2<f64> = 2.0 * PI * Array2::eye(3);
        assert!(approx::abs_diff_eq!(products, reference, epsilon = 1e-12));
        assert!((lattice.volume() - 2.0 * 2.7_f64.powi(3)).abs() < 1e-10);
    }

    #[test]
    fn degenerate_lattice_is_rejected() {
        let result = Lattice::new(array![[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(result.is_err());
    }
}
