/*!

## Auxiliary functions of the exciton eigensolvers

 */

use ndarray::prelude::*;
use ndarray_linalg::c64;
#[cfg(test)]
use ndarray_rand::rand_distr::Uniform;
#[cfg(test)]
use ndarray_rand::RandomExt;
#[cfg(test)]
use ndarray::Zip;
#[cfg(test)]
use rand::{rngs::StdRng, SeedableRng};
use std::cmp::Ordering;

/// Indices that sort the values by their real part in ascending order.
pub fn argsort_real(values: ArrayView1<c64>) -> Vec<usize> {
    let mut idx = (0..values.len()).collect::<Vec<_>>();
    idx.sort_unstable_by(|&i, &j| {
        values[i]
            .re
            .partial_cmp(&values[j].re)
            .unwrap_or(Ordering::Equal)
    });
    idx
}

pub fn argsort(v: ArrayView1<f64>) -> Vec<usize> {
    let mut idx = (0..v.len()).collect::<Vec<_>>();
    idx.sort_unstable_by(|&i, &j| v[i].partial_cmp(&v[j]).unwrap_or(Ordering::Equal));
    idx
}

pub fn norm(vector: ArrayView1<c64>) -> f64 {
    vector.iter().map(|x| x.norm_sqr()).sum::<f64>().sqrt()
}

/// Scales every column to unit 2-norm. Columns with zero norm are left untouched.
pub fn normalize_columns(mut vectors: ArrayViewMut2<c64>) {
    for mut column in vectors.axis_iter_mut(Axis(1)) {
        let length: f64 = norm(column.view());
        if length > 0.0 {
            column.mapv_inplace(|x| x / length);
        }
    }
}

/// <a|b> with the complex conjugate of the first vector.
pub fn inner_product(a: ArrayView1<c64>, b: ArrayView1<c64>) -> c64 {
    a.iter().zip(b.iter()).map(|(x, y)| x.conj() * y).sum()
}

#[cfg(test)]
fn random_complex(dim: usize, rng: &mut StdRng) -> Array2<c64> {
    let distribution = Uniform::new(-1.0, 1.0);
    let re: Array2<f64> = Array2::random_using((dim, dim), distribution, rng);
    let im: Array2<f64> = Array2::random_using((dim, dim), distribution, rng);
    Zip::from(&re).and(&im).map_collect(|r, i| c64::new(*r, *i))
}

/// Reproducible random blocks of a positive definite excitonic Hamiltonian: a Hermitian A
/// with a dominant positive diagonal and a small complex symmetric B.
#[cfg(test)]
pub fn generate_bse_blocks(dim: usize, coupling: f64, seed: u64) -> (Array2<c64>, Array2<c64>) {
    let mut rng: StdRng = StdRng::seed_from_u64(seed);
    let r: Array2<c64> = random_complex(dim, &mut rng);
    let mut a: Array2<c64> = (&r + &r.t().mapv(|x| x.conj())) * c64::new(0.025, 0.0);
    for (i, value) in a.diag_mut().iter_mut().enumerate() {
        *value += c64::new(2.0 + 0.37 * i as f64, 0.0);
    }
    let r: Array2<c64> = random_complex(dim, &mut rng);
    let b: Array2<c64> = (&r + &r.t()) * c64::new(0.5 * coupling, 0.0);
    (a, b)
}

/// Asserts that two sets of exciton states agree in their energies and, up to a phase, in
/// their eigenvectors.
#[cfg(test)]
pub fn test_exciton_states(
    reference: (ArrayView1<f64>, ArrayView2<c64>),
    states: (ArrayView1<f64>, ArrayView2<c64>),
    number: usize,
) {
    let (ref_energies, ref_vectors) = reference;
    let (energies, vectors) = states;
    for i in 0..number {
        assert!(approx::relative_eq!(
            ref_energies[i],
            energies[i],
            epsilon = 1e-8,
            max_relative = 1e-8
        ));
        let overlap: f64 = inner_product(ref_vectors.column(i), vectors.column(i)).norm();
        assert!(approx::relative_eq!(overlap, 1.0, epsilon = 1e-6));
    }
}
