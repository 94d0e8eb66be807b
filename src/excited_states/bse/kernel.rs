use super::index::KernelIndexTable;
use ndarray::prelude::*;
use ndarray_linalg::c64;
use rayon::prelude::*;

/// W_GG' = eps^-1_GG'(Q, 0) * V(Q + G').
pub fn screened_potential(eps_inv: ArrayView2<c64>, potential: ArrayView1<f64>) -> Array2<c64> {
    let columns: Array2<f64> = potential.insert_axis(Axis(0)).to_owned();
    &eps_inv * &columns.mapv(|v| c64::new(v, 0.0))
}

/// (1 / N_k) conj(left) diag(bare) right^T, with one density per row and one G-vector per
/// column.
pub fn exchange_block(
    left: ArrayView2<c64>,
    right: ArrayView2<c64>,
    bare: ArrayView1<f64>,
    n_k: usize,
) -> Array2<c64> {
    let scale: f64 = 1.0 / n_k as f64;
    let weighted: Array2<c64> =
        left.mapv(|x| x.conj()) * &bare.mapv(|v| c64::new(v * scale, 0.0)).insert_axis(Axis(0));
    weighted.dot(&right.t())
}

/// K[a, b] = (1 / N_k) sum_G left[l(a, b), G] right[r(a, b), G] with the rows l and r taken
/// from the index table. `left` already contains the screened potential.
pub fn contract_kernel(
    left: ArrayView2<c64>,
    right: ArrayView2<c64>,
    table: &KernelIndexTable,
    n_k: usize,
) -> Array2<c64> {
    let m: usize = table.dimension();
    let scale: f64 = 1.0 / n_k as f64;
    let mut kernel: Array2<c64> = Array2::zeros([m, m]);
    kernel
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(a, mut row)| {
            for (b, value) in row.iter_mut().enumerate() {
                let (l, r) = table.rows(a, b);
                *value = scale * left.row(l).dot(&right.row(r));
            }
        });
    kernel
}
