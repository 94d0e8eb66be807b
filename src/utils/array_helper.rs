use ndarray::prelude::*;
use ndarray::LinalgScalar;
use ndarray_linalg::c64;
use ndarray_stats::QuantileExt;

/// (M + M^H) / 2
pub fn hermitian_part(matrix: ArrayView2<c64>) -> Array2<c64> {
    let adjoint: Array2<c64> = matrix.t().mapv(|x| x.conj());
    (&matrix + &adjoint).mapv(|x| 0.5 * x)
}

/// (M + M^T) / 2
pub fn symmetric_part<A: LinalgScalar>(matrix: ArrayView2<A>) -> Array2<A> {
    let two: A = A::one() + A::one();
    (&matrix + &matrix.t()).mapv(|x| x / two)
}

/// Largest element-wise distance |a_ij - b_ij| of two complex arrays of the same shape.
pub fn max_abs_deviation<D: Dimension>(a: ArrayView<c64, D>, b: ArrayView<c64, D>) -> f64 {
    let deviation: Array<f64, D> = (&a - &b).mapv(|x| x.norm());
    if deviation.is_empty() {
        return 0.0;
    }
    *deviation.max_skipnan()
}
