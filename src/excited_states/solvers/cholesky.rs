use super::utils::{inner_product, norm};
use super::{BseSolver, BseSolverError, ExcitonStates};
use crate::constants::{DEGENERACY_TOLERANCE, LINEAR_DEPENDENCE_THRESHOLD};
use crate::excited_states::bse::{BlockLayout, BseHamiltonian};
use crate::excited_states::logging::print_solver;
use crate::utils::{symmetric_part, Timer};
use log::debug;
use ndarray::prelude::*;
use ndarray_linalg::{c64, Cholesky, SVD, UPLO};

/// Structure preserving solver for H = [[A, B], [-conj(B), -conj(A)]] with a positive definite
/// [[A, B], [conj(B), conj(A)]].
///
/// The real symmetric form
/// M = [[Re(A + B), -Im(A - B)], [Im(A + B), Re(A - B)]] = L L^T
/// turns the eigenvalue problem into the singular value decomposition of the antisymmetric
/// W = L^T J^T L with J = [[0, I], [-I, 0]]. Every excitation energy appears as a pair of
/// equal singular values.
#[derive(Copy, Clone, Debug)]
pub struct CholeskySolver {
    /// Relative distance of singular values that belong to the same energy level.
    pub degeneracy_tolerance: f64,
    /// Residual norm below which a vector of a degenerate level is dropped.
    pub linear_dependence: f64,
}

impl Default for CholeskySolver {
    fn default() -> Self {
        Self {
            degeneracy_tolerance: DEGENERACY_TOLERANCE,
            linear_dependence: LINEAR_DEPENDENCE_THRESHOLD,
        }
    }
}

impl CholeskySolver {
    fn real_form(&self, a: ArrayView2<c64>, b: ArrayView2<c64>) -> Array2<f64> {
        let n: usize = a.nrows();
        let sum: Array2<c64> = &a + &b;
        let difference: Array2<c64> = &a - &b;
        let mut m: Array2<f64> = Array2::zeros([2 * n, 2 * n]);
        m.slice_mut(s![..n, ..n]).assign(&sum.mapv(|x| x.re));
        m.slice_mut(s![..n, n..]).assign(&difference.mapv(|x| -x.im));
        m.slice_mut(s![n.., ..n]).assign(&sum.mapv(|x| x.im));
        m.slice_mut(s![n.., n..]).assign(&difference.mapv(|x| x.re));
        symmetric_part(m.view())
    }

    /// [X; Y] of the pair of singular vectors (beta, gamma) with W gamma = E beta and
    /// W beta = -E gamma, normalized to unit length.
    fn exciton_vector(
        l: ArrayView2<f64>,
        jt_l: ArrayView2<f64>,
        beta: ArrayView1<f64>,
        gamma: ArrayView1<f64>,
    ) -> Array1<c64> {
        let n: usize = l.nrows() / 2;
        let p: Array1<f64> = jt_l.dot(&gamma);
        let q: Array1<f64> = l.dot(&beta);
        let mut vector: Array1<c64> = Array1::zeros(2 * n);
        for i in 0..n {
            let p_i: c64 = c64::new(p[i], p[n + i]);
            let q_i: c64 = c64::new(q[i], q[n + i]);
            vector[i] = (p_i + q_i) * 0.5;
            vector[n + i] = ((p_i - q_i) * 0.5).conj();
        }
        let length: f64 = norm(vector.view());
        vector.mapv(|x| x / length)
    }

    /// Pivoted Gram-Schmidt orthogonalization of the candidate vectors of one energy level.
    /// At most `keep` vectors are returned.
    fn orthogonalize(&self, mut candidates: Vec<Array1<c64>>, keep: usize) -> Vec<Array1<c64>> {
        let mut accepted: Vec<Array1<c64>> = Vec::with_capacity(keep);
        while accepted.len() < keep && !candidates.is_empty() {
            let (pivot, length): (usize, f64) = candidates
                .iter()
                .map(|c| norm(c.view()))
                .enumerate()
                .fold((0, -1.0), |best, (i, l)| if l > best.1 { (i, l) } else { best });
            if length < self.linear_dependence {
                break;
            }
            let chosen: Array1<c64> = candidates.swap_remove(pivot).mapv(|x| x / length);
            for candidate in candidates.iter_mut() {
                let projection: c64 = inner_product(chosen.view(), candidate.view());
                candidate.scaled_add(-projection, &chosen);
            }
            accepted.push(chosen);
        }
        accepted
    }
}

impl BseSolver for CholeskySolver {
    fn mode(&self) -> &'static str {
        "cholesky"
    }

    fn layout(&self) -> BlockLayout {
        BlockLayout::Separated
    }

    fn solve(&self, hamiltonian: &BseHamiltonian) -> Result<ExcitonStates, BseSolverError> {
        let timer: Timer = Timer::start();
        let (a, b) = hamiltonian.matrix.blocks();
        let n: usize = a.nrows();

        let m: Array2<f64> = self.real_form(a.view(), b.view());
        let l: Array2<f64> =
            m.cholesky(UPLO::Lower)
                .map_err(|_| BseSolverError::NotPositiveDefinite {
                    momentum: hamiltonian.momentum.clone(),
                    mode: self.mode(),
                })?;
        // J^T L = [[-L_lower], [L_upper]]
        let mut jt_l: Array2<f64> = Array2::zeros([2 * n, 2 * n]);
        jt_l.slice_mut(s![..n, ..])
            .assign(&l.slice(s![n.., ..]).mapv(|x| -x));
        jt_l.slice_mut(s![n.., ..]).assign(&l.slice(s![..n, ..]));
        let w: Array2<f64> = l.t().dot(&jt_l);

        let svd_error = |message: String| BseSolverError::SvdFailed {
            momentum: hamiltonian.momentum.clone(),
            mode: self.mode(),
            message,
        };
        let (u, sigma, vt) = w.svd(true, true).map_err(|err| svd_error(err.to_string()))?;
        let (u, vt): (Array2<f64>, Array2<f64>) = match (u, vt) {
            (Some(u), Some(vt)) => (u, vt),
            _ => return Err(svd_error(String::from("no singular vectors were computed"))),
        };

        // singular values are returned in descending order
        let ascending: Vec<usize> = (0..sigma.len()).rev().collect();
        let mut energies: Vec<f64> = Vec::with_capacity(n);
        let mut vectors: Vec<Array1<c64>> = Vec::with_capacity(n);
        let mut start: usize = 0;
        while start < ascending.len() && energies.len() < n {
            let level: f64 = sigma[ascending[start]];
            let tolerance: f64 = self.degeneracy_tolerance * level.abs().max(1.0);
            let mut end: usize = start + 1;
            while end < ascending.len() && (sigma[ascending[end]] - level).abs() <= tolerance {
                end += 1;
            }
            let group: &[usize] = &ascending[start..end];
            let candidates: Vec<Array1<c64>> = group
                .iter()
                .map(|i| Self::exciton_vector(l.view(), jt_l.view(), u.column(*i), vt.row(*i)))
                .collect();
            let keep: usize = (group.len() / 2).max(1);
            let energy: f64 =
                group.iter().map(|i| sigma[*i]).sum::<f64>() / group.len() as f64;
            let accepted: Vec<Array1<c64>> = self.orthogonalize(candidates, keep);
            if accepted.len() < keep {
                debug!(
                    "{: <25} {:.8} ({} of {} vectors)",
                    "dependent level:",
                    energy,
                    accepted.len(),
                    keep
                );
            }
            for vector in accepted.into_iter().take(n - energies.len()) {
                energies.push(energy);
                vectors.push(vector);
            }
            start = end;
        }

        let mut eigenvectors: Array2<c64> = Array2::zeros([2 * n, vectors.len()]);
        for (mut column, vector) in eigenvectors.axis_iter_mut(Axis(1)).zip(vectors.iter()) {
            column.assign(vector);
        }
        print_solver(self.mode(), energies.len(), timer);
        Ok(ExcitonStates {
            energies: Array1::from(energies),
            eigenvectors,
        })
    }
}
