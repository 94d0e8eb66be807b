use super::utils::{argsort, argsort_real, normalize_columns};
use super::{BseSolver, BseSolverError, ExcitonStates};
use crate::excited_states::bse::{BlockLayout, BseHamiltonian, ExcitonIndex};
use crate::excited_states::logging::print_solver;
use crate::utils::Timer;
use log::debug;
use ndarray::prelude::*;
use ndarray_linalg::{c64, Eig};

/// Full diagonalization of the non-Hermitian H = [[A, B], [-conj(B), -conj(A)]].
#[derive(Copy, Clone, Debug, Default)]
pub struct DirectSolver;

impl DirectSolver {
    /// Eigenpairs of the upper (positive) half of the spectrum of `h`.
    fn diagonalize(
        &self,
        h: &Array2<c64>,
        momentum: &Array1<f64>,
    ) -> Result<(Array1<f64>, Array2<c64>), BseSolverError> {
        let n: usize = h.nrows() / 2;
        let (values, vectors): (Array1<c64>, Array2<c64>) =
            h.eig().map_err(|err| BseSolverError::EigFailed {
                momentum: momentum.clone(),
                mode: self.mode(),
                message: err.to_string(),
            })?;
        let upper: Vec<usize> = argsort_real(values.view()).split_off(n);
        let max_imaginary: f64 = upper
            .iter()
            .map(|i| values[*i].im.abs())
            .fold(0.0, f64::max);
        debug!("{: <25} {:.3e}", "max. |Im(E)|:", max_imaginary);

        let energies: Array1<f64> = upper.iter().map(|i| values[*i].re).collect();
        let mut states: Array2<c64> = vectors.select(Axis(1), &upper);
        normalize_columns(states.view_mut());
        Ok((energies, states))
    }

    /// Rows of the resonant and anti-resonant blocks that belong to the given spin sectors.
    fn sector_rows(index: &ExcitonIndex, sectors: &[usize]) -> Vec<usize> {
        let n: usize = index.dimension();
        let m: usize = index.block_dimension();
        let resonant: Vec<usize> = sectors
            .iter()
            .flat_map(|s| index.offset(*s)..index.offset(*s) + m)
            .collect();
        resonant
            .iter()
            .copied()
            .chain(resonant.iter().map(|r| r + n))
            .collect()
    }

    /// The sectors {(up, up), (down, down)} and {(up, down), (down, up)} do not couple and
    /// are diagonalized separately.
    fn solve_polarized(
        &self,
        h: &Array2<c64>,
        index: &ExcitonIndex,
        momentum: &Array1<f64>,
    ) -> Result<(Array1<f64>, Array2<c64>), BseSolverError> {
        let n: usize = index.dimension();
        let same_spin: Vec<usize> = vec![index.sector(0, 0), index.sector(1, 1)];
        let spin_flip: Vec<usize> = vec![index.sector(0, 1), index.sector(1, 0)];

        let mut energies: Vec<f64> = Vec::with_capacity(n);
        let mut columns: Vec<Array1<c64>> = Vec::with_capacity(n);
        for sectors in [same_spin, spin_flip].iter() {
            let rows: Vec<usize> = Self::sector_rows(index, sectors);
            let sub: Array2<c64> = h.select(Axis(0), &rows).select(Axis(1), &rows);
            let (e, v) = self.diagonalize(&sub, momentum)?;
            for (energy, column) in e.iter().zip(v.axis_iter(Axis(1))) {
                let mut full: Array1<c64> = Array1::zeros(2 * n);
                for (row, value) in rows.iter().zip(column.iter()) {
                    full[*row] = *value;
                }
                energies.push(*energy);
                columns.push(full);
            }
        }

        let order: Vec<usize> = argsort(Array1::from(energies.clone()).view());
        let mut vectors: Array2<c64> = Array2::zeros([2 * n, order.len()]);
        for (mut target, idx) in vectors.axis_iter_mut(Axis(1)).zip(order.iter()) {
            target.assign(&columns[*idx]);
        }
        let sorted: Array1<f64> = order.iter().map(|i| energies[*i]).collect();
        Ok((sorted, vectors))
    }
}

impl BseSolver for DirectSolver {
    fn mode(&self) -> &'static str {
        "direct"
    }

    fn layout(&self) -> BlockLayout {
        BlockLayout::Combined
    }

    fn solve(&self, hamiltonian: &BseHamiltonian) -> Result<ExcitonStates, BseSolverError> {
        let timer: Timer = Timer::start();
        let h: Array2<c64> = hamiltonian.matrix.combined();
        let (energies, eigenvectors) = if hamiltonian.index.spin_polarized() {
            self.solve_polarized(&h, &hamiltonian.index, &hamiltonian.momentum)?
        } else {
            self.diagonalize(&h, &hamiltonian.momentum)?
        };
        print_solver(self.mode(), energies.len(), timer);
        Ok(ExcitonStates {
            energies,
            eigenvectors,
        })
    }
}
