use crate::excited_states::bse::{BlockLayout, BseHamiltonian};
use log::warn;
use ndarray::prelude::*;
use ndarray_linalg::c64;
use std::str::FromStr;

pub use cholesky::CholeskySolver;
pub use direct::DirectSolver;
pub use errors::BseSolverError;

mod cholesky;
mod direct;
mod errors;
pub mod utils;

/// Positive excitation energies and the eigenvectors [X; Y] of the excitonic Hamiltonian.
#[derive(Clone, Debug)]
pub struct ExcitonStates {
    /// Excitation energies in eV in ascending order.
    pub energies: Array1<f64>,
    /// Unit-norm eigenvectors as columns, shape [2N, n_states].
    pub eigenvectors: Array2<c64>,
}

impl ExcitonStates {
    pub fn n_states(&self) -> usize {
        self.energies.len()
    }

    /// Dimension N of the resonant block.
    pub fn dimension(&self) -> usize {
        self.eigenvectors.nrows() / 2
    }

    /// Resonant parts X of the eigenvectors, shape [N, n_states].
    pub fn resonant(&self) -> ArrayView2<c64> {
        self.eigenvectors.slice(s![..self.dimension(), ..])
    }

    /// Anti-resonant parts Y of the eigenvectors, shape [N, n_states].
    pub fn anti_resonant(&self) -> ArrayView2<c64> {
        self.eigenvectors.slice(s![self.dimension().., ..])
    }
}

/// Abstract trait of the exciton eigensolvers.
/// The states are returned with ascending energies and unit-norm eigenvectors.
pub trait BseSolver {
    /// Name of the solver that appears in the log and in the error messages.
    fn mode(&self) -> &'static str;

    /// The block layout of the Hamiltonian that the solver works on without copies.
    fn layout(&self) -> BlockLayout;

    fn solve(&self, hamiltonian: &BseHamiltonian) -> Result<ExcitonStates, BseSolverError>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SolverKind {
    Direct,
    Cholesky,
}

impl FromStr for SolverKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(SolverKind::Direct),
            "cholesky" => Ok(SolverKind::Cholesky),
            _ => Err(anyhow::anyhow!("unknown BSE solver: {}", s)),
        }
    }
}

impl SolverKind {
    pub fn layout(&self) -> BlockLayout {
        match self {
            SolverKind::Direct => DirectSolver.layout(),
            SolverKind::Cholesky => CholeskySolver::default().layout(),
        }
    }

    /// Solves with the selected solver. A failure of the Cholesky solver is logged and the
    /// direct solver is used instead.
    pub fn solve(&self, hamiltonian: &BseHamiltonian) -> Result<ExcitonStates, BseSolverError> {
        match self {
            SolverKind::Direct => DirectSolver.solve(hamiltonian),
            SolverKind::Cholesky => match CholeskySolver::default().solve(hamiltonian) {
                Ok(states) => Ok(states),
                Err(err) => {
                    warn!("{}", err);
                    warn!("falling back to the direct solver");
                    DirectSolver.solve(hamiltonian)
                }
            },
        }
    }
}
