use ndarray::prelude::*;
use std::error::Error;
use std::fmt;

/// Numerical failures of the exciton eigensolvers. Every variant names the excitonic momentum
/// and the solver mode.
#[derive(Debug)]
pub enum BseSolverError {
    /// The real form of [[A, B], [conj(B), conj(A)]] has no Cholesky factorization.
    NotPositiveDefinite {
        momentum: Array1<f64>,
        mode: &'static str,
    },
    SvdFailed {
        momentum: Array1<f64>,
        mode: &'static str,
        message: String,
    },
    EigFailed {
        momentum: Array1<f64>,
        mode: &'static str,
        message: String,
    },
}

fn format_momentum(momentum: &Array1<f64>) -> String {
    let components: Vec<String> = momentum.iter().map(|q| format!("{:.3e}", q)).collect();
    format!("[{}]", components.join(", "))
}

impl fmt::Display for BseSolverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BseSolverError::NotPositiveDefinite { momentum, mode } => write!(
                f,
                "{} solver: the excitonic Hamiltonian at Q = {} is not positive definite",
                mode,
                format_momentum(momentum)
            ),
            BseSolverError::SvdFailed {
                momentum,
                mode,
                message,
            } => write!(
                f,
                "{} solver: singular value decomposition at Q = {} failed: {}",
                mode,
                format_momentum(momentum),
                message
            ),
            BseSolverError::EigFailed {
                momentum,
                mode,
                message,
            } => write!(
                f,
                "{} solver: diagonalization at Q = {} failed: {}",
                mode,
                format_momentum(momentum),
                message
            ),
        }
    }
}

impl Error for BseSolverError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_momentum_and_mode() {
        let err = BseSolverError::NotPositiveDefinite {
            momentum: array![1e-6, 0.0, 0.0],
            mode: "cholesky",
        };
        let message: String = err.to_string();
        assert!(message.starts_with("cholesky solver"));
        assert!(message.contains("1.000e-6"));
    }
}
