use std::error::Error;
use std::fmt;

/// Errors raised while building or querying the tight-binding model and the point lists.
#[derive(Debug)]
pub enum ModelError {
    /// A file could not be opened or read.
    Io {
        path: String,
        source: std::io::Error,
    },
    /// The content of an input file does not follow the expected format.
    Parse { path: String, message: String },
    /// The data passed to a constructor is inconsistent.
    Inconsistent(String),
    /// More valence or conduction bands were requested than the model provides at a k-point.
    BandSelection {
        requested_valence: usize,
        requested_conduction: usize,
        available_valence: usize,
        available_conduction: usize,
    },
    /// The LAPACK diagonalization of H(k) failed.
    Diagonalization(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelError::Io { path, source } => write!(f, "cannot read {}: {}", path, source),
            ModelError::Parse { path, message } => {
                write!(f, "malformed input in {}: {}", path, message)
            }
            ModelError::Inconsistent(message) => write!(f, "inconsistent model: {}", message),
            ModelError::BandSelection {
                requested_valence,
                requested_conduction,
                available_valence,
                available_conduction,
            } => write!(
                f,
                "requested {} valence and {} conduction bands, but only {} valence and {} conduction bands are available",
                requested_valence, requested_conduction, available_valence, available_conduction
            ),
            ModelError::Diagonalization(message) => {
                write!(f, "diagonalization of H(k) failed: {}", message)
            }
        }
    }
}

impl Error for ModelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ModelError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
