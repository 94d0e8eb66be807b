mod hamiltonian;
pub mod index;
pub mod kernel;

pub use hamiltonian::*;
pub use index::ExcitonIndex;
