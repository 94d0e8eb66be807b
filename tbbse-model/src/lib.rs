pub mod coulomb;
pub mod defaults;
pub mod errors;
pub mod interface;
pub mod lattice;
pub mod points;
pub mod wannier;

pub use coulomb::{Coulomb, Dimensionality};
pub use errors::ModelError;
pub use interface::{BandStructure, CoulombKernel};
pub use lattice::Lattice;
pub use wannier::{ModelOptions, WannierModel};
