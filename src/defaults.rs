use tbbse_model::Dimensionality;

// jobtype
pub const JOBTYPE: &str = "spectrum";
// config file
pub const CONFIG_FILE_NAME: &str = "tbbse.toml";
// verbosity of the log
pub const VERBOSE: i8 = 0;

// TIGHT-BINDING MODEL
// Fermi energy in eV that separates valence and conduction bands
pub const FERMI_ENERGY: f64 = 0.0;
// rigid shift of the conduction bands in eV
pub const SCISSOR: f64 = 0.0;
pub const SPIN_POLARIZED: bool = false;

// SAMPLING OF THE BRILLOUIN ZONE
pub const K_GRID: [usize; 3] = [4, 4, 4];
// cutoff for the reciprocal lattice vectors in 1/Angstrom
pub const G_CUTOFF: f64 = 0.0;
// periodicity of the material (bulk or slab)
pub const DIMENSIONALITY: Dimensionality = Dimensionality::Bulk;
// index of the lattice vector that is not periodic in a slab geometry
pub const CUT_DIRECTION: usize = 2;
// squared momentum in 1/Angstrom^2 below which the Coulomb interaction is zero
pub const COULOMB_MIN_MODULUS: f64 = 1.0e-14;

// BETHE-SALPETER EQUATION
pub const VALENCE_BANDS: usize = 4;
pub const CONDUCTION_BANDS: usize = 4;
pub const SCREENING: bool = true;
pub const TAMM_DANCOFF: bool = false;
pub const SOLVER: &str = "cholesky";
// broadening of the transition energies in the dielectric matrix in eV
pub const ETA: f64 = 1.0e-3;
// number of excitons written to the output of the "excitons" job
pub const NSTATES: usize = 20;

// SPECTRUM
pub const OMEGA_MIN: f64 = 0.0;
pub const OMEGA_MAX: f64 = 5.0;
pub const N_OMEGAS: usize = 400;
// phenomenological broadening of the excitonic peaks in eV
pub const LORENTZIAN: f64 = 0.1;
pub const DIELECTRIC_TENSOR_FILE: &str = "macroscopic_diel_func_bse";
pub const RPA_DIELECTRIC_FILE: &str = "macroscopic_diel_func_rpa";
pub const EXCITON_SPECTRUM_FILE: &str = "exciton_spectrum";
