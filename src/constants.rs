pub use tbbse_model::defaults::COULOMB_CONSTANT;

/// Length of the small momentum (1/Angstrom) that is used to probe the optical limit q -> 0.
pub const Q_MIN: f64 = 1.0e-6;
/// Relative distance below which two pairs of singular values belong to the same
/// (degenerate) excitation energy.
pub const DEGENERACY_TOLERANCE: f64 = 1.0e-8;
/// Relative size of the correlation part of eps^-1 (and of its change between the two fit
/// frequencies) below which the plasmon-pole model leaves an element unscreened.
pub const PLASMON_POLE_TOLERANCE: f64 = 1.0e-10;
/// Norm below which a vector is considered to be linearly dependent in the Gram-Schmidt
/// orthogonalization of degenerate exciton states.
pub const LINEAR_DEPENDENCE_THRESHOLD: f64 = 1.0e-6;
