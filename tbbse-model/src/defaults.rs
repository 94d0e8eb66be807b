/// e^2 / (4 pi eps_0) in eV * Angstrom.
pub const COULOMB_CONSTANT: f64 = 14.399645;
/// Squared momenta below this value (in 1/Angstrom^2) are treated as zero by the Coulomb kernel.
pub const MIN_MOMENTUM_MODULUS: f64 = 1.0e-14;
/// Tolerance used to identify the zero vector in a list of points.
pub const ZERO_POINT_TOLERANCE: f64 = 1.0e-10;
