use crate::constants::Q_MIN;
use crate::defaults::*;
use crate::excited_states::{BseOptions, BseOptionsBuilder};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use tbbse_model::Dimensionality;

fn default_jobtype() -> String {
    String::from(JOBTYPE)
}
fn default_verbose() -> i8 {
    VERBOSE
}
fn default_centres_file() -> String {
    String::new()
}
fn default_fermi_energy() -> f64 {
    FERMI_ENERGY
}
fn default_scissor() -> f64 {
    SCISSOR
}
fn default_spin_polarized() -> bool {
    SPIN_POLARIZED
}
fn default_lattice_vectors() -> [[f64; 3]; 3] {
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
}
fn default_dimension() -> Dimensionality {
    DIMENSIONALITY
}
fn default_cut_direction() -> usize {
    CUT_DIRECTION
}
fn default_k_grid() -> [usize; 3] {
    K_GRID
}
fn default_k_shift() -> [f64; 3] {
    [0.0, 0.0, 0.0]
}
fn default_g_cutoff() -> f64 {
    G_CUTOFF
}
fn default_coulomb_min_modulus() -> f64 {
    COULOMB_MIN_MODULUS
}
fn default_valence_bands() -> usize {
    VALENCE_BANDS
}
fn default_conduction_bands() -> usize {
    CONDUCTION_BANDS
}
fn default_screening() -> bool {
    SCREENING
}
fn default_tamm_dancoff() -> bool {
    TAMM_DANCOFF
}
fn default_solver() -> String {
    String::from(SOLVER)
}
fn default_eta() -> f64 {
    ETA
}
fn default_momentum() -> [f64; 3] {
    [Q_MIN, 0.0, 0.0]
}
fn default_nstates() -> usize {
    NSTATES
}
fn default_omega_min() -> f64 {
    OMEGA_MIN
}
fn default_omega_max() -> f64 {
    OMEGA_MAX
}
fn default_n_omegas() -> usize {
    N_OMEGAS
}
fn default_lorentzian() -> f64 {
    LORENTZIAN
}
fn default_dielectric_tensor_file() -> String {
    String::from(DIELECTRIC_TENSOR_FILE)
}
fn default_rpa_dielectric_file() -> String {
    String::from(RPA_DIELECTRIC_FILE)
}
fn default_exciton_spectrum_file() -> String {
    String::from(EXCITON_SPECTRUM_FILE)
}
fn default_number_of_cores() -> usize {
    1
}
fn default_model_config() -> ModelConfig {
    let config: ModelConfig = toml::from_str("").unwrap();
    config
}
fn default_geometry_config() -> GeometryConfig {
    let config: GeometryConfig = toml::from_str("").unwrap();
    config
}
fn default_kpoints_config() -> KPointsConfig {
    let config: KPointsConfig = toml::from_str("").unwrap();
    config
}
fn default_gvectors_config() -> GVectorsConfig {
    let config: GVectorsConfig = toml::from_str("").unwrap();
    config
}
fn default_coulomb_config() -> CoulombConfig {
    let config: CoulombConfig = toml::from_str("").unwrap();
    config
}
fn default_bse_config() -> BseConfig {
    let config: BseConfig = toml::from_str("").unwrap();
    config
}
fn default_spectrum_config() -> SpectrumConfig {
    let config: SpectrumConfig = toml::from_str("").unwrap();
    config
}
fn default_parallelization_config() -> ParallelizationConfig {
    let config: ParallelizationConfig = toml::from_str("").unwrap();
    config
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Configuration {
    #[serde(default = "default_jobtype")]
    pub jobtype: String,
    #[serde(default = "default_verbose")]
    pub verbose: i8,
    #[serde(default = "default_model_config")]
    pub model: ModelConfig,
    #[serde(default = "default_geometry_config")]
    pub geometry: GeometryConfig,
    #[serde(default = "default_kpoints_config")]
    pub kpoints: KPointsConfig,
    #[serde(default = "default_gvectors_config")]
    pub gvectors: GVectorsConfig,
    #[serde(default = "default_coulomb_config")]
    pub coulomb: CoulombConfig,
    #[serde(default = "default_bse_config")]
    pub bse: BseConfig,
    #[serde(default = "default_spectrum_config")]
    pub spectrum: SpectrumConfig,
    #[serde(default = "default_parallelization_config")]
    pub parallelization: ParallelizationConfig,
}

/// Settings of the tight-binding model that are not contained in the Wannier90 files.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModelConfig {
    /// Path to the seedname_centres.xyz file. If empty, the path is derived from the hr file.
    #[serde(default = "default_centres_file")]
    pub centres_file: String,
    #[serde(default = "default_fermi_energy")]
    pub fermi_energy: f64,
    #[serde(default = "default_scissor")]
    pub scissor: f64,
    #[serde(default = "default_spin_polarized")]
    pub spin_polarized: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GeometryConfig {
    /// Lattice vectors a1, a2, a3 in Angstrom.
    #[serde(default = "default_lattice_vectors")]
    pub lattice_vectors: [[f64; 3]; 3],
    #[serde(default = "default_dimension")]
    pub dimension: Dimensionality,
    #[serde(default = "default_cut_direction")]
    pub cut_direction: usize,
}

/// The k-points are read from `file` if it is given, otherwise a grid is generated with the
/// given `spacing` or, if no spacing is set, with the explicit `grid`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct KPointsConfig {
    #[serde(default = "default_k_grid")]
    pub grid: [usize; 3],
    #[serde(default = "default_k_shift")]
    pub shift: [f64; 3],
    #[serde(default)]
    pub spacing: Option<f64>,
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GVectorsConfig {
    #[serde(default = "default_g_cutoff")]
    pub cutoff: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CoulombConfig {
    #[serde(default = "default_coulomb_min_modulus")]
    pub min_modulus: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BseConfig {
    #[serde(default = "default_valence_bands")]
    pub valence_bands: usize,
    #[serde(default = "default_conduction_bands")]
    pub conduction_bands: usize,
    #[serde(default = "default_screening")]
    pub screening: bool,
    #[serde(default = "default_tamm_dancoff")]
    pub tamm_dancoff: bool,
    /// Either "cholesky" or "direct".
    #[serde(default = "default_solver")]
    pub solver: String,
    #[serde(default = "default_eta")]
    pub eta: f64,
    /// Probe frequency (eV) of the plasmon-pole model. The static RPA screening is used if
    /// it is not set.
    #[serde(default)]
    pub plasmon_pole: Option<f64>,
    /// Excitonic momentum (1/Angstrom) of the "excitons" job.
    #[serde(default = "default_momentum")]
    pub momentum: [f64; 3],
    #[serde(default = "default_nstates")]
    pub nstates: usize,
}

impl BseConfig {
    pub fn build_options(&self) -> anyhow::Result<BseOptions> {
        BseOptionsBuilder::default()
            .n_valence(self.valence_bands)
            .n_conduction(self.conduction_bands)
            .screening(self.screening)
            .tamm_dancoff(self.tamm_dancoff)
            .plasmon_pole(self.plasmon_pole)
            .build()
            .context("the BSE options could not be built")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SpectrumConfig {
    #[serde(default = "default_omega_min")]
    pub omega_min: f64,
    #[serde(default = "default_omega_max")]
    pub omega_max: f64,
    #[serde(default = "default_n_omegas")]
    pub n_omegas: usize,
    #[serde(default = "default_lorentzian")]
    pub lorentzian: f64,
    #[serde(default = "default_dielectric_tensor_file")]
    pub dielectric_tensor_file: String,
    #[serde(default = "default_rpa_dielectric_file")]
    pub rpa_dielectric_file: String,
    #[serde(default = "default_exciton_spectrum_file")]
    pub exciton_spectrum_file: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ParallelizationConfig {
    #[serde(default = "default_number_of_cores")]
    pub number_of_cores: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gives_defaults() {
        let config: Configuration = toml::from_str("").unwrap();
        assert_eq!(config.jobtype, "spectrum");
        assert_eq!(config.bse.valence_bands, VALENCE_BANDS);
        assert_eq!(config.geometry.dimension, Dimensionality::Bulk);
        assert!(config.kpoints.file.is_none());
        assert!(config.bse.plasmon_pole.is_none());
    }

    #[test]
    fn sections_are_read() {
        let input: &str = r#"
            jobtype = "excitons"
            [geometry]
            lattice_vectors = [[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 20.0]]
            dimension = 2
            [bse]
            valence_bands = 2
            solver = "direct"
            plasmon_pole = 27.0
        "#;
        let config: Configuration = toml::from_str(input).unwrap();
        assert_eq!(config.jobtype, "excitons");
        assert_eq!(config.geometry.dimension, Dimensionality::Slab);
        assert_eq!(config.geometry.lattice_vectors[2][2], 20.0);
        assert_eq!(config.bse.valence_bands, 2);
        assert_eq!(config.bse.conduction_bands, CONDUCTION_BANDS);
        assert_eq!(config.bse.plasmon_pole, Some(27.0));
        let options = config.bse.build_options().unwrap();
        assert_eq!(options.n_valence, 2);
        assert_eq!(options.plasmon_pole, Some(27.0));
        assert!(options.screening);
    }

    #[test]
    fn configuration_survives_serialization() {
        let config: Configuration = toml::from_str("").unwrap();
        let text: String = toml::to_string(&config).unwrap();
        let again: Configuration = toml::from_str(&text).unwrap();
        assert_eq!(again.spectrum.n_omegas, config.spectrum.n_omegas);
    }
}
