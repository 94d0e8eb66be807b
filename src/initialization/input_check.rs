use crate::constants::Q_MIN;
use crate::io::Configuration;
use anyhow::{bail, Result};
use log::debug;

const JOBTYPES: [&str; 3] = ["spectrum", "excitons", "rpa"];
const SOLVERS: [&str; 2] = ["cholesky", "direct"];

/// Checks the configuration for settings that cannot be used together or are out of range.
pub fn input_check(config: &Configuration) -> Result<()> {
    debug!("{:^80}", "");
    debug!("{:-^80}", " input check ");

    if !JOBTYPES.contains(&config.jobtype.as_str()) {
        bail!(
            "Jobtype: {} is not available. Choose one of: {}",
            config.jobtype,
            JOBTYPES.join(", ")
        );
    }
    if !SOLVERS.contains(&config.bse.solver.as_str()) {
        bail!(
            "Solver: {} is not available. Choose one of: {}",
            config.bse.solver,
            SOLVERS.join(", ")
        );
    }
    if config.bse.valence_bands == 0 || config.bse.conduction_bands == 0 {
        bail!("At least one valence and one conduction band are required");
    }
    if config.bse.eta < 0.0 {
        bail!("The broadening eta must not be negative");
    }
    if let Some(frequency) = config.bse.plasmon_pole {
        if frequency <= 0.0 {
            bail!("The plasmon-pole probe frequency must be positive");
        }
    }
    if config.geometry.cut_direction > 2 {
        bail!("The cut direction must be 0, 1 or 2");
    }
    if config.spectrum.n_omegas == 0 || config.spectrum.omega_max < config.spectrum.omega_min {
        bail!("The frequency window of the spectrum is empty");
    }
    if config.spectrum.lorentzian <= 0.0 {
        bail!("The Lorentzian broadening of the spectrum must be positive");
    }
    if config.parallelization.number_of_cores == 0 {
        bail!("At least one core is required");
    }
    // The optical probes |q| = q_min must not be cut off by the Coulomb kernel.
    if config.coulomb.min_modulus < 0.0 || config.coulomb.min_modulus >= Q_MIN * Q_MIN {
        bail!(
            "The Coulomb cutoff min_modulus = {:e} must lie in [0, {:e})",
            config.coulomb.min_modulus,
            Q_MIN * Q_MIN
        );
    }
    if config.kpoints.grid.iter().any(|n| *n == 0) {
        bail!("The k-point grid must not contain zeros");
    }

    debug!("{:<25} {}", "Jobtype:", config.jobtype);
    debug!("{:<25} {}", "Solver:", config.bse.solver);
    debug!("{:-^80}", "");
    Ok(())
}
