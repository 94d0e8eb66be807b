use crate::excited_states::logging::print_states;
use crate::excited_states::{
    BseHamiltonian, BseHamiltonianBuilder, BseOptions, DielectricTensor, ExcitedState,
    ExcitonSpectrum, ScreeningEngine, SolverKind,
};
use crate::initialization::{input_check, ExcitonSystem};
use crate::io::{
    read_input, write_dielectric_function, write_dielectric_tensor, write_footer, write_header,
    Configuration,
};
use crate::utils::Timer;
use anyhow::{Context, Result};
use clap::{App, Arg};
use env_logger::Builder;
use log::{error, LevelFilter};
use ndarray::prelude::*;
use ndarray_linalg::c64;
use std::io::Write;
use std::process;

mod constants;
mod defaults;
mod excited_states;
mod initialization;
mod io;
mod utils;

#[macro_use]
extern crate clap;

fn main() {
    // Input.
    let matches = App::new(crate_name!())
        .version(crate_version!())
        .about("Bethe-Salpeter excitons and optical spectra of Wannier tight-binding models")
        .arg(
            Arg::new("hr-File")
                .about("Sets the Wannier90 seedname_hr.dat file to use")
                .required(true)
                .index(1),
        )
        .get_matches();
    // The hopping file is the only mandatory file to start a calculation.
    let hr_file: String = match matches.value_of("hr-File") {
        Some(file) => String::from(file),
        None => {
            eprintln!("No Wannier90 hr file was given");
            process::exit(1);
        }
    };
    let config: Configuration = match read_input() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{:?}", err);
            process::exit(1);
        }
    };

    // Multithreading.
    if let Err(err) = rayon::ThreadPoolBuilder::new()
        .num_threads(config.parallelization.number_of_cores)
        .build_global()
    {
        eprintln!("The thread pool could not be built: {}", err);
        process::exit(1);
    }

    // Logging.
    // The log level is set.
    let log_level: LevelFilter = match config.verbose {
        2 => LevelFilter::Trace,
        1 => LevelFilter::Debug,
        0 => LevelFilter::Info,
        -1 => LevelFilter::Warn,
        -2 => LevelFilter::Error,
        _ => LevelFilter::Info,
    };
    // and the logger is build.
    Builder::new()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .filter(None, log_level)
        .init();

    // The program header is written to the command line.
    write_header();
    // and the total wall-time timer is started.
    let timer: Timer = Timer::start();

    if let Err(err) = run(&hr_file, &config) {
        error!("{:?}", err);
        process::exit(1);
    }

    // The program footer is written to the command line.
    write_footer(timer);
}

fn run(hr_file: &str, config: &Configuration) -> Result<()> {
    input_check(config)?;
    let system: ExcitonSystem = ExcitonSystem::from_config(hr_file, config)?;
    let options: BseOptions = config.bse.build_options()?;
    let solver: SolverKind = config.bse.solver.parse()?;
    let omegas: Array1<f64> = Array1::linspace(
        config.spectrum.omega_min,
        config.spectrum.omega_max,
        config.spectrum.n_omegas,
    );

    // Computations.
    // ................................................................
    match config.jobtype.as_str() {
        // Macroscopic dielectric tensor of the interacting electron-hole pairs.
        "spectrum" => {
            let tensor: Array3<c64> =
                DielectricTensor::new(&system, options, solver, config.bse.eta)
                    .compute(omegas.view(), config.spectrum.lorentzian)?;
            write_dielectric_tensor(
                &config.spectrum.dielectric_tensor_file,
                omegas.view(),
                tensor.view(),
            )?;
        }
        // Exciton states at a single excitonic momentum.
        "excitons" => {
            let momentum: Array1<f64> = Array1::from(config.bse.momentum.to_vec());
            let builder = BseHamiltonianBuilder::new(&system, options);
            let hamiltonian: BseHamiltonian = builder
                .build(momentum.view(), config.bse.eta, solver.layout())
                .context("The BSE Hamiltonian could not be built")?;
            let states = solver.solve(&hamiltonian)?;
            let mut spectrum: ExcitonSpectrum =
                ExcitonSpectrum::new(states, hamiltonian.rho_cv.column(system.g0));
            print_states(
                spectrum.get_energies(),
                spectrum.get_oscillator_strengths(),
                config.bse.nstates,
            );
            spectrum.truncate(config.bse.nstates);
            let stem: &str = &config.spectrum.exciton_spectrum_file;
            spectrum.spectrum_to_txt(&format!("{}.txt", stem))?;
            spectrum
                .spectrum_to_npy(&format!("{}.npy", stem))
                .with_context(|| format!("Unable to write {}.npy", stem))?;
        }
        // Macroscopic dielectric function of the independent particles with local fields.
        "rpa" => {
            let epsilon: Array1<c64> =
                ScreeningEngine::new(&system, options.n_valence, options.n_conduction)
                    .macroscopic_rpa(omegas.view(), config.bse.eta)?;
            write_dielectric_function(
                &config.spectrum.rpa_dielectric_file,
                omegas.view(),
                epsilon.view(),
            )?;
        }
        _ => {
            anyhow::bail!("Jobtype: {} is not available", config.jobtype);
        }
    }
    Ok(())
}
