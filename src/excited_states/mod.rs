use std::fs::File;
use std::io::Write;

use anyhow::Context;
use ndarray::prelude::*;
use ndarray_linalg::c64;
use ndarray_npy::{write_npy, WriteNpyError};

pub use bse::*;
pub use screening::ScreeningEngine;
pub use solvers::*;
pub use spectrum::*;
pub use transition_densities::*;

pub mod bse;
pub(crate) mod logging;
pub mod screening;
pub mod solvers;
pub mod spectrum;
pub mod transition_densities;

/// General trait for all excited states structs, to write the spectrum of the states.
pub trait ExcitedState {
    /// Returns the excitation energies in eV of all states.
    fn get_energies(&self) -> ArrayView1<f64>;

    /// Returns the oscillator strengths of all states.
    fn get_oscillator_strengths(&self) -> ArrayView1<f64>;

    /// Returns the number of excited states.
    fn get_num_states(&self) -> usize;

    /// Write the excitation energies (in eV) and oscillator strengths to a .npy file
    fn spectrum_to_npy(&self, filename: &str) -> Result<(), WriteNpyError> {
        // The energies and osc. strengths are the two columns of the array.
        let mut data: Array2<f64> = Array2::zeros([self.get_num_states(), 2]);
        data.column_mut(0).assign(&self.get_energies());
        data.column_mut(1).assign(&self.get_oscillator_strengths());

        write_npy(filename, &data)
    }

    /// Write the excitation energies (in eV) and the oscillator strengths to a text file.
    fn spectrum_to_txt(&self, filename: &str) -> anyhow::Result<()> {
        // Two lines of header.
        let mut txt: String = "# Exciton spectrum\n".to_owned();
        txt += "# exc. energy / eV    |f|^2\n";

        for (e, f) in self
            .get_energies()
            .iter()
            .zip(self.get_oscillator_strengths().iter())
        {
            txt += &format!("{:16.10}      {:20.12e}\n", e, f);
        }

        let mut f = File::create(filename)
            .with_context(|| format!("Unable to create file: {}", filename))?;
        f.write_all(txt.as_bytes())
            .with_context(|| format!("Unable to write data at: {}", filename))
    }
}

/// Exciton states with the squared oscillator strengths |f_l|^2 of one optical probe.
#[derive(Clone, Debug)]
pub struct ExcitonSpectrum {
    pub states: ExcitonStates,
    pub strengths: Array1<f64>,
}

impl ExcitonSpectrum {
    pub fn new(states: ExcitonStates, rho_g0: ArrayView1<c64>) -> Self {
        let strengths: Array1<f64> =
            oscillator_strengths(&states, rho_g0).mapv(|f| f.norm_sqr());
        Self { states, strengths }
    }

    /// Keeps the `n` lowest states.
    pub fn truncate(&mut self, n: usize) {
        let n: usize = n.min(self.states.n_states());
        self.states.energies = self.states.energies.slice(s![..n]).to_owned();
        self.states.eigenvectors = self.states.eigenvectors.slice(s![.., ..n]).to_owned();
        self.strengths = self.strengths.slice(s![..n]).to_owned();
    }
}

impl ExcitedState for ExcitonSpectrum {
    fn get_energies(&self) -> ArrayView1<f64> {
        self.states.energies.view()
    }

    fn get_oscillator_strengths(&self) -> ArrayView1<f64> {
        self.strengths.view()
    }

    fn get_num_states(&self) -> usize {
        self.states.n_states()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn spectrum() -> ExcitonSpectrum {
        let states = ExcitonStates {
            energies: array![1.0, 2.0, 3.0],
            eigenvectors: Array2::eye(6).slice(s![.., ..3]).to_owned(),
        };
        let rho: Array1<c64> = array![c64::new(0.0, 0.5), c64::new(1.0, 0.0), c64::new(0.0, 0.0)];
        ExcitonSpectrum::new(states, rho.view())
    }

    #[test]
    fn strengths_are_squared_moduli() {
        let spectrum = spectrum();
        assert_eq!(spectrum.strengths, array![0.25, 1.0, 0.0]);
    }

    #[test]
    fn truncation_keeps_the_lowest_states() {
        let mut spectrum = spectrum();
        spectrum.truncate(2);
        assert_eq!(spectrum.get_num_states(), 2);
        assert_eq!(spectrum.states.eigenvectors.dim(), (6, 2));
        spectrum.truncate(10);
        assert_eq!(spectrum.get_num_states(), 2);
    }

    #[test]
    fn spectrum_is_written() {
        let dir = std::env::temp_dir().join("tbbse_exciton_spectrum");
        fs::create_dir_all(&dir).unwrap();
        let txt = dir.join("excitons.txt");
        let npy = dir.join("excitons.npy");
        let spectrum = spectrum();
        spectrum.spectrum_to_txt(txt.to_str().unwrap()).unwrap();
        spectrum.spectrum_to_npy(npy.to_str().unwrap()).unwrap();
        let content: String = fs::read_to_string(&txt).unwrap();
        assert_eq!(content.lines().count(), 5);
        let data: Array2<f64> = ndarray_npy::read_npy(&npy).unwrap();
        assert_eq!(data.dim(), (3, 2));
        assert_eq!(data[[1, 1]], 1.0);
    }
}
