use crate::errors::ModelError;
use ndarray::prelude::*;
use ndarray_linalg::c64;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Real-space hopping matrices of one spin channel as written by Wannier90 (seedname_hr.dat).
#[derive(Clone, Debug)]
pub struct HoppingBlock {
    pub n_wann: usize,
    /// Lattice translations in units of the lattice vectors, shape [n_rpts, 3].
    pub cells: Array2<f64>,
    /// Degeneracy of each Wigner-Seitz point.
    pub weights: Array1<f64>,
    /// H(R)_mn with shape [n_rpts, n_wann, n_wann].
    pub hoppings: Array3<c64>,
}

/// Reads whitespace separated tokens line by line, so that comment lines can be skipped as a
/// whole while the numerical blocks may be wrapped arbitrarily.
struct TokenReader<'a> {
    path: String,
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    pending: VecDeque<&'a str>,
    line_number: usize,
}

impl<'a> TokenReader<'a> {
    fn new(path: &Path, content: &'a str) -> Self {
        Self {
            path: path.display().to_string(),
            lines: content.lines().enumerate(),
            pending: VecDeque::new(),
            line_number: 0,
        }
    }

    fn error(&self, message: String) -> ModelError {
        ModelError::Parse {
            path: self.path.clone(),
            message: format!("line {}: {}", self.line_number, message),
        }
    }

    /// Discards the rest of the current line and the next non-empty line. Returns false at the
    /// end of the file.
    fn skip_line(&mut self) -> bool {
        self.pending.clear();
        for (number, line) in self.lines.by_ref() {
            self.line_number = number + 1;
            if !line.trim().is_empty() {
                return true;
            }
        }
        false
    }

    fn at_end(&mut self) -> bool {
        while self.pending.is_empty() {
            match self.lines.next() {
                Some((number, line)) => {
                    self.line_number = number + 1;
                    self.pending.extend(line.split_whitespace());
                }
                None => return true,
            }
        }
        false
    }

    fn next<T: FromStr>(&mut self) -> Result<T, ModelError>
    where
        T::Err: std::fmt::Display,
    {
        if self.at_end() {
            return Err(self.error(String::from("unexpected end of file")));
        }
        let token: &str = self.pending.pop_front().unwrap_or_default();
        token
            .parse::<T>()
            .map_err(|err| self.error(format!("cannot parse '{}': {}", token, err)))
    }
}

fn read_file(path: &Path) -> Result<String, ModelError> {
    fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_hopping_block(reader: &mut TokenReader) -> Result<HoppingBlock, ModelError> {
    let n_wann: usize = reader.next()?;
    let n_rpts: usize = reader.next()?;
    if n_wann == 0 || n_rpts == 0 {
        return Err(reader.error(String::from("empty Hamiltonian block")));
    }

    let mut weights: Array1<f64> = Array1::zeros(n_rpts);
    for w in weights.iter_mut() {
        let degeneracy: usize = reader.next()?;
        *w = degeneracy as f64;
    }

    let mut cells: Array2<f64> = Array2::zeros([n_rpts, 3]);
    let mut hoppings: Array3<c64> = Array3::zeros([n_rpts, n_wann, n_wann]);
    for r in 0..n_rpts {
        for _ in 0..n_wann * n_wann {
            let translation: [i64; 3] = [reader.next()?, reader.next()?, reader.next()?];
            let m: usize = reader.next()?;
            let n: usize = reader.next()?;
            let re: f64 = reader.next()?;
            let im: f64 = reader.next()?;
            if m == 0 || n == 0 || m > n_wann || n > n_wann {
                return Err(reader.error(format!("orbital index ({}, {}) out of range", m, n)));
            }
            for (c, t) in cells.row_mut(r).iter_mut().zip(translation.iter()) {
                *c = *t as f64;
            }
            hoppings[[r, m - 1, n - 1]] = c64::new(re, im);
        }
    }
    Ok(HoppingBlock {
        n_wann,
        cells,
        weights,
        hoppings,
    })
}

/// Reads a Wannier90 hr file. Collinear spin-polarized models store the spin-down block
/// (including its comment line) directly after the spin-up block.
pub fn read_hr_file(path: &Path) -> Result<Vec<HoppingBlock>, ModelError> {
    let content: String = read_file(path)?;
    let mut reader = TokenReader::new(path, &content);
    let mut blocks: Vec<HoppingBlock> = Vec::new();
    while blocks.len() < 2 && reader.skip_line() {
        blocks.push(parse_hopping_block(&mut reader)?);
    }
    if blocks.is_empty() {
        return Err(reader.error(String::from("no Hamiltonian found")));
    }
    Ok(blocks)
}

/// Reads the Wannier centres (seedname_centres.xyz) of `n_channels` spin channels with
/// `n_wann` functions each. Every channel is an xyz block whose first `n_wann` entries
/// (label X) are the centres, the remaining entries are atoms and are skipped.
pub fn read_centres_file(
    path: &Path,
    n_wann: usize,
    n_channels: usize,
) -> Result<Array3<f64>, ModelError> {
    let content: String = read_file(path)?;
    let mut lines = content.lines().filter(|l| !l.trim().is_empty()).enumerate();
    let parse_error = |number: usize, message: String| ModelError::Parse {
        path: path.display().to_string(),
        message: format!("entry {}: {}", number + 1, message),
    };

    let mut centres: Array3<f64> = Array3::zeros([n_channels, n_wann, 3]);
    for channel in 0..n_channels {
        let (number, header) = lines
            .next()
            .ok_or_else(|| parse_error(0, String::from("missing xyz header")))?;
        let n_entries: usize = header
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .parse()
            .map_err(|_| parse_error(number, format!("invalid entry count '{}'", header)))?;
        if n_entries < n_wann {
            return Err(parse_error(
                number,
                format!("{} entries cannot hold {} centres", n_entries, n_wann),
            ));
        }
        // comment line
        lines.next();

        for (i, mut centre) in centres
            .slice_mut(s![channel, .., ..])
            .outer_iter_mut()
            .enumerate()
        {
            let (number, line) = lines
                .next()
                .ok_or_else(|| parse_error(i, String::from("missing Wannier centre")))?;
            let position: Vec<f64> = line
                .split_whitespace()
                .skip(1)
                .take(3)
                .map(|x| x.parse::<f64>())
                .collect::<Result<Vec<f64>, _>>()
                .map_err(|err| parse_error(number, err.to_string()))?;
            if position.len() != 3 {
                return Err(parse_error(number, String::from("expected 'X x y z'")));
            }
            centre.assign(&Array1::from(position));
        }
        for _ in n_wann..n_entries {
            lines.next();
        }
    }
    Ok(centres)
}
