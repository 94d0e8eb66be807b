use anyhow::{Context, Result};
use ndarray::prelude::*;
use ndarray_linalg::c64;
use ndarray_npy::write_npy;
use std::fs::File;
use std::io::Write;

const TENSOR_LABELS: [&str; 9] = ["xx", "xy", "xz", "yx", "yy", "yz", "zx", "zy", "zz"];

fn write_txt(filename: &str, txt: &str) -> Result<()> {
    let mut f =
        File::create(filename).with_context(|| format!("Unable to create file: {}", filename))?;
    f.write_all(txt.as_bytes())
        .with_context(|| format!("Unable to write data at: {}", filename))
}

/// Table with one row per frequency: omega followed by the real and imaginary part of the
/// nine tensor elements (row-major).
fn tensor_table(omegas: ArrayView1<f64>, tensor: ArrayView3<c64>) -> Array2<f64> {
    let mut data: Array2<f64> = Array2::zeros([omegas.len(), 19]);
    for ((mut row, omega), eps) in data
        .outer_iter_mut()
        .zip(omegas.iter())
        .zip(tensor.outer_iter())
    {
        row[0] = *omega;
        for (n, value) in eps.iter().enumerate() {
            row[1 + 2 * n] = value.re;
            row[2 + 2 * n] = value.im;
        }
    }
    data
}

/// Writes the macroscopic dielectric tensor [omega, 3, 3] to `<stem>.txt` and `<stem>.npy`.
pub fn write_dielectric_tensor(
    stem: &str,
    omegas: ArrayView1<f64>,
    tensor: ArrayView3<c64>,
) -> Result<()> {
    let data: Array2<f64> = tensor_table(omegas, tensor);

    let mut txt: String = format!("### omega {}\n", TENSOR_LABELS.join(" "));
    for row in data.outer_iter() {
        let line: Vec<String> = row.iter().map(|x| format!("{:16.10}", x)).collect();
        txt += &line.join(" ");
        txt += "\n";
    }
    write_txt(&format!("{}.txt", stem), &txt)?;
    write_npy(format!("{}.npy", stem), &data)
        .with_context(|| format!("Unable to write {}.npy", stem))
}

/// Writes a scalar dielectric function as a table `omega re im`.
pub fn write_dielectric_function(
    stem: &str,
    omegas: ArrayView1<f64>,
    epsilon: ArrayView1<c64>,
) -> Result<()> {
    let mut txt: String = String::from("### omega re im\n");
    for (omega, eps) in omegas.iter().zip(epsilon.iter()) {
        txt += &format!("{:16.10} {:16.10} {:16.10}\n", omega, eps.re, eps.im);
    }
    write_txt(&format!("{}.txt", stem), &txt)
}
