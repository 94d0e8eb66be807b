use crate::coulomb::Dimensionality;
use crate::defaults::ZERO_POINT_TOLERANCE;
use crate::errors::ModelError;
use crate::lattice::Lattice;
use itertools::iproduct;
use ndarray::prelude::*;
use std::fs;
use std::path::Path;

/// Regular grid k = (i / n1) b1 + (j / n2) b2 + (l / n3) b3 + shift, one k-point per row.
pub fn monkhorst_pack(lattice: &Lattice, grid: [usize; 3], shift: ArrayView1<f64>) -> Array2<f64> {
    let b: ArrayView2<f64> = lattice.reciprocal_vectors();
    let n_points: usize = grid.iter().product();
    let mut k_points: Array2<f64> = Array2::zeros([n_points, 3]);

    for (mut row, (i, j, l)) in k_points
        .outer_iter_mut()
        .zip(iproduct!(0..grid[0], 0..grid[1], 0..grid[2]))
    {
        let fractions: Array1<f64> = array![
            i as f64 / grid[0] as f64,
            j as f64 / grid[1] as f64,
            l as f64 / grid[2] as f64
        ];
        row.assign(&(fractions.dot(&b) + &shift));
    }
    k_points
}

/// Grid with approximately `spacing` (1/Angstrom) between neighbouring points along each
/// reciprocal lattice vector. Directions that are cut off (slab geometry) are sampled with a
/// single point.
pub fn k_points_from_spacing(
    lattice: &Lattice,
    spacing: f64,
    dimensionality: Dimensionality,
    cut_direction: usize,
    shift: ArrayView1<f64>,
) -> Array2<f64> {
    let b: ArrayView2<f64> = lattice.reciprocal_vectors();
    let mut grid: [usize; 3] = [1; 3];
    for (i, n) in grid.iter_mut().enumerate() {
        if dimensionality == Dimensionality::Slab && i == cut_direction {
            continue;
        }
        let length: f64 = b.row(i).dot(&b.row(i)).sqrt();
        *n = ((length / spacing) as usize).max(1);
    }
    monkhorst_pack(lattice, grid, shift)
}

/// Reads a list of Cartesian k-points (1/Angstrom), three numbers per line. Empty lines and
/// lines starting with `#` are ignored.
pub fn read_k_points(path: &Path) -> Result<Array2<f64>, ModelError> {
    let path_name: String = path.display().to_string();
    let content: String = fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path_name.clone(),
        source,
    })?;

    let mut values: Vec<f64> = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line: &str = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let coordinates: Vec<f64> = line
            .split_whitespace()
            .take(3)
            .map(|x| x.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|err| ModelError::Parse {
                path: path_name.clone(),
                message: format!("line {}: {}", number + 1, err),
            })?;
        if coordinates.len() != 3 {
            return Err(ModelError::Parse {
                path: path_name,
                message: format!("line {} does not contain three coordinates", number + 1),
            });
        }
        values.extend(coordinates);
    }
    if values.is_empty() {
        return Err(ModelError::Parse {
            path: path_name,
            message: String::from("no k-points found"),
        });
    }
    let n_points: usize = values.len() / 3;
    Array2::from_shape_vec([n_points, 3], values)
        .map_err(|err| ModelError::Inconsistent(err.to_string()))
}

/// Reciprocal lattice vectors G = i b1 + j b2 + l b3 with |i| <= int(cutoff / |b1|) and so on.
/// For slab geometries the cut direction is not expanded. The list is symmetric under G -> -G
/// and always contains the zero vector.
pub fn g_vectors(
    lattice: &Lattice,
    cutoff: f64,
    dimensionality: Dimensionality,
    cut_direction: usize,
) -> Array2<f64> {
    let b: ArrayView2<f64> = lattice.reciprocal_vectors();
    let mut limits: [i64; 3] = [0; 3];
    for (i, n) in limits.iter_mut().enumerate() {
        if dimensionality == Dimensionality::Slab && i == cut_direction {
            continue;
        }
        let length: f64 = b.row(i).dot(&b.row(i)).sqrt();
        *n = (cutoff / length) as i64;
    }

    let n_points: usize = limits.iter().map(|n| (2 * n + 1) as usize).product();
    let mut g_list: Array2<f64> = Array2::zeros([n_points, 3]);
    for (mut row, (i, j, l)) in g_list.outer_iter_mut().zip(iproduct!(
        -limits[0]..=limits[0],
        -limits[1]..=limits[1],
        -limits[2]..=limits[2]
    )) {
        let n: Array1<f64> = array![i as f64, j as f64, l as f64];
        row.assign(&n.dot(&b));
    }
    g_list
}

/// Index of the zero vector in a list of points.
pub fn zero_index(points: ArrayView2<f64>) -> Option<usize> {
    points
        .outer_iter()
        .position(|p| p.iter().all(|x| x.abs() < ZERO_POINT_TOLERANCE))
}
