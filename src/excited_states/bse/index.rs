//! Index maps between the composite exciton basis and the flattened density layouts.
//!
//! The exciton basis of one spin sector is ordered as (c * nv + v) * n_k + k. The sectors of a
//! collinear model are numbered 2 * spin_v + spin_c and follow each other. Densities are
//! flattened with one row per (spin, n1, n2, k1 * n_k + k2) in C order.
use itertools::iproduct;
use ndarray::prelude::*;

/// Row of the element (channel, i, j, k1, k2) in a density block of shape
/// [n_spin, n_left, n_right, n_k * n_k] flattened to rows.
pub fn pair_row(
    channel: usize,
    n_left: usize,
    n_right: usize,
    n_k: usize,
    (i, j): (usize, usize),
    (k1, k2): (usize, usize),
) -> usize {
    ((channel * n_left + i) * n_right + j) * n_k * n_k + k1 * n_k + k2
}

/// Layout of the resonant block of the excitonic Hamiltonian.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExcitonIndex {
    pub n_valence: usize,
    pub n_conduction: usize,
    pub n_k: usize,
    pub n_sectors: usize,
}

impl ExcitonIndex {
    pub fn new(n_valence: usize, n_conduction: usize, n_k: usize, spin_polarized: bool) -> Self {
        Self {
            n_valence,
            n_conduction,
            n_k,
            n_sectors: if spin_polarized { 4 } else { 1 },
        }
    }

    pub fn spin_polarized(&self) -> bool {
        self.n_sectors == 4
    }

    /// Number of transitions in one spin sector.
    pub fn block_dimension(&self) -> usize {
        self.n_k * self.n_valence * self.n_conduction
    }

    /// Dimension N of the resonant block.
    pub fn dimension(&self) -> usize {
        self.n_sectors * self.block_dimension()
    }

    pub fn composite(&self, c: usize, v: usize, k: usize) -> usize {
        (c * self.n_valence + v) * self.n_k + k
    }

    /// (c, v, k) of a composite index inside a sector.
    pub fn decompose(&self, index: usize) -> (usize, usize, usize) {
        let k: usize = index % self.n_k;
        let cv: usize = index / self.n_k;
        (cv / self.n_valence, cv % self.n_valence, k)
    }

    pub fn offset(&self, sector: usize) -> usize {
        sector * self.block_dimension()
    }

    pub fn sector(&self, spin_v: usize, spin_c: usize) -> usize {
        if self.spin_polarized() {
            2 * spin_v + spin_c
        } else {
            0
        }
    }

    /// (spin_v, spin_c) of a sector.
    pub fn spins(&self, sector: usize) -> (usize, usize) {
        if self.spin_polarized() {
            (sector / 2, sector % 2)
        } else {
            (0, 0)
        }
    }

    pub fn is_same_spin(&self, sector: usize) -> bool {
        let (spin_v, spin_c) = self.spins(sector);
        spin_v == spin_c
    }

    pub fn same_spin_sectors(&self) -> Vec<usize> {
        (0..self.n_sectors)
            .filter(|s| self.is_same_spin(*s))
            .collect()
    }

    /// Sector with exchanged spins (spin_c, spin_v), coupled by the off-diagonal blocks.
    pub fn partner(&self, sector: usize) -> usize {
        let (spin_v, spin_c) = self.spins(sector);
        self.sector(spin_c, spin_v)
    }
}

/// Rows of the two flattened densities that enter the kernel element between the composite
/// index a of one sector and b of its column sector.
#[derive(Clone, Debug)]
pub struct KernelIndexTable {
    left: Array2<usize>,
    right: Array2<usize>,
}

impl KernelIndexTable {
    /// w[(c v k1), (c' v' k2)] contracts rho_cc(c, c', k1, k2) of the conduction spin with
    /// rho_vv(v, v', k1, k2) of the valence spin.
    pub fn screened_exchange(index: &ExcitonIndex, sector: usize) -> Self {
        let (spin_v, spin_c) = index.spins(sector);
        let (nv, nc, n_k) = (index.n_valence, index.n_conduction, index.n_k);
        Self::build(index, |(c, v, k1), (cp, vp, k2)| {
            (
                pair_row(spin_c, nc, nc, n_k, (c, cp), (k1, k2)),
                pair_row(spin_v, nv, nv, n_k, (v, vp), (k1, k2)),
            )
        })
    }

    /// w^c[(c v k1), (c' v' k2)] between a sector and its partner contracts rho_cv(c, v', k1, k2)
    /// with the momentum-reversed rho_vc(v, c', k1, k2).
    pub fn coupling(index: &ExcitonIndex, sector: usize) -> Self {
        let (spin_v, spin_c) = index.spins(sector);
        let (nv, nc, n_k) = (index.n_valence, index.n_conduction, index.n_k);
        Self::build(index, |(c, v, k1), (cp, vp, k2)| {
            (
                pair_row(spin_c, nc, nv, n_k, (c, vp), (k1, k2)),
                pair_row(spin_v, nv, nc, n_k, (v, cp), (k1, k2)),
            )
        })
    }

    fn build<F>(index: &ExcitonIndex, rows: F) -> Self
    where
        F: Fn((usize, usize, usize), (usize, usize, usize)) -> (usize, usize),
    {
        let m: usize = index.block_dimension();
        let mut left: Array2<usize> = Array2::zeros([m, m]);
        let mut right: Array2<usize> = Array2::zeros([m, m]);
        for (a, b) in iproduct!(0..m, 0..m) {
            let (l, r) = rows(index.decompose(a), index.decompose(b));
            left[[a, b]] = l;
            right[[a, b]] = r;
        }
        Self { left, right }
    }

    pub fn dimension(&self) -> usize {
        self.left.nrows()
    }

    /// Rows of the left and the right density of the element (a, b).
    pub fn rows(&self, a: usize, b: usize) -> (usize, usize) {
        (self.left[[a, b]], self.right[[a, b]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excited_states::transition_densities::flatten_density;
    use ndarray_linalg::c64;

    /// Density block whose elements encode their own indices.
    fn labelled_block(n_spin: usize, n1: usize, n2: usize, n_k: usize) -> Array5<c64> {
        Array5::from_shape_fn((n_spin, n1, n2, n_k * n_k, 2), |(s, i, j, pair, g)| {
            let label: usize = (((s * 10 + i) * 10 + j) * 100 + pair) * 10 + g;
            c64::new(label as f64, 0.0)
        })
    }

    fn label(s: usize, i: usize, j: usize, k1: usize, k2: usize, n_k: usize) -> f64 {
        ((((s * 10 + i) * 10 + j) * 100 + k1 * n_k + k2) * 10) as f64
    }

    #[test]
    fn composite_index_round_trip() {
        let index = ExcitonIndex::new(2, 3, 4, false);
        assert_eq!(index.dimension(), 24);
        let mut seen: Vec<usize> = Vec::new();
        for c in 0..3 {
            for v in 0..2 {
                for k in 0..4 {
                    let a: usize = index.composite(c, v, k);
                    assert_eq!(index.decompose(a), (c, v, k));
                    seen.push(a);
                }
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..24).collect::<Vec<usize>>());
    }

    #[test]
    fn sectors_of_collinear_models() {
        let index = ExcitonIndex::new(1, 1, 2, true);
        assert_eq!(index.dimension(), 8);
        assert_eq!(index.spins(1), (0, 1));
        assert_eq!(index.spins(2), (1, 0));
        assert_eq!(index.partner(1), 2);
        assert_eq!(index.partner(3), 3);
        assert_eq!(index.same_spin_sectors(), vec![0, 3]);
        assert_eq!(index.offset(3), 6);
        let unpolarized = ExcitonIndex::new(1, 1, 2, false);
        assert_eq!(unpolarized.dimension(), 2);
        assert_eq!(unpolarized.same_spin_sectors(), vec![0]);
    }

    /// Compares the tables with a direct lookup of the labelled elements.
    #[test]
    fn screened_exchange_table_matches_brute_force() {
        let (nv, nc, n_k) = (2, 3, 2);
        let rho = labelled_block(2, nv + nc, nv + nc, n_k);
        let cc: Array2<c64> = flatten_density(rho.slice(s![.., nv.., nv.., .., ..]));
        let vv: Array2<c64> = flatten_density(rho.slice(s![.., ..nv, ..nv, .., ..]));

        let index = ExcitonIndex::new(nv, nc, n_k, true);
        for sector in 0..4 {
            let (spin_v, spin_c) = index.spins(sector);
            let table = KernelIndexTable::screened_exchange(&index, sector);
            assert_eq!(table.dimension(), index.block_dimension());
            for (c, v, k1) in iproduct!(0..nc, 0..nv, 0..n_k) {
                for (cp, vp, k2) in iproduct!(0..nc, 0..nv, 0..n_k) {
                    let (l, r) =
                        table.rows(index.composite(c, v, k1), index.composite(cp, vp, k2));
                    assert_eq!(cc[[l, 0]].re, label(spin_c, nv + c, nv + cp, k1, k2, n_k));
                    assert_eq!(vv[[r, 0]].re, label(spin_v, v, vp, k1, k2, n_k));
                }
            }
        }
    }

    #[test]
    fn coupling_table_matches_brute_force() {
        let (nv, nc, n_k) = (2, 1, 3);
        let rho = labelled_block(2, nv + nc, nv + nc, n_k);
        let cv: Array2<c64> = flatten_density(rho.slice(s![.., nv.., ..nv, .., ..]));
        let vc: Array2<c64> = flatten_density(rho.slice(s![.., ..nv, nv.., .., ..]));

        let index = ExcitonIndex::new(nv, nc, n_k, true);
        for sector in 0..4 {
            let (spin_v, spin_c) = index.spins(sector);
            let table = KernelIndexTable::coupling(&index, sector);
            for (c, v, k1) in iproduct!(0..nc, 0..nv, 0..n_k) {
                for (cp, vp, k2) in iproduct!(0..nc, 0..nv, 0..n_k) {
                    let (l, r) =
                        table.rows(index.composite(c, v, k1), index.composite(cp, vp, k2));
                    assert_eq!(cv[[l, 1]].re, label(spin_c, nv + c, vp, k1, k2, n_k) + 1.0);
                    assert_eq!(vc[[r, 1]].re, label(spin_v, v, nv + cp, k1, k2, n_k) + 1.0);
                }
            }
        }
    }
}
