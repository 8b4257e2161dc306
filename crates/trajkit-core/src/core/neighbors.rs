//! Distance-cutoff pair search.
//!
//! [`CellList`] bins one set of positions into cubic cells whose side is at
//! least the cutoff, so every pair within the cutoff lies in the same or in an
//! adjacent cell. Orthorhombic boxes wrap the cell grid; triclinic boxes, and
//! boxes too small for a 3×3×3 grid, fall back to an all-pairs scan with the
//! minimum-image convention.

use crate::core::models::unit_cell::{UnitCell, wrap_fractional, wrap_orthorhombic};
use nalgebra::{Matrix3, Point3, Vector3};
use std::collections::HashMap;

type CellKey = (i64, i64, i64);

#[derive(Debug, Clone)]
enum Geometry {
    Open,
    Periodic {
        lengths: Vector3<f64>,
        dims: [i64; 3],
    },
    BruteForceOrthorhombic {
        lengths: Vector3<f64>,
    },
    BruteForceTriclinic {
        matrix: Matrix3<f64>,
        inverse: Matrix3<f64>,
    },
}

#[derive(Debug, Clone)]
pub struct CellList {
    cutoff: f64,
    geometry: Geometry,
}

impl CellList {
    /// Prepares a pair search for one frame's box.
    ///
    /// A non-positive or non-finite cutoff finds no pairs. A singular triclinic
    /// matrix is treated as no periodicity.
    pub fn new(cutoff: f64, unit_cell: &UnitCell) -> Self {
        let geometry = match unit_cell {
            UnitCell::Infinite => Geometry::Open,
            UnitCell::Orthorhombic { lengths } => {
                let dims = [lengths.x, lengths.y, lengths.z].map(|l| (l / cutoff).floor() as i64);
                if cutoff > 0.0 && dims.iter().all(|&n| n >= 3) {
                    Geometry::Periodic {
                        lengths: *lengths,
                        dims,
                    }
                } else {
                    Geometry::BruteForceOrthorhombic { lengths: *lengths }
                }
            }
            UnitCell::Triclinic { matrix } => match matrix.try_inverse() {
                Some(inverse) => Geometry::BruteForceTriclinic {
                    matrix: *matrix,
                    inverse,
                },
                None => Geometry::Open,
            },
        };
        Self { cutoff, geometry }
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Calls `f(i, j, distance)` for every `a[i]`, `b[j]` closer than the cutoff.
    pub fn for_each_pair_within<F>(&self, a: &[Point3<f64>], b: &[Point3<f64>], mut f: F)
    where
        F: FnMut(usize, usize, f64),
    {
        if !self.searchable() {
            return;
        }
        match self.cell_size() {
            Some(cell) => {
                let bins = self.bin(b, cell);
                for (i, p) in a.iter().enumerate() {
                    self.visit_neighbors(p, cell, &bins, |j| self.report(p, &b[j], i, j, &mut f));
                }
            }
            None => {
                for (i, p) in a.iter().enumerate() {
                    for (j, q) in b.iter().enumerate() {
                        self.report(p, q, i, j, &mut f);
                    }
                }
            }
        }
    }

    /// Calls `f(i, j, distance)` once per unordered pair `i < j` of `a`
    /// closer than the cutoff.
    pub fn for_each_self_pair_within<F>(&self, a: &[Point3<f64>], mut f: F)
    where
        F: FnMut(usize, usize, f64),
    {
        if !self.searchable() {
            return;
        }
        match self.cell_size() {
            Some(cell) => {
                let bins = self.bin(a, cell);
                for (i, p) in a.iter().enumerate() {
                    self.visit_neighbors(p, cell, &bins, |j| {
                        if j > i {
                            self.report(p, &a[j], i, j, &mut f);
                        }
                    });
                }
            }
            None => {
                for (i, p) in a.iter().enumerate() {
                    for (j, q) in a.iter().enumerate().skip(i + 1) {
                        self.report(p, q, i, j, &mut f);
                    }
                }
            }
        }
    }

    fn searchable(&self) -> bool {
        self.cutoff.is_finite() && self.cutoff > 0.0
    }

    /// Cell edge lengths for binned geometries, `None` for brute force.
    fn cell_size(&self) -> Option<Vector3<f64>> {
        match &self.geometry {
            Geometry::Open => Some(Vector3::repeat(self.cutoff)),
            Geometry::Periodic { lengths, dims } => Some(Vector3::new(
                lengths.x / dims[0] as f64,
                lengths.y / dims[1] as f64,
                lengths.z / dims[2] as f64,
            )),
            _ => None,
        }
    }

    fn cell_of(&self, p: &Point3<f64>, cell: &Vector3<f64>) -> CellKey {
        let raw = [
            (p.x / cell.x).floor() as i64,
            (p.y / cell.y).floor() as i64,
            (p.z / cell.z).floor() as i64,
        ];
        self.wrap_key(raw)
    }

    fn wrap_key(&self, key: [i64; 3]) -> CellKey {
        match &self.geometry {
            Geometry::Periodic { dims, .. } => (
                key[0].rem_euclid(dims[0]),
                key[1].rem_euclid(dims[1]),
                key[2].rem_euclid(dims[2]),
            ),
            _ => (key[0], key[1], key[2]),
        }
    }

    fn bin(&self, positions: &[Point3<f64>], cell: Vector3<f64>) -> HashMap<CellKey, Vec<usize>> {
        let mut bins: HashMap<CellKey, Vec<usize>> = HashMap::new();
        for (index, p) in positions.iter().enumerate() {
            bins.entry(self.cell_of(p, &cell)).or_default().push(index);
        }
        bins
    }

    fn visit_neighbors<G>(
        &self,
        p: &Point3<f64>,
        cell: Vector3<f64>,
        bins: &HashMap<CellKey, Vec<usize>>,
        mut visit: G,
    ) where
        G: FnMut(usize),
    {
        let (ix, iy, iz) = self.cell_of(p, &cell);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = self.wrap_key([ix + dx, iy + dy, iz + dz]);
                    if let Some(members) = bins.get(&key) {
                        members.iter().for_each(|&j| visit(j));
                    }
                }
            }
        }
    }

    #[inline]
    fn report<F>(&self, p: &Point3<f64>, q: &Point3<f64>, i: usize, j: usize, f: &mut F)
    where
        F: FnMut(usize, usize, f64),
    {
        let dist = self.image(q - p).norm();
        if dist <= self.cutoff {
            f(i, j, dist);
        }
    }

    #[inline]
    fn image(&self, delta: Vector3<f64>) -> Vector3<f64> {
        match &self.geometry {
            Geometry::Open => delta,
            Geometry::Periodic { lengths, .. } | Geometry::BruteForceOrthorhombic { lengths } => {
                wrap_orthorhombic(delta, lengths)
            }
            Geometry::BruteForceTriclinic { matrix, inverse } => {
                wrap_fractional(delta, matrix, inverse)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    /// Deterministic pseudo-random points in `[0, extent)³`.
    fn scattered_points(n: usize, extent: f64, seed: u64) -> Vec<Point3<f64>> {
        let mut state = seed;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64 * extent
        };
        (0..n).map(|_| Point3::new(next(), next(), next())).collect()
    }

    fn brute_force_pairs(
        a: &[Point3<f64>],
        b: &[Point3<f64>],
        cutoff: f64,
        cell: &UnitCell,
    ) -> Vec<(usize, usize, f64)> {
        let mut pairs = Vec::new();
        for (i, p) in a.iter().enumerate() {
            for (j, q) in b.iter().enumerate() {
                let dist = cell.minimum_image(q - p).norm();
                if dist <= cutoff {
                    pairs.push((i, j, dist));
                }
            }
        }
        pairs
    }

    fn collect_pairs(list: &CellList, a: &[Point3<f64>], b: &[Point3<f64>]) -> Vec<(usize, usize, f64)> {
        let mut pairs = Vec::new();
        list.for_each_pair_within(a, b, |i, j, d| pairs.push((i, j, d)));
        pairs.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        pairs
    }

    fn assert_same_pairs(mut expected: Vec<(usize, usize, f64)>, actual: Vec<(usize, usize, f64)>) {
        expected.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        assert_eq!(expected.len(), actual.len());
        for (e, a) in expected.iter().zip(&actual) {
            assert_eq!((e.0, e.1), (a.0, a.1));
            assert!((e.2 - a.2).abs() < TOLERANCE);
        }
    }

    #[test]
    fn open_cell_list_matches_brute_force() {
        let a = scattered_points(60, 20.0, 1);
        let b = scattered_points(80, 20.0, 2);
        let cell = UnitCell::Infinite;
        let list = CellList::new(4.0, &cell);
        assert_same_pairs(brute_force_pairs(&a, &b, 4.0, &cell), collect_pairs(&list, &a, &b));
    }

    #[test]
    fn periodic_cell_list_finds_pairs_across_the_boundary() {
        let cell = UnitCell::Orthorhombic {
            lengths: Vector3::new(20.0, 20.0, 20.0),
        };
        let a = vec![Point3::new(0.5, 10.0, 10.0)];
        let b = vec![Point3::new(19.5, 10.0, 10.0), Point3::new(10.0, 10.0, 10.0)];
        let list = CellList::new(3.0, &cell);
        let pairs = collect_pairs(&list, &a, &b);
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].0, pairs[0].1), (0, 0));
        assert!((pairs[0].2 - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn periodic_cell_list_matches_brute_force_with_unwrapped_positions() {
        let cell = UnitCell::Orthorhombic {
            lengths: Vector3::new(18.0, 21.0, 25.0),
        };
        let mut a = scattered_points(50, 18.0, 3);
        a.iter_mut().step_by(3).for_each(|p| p.x += 18.0);
        let b = scattered_points(70, 21.0, 4);
        let list = CellList::new(5.0, &cell);
        assert_same_pairs(brute_force_pairs(&a, &b, 5.0, &cell), collect_pairs(&list, &a, &b));
    }

    #[test]
    fn small_and_triclinic_boxes_fall_back_to_brute_force() {
        let small = UnitCell::Orthorhombic {
            lengths: Vector3::new(8.0, 8.0, 8.0),
        };
        let triclinic = UnitCell::from_lengths_and_angles([20.0, 20.0, 20.0], [80.0, 85.0, 75.0]);
        let a = scattered_points(30, 8.0, 5);
        let b = scattered_points(30, 8.0, 6);
        for cell in [small, triclinic] {
            let list = CellList::new(3.5, &cell);
            assert_same_pairs(brute_force_pairs(&a, &b, 3.5, &cell), collect_pairs(&list, &a, &b));
        }
    }

    #[test]
    fn self_pairs_are_unordered_and_unique() {
        let a = scattered_points(100, 15.0, 7);
        let cell = UnitCell::Orthorhombic {
            lengths: Vector3::new(15.0, 15.0, 15.0),
        };
        let list = CellList::new(4.0, &cell);
        let mut pairs = Vec::new();
        list.for_each_self_pair_within(&a, |i, j, d| pairs.push((i, j, d)));
        assert!(pairs.iter().all(|&(i, j, _)| i < j));

        let expected: Vec<_> = brute_force_pairs(&a, &a, 4.0, &cell)
            .into_iter()
            .filter(|&(i, j, _)| i < j)
            .collect();
        pairs.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        assert_same_pairs(expected, pairs);
    }

    #[test]
    fn non_positive_cutoff_finds_nothing() {
        let a = vec![Point3::origin(), Point3::origin()];
        let list = CellList::new(0.0, &UnitCell::Infinite);
        let mut count = 0;
        list.for_each_self_pair_within(&a, |_, _, _| count += 1);
        assert_eq!(count, 0);
    }
}
