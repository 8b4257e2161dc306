use super::unit_cell::UnitCell;
use nalgebra::Point3;

/// One timestep of a trajectory: atomic positions and the periodic box.
///
/// A [`crate::core::trajectory::Trajectory`] owns exactly one `Frame` and
/// overwrites it on every read. Anything that must survive the next advance
/// has to be copied out (`Frame` is `Clone`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Atomic positions in Angstroms, in file order.
    pub positions: Vec<Point3<f64>>,
    /// The simulation box for this step.
    pub unit_cell: UnitCell,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n_atoms: usize) -> Self {
        Self {
            positions: Vec::with_capacity(n_atoms),
            unit_cell: UnitCell::Infinite,
        }
    }

    pub fn n_atoms(&self) -> usize {
        self.positions.len()
    }

    /// Resets the frame for reuse while keeping the allocation.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.unit_cell = UnitCell::Infinite;
    }

    /// Geometric center of all positions, `None` for an empty frame.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.positions.is_empty() {
            return None;
        }
        let sum = self
            .positions
            .iter()
            .fold(nalgebra::Vector3::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / self.positions.len() as f64))
    }
}
