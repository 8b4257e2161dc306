use super::error::EngineError;
use crate::core::io::format::{AnyTrajectory, read_topology};
use crate::core::io::traits::TrajectoryBackend;
use crate::core::models::atom::Atom;
use crate::core::models::frame::Frame;
use crate::core::models::topology::Topology;
use crate::core::models::unit_cell::UnitCell;
use crate::core::trajectory::{FrameRange, Frames, RangeConfig, Trajectory};
use nalgebra::Point3;
use std::path::Path;
use tracing::info;

/// A static topology paired with the trajectory of its coordinates.
///
/// Every frame visited through [`Simulation::for_each_frame`] is checked to
/// have as many atoms as the topology.
pub struct Simulation<B: TrajectoryBackend = AnyTrajectory> {
    topology: Topology,
    trajectory: Trajectory<B>,
}

/// Coordinates of `frame`, in topology order.
pub fn positions(frame: &Frame) -> &[Point3<f64>] {
    &frame.positions
}

pub fn unit_cell(frame: &Frame) -> &UnitCell {
    &frame.unit_cell
}

impl<B: TrajectoryBackend> Simulation<B> {
    /// Reads the topology file and opens the trajectory file.
    ///
    /// # Errors
    ///
    /// [`EngineError::Topology`] if the topology cannot be read, trajectory
    /// errors, or [`EngineError::AtomCountMismatch`] if the first frame of
    /// the range does not match the topology.
    pub fn open(
        topology_path: impl AsRef<Path>,
        trajectory_path: impl AsRef<Path>,
        config: RangeConfig,
    ) -> Result<Self, EngineError> {
        let topology_path = topology_path.as_ref();
        let topology = read_topology(topology_path).map_err(|source| EngineError::Topology {
            path: topology_path.to_path_buf(),
            source,
        })?;
        let trajectory = Trajectory::open(trajectory_path, config)?;
        info!(
            atoms = topology.len(),
            frames = trajectory.len(),
            raw_frames = trajectory.raw_len(),
            "Loaded simulation"
        );
        Self::from_parts(topology, trajectory)
    }

    /// # Errors
    ///
    /// [`EngineError::AtomCountMismatch`] if the current frame does not match
    /// the topology.
    pub fn from_parts(topology: Topology, trajectory: Trajectory<B>) -> Result<Self, EngineError> {
        check_atom_count(&topology, trajectory.frame_index(), trajectory.current_frame())?;
        Ok(Self {
            topology,
            trajectory,
        })
    }

    pub fn into_parts(self) -> (Topology, Trajectory<B>) {
        (self.topology, self.trajectory)
    }

    pub fn atoms(&self) -> &[Atom] {
        self.topology.atoms()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn trajectory(&self) -> &Trajectory<B> {
        &self.trajectory
    }

    pub fn trajectory_mut(&mut self) -> &mut Trajectory<B> {
        &mut self.trajectory
    }

    pub fn len(&self) -> usize {
        self.trajectory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectory.is_empty()
    }

    pub fn raw_len(&self) -> usize {
        self.trajectory.raw_len()
    }

    pub fn frame_range(&self) -> FrameRange {
        self.trajectory.frame_range()
    }

    pub fn frame_index(&self) -> usize {
        self.trajectory.frame_index()
    }

    pub fn current_frame(&self) -> &Frame {
        self.trajectory.current_frame()
    }

    /// # Errors
    ///
    /// See [`Trajectory::restart`].
    pub fn restart(&mut self) -> Result<&mut Self, EngineError> {
        self.trajectory.restart()?;
        Ok(self)
    }

    /// # Errors
    ///
    /// See [`Trajectory::set_frame_range`].
    pub fn set_frame_range(&mut self, config: RangeConfig) -> Result<&mut Self, EngineError> {
        self.trajectory.set_frame_range(config)?;
        Ok(self)
    }

    /// The trajectory's lending cursor. Atom counts are not checked.
    pub fn frames(&mut self) -> Frames<'_, B> {
        self.trajectory.frames()
    }

    /// Visits every frame of the range after checking its atom count.
    ///
    /// # Errors
    ///
    /// Trajectory errors, [`EngineError::AtomCountMismatch`], or the first
    /// error returned by `f`.
    pub fn for_each_frame<F, E>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(usize, &Frame) -> Result<(), E>,
        E: From<EngineError>,
    {
        let mut frames = self.trajectory.frames();
        while frames.advance().map_err(EngineError::from)?.is_some() {
            let (index, frame) = frames.current();
            check_atom_count(&self.topology, index, frame)?;
            f(index, frame)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Trajectory::close`].
    pub fn close(self) -> Result<(), EngineError> {
        self.trajectory.close()?;
        Ok(())
    }
}

fn check_atom_count(topology: &Topology, frame_index: usize, frame: &Frame) -> Result<(), EngineError> {
    if frame.n_atoms() == topology.len() {
        Ok(())
    } else {
        Err(EngineError::AtomCountMismatch {
            frame_index,
            frame: frame.n_atoms(),
            topology: topology.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::xyz::XyzFile;
    use std::path::PathBuf;

    fn xyz_frame(n_atoms: usize, x: f64) -> String {
        let mut frame = format!("{n_atoms}\n\n");
        for i in 0..n_atoms {
            frame.push_str(&format!("C {x} {i} 0\n"));
        }
        frame
    }

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn open_pairs_topology_with_trajectory() {
        let dir = tempfile::tempdir().unwrap();
        let content: String = (1..=4).map(|k| xyz_frame(3, k as f64)).collect();
        let path = write(&dir, "traj.xyz", &content);

        let mut simulation =
            Simulation::<XyzFile>::open(&path, &path, RangeConfig::new().first(2).step(2)).unwrap();
        assert_eq!(simulation.atoms().len(), 3);
        assert_eq!(simulation.len(), 2);
        assert_eq!(simulation.raw_len(), 4);
        assert_eq!(positions(simulation.current_frame())[0].x, 2.0);
        assert!(!unit_cell(simulation.current_frame()).is_periodic());

        let mut seen = Vec::new();
        simulation
            .for_each_frame(|index, frame| {
                seen.push((index, frame.positions[0].x));
                Ok::<_, EngineError>(())
            })
            .unwrap();
        assert_eq!(seen, vec![(2, 2.0), (4, 4.0)]);
        simulation.close().unwrap();
    }

    #[test]
    fn mismatched_first_frame_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let topology = write(&dir, "top.xyz", &xyz_frame(2, 0.0));
        let trajectory = write(&dir, "traj.xyz", &xyz_frame(3, 0.0));
        let result = Simulation::<XyzFile>::open(&topology, &trajectory, RangeConfig::default());
        assert!(matches!(
            result,
            Err(EngineError::AtomCountMismatch {
                frame_index: 1,
                frame: 3,
                topology: 2
            })
        ));
    }

    #[test]
    fn for_each_frame_checks_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let content = format!("{}{}", xyz_frame(2, 0.0), xyz_frame(1, 1.0));
        let path = write(&dir, "traj.xyz", &content);
        let mut simulation = Simulation::<XyzFile>::open(&path, &path, RangeConfig::default()).unwrap();
        let result = simulation.for_each_frame(|_, _| Ok::<_, EngineError>(()));
        assert!(matches!(
            result,
            Err(EngineError::AtomCountMismatch { frame_index: 2, .. })
        ));
    }

    #[test]
    fn missing_topology_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let trajectory = write(&dir, "traj.xyz", &xyz_frame(1, 0.0));
        let missing = dir.path().join("missing.pdb");
        match Simulation::<AnyTrajectory>::open(&missing, &trajectory, RangeConfig::default()) {
            Err(EngineError::Topology { path, .. }) => assert_eq!(path, missing),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("missing topology was accepted"),
        }
    }

    #[test]
    fn set_frame_range_and_restart_chain() {
        let dir = tempfile::tempdir().unwrap();
        let content: String = (1..=5).map(|k| xyz_frame(1, k as f64)).collect();
        let path = write(&dir, "traj.xyz", &content);
        let mut simulation = Simulation::<XyzFile>::open(&path, &path, RangeConfig::default()).unwrap();
        simulation
            .set_frame_range(RangeConfig::new().first(3))
            .unwrap()
            .restart()
            .unwrap();
        assert_eq!(simulation.frame_index(), 3);
        assert_eq!(simulation.frame_range(), FrameRange::new(3, 5, 1).unwrap());
    }
}
