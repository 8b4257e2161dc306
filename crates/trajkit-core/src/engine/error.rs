use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::error::ReadError;
use crate::core::secondary::ClassifierError;
use crate::core::trajectory::TrajectoryError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),

    #[error("Failed to read topology '{path}': {source}", path = path.display())]
    Topology {
        path: PathBuf,
        #[source]
        source: ReadError,
    },

    #[error("Frame {frame_index} has {frame} atoms but the topology has {topology}")]
    AtomCountMismatch {
        frame_index: usize,
        frame: usize,
        topology: usize,
    },

    #[error("Atom index {index} is out of range for a frame of {n_atoms} atoms")]
    AtomIndexOutOfRange { index: usize, n_atoms: usize },

    #[error("Selection '{group}' matches no atom")]
    EmptySelection { group: &'static str },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Secondary-structure classifier failed on frame {frame_index}: {source}")]
    Classifier {
        frame_index: usize,
        #[source]
        source: ClassifierError,
    },

    #[error("Classifier returned {found} classes for {expected} residues on frame {frame_index}")]
    ClassifierOutput {
        frame_index: usize,
        expected: usize,
        found: usize,
    },
}
