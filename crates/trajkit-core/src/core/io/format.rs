use super::error::ReadError;
use super::pdb::PdbFile;
use super::traits::TrajectoryBackend;
use super::xyz::XyzFile;
use crate::core::models::frame::Frame;
use crate::core::models::topology::Topology;
use std::fmt;
use std::path::Path;

/// Trajectory formats understood by [`AnyTrajectory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrajectoryFormat {
    Xyz,
    Pdb,
}

impl TrajectoryFormat {
    /// Guesses the format from the file extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::UnsupportedFormat`] for unknown or missing extensions.
    pub fn from_path(path: &Path) -> Result<Self, ReadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "xyz" => Ok(TrajectoryFormat::Xyz),
            "pdb" | "ent" => Ok(TrajectoryFormat::Pdb),
            _ => Err(ReadError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl fmt::Display for TrajectoryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrajectoryFormat::Xyz => write!(f, "XYZ"),
            TrajectoryFormat::Pdb => write!(f, "PDB"),
        }
    }
}

/// Reads the static topology of a structure or trajectory file.
///
/// # Errors
///
/// Returns [`ReadError::UnsupportedFormat`] for unknown extensions, or the
/// format reader's error.
pub fn read_topology(path: &Path) -> Result<Topology, ReadError> {
    match TrajectoryFormat::from_path(path)? {
        TrajectoryFormat::Xyz => XyzFile::read_topology(path),
        TrajectoryFormat::Pdb => PdbFile::read_topology(path),
    }
}

/// A backend chosen at runtime from the file extension.
pub enum AnyTrajectory {
    Xyz(XyzFile),
    Pdb(PdbFile),
}

impl AnyTrajectory {
    pub fn format(&self) -> TrajectoryFormat {
        match self {
            AnyTrajectory::Xyz(_) => TrajectoryFormat::Xyz,
            AnyTrajectory::Pdb(_) => TrajectoryFormat::Pdb,
        }
    }
}

macro_rules! dispatch {
    ($self:expr, $backend:ident => $body:expr) => {
        match $self {
            AnyTrajectory::Xyz($backend) => $body,
            AnyTrajectory::Pdb($backend) => $body,
        }
    };
}

impl TrajectoryBackend for AnyTrajectory {
    fn open(path: &Path) -> Result<Self, ReadError> {
        match TrajectoryFormat::from_path(path)? {
            TrajectoryFormat::Xyz => XyzFile::open(path).map(AnyTrajectory::Xyz),
            TrajectoryFormat::Pdb => PdbFile::open(path).map(AnyTrajectory::Pdb),
        }
    }

    fn path(&self) -> &Path {
        dispatch!(self, backend => backend.path())
    }

    fn n_frames(&mut self) -> Result<usize, ReadError> {
        dispatch!(self, backend => backend.n_frames())
    }

    fn read_into(&mut self, frame: &mut Frame) -> Result<(), ReadError> {
        dispatch!(self, backend => backend.read_into(frame))
    }

    fn skip(&mut self, n: usize, scratch: &mut Frame) -> Result<(), ReadError> {
        dispatch!(self, backend => backend.skip(n, scratch))
    }

    fn close(self) -> Result<(), ReadError> {
        dispatch!(self, backend => backend.close())
    }
}
