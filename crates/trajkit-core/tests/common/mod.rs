#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;
use trajkit::core::io::xyz::XyzFile;
use trajkit::core::trajectory::{RangeConfig, Trajectory};

/// An XYZ file of `n_frames` two-atom frames; frame `k` has its first atom at
/// `x = k`, so the buffer tells which raw frame it holds.
pub struct NumberedTrajectory {
    _dir: TempDir,
    pub path: PathBuf,
    pub n_frames: usize,
}

impl NumberedTrajectory {
    pub fn new(n_frames: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("numbered.xyz");
        let content: String = (1..=n_frames)
            .map(|k| format!("2\nframe {k}\nC {k} 0 0\nO {k} 1 0\n"))
            .collect();
        std::fs::write(&path, content).unwrap();
        Self {
            _dir: dir,
            path,
            n_frames,
        }
    }

    pub fn open(&self, config: RangeConfig) -> Trajectory<XyzFile> {
        Trajectory::open(&self.path, config).unwrap()
    }
}

/// Raw index encoded in the frame buffer.
pub fn encoded_index(trajectory: &Trajectory<XyzFile>) -> usize {
    trajectory.current_frame().positions[0].x as usize
}

/// Full traversal through the lending cursor, checking each buffer against
/// the reported index.
pub fn traverse(trajectory: &mut Trajectory<XyzFile>) -> Vec<usize> {
    let mut indices = Vec::new();
    let mut frames = trajectory.frames();
    while let Some(frame) = frames.advance().unwrap() {
        let index = frame.positions[0].x as usize;
        assert_eq!(index, frames.frame_index());
        indices.push(index);
    }
    indices
}
