use super::range::FrameRange;
use crate::core::io::error::ReadError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("Failed to open trajectory '{path}': {source}", path = path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: ReadError,
    },

    #[error("No frame of range {range} follows frame {frame_index}")]
    EndOfSequence {
        frame_index: usize,
        range: FrameRange,
    },

    #[error("Invalid frame range (first={first}, last={last}, step={step}): {reason}")]
    InvalidRange {
        first: usize,
        last: usize,
        step: usize,
        reason: String,
    },

    #[error("Failed to read frame {frame_index}: {source}")]
    Read {
        frame_index: usize,
        #[source]
        source: ReadError,
    },

    #[error("Trajectory must be restarted after a failed read past frame {frame_index}")]
    NeedsRestart { frame_index: usize },

    #[error(transparent)]
    Backend(#[from] ReadError),
}

impl TrajectoryError {
    pub fn is_end_of_sequence(&self) -> bool {
        matches!(self, TrajectoryError::EndOfSequence { .. })
    }
}
