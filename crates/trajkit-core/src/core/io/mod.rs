//! Provides input functionality for trajectory file formats.
//!
//! All readers implement [`traits::TrajectoryBackend`], a forward-only cursor
//! over the frames of one file. Nothing here assumes random access: moving
//! backwards means reopening the file, and skipping frames costs a scan.

pub mod error;
pub mod format;
pub(crate) mod lines;
pub mod pdb;
pub mod traits;
pub mod xyz;
