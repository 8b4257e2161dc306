use super::error::ReadError;
use crate::core::models::frame::Frame;
use std::path::Path;

/// Defines the interface of a sequential trajectory reader.
///
/// A backend owns an open file and a read cursor that only moves forward:
/// after `k` successful reads (or skips) since [`TrajectoryBackend::open`],
/// the next read returns raw frame `k + 1`. Going back means reopening.
pub trait TrajectoryBackend: Sized {
    /// Opens the file at `path` with the cursor before the first frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its header is malformed.
    fn open(path: &Path) -> Result<Self, ReadError>;

    /// The path this backend was opened from.
    fn path(&self) -> &Path;

    /// Counts the frames in the whole file, independently of the read cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be scanned.
    fn n_frames(&mut self) -> Result<usize, ReadError>;

    /// Reads the next frame into `frame`, overwriting its contents.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::EndOfFile`] when no frame is left, or a parse/I/O
    /// error. The content of `frame` is unspecified after an error.
    fn read_into(&mut self, frame: &mut Frame) -> Result<(), ReadError>;

    /// Reads the next frame into a freshly allocated buffer.
    ///
    /// # Errors
    ///
    /// Same as [`TrajectoryBackend::read_into`].
    fn read(&mut self) -> Result<Frame, ReadError> {
        let mut frame = Frame::new();
        self.read_into(&mut frame)?;
        Ok(frame)
    }

    /// Moves the cursor `n` frames forward without keeping their data.
    ///
    /// The default is `n` discard reads through `scratch`, the only option for a
    /// reader without random access. Backends that can skip cheaply (or seek)
    /// override this; `scratch` may then be left untouched.
    ///
    /// # Errors
    ///
    /// Same as [`TrajectoryBackend::read_into`].
    fn skip(&mut self, n: usize, scratch: &mut Frame) -> Result<(), ReadError> {
        for _ in 0..n {
            self.read_into(scratch)?;
        }
        Ok(())
    }

    /// Releases the underlying file.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend has pending work that fails to flush.
    fn close(self) -> Result<(), ReadError> {
        Ok(())
    }
}
