use super::Trajectory;
use super::error::TrajectoryError;
use crate::core::io::traits::TrajectoryBackend;
use crate::core::models::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Fresh,
    Active,
    Exhausted,
}

/// A lending cursor over the frames of a [`Trajectory`]'s range.
///
/// Each frame is borrowed from the trajectory's buffer, so the reference
/// returned by [`Frames::advance`] is only valid until the next call. Use
/// [`Frames::owned`] (or [`Frame::clone`]) to keep frames around.
///
/// ```ignore
/// let mut frames = trajectory.frames();
/// while let Some(frame) = frames.advance()? {
///     println!("{} atoms", frame.n_atoms());
/// }
/// ```
pub struct Frames<'t, B: TrajectoryBackend> {
    trajectory: &'t mut Trajectory<B>,
    state: CursorState,
}

impl<'t, B: TrajectoryBackend> Frames<'t, B> {
    pub(super) fn new(trajectory: &'t mut Trajectory<B>) -> Self {
        Self {
            trajectory,
            state: CursorState::Fresh,
        }
    }

    /// Moves to the next frame of the range, or returns `Ok(None)` once the
    /// last frame has been yielded. The first call restarts the trajectory.
    ///
    /// # Errors
    ///
    /// Restart or read errors. The cursor is exhausted after an error.
    pub fn advance(&mut self) -> Result<Option<&Frame>, TrajectoryError> {
        match self.state {
            CursorState::Exhausted => Ok(None),
            CursorState::Fresh => {
                if let Err(err) = self.trajectory.restart() {
                    self.state = CursorState::Exhausted;
                    return Err(err);
                }
                self.state = CursorState::Active;
                Ok(Some(self.trajectory.current_frame()))
            }
            CursorState::Active => {
                if self.trajectory.frame_index() >= self.trajectory.last_index() {
                    self.state = CursorState::Exhausted;
                    return Ok(None);
                }
                if let Err(err) = self.trajectory.next_frame() {
                    self.state = CursorState::Exhausted;
                    return Err(err);
                }
                Ok(Some(self.trajectory.current_frame()))
            }
        }
    }

    /// Raw index and contents of the frame yielded by the last advance.
    pub fn current(&self) -> (usize, &Frame) {
        (self.trajectory.frame_index(), self.trajectory.current_frame())
    }

    pub fn frame_index(&self) -> usize {
        self.trajectory.frame_index()
    }

    /// Numbers the yielded frames 1, 2, ... alongside their raw indices.
    pub fn enumerate(self) -> EnumeratedFrames<'t, B> {
        EnumeratedFrames {
            inner: self,
            position: 0,
        }
    }

    /// A standard iterator that clones every frame out of the buffer.
    pub fn owned(self) -> OwnedFrames<'t, B> {
        OwnedFrames { inner: self }
    }
}

/// See [`Frames::enumerate`].
pub struct EnumeratedFrames<'t, B: TrajectoryBackend> {
    inner: Frames<'t, B>,
    position: usize,
}

impl<B: TrajectoryBackend> EnumeratedFrames<'_, B> {
    /// Yields `(position, raw_index, frame)` with a 1-based `position`.
    ///
    /// # Errors
    ///
    /// Same as [`Frames::advance`].
    pub fn advance(&mut self) -> Result<Option<(usize, usize, &Frame)>, TrajectoryError> {
        if self.inner.advance()?.is_none() {
            return Ok(None);
        }
        self.position += 1;
        let (index, frame) = self.inner.current();
        Ok(Some((self.position, index, frame)))
    }
}

/// See [`Frames::owned`].
pub struct OwnedFrames<'t, B: TrajectoryBackend> {
    inner: Frames<'t, B>,
}

impl<B: TrajectoryBackend> Iterator for OwnedFrames<'_, B> {
    type Item = Result<(usize, Frame), TrajectoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.advance() {
            Ok(Some(frame)) => {
                let frame = frame.clone();
                Some(Ok((self.inner.frame_index(), frame)))
            }
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
