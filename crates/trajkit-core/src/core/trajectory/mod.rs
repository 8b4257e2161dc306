//! Range-aware, restartable iteration over a sequential trajectory file.
//!
//! A [`Trajectory`] owns one [`TrajectoryBackend`], one [`Frame`] buffer, the
//! raw index of the frame currently in that buffer, and the [`FrameRange`] to
//! visit. The backend only reads forward, so:
//!
//! - starting at frame `first` costs `first - 1` discarded frames,
//! - advancing with `step > 1` discards the frames in between,
//! - going back (a new traversal) closes and reopens the file.
//!
//! Invariants maintained by every successful operation:
//!
//! - `frame_index` is a member of `frame_range`;
//! - the backend has consumed exactly `frame_index` frames;
//! - the buffer holds raw frame `frame_index`.
//!
//! A failed restart or range change leaves the previous state untouched. A
//! read error in the middle of [`Trajectory::next_frame`] leaves the backend
//! out of step with the buffer; further advances are refused with
//! [`TrajectoryError::NeedsRestart`] until a restart succeeds.

pub mod error;
pub mod frames;
pub mod range;

pub use error::TrajectoryError;
pub use frames::{EnumeratedFrames, Frames, OwnedFrames};
pub use range::{FrameRange, RangeConfig};

use crate::core::io::traits::TrajectoryBackend;
use crate::core::models::frame::Frame;
use std::path::Path;
use tracing::{debug, trace};

pub struct Trajectory<B: TrajectoryBackend> {
    backend: B,
    frame: Frame,
    frame_index: usize,
    frame_range: FrameRange,
    raw_len: usize,
    needs_restart: bool,
}

impl<B: TrajectoryBackend> Trajectory<B> {
    /// Opens `path` and positions the cursor on the first frame of the range.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::FileOpen`] if the file cannot be opened or scanned,
    /// [`TrajectoryError::InvalidRange`] if `config` does not fit the file,
    /// [`TrajectoryError::Read`] if the leading frames cannot be read.
    pub fn open(path: impl AsRef<Path>, config: RangeConfig) -> Result<Self, TrajectoryError> {
        let path = path.as_ref();
        let file_open = |source| TrajectoryError::FileOpen {
            path: path.to_path_buf(),
            source,
        };
        let mut backend = B::open(path).map_err(file_open)?;
        let raw_len = backend.n_frames().map_err(file_open)?;
        let frame_range = config.resolve(raw_len)?;
        debug!(path = ?path, raw_len, range = %frame_range, "Opened trajectory");
        Self::positioned(backend, frame_range, raw_len)
    }

    /// Wraps an already-open backend, discarding frames up to `first`.
    ///
    /// The cost is linear in `frame_range.first()` because the backend cannot
    /// seek. The backend is expected to be freshly opened.
    ///
    /// # Errors
    ///
    /// Same as [`Trajectory::open`], except that opening cannot fail.
    pub fn from_backend(mut backend: B, frame_range: FrameRange) -> Result<Self, TrajectoryError> {
        let raw_len = backend
            .n_frames()
            .map_err(|source| TrajectoryError::FileOpen {
                path: backend.path().to_path_buf(),
                source,
            })?;
        if frame_range.last() > raw_len {
            return Err(TrajectoryError::InvalidRange {
                first: frame_range.first(),
                last: frame_range.last(),
                step: frame_range.step(),
                reason: format!("the file only has {raw_len} frame(s)"),
            });
        }
        Self::positioned(backend, frame_range, raw_len)
    }

    fn positioned(mut backend: B, frame_range: FrameRange, raw_len: usize) -> Result<Self, TrajectoryError> {
        let mut frame = Frame::new();
        read_first(&mut backend, &mut frame, frame_range.first())?;
        Ok(Self {
            backend,
            frame,
            frame_index: frame_range.first(),
            frame_range,
            raw_len,
            needs_restart: false,
        })
    }

    /// Positions a freshly opened backend on `frame_range.first()` and only
    /// then swaps it in together with its buffer and range.
    ///
    /// On error before the swap nothing changes. A close error on the old
    /// handle is reported after the swap, with the new state in place.
    fn reposition(&mut self, frame_range: FrameRange) -> Result<(), TrajectoryError> {
        let path = self.backend.path().to_path_buf();
        let mut fresh = B::open(&path).map_err(|source| TrajectoryError::FileOpen {
            path: path.clone(),
            source,
        })?;
        let mut frame = Frame::with_capacity(self.frame.n_atoms());
        read_first(&mut fresh, &mut frame, frame_range.first())?;

        let previous = std::mem::replace(&mut self.backend, fresh);
        self.frame = frame;
        self.frame_range = frame_range;
        self.frame_index = frame_range.first();
        self.needs_restart = false;
        previous.close()?;
        Ok(())
    }

    pub fn frame_range(&self) -> FrameRange {
        self.frame_range
    }

    /// Raw (1-based) file index of the frame in the buffer.
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// The live frame buffer. It is overwritten by the next advance or restart.
    pub fn current_frame(&self) -> &Frame {
        &self.frame
    }

    /// A copy of the current frame that survives further advances.
    pub fn current_frame_owned(&self) -> Frame {
        self.frame.clone()
    }

    /// Number of frames in the file, regardless of the configured range.
    pub fn raw_len(&self) -> usize {
        self.raw_len
    }

    /// Number of frames in the configured range.
    pub fn len(&self) -> usize {
        self.frame_range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_range.is_empty()
    }

    pub fn path(&self) -> &Path {
        self.backend.path()
    }

    pub fn first_index(&self) -> usize {
        self.frame_range.first()
    }

    pub fn last_index(&self) -> usize {
        self.frame_range.last()
    }

    pub fn contains_index(&self, index: usize) -> bool {
        self.frame_range.contains(index)
    }

    /// Whether a read error has desynchronised the backend from the buffer.
    pub fn needs_restart(&self) -> bool {
        self.needs_restart
    }

    /// Raw indices visited by a full traversal, without reading anything.
    pub fn indices(&self) -> std::iter::StepBy<std::ops::RangeInclusive<usize>> {
        self.frame_range.iter()
    }

    /// Reopens the file and returns to the first frame of the range.
    ///
    /// Calling it repeatedly always lands on the same frame.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::FileOpen`] if the file cannot be reopened and
    /// [`TrajectoryError::Read`] if the leading frames cannot be read; the
    /// trajectory is unchanged in both cases.
    /// [`TrajectoryError::Backend`] if the previous handle fails to close; the
    /// trajectory is already on the first frame by then.
    pub fn restart(&mut self) -> Result<&mut Self, TrajectoryError> {
        debug!(path = ?self.backend.path(), range = %self.frame_range, "Restarting trajectory");
        self.reposition(self.frame_range)?;
        Ok(self)
    }

    /// Advances to the next raw frame that belongs to the range.
    ///
    /// Raw frames between the current index and the next member are consumed
    /// through [`TrajectoryBackend::skip`].
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::EndOfSequence`] when the current frame is the last of
    /// the range; nothing is read and the index is unchanged.
    /// [`TrajectoryError::Read`] if the backend fails, after which the
    /// trajectory needs a restart.
    /// [`TrajectoryError::NeedsRestart`] after an earlier read failure.
    pub fn next_frame(&mut self) -> Result<&Frame, TrajectoryError> {
        if self.needs_restart {
            return Err(TrajectoryError::NeedsRestart {
                frame_index: self.frame_index,
            });
        }
        let last = self.frame_range.last();
        let end_of_sequence = TrajectoryError::EndOfSequence {
            frame_index: self.frame_index,
            range: self.frame_range,
        };
        if self.frame_index == last {
            return Err(end_of_sequence);
        }

        let mut candidate = self.frame_index + 1;
        while !self.frame_range.contains(candidate) && candidate < last {
            candidate += 1;
        }
        if !self.frame_range.contains(candidate) {
            return Err(end_of_sequence);
        }

        let discarded = candidate - self.frame_index - 1;
        if discarded > 0 {
            trace!(discarded, target = candidate, "Skipping frames outside range");
        }
        let read = self
            .backend
            .skip(discarded, &mut self.frame)
            .and_then(|()| self.backend.read_into(&mut self.frame));
        if let Err(source) = read {
            self.needs_restart = true;
            return Err(TrajectoryError::Read {
                frame_index: candidate,
                source,
            });
        }
        self.frame_index = candidate;
        Ok(&self.frame)
    }

    /// Installs a new range and restarts on its first frame.
    ///
    /// An omitted `last` means the end of the file. The current range, index
    /// and buffer are kept if `config` is invalid or the file cannot be
    /// repositioned.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::InvalidRange`] for a malformed range, otherwise the
    /// errors of [`Trajectory::restart`].
    pub fn set_frame_range(&mut self, config: RangeConfig) -> Result<&mut Self, TrajectoryError> {
        let frame_range = config.resolve(self.raw_len)?;
        debug!(path = ?self.backend.path(), range = %frame_range, "Changing frame range");
        self.reposition(frame_range)?;
        Ok(self)
    }

    /// A cursor over the frames of the range. Its first advance restarts the
    /// trajectory, so every traversal starts from the first frame.
    pub fn frames(&mut self) -> Frames<'_, B> {
        Frames::new(self)
    }

    /// Visits every frame of the range in order.
    ///
    /// # Errors
    ///
    /// Propagates trajectory errors and the first error returned by `f`.
    pub fn for_each_frame<F, E>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(usize, &Frame) -> Result<(), E>,
        E: From<TrajectoryError>,
    {
        let mut frames = self.frames();
        while frames.advance()?.is_some() {
            let (index, frame) = frames.current();
            f(index, frame)?;
        }
        Ok(())
    }

    /// Closes the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend's close error.
    pub fn close(self) -> Result<(), TrajectoryError> {
        debug!(path = ?self.backend.path(), "Closing trajectory");
        self.backend.close()?;
        Ok(())
    }
}

/// Reads raw frame `first` into `frame` from a freshly opened backend.
fn read_first<B: TrajectoryBackend>(backend: &mut B, frame: &mut Frame, first: usize) -> Result<(), TrajectoryError> {
    let read_error = |source| TrajectoryError::Read {
        frame_index: first,
        source,
    };
    if first > 1 {
        trace!(discarded = first - 1, "Skipping to first frame of range");
    }
    backend.skip(first - 1, frame).map_err(read_error)?;
    backend.read_into(frame).map_err(read_error)?;
    Ok(())
}

/// Opens a trajectory, runs `f` on it, and closes it on every exit path.
///
/// An error from `f` takes precedence over a close error.
///
/// # Errors
///
/// Errors from opening, from `f`, or from closing.
pub fn with_trajectory<B, T, E, F>(path: impl AsRef<Path>, config: RangeConfig, f: F) -> Result<T, E>
where
    B: TrajectoryBackend,
    F: FnOnce(&mut Trajectory<B>) -> Result<T, E>,
    E: From<TrajectoryError>,
{
    let mut trajectory = Trajectory::<B>::open(path, config)?;
    let result = f(&mut trajectory);
    let closed = trajectory.close();
    let value = result?;
    closed?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::error::ReadError;
    use nalgebra::Point3;
    use std::path::PathBuf;

    /// In-memory backend whose file stem is its frame count ("10.mock").
    /// Frame `k` has a single atom at `(k, 0, 0)`. It relies on the default
    /// discard-read `skip`.
    ///
    /// Optional stem suffixes: `-failK` makes reading raw frame `K` fail,
    /// `-closefail` makes `close` fail ("10-fail4-closefail.mock").
    struct MockBackend {
        path: PathBuf,
        total: usize,
        consumed: usize,
        fail_at: Option<usize>,
        fail_close: bool,
    }

    impl TrajectoryBackend for MockBackend {
        fn open(path: &Path) -> Result<Self, ReadError> {
            let unsupported = || ReadError::UnsupportedFormat(path.display().to_string());
            let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(unsupported)?;
            let mut parts = stem.split('-');
            let total = parts
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(unsupported)?;
            let mut backend = Self {
                path: path.to_path_buf(),
                total,
                consumed: 0,
                fail_at: None,
                fail_close: false,
            };
            for part in parts {
                if part == "closefail" {
                    backend.fail_close = true;
                } else {
                    let k = part
                        .strip_prefix("fail")
                        .and_then(|k| k.parse().ok())
                        .ok_or_else(unsupported)?;
                    backend.fail_at = Some(k);
                }
            }
            Ok(backend)
        }

        fn path(&self) -> &Path {
            &self.path
        }

        fn n_frames(&mut self) -> Result<usize, ReadError> {
            Ok(self.total)
        }

        fn read_into(&mut self, frame: &mut Frame) -> Result<(), ReadError> {
            if self.consumed == self.total {
                return Err(ReadError::EndOfFile {
                    frames_read: self.consumed,
                });
            }
            self.consumed += 1;
            if self.fail_at == Some(self.consumed) {
                return Err(ReadError::Inconsistency("corrupt frame".to_string()));
            }
            frame.clear();
            frame.positions.push(Point3::new(self.consumed as f64, 0.0, 0.0));
            Ok(())
        }

        fn close(self) -> Result<(), ReadError> {
            if self.fail_close {
                return Err(ReadError::Inconsistency("close failed".to_string()));
            }
            Ok(())
        }
    }

    fn open(total: usize, config: RangeConfig) -> Trajectory<MockBackend> {
        open_named(&format!("{total}.mock"), config)
    }

    fn open_named(name: &str, config: RangeConfig) -> Trajectory<MockBackend> {
        Trajectory::open(name, config).unwrap()
    }

    fn buffer_index(trajectory: &Trajectory<MockBackend>) -> usize {
        trajectory.current_frame().positions[0].x as usize
    }

    fn traverse(trajectory: &mut Trajectory<MockBackend>) -> Vec<usize> {
        let mut visited = Vec::new();
        trajectory
            .for_each_frame(|index, frame| {
                assert_eq!(frame.positions[0].x as usize, index);
                visited.push(index);
                Ok::<_, TrajectoryError>(())
            })
            .unwrap();
        visited
    }

    #[test]
    fn open_positions_on_first_frame_of_range() {
        let trajectory = open(10, RangeConfig::new().first(4).step(3));
        assert_eq!(trajectory.frame_index(), 4);
        assert_eq!(buffer_index(&trajectory), 4);
        assert_eq!(trajectory.raw_len(), 10);
        assert_eq!(trajectory.len(), 3);
        assert_eq!(trajectory.indices().collect::<Vec<_>>(), vec![4, 7, 10]);
    }

    #[test]
    fn open_fails_for_unopenable_path() {
        let result = Trajectory::<MockBackend>::open("not-a-number.mock", RangeConfig::default());
        assert!(matches!(result, Err(TrajectoryError::FileOpen { .. })));
    }

    #[test]
    fn next_frame_skips_to_next_member_and_keeps_buffer_in_sync() {
        let mut trajectory = open(10, RangeConfig::new().first(2).step(3));
        let frame = trajectory.next_frame().unwrap();
        assert_eq!(frame.positions[0].x, 5.0);
        assert_eq!(trajectory.frame_index(), 5);
        trajectory.next_frame().unwrap();
        assert_eq!(trajectory.frame_index(), 8);
        assert_eq!(buffer_index(&trajectory), 8);
    }

    #[test]
    fn next_frame_at_last_fails_without_mutation() {
        let mut trajectory = open(5, RangeConfig::new().first(4).step(1));
        trajectory.next_frame().unwrap();
        assert_eq!(trajectory.frame_index(), 5);

        let err = trajectory.next_frame().unwrap_err();
        assert!(err.is_end_of_sequence());
        assert_eq!(trajectory.frame_index(), 5);
        assert_eq!(buffer_index(&trajectory), 5);
    }

    #[test]
    fn unaligned_last_stops_at_final_member() {
        let mut trajectory = open(10, RangeConfig::new().first(1).last(8).step(3));
        assert_eq!(trajectory.last_index(), 7);
        assert_eq!(traverse(&mut trajectory), vec![1, 4, 7]);
        assert!(trajectory.next_frame().unwrap_err().is_end_of_sequence());
    }

    #[test]
    fn restart_is_idempotent() {
        let mut trajectory = open(10, RangeConfig::new().first(3).step(2));
        trajectory.next_frame().unwrap();
        trajectory.next_frame().unwrap();
        for _ in 0..3 {
            trajectory.restart().unwrap();
            assert_eq!(trajectory.frame_index(), 3);
            assert_eq!(buffer_index(&trajectory), 3);
        }
    }

    #[test]
    fn traversal_is_repeatable() {
        let mut trajectory = open(9, RangeConfig::new().step(2));
        let first = traverse(&mut trajectory);
        let second = traverse(&mut trajectory);
        assert_eq!(first, vec![1, 3, 5, 7, 9]);
        assert_eq!(first, second);
    }

    #[test]
    fn set_frame_range_restarts_on_new_range() {
        let mut trajectory = open(10, RangeConfig::default());
        trajectory.next_frame().unwrap();
        trajectory
            .set_frame_range(RangeConfig::new().first(6).step(2))
            .unwrap();
        assert_eq!(trajectory.frame_index(), 6);
        assert_eq!(buffer_index(&trajectory), 6);
        assert_eq!(traverse(&mut trajectory), vec![6, 8, 10]);
    }

    #[test]
    fn invalid_set_frame_range_keeps_previous_state() {
        let mut trajectory = open(10, RangeConfig::new().first(2));
        trajectory.next_frame().unwrap();
        assert!(matches!(
            trajectory.set_frame_range(RangeConfig::new().first(4).last(20)),
            Err(TrajectoryError::InvalidRange { .. })
        ));
        assert_eq!(trajectory.frame_range(), FrameRange::new(2, 10, 1).unwrap());
        assert_eq!(trajectory.frame_index(), 3);
    }

    #[test]
    fn from_backend_discards_leading_frames() {
        let backend = MockBackend::open(Path::new("6.mock")).unwrap();
        let range = FrameRange::new(3, 6, 3).unwrap();
        let mut trajectory = Trajectory::from_backend(backend, range).unwrap();
        assert_eq!(buffer_index(&trajectory), 3);
        assert_eq!(traverse(&mut trajectory), vec![3, 6]);
    }

    #[test]
    fn from_backend_rejects_range_beyond_file() {
        let backend = MockBackend::open(Path::new("4.mock")).unwrap();
        let range = FrameRange::new(1, 5, 1).unwrap();
        assert!(matches!(
            Trajectory::from_backend(backend, range),
            Err(TrajectoryError::InvalidRange { .. })
        ));
    }

    #[test]
    fn current_frame_owned_survives_advance() {
        let mut trajectory = open(3, RangeConfig::default());
        let snapshot = trajectory.current_frame_owned();
        trajectory.next_frame().unwrap();
        assert_eq!(snapshot.positions[0].x, 1.0);
        assert_eq!(buffer_index(&trajectory), 2);
    }

    #[test]
    fn with_trajectory_returns_closure_result() {
        let count = with_trajectory::<MockBackend, _, TrajectoryError, _>(
            "4.mock",
            RangeConfig::new().step(2),
            |trajectory| {
                let mut n = 0;
                trajectory.for_each_frame(|_, _| {
                    n += 1;
                    Ok::<_, TrajectoryError>(())
                })?;
                Ok(n)
            },
        )
        .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn with_trajectory_propagates_open_errors() {
        let result = with_trajectory::<MockBackend, (), TrajectoryError, _>(
            "3.mock",
            RangeConfig::new().first(5),
            |_| Ok(()),
        );
        assert!(matches!(result, Err(TrajectoryError::InvalidRange { .. })));
    }

    #[test]
    fn failed_close_during_restart_leaves_consistent_state() {
        let mut trajectory = open_named("10-closefail.mock", RangeConfig::new().first(2).step(3));
        trajectory.next_frame().unwrap();
        assert!(matches!(
            trajectory.restart(),
            Err(TrajectoryError::Backend(ReadError::Inconsistency(_)))
        ));
        assert_eq!(trajectory.frame_index(), 2);
        assert_eq!(buffer_index(&trajectory), 2);
        trajectory.next_frame().unwrap();
        assert_eq!(trajectory.frame_index(), 5);
        assert_eq!(buffer_index(&trajectory), 5);
    }

    #[test]
    fn failed_close_during_set_frame_range_installs_new_range() {
        let mut trajectory = open_named("10-closefail.mock", RangeConfig::default());
        assert!(trajectory
            .set_frame_range(RangeConfig::new().first(6).step(2))
            .is_err());
        assert_eq!(trajectory.frame_range(), FrameRange::new(6, 10, 2).unwrap());
        assert_eq!(trajectory.frame_index(), 6);
        assert_eq!(buffer_index(&trajectory), 6);
        trajectory.next_frame().unwrap();
        assert_eq!(buffer_index(&trajectory), 8);
    }

    #[test]
    fn failed_read_on_reposition_keeps_previous_state() {
        let mut trajectory = open_named("10-fail7.mock", RangeConfig::new().first(2));
        trajectory.next_frame().unwrap();
        assert!(matches!(
            trajectory.set_frame_range(RangeConfig::new().first(7)),
            Err(TrajectoryError::Read { frame_index: 7, .. })
        ));
        assert_eq!(trajectory.frame_range(), FrameRange::new(2, 10, 1).unwrap());
        assert_eq!(trajectory.frame_index(), 3);
        assert_eq!(buffer_index(&trajectory), 3);
        trajectory.next_frame().unwrap();
        assert_eq!(buffer_index(&trajectory), 4);
    }

    #[test]
    fn read_failure_requires_restart_before_advancing() {
        let mut trajectory = open_named("10-fail4.mock", RangeConfig::new().step(2));
        trajectory.next_frame().unwrap();
        assert!(matches!(
            trajectory.next_frame(),
            Err(TrajectoryError::Read { frame_index: 5, .. })
        ));
        assert!(trajectory.needs_restart());
        assert!(matches!(
            trajectory.next_frame(),
            Err(TrajectoryError::NeedsRestart { frame_index: 3 })
        ));

        trajectory.restart().unwrap();
        assert!(!trajectory.needs_restart());
        assert_eq!(buffer_index(&trajectory), 1);
        trajectory.next_frame().unwrap();
        assert_eq!(buffer_index(&trajectory), 3);
    }
}
