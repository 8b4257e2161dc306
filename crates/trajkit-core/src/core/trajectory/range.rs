use super::error::TrajectoryError;
use std::fmt;
use std::iter::StepBy;
use std::ops::RangeInclusive;

/// Arithmetic sequence `first:step:last` of 1-based raw frame indices.
///
/// The stored `last` is always a member: a requested last that is not aligned
/// with `step` is rounded down to the final reachable index, so `3:2:8`
/// becomes `3:2:7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRange {
    first: usize,
    step: usize,
    last: usize,
}

impl FrameRange {
    /// Builds a range, normalizing `last` down to the closest member.
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::InvalidRange`] if `first` is 0, `step` is 0,
    /// or `first > last`.
    pub fn new(first: usize, last: usize, step: usize) -> Result<Self, TrajectoryError> {
        let invalid = |reason: &str| TrajectoryError::InvalidRange {
            first,
            last,
            step,
            reason: reason.to_string(),
        };
        if first == 0 {
            return Err(invalid("frame indices start at 1"));
        }
        if step == 0 {
            return Err(invalid("step must be at least 1"));
        }
        if first > last {
            return Err(invalid("first frame is after last frame"));
        }
        let last = first + (last - first) / step * step;
        Ok(Self { first, step, last })
    }

    pub fn first(&self) -> usize {
        self.first
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// The final member of the range (not necessarily the requested last).
    pub fn last(&self) -> usize {
        self.last
    }

    pub fn len(&self) -> usize {
        (self.last - self.first) / self.step + 1
    }

    /// Always `false`: a constructed range has at least one member.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.first && index <= self.last && (index - self.first) % self.step == 0
    }

    pub fn iter(&self) -> StepBy<RangeInclusive<usize>> {
        (self.first..=self.last).step_by(self.step)
    }
}

impl IntoIterator for FrameRange {
    type Item = usize;
    type IntoIter = StepBy<RangeInclusive<usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.first, self.step, self.last)
    }
}

/// Requested frame selection; `last: None` means "up to the end of the file".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeConfig {
    pub first: usize,
    pub last: Option<usize>,
    pub step: usize,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            first: 1,
            last: None,
            step: 1,
        }
    }
}

impl RangeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first(mut self, first: usize) -> Self {
        self.first = first;
        self
    }

    pub fn last(mut self, last: usize) -> Self {
        self.last = Some(last);
        self
    }

    pub fn step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    /// Turns the request into a concrete range for a file of `raw_len` frames.
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::InvalidRange`] if the range is malformed or
    /// reaches past the end of the file.
    pub fn resolve(&self, raw_len: usize) -> Result<FrameRange, TrajectoryError> {
        let last = self.last.unwrap_or(raw_len);
        if last > raw_len {
            return Err(TrajectoryError::InvalidRange {
                first: self.first,
                last,
                step: self.step,
                reason: format!("the file only has {raw_len} frame(s)"),
            });
        }
        FrameRange::new(self.first, last, self.step)
    }
}
