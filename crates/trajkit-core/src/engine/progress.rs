/// Events emitted by long-running workflows.
///
/// A workflow reports a `PhaseStart`/`PhaseFinish` pair around each phase and,
/// for phases that traverse the trajectory, a `TraversalStart`, one
/// `FrameDone` per visited frame, and a `TraversalFinish`.
#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TraversalStart { total_frames: u64 },
    FrameDone { frame_index: usize },
    TraversalFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `body` between `PhaseStart` and `PhaseFinish` events.
    ///
    /// `PhaseFinish` is only reported when `body` succeeds.
    pub fn phase<T, E>(&self, name: &'static str, body: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        self.report(Progress::PhaseStart { name });
        let value = body()?;
        self.report(Progress::PhaseFinish);
        Ok(value)
    }
}
