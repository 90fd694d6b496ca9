/// Event stream a workflow emits while it runs.
///
/// Phases bracket the coarse stages of a run (scans, catalog, expansion);
/// batch events count individual scan jobs inside a phase. `Message`
/// carries a human-readable notice, e.g. a seed species the catalog does
/// not contain.
#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,
    BatchStart { total_jobs: u64 },
    JobFinish,
    BatchFinish,
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards [`Progress`] events to an optional callback.
///
/// Jobs run on rayon threads, so the callback must be shareable; a
/// reporter without a callback swallows every event, which is what the
/// library tests use.
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
        if let Some(callback) = &self.callback {
            callback(event);
        }
    }
}
