#[derive(Debug, Clone)]
pub enum Progress {
    /// A measurement run over `total_frames` instantaneous frames is starting.
    RunStart { total_frames: u64 },
    /// One frame has been measured.
    FrameMeasured,
    /// The run is complete.
    RunFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards measurement progress to an optional caller-supplied callback.
///
/// Keeps the core free of any logging or terminal dependency; front-ends bridge
/// the events to whatever UI they own.
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_is_silent() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::RunStart { total_frames: 3 });
        reporter.report(Progress::RunFinish);
    }

    #[test]
    fn reporter_forwards_events_in_order() {
        let seen: Mutex<Vec<Progress>> = Mutex::new(Vec::new());
        {
            let reporter = ProgressReporter::with_callback(Box::new(|event| {
                seen.lock().unwrap().push(event);
            }));
            reporter.report(Progress::RunStart { total_frames: 2 });
            reporter.report(Progress::FrameMeasured);
            reporter.report(Progress::FrameMeasured);
            reporter.report(Progress::RunFinish);
        }
        let events = seen.into_inner().unwrap();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], Progress::RunStart { total_frames: 2 }));
        assert!(matches!(events[3], Progress::RunFinish));
    }
}
