/// Events a clustering run emits while it works.
///
/// A run is split into named phases; the layout phase is a task whose length is
/// the number of rounds expected.
#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: String },
    PhaseFinish,

    TaskStart { total: u64 },
    TaskIncrement { amount: u64 },
    TaskFinish,

    StatusUpdate { text: String },
    Message(String),
}

impl Progress {
    pub fn phase(name: impl Into<String>) -> Self {
        Progress::PhaseStart { name: name.into() }
    }

    /// Status line for a layout that has reached `round` at `temperature`.
    pub fn layout_status(round: u64, temperature: f64) -> Self {
        Progress::StatusUpdate {
            text: format!("round {}, T = {:.2e}", round, temperature),
        }
    }
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn layout_status_shows_round_and_temperature() {
        match Progress::layout_status(25, 0.7778213593991467) {
            Progress::StatusUpdate { text } => assert_eq!(text, "round 25, T = 7.78e-1"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn reporter_without_callback_is_silent() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::Message("ignored".to_string()));
    }

    #[test]
    fn reporter_forwards_events_to_callback() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            seen.lock().unwrap().push(event);
        }));

        reporter.report(Progress::TaskStart { total: 3 });
        reporter.report(Progress::TaskIncrement { amount: 1 });
        drop(reporter);

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0], Progress::TaskStart { total: 3 }));
        assert!(matches!(seen[1], Progress::TaskIncrement { amount: 1 }));
    }
}
