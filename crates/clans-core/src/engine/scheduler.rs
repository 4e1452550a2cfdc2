use super::config::ConfigError;
use super::context::LayoutContext;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::state::{LayoutSnapshot, SchedulerState};
use crate::core::similarity::connectivity::Threshold;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// A cooling run stops once the temperature falls below this value.
pub const CONVERGENCE_TEMPERATURE: f64 = 1e-5;

/// Rounds between two progress increments and status lines.
const STATUS_INTERVAL: u64 = 25;

/// A cooperative cancellation flag shared between the scheduler and its drivers.
///
/// The flag is only looked at between two steps; a step that has started always
/// completes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears the flag, returning whether it was set.
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// The most recently committed layout, readable from any thread.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHandle(Arc<RwLock<Option<Arc<LayoutSnapshot>>>>);

impl SnapshotHandle {
    pub fn latest(&self) -> Option<Arc<LayoutSnapshot>> {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn publish(&self, snapshot: LayoutSnapshot) -> Arc<LayoutSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut guard = match self.0.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(Arc::clone(&snapshot));
        snapshot
    }
}

/// How a run ended. `rounds` counts the steps taken by this call only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { rounds: u64 },
    Converged { rounds: u64 },
    Cancelled { rounds: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Bounded { remaining: u64 },
    UntilConverged,
}

/// Drives a [`LayoutContext`] through its lifecycle.
///
/// ```text
/// Uninitialized -> Ready -> Running <-> Paused -> Converged
/// ```
///
/// `initialize` returns to `Ready` from any state.
#[derive(Debug)]
pub struct LayoutScheduler {
    context: LayoutContext,
    state: SchedulerState,
    cancel: CancelToken,
    snapshots: SnapshotHandle,
    pending: Option<RunMode>,
}

impl LayoutScheduler {
    pub fn new(context: LayoutContext) -> Self {
        Self {
            context,
            state: SchedulerState::Uninitialized,
            cancel: CancelToken::new(),
            snapshots: SnapshotHandle::default(),
            pending: None,
        }
    }

    /// Wraps a context restored from a session; it continues from its saved state.
    pub fn restored(context: LayoutContext) -> Self {
        let converged = context.engine().parameters().cooling < 1.0
            && context.engine().temperature() < CONVERGENCE_TEMPERATURE;
        let mut scheduler = Self::new(context);
        scheduler.state = if converged {
            SchedulerState::Converged
        } else {
            SchedulerState::Paused
        };
        scheduler.publish();
        scheduler
    }

    /// Shares an externally created cancellation flag with this scheduler.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn context(&self) -> &LayoutContext {
        &self.context
    }

    pub fn into_context(self) -> LayoutContext {
        self.context
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn snapshots(&self) -> SnapshotHandle {
        self.snapshots.clone()
    }

    /// Scatters the active population at random and resets temperature and momentum.
    pub fn initialize(&mut self) {
        self.context.initialize();
        self.pending = None;
        self.state = SchedulerState::Ready;
        self.publish();
        debug!("Layout initialized.");
    }

    /// Runs exactly `rounds` steps unless cancelled first.
    pub fn run_bounded(
        &mut self,
        rounds: u64,
        reporter: &ProgressReporter,
    ) -> Result<RunOutcome, EngineError> {
        self.require_startable("start a bounded run")?;
        self.pending = Some(RunMode::Bounded { remaining: rounds });
        self.drive(reporter)
    }

    /// Steps until the temperature drops below [`CONVERGENCE_TEMPERATURE`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `cooling` is 1, since the run would
    /// never end.
    pub fn run_until_converged(
        &mut self,
        reporter: &ProgressReporter,
    ) -> Result<RunOutcome, EngineError> {
        self.require_startable("start a cooling run")?;
        let cooling = self.context.engine().parameters().cooling;
        if cooling >= 1.0 {
            return Err(ConfigError::OutOfRange {
                parameter: "cooling",
                value: cooling,
                valid: "(0, 1) for a run until convergence",
            }
            .into());
        }
        self.pending = Some(RunMode::UntilConverged);
        self.drive(reporter)
    }

    /// Continues a cancelled run exactly where it stopped.
    pub fn resume(&mut self, reporter: &ProgressReporter) -> Result<RunOutcome, EngineError> {
        if self.state != SchedulerState::Paused || self.pending.is_none() {
            return Err(EngineError::InvalidTransition {
                state: self.state,
                action: "resume",
            });
        }
        self.drive(reporter)
    }

    /// Advances the layout by a single step for an external driver.
    pub fn step_once(&mut self) -> Result<Arc<LayoutSnapshot>, EngineError> {
        self.require_startable("step")?;
        self.context.step();
        self.state = SchedulerState::Paused;
        Ok(self.publish())
    }

    /// Re-thresholds the data. Positions are kept and the scheduler returns to `Ready`.
    pub fn set_threshold(&mut self, threshold: Threshold) -> Result<(), EngineError> {
        self.context.set_threshold(threshold)?;
        self.pending = None;
        if self.state != SchedulerState::Uninitialized {
            self.state = SchedulerState::Ready;
        }
        Ok(())
    }

    /// Restricts the layout to the given global indices.
    pub fn enter_subset(&mut self, members: &[usize]) -> Result<(), EngineError> {
        self.require_initialized("enter subset mode")?;
        self.context.select_subset_indices(members)?;
        self.after_mode_switch();
        Ok(())
    }

    pub fn leave_subset(&mut self) -> Result<(), EngineError> {
        self.require_initialized("leave subset mode")?;
        self.context.clear_subset();
        self.after_mode_switch();
        Ok(())
    }

    fn after_mode_switch(&mut self) {
        self.pending = None;
        self.state = SchedulerState::Ready;
        self.publish();
    }

    fn require_initialized(&self, action: &'static str) -> Result<(), EngineError> {
        if self.state == SchedulerState::Uninitialized {
            return Err(EngineError::InvalidTransition {
                state: self.state,
                action,
            });
        }
        Ok(())
    }

    fn require_startable(&self, action: &'static str) -> Result<(), EngineError> {
        match self.state {
            SchedulerState::Ready | SchedulerState::Paused => Ok(()),
            state => Err(EngineError::InvalidTransition { state, action }),
        }
    }

    fn publish(&self) -> Arc<LayoutSnapshot> {
        self.snapshots.publish(self.context.snapshot())
    }

    fn expected_rounds(&self, mode: RunMode) -> u64 {
        match mode {
            RunMode::Bounded { remaining } => remaining,
            RunMode::UntilConverged => {
                let engine = self.context.engine();
                rounds_to_converge(engine.temperature(), engine.parameters().cooling)
            }
        }
    }

    fn drive(&mut self, reporter: &ProgressReporter) -> Result<RunOutcome, EngineError> {
        let mut mode = self
            .pending
            .ok_or_else(|| EngineError::Internal("no run is pending".to_string()))?;
        self.state = SchedulerState::Running;
        reporter.report(Progress::TaskStart {
            total: self.expected_rounds(mode),
        });

        let empty = self.context.engine().active().size() == 0;
        let mut rounds = 0;
        let outcome = loop {
            match mode {
                RunMode::Bounded { remaining: 0 } => {
                    self.state = SchedulerState::Paused;
                    self.pending = None;
                    break RunOutcome::Completed { rounds };
                }
                RunMode::UntilConverged
                    if empty || self.context.engine().temperature() < CONVERGENCE_TEMPERATURE =>
                {
                    self.state = SchedulerState::Converged;
                    self.pending = None;
                    break RunOutcome::Converged { rounds };
                }
                _ => {}
            }

            if self.cancel.take() {
                self.state = SchedulerState::Paused;
                self.pending = Some(mode);
                break RunOutcome::Cancelled { rounds };
            }

            self.context.step();
            rounds += 1;
            if let RunMode::Bounded { remaining } = &mut mode {
                *remaining -= 1;
            }
            self.publish();
            if rounds % STATUS_INTERVAL == 0 {
                reporter.report(Progress::TaskIncrement {
                    amount: STATUS_INTERVAL,
                });
                let engine = self.context.engine();
                reporter.report(Progress::layout_status(engine.round(), engine.temperature()));
            }
        };

        let unreported = rounds % STATUS_INTERVAL;
        if unreported > 0 {
            reporter.report(Progress::TaskIncrement { amount: unreported });
        }
        reporter.report(Progress::TaskFinish);
        let engine = self.context.engine();
        info!(
            ?outcome,
            round = engine.round(),
            temperature = engine.temperature(),
            "Layout run stopped."
        );
        Ok(outcome)
    }
}

/// Number of steps until `temperature` falls below [`CONVERGENCE_TEMPERATURE`].
pub fn rounds_to_converge(temperature: f64, cooling: f64) -> u64 {
    if temperature < CONVERGENCE_TEMPERATURE {
        return 0;
    }
    if cooling >= 1.0 {
        return u64::MAX;
    }
    let exact = (CONVERGENCE_TEMPERATURE / temperature).ln() / cooling.ln();
    // A ratio that is an exact integer still needs one more step to fall strictly below.
    (exact.floor() as u64) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::coordinates::Dimensions;
    use crate::core::models::similarity::{SimilarityMatrix, ValueKind};
    use crate::engine::config::{LayoutConfigBuilder, LayoutParameters};
    use crate::engine::state::LayoutMode;
    use std::sync::Mutex;

    fn scheduler_with(cooling: f64, rounds: u64) -> LayoutScheduler {
        let similarity = SimilarityMatrix::from_triples(
            5,
            vec![(0, 1, 1e-50), (1, 2, 1e-30), (3, 4, 1e-20)],
            ValueKind::Evalue,
        )
        .unwrap();
        let config = LayoutConfigBuilder::new()
            .parameters(LayoutParameters {
                cooling,
                ..LayoutParameters::default()
            })
            .threshold(Threshold::evalue(1e-10))
            .dimensions(Dimensions::Two)
            .rounds_requested(rounds)
            .seed(Some(1))
            .build()
            .unwrap();
        LayoutScheduler::new(LayoutContext::new(similarity, &config).unwrap())
    }

    fn silent() -> ProgressReporter<'static> {
        ProgressReporter::new()
    }

    #[test]
    fn stepping_before_initialize_is_rejected() {
        let mut scheduler = scheduler_with(0.99, 0);
        assert_eq!(scheduler.state(), SchedulerState::Uninitialized);
        assert!(matches!(
            scheduler.step_once(),
            Err(EngineError::InvalidTransition {
                state: SchedulerState::Uninitialized,
                ..
            })
        ));
        assert!(scheduler.run_bounded(3, &silent()).is_err());
    }

    #[test]
    fn bounded_run_completes_and_pauses() {
        let mut scheduler = scheduler_with(1.0, 25);
        scheduler.initialize();

        let outcome = scheduler.run_bounded(25, &silent()).unwrap();

        assert_eq!(outcome, RunOutcome::Completed { rounds: 25 });
        assert_eq!(scheduler.state(), SchedulerState::Paused);
        let latest = scheduler.snapshots().latest().unwrap();
        assert_eq!(latest.round, 25);
        assert_eq!(latest.temperature, 1.0);

        let outcome = scheduler.run_bounded(5, &silent()).unwrap();
        assert_eq!(outcome, RunOutcome::Completed { rounds: 5 });
        assert_eq!(scheduler.context().engine().round(), 30);
    }

    #[test]
    fn cooling_run_converges_after_expected_rounds() {
        let mut scheduler = scheduler_with(0.99, 0);
        scheduler.initialize();

        let outcome = scheduler.run_until_converged(&silent()).unwrap();

        assert_eq!(outcome, RunOutcome::Converged { rounds: 1146 });
        assert_eq!(scheduler.state(), SchedulerState::Converged);
        assert!(scheduler.context().engine().temperature() < CONVERGENCE_TEMPERATURE);
    }

    #[test]
    fn rounds_to_converge_matches_geometric_cooling() {
        assert_eq!(rounds_to_converge(1.0, 0.99), 1146);
        assert_eq!(rounds_to_converge(1e-6, 0.99), 0);
        assert_eq!(rounds_to_converge(1.0, 1.0), u64::MAX);
    }

    #[test]
    fn converged_scheduler_only_accepts_initialize() {
        let mut scheduler = scheduler_with(0.5, 0);
        scheduler.initialize();
        scheduler.run_until_converged(&silent()).unwrap();

        assert!(matches!(
            scheduler.resume(&silent()),
            Err(EngineError::InvalidTransition { .. })
        ));
        assert!(scheduler.run_bounded(1, &silent()).is_err());

        scheduler.initialize();
        assert_eq!(scheduler.state(), SchedulerState::Ready);
        assert_eq!(scheduler.context().engine().round(), 0);
    }

    #[test]
    fn cooling_run_without_cooling_is_a_config_error() {
        let mut scheduler = scheduler_with(1.0, 10);
        scheduler.initialize();
        assert!(matches!(
            scheduler.run_until_converged(&silent()),
            Err(EngineError::Config { .. })
        ));
        assert_eq!(scheduler.state(), SchedulerState::Ready);
    }

    #[test]
    fn cancellation_pauses_between_steps_and_resume_finishes_the_run() {
        let mut scheduler = scheduler_with(1.0, 40);
        scheduler.initialize();
        let token = scheduler.cancel_token();
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::StatusUpdate { .. } = event {
                token.cancel();
            }
        }));

        let outcome = scheduler.run_bounded(40, &reporter).unwrap();
        assert_eq!(outcome, RunOutcome::Cancelled { rounds: 25 });
        assert_eq!(scheduler.state(), SchedulerState::Paused);
        assert_eq!(scheduler.snapshots().latest().unwrap().round, 25);

        let outcome = scheduler.resume(&silent()).unwrap();
        assert_eq!(outcome, RunOutcome::Completed { rounds: 15 });
        assert_eq!(scheduler.context().engine().round(), 40);
        assert!(!scheduler.cancel_token().is_cancelled());
    }

    #[test]
    fn increments_are_batched_and_sum_to_the_rounds_run() {
        let mut scheduler = scheduler_with(1.0, 60);
        scheduler.initialize();
        let increments = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::TaskIncrement { amount } = event {
                increments.lock().unwrap().push(amount);
            }
        }));

        scheduler.run_bounded(60, &reporter).unwrap();
        drop(reporter);

        assert_eq!(increments.into_inner().unwrap(), vec![25, 25, 10]);
    }

    #[test]
    fn cancelled_cooling_run_resumes_with_retained_temperature() {
        let mut scheduler = scheduler_with(0.9, 0);
        scheduler.initialize();
        scheduler.cancel_token().cancel();

        let outcome = scheduler.run_until_converged(&silent()).unwrap();
        assert_eq!(outcome, RunOutcome::Cancelled { rounds: 0 });

        let outcome = scheduler.resume(&silent()).unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Converged {
                rounds: rounds_to_converge(1.0, 0.9)
            }
        );
    }

    #[test]
    fn progress_reports_expected_total() {
        let mut scheduler = scheduler_with(0.99, 0);
        scheduler.initialize();
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if !matches!(event, Progress::TaskIncrement { .. }) {
                events.lock().unwrap().push(event);
            }
        }));

        scheduler.run_until_converged(&reporter).unwrap();
        drop(reporter);

        let events = events.into_inner().unwrap();
        assert!(matches!(events[0], Progress::TaskStart { total: 1146 }));
        assert!(matches!(events.last(), Some(Progress::TaskFinish)));
    }

    #[test]
    fn step_once_publishes_a_snapshot() {
        let mut scheduler = scheduler_with(0.99, 0);
        scheduler.initialize();
        let snapshot = scheduler.step_once().unwrap();
        assert_eq!(snapshot.round, 1);
        assert_eq!(scheduler.state(), SchedulerState::Paused);
        assert_eq!(scheduler.snapshots().latest().unwrap(), snapshot);
    }

    #[test]
    fn snapshots_are_readable_from_another_thread() {
        let mut scheduler = scheduler_with(1.0, 4);
        scheduler.initialize();
        scheduler.run_bounded(4, &silent()).unwrap();
        let handle = scheduler.snapshots();

        let round = std::thread::spawn(move || handle.latest().map(|s| s.round))
            .join()
            .unwrap();

        assert_eq!(round, Some(4));
    }

    #[test]
    fn mode_switches_return_to_ready() {
        let mut scheduler = scheduler_with(1.0, 5);
        assert!(scheduler.enter_subset(&[0, 1]).is_err());

        scheduler.initialize();
        scheduler.run_bounded(5, &silent()).unwrap();
        scheduler.enter_subset(&[0, 1, 2]).unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Ready);
        let latest = scheduler.snapshots().latest().unwrap();
        assert_eq!(latest.mode, LayoutMode::Subset);
        assert_eq!(latest.round, 0);

        scheduler.run_bounded(3, &silent()).unwrap();
        scheduler.leave_subset().unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Ready);
        assert_eq!(
            scheduler.snapshots().latest().unwrap().mode,
            LayoutMode::Full
        );
    }

    #[test]
    fn threshold_change_returns_to_ready_and_drops_pending_run() {
        let mut scheduler = scheduler_with(1.0, 10);
        scheduler.initialize();
        scheduler.cancel_token().cancel();
        scheduler.run_bounded(10, &silent()).unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Paused);

        scheduler.set_threshold(Threshold::evalue(1e-40)).unwrap();

        assert_eq!(scheduler.state(), SchedulerState::Ready);
        assert!(scheduler.resume(&silent()).is_err());
        assert_eq!(scheduler.context().connectivity().edges().len(), 1);
    }

    #[test]
    fn restored_context_starts_paused() {
        let mut scheduler = scheduler_with(0.99, 0);
        scheduler.initialize();
        scheduler.run_bounded(10, &silent()).unwrap();
        let session = scheduler.context().to_session();
        let similarity = scheduler.context().similarity().clone();

        let restored =
            LayoutScheduler::restored(LayoutContext::from_session(similarity, &session).unwrap());

        assert_eq!(restored.state(), SchedulerState::Paused);
        assert_eq!(restored.snapshots().latest().unwrap().round, 10);
    }
}
