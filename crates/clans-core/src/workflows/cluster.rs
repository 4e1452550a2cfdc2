use crate::core::models::similarity::SimilarityMatrix;
use crate::engine::config::LayoutConfig;
use crate::engine::context::LayoutContext;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::scheduler::{CancelToken, LayoutScheduler, RunOutcome};
use crate::engine::session::LayoutSession;
use crate::engine::state::{LayoutSnapshot, SchedulerState};
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct ClusterOptions<'a> {
    /// A saved session to continue instead of starting from a random layout.
    pub resume: Option<&'a LayoutSession>,
    /// Global indices to restrict the layout to.
    pub subset: Option<&'a [usize]>,
    pub cancel: Option<CancelToken>,
}

#[derive(Debug, Clone)]
pub struct ClusterResult {
    pub snapshot: Arc<LayoutSnapshot>,
    pub outcome: RunOutcome,
    pub session: LayoutSession,
    pub edge_count: usize,
    pub singletons: Vec<usize>,
}

/// Lays out `similarity` according to `config`.
///
/// With a session to resume, the saved parameters and positions are used; the
/// threshold and the run length still come from `config`. A run over
/// `config.rounds_requested` rounds ends paused, a run with zero requested rounds
/// cools until it converges.
#[instrument(skip_all, name = "cluster_workflow")]
pub fn run(
    similarity: SimilarityMatrix,
    config: &LayoutConfig,
    options: ClusterOptions,
    reporter: &ProgressReporter,
) -> Result<ClusterResult, EngineError> {
    // === Phase 1: Preparation ===
    reporter.report(Progress::phase("Preparation"));
    let mut scheduler = match options.resume {
        Some(saved) => {
            info!(round = saved.round, "Resuming saved layout.");
            LayoutScheduler::restored(LayoutContext::from_session(similarity, saved)?)
        }
        None => LayoutScheduler::new(LayoutContext::new(similarity, config)?),
    };
    if let Some(cancel) = options.cancel {
        scheduler = scheduler.with_cancel_token(cancel);
    }
    if scheduler.context().threshold() != config.threshold {
        scheduler.set_threshold(config.threshold)?;
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Initial placement ===
    reporter.report(Progress::phase("Initial placement"));
    if scheduler.state() == SchedulerState::Uninitialized {
        scheduler.initialize();
    }
    if let Some(members) = options.subset {
        scheduler.enter_subset(members)?;
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Layout ===
    reporter.report(Progress::phase("Layout"));
    let converged = scheduler.state() == SchedulerState::Converged;
    let outcome = match (config.cools_until_converged(), converged) {
        (true, true) => {
            warn!("The saved layout has already converged; nothing to do.");
            RunOutcome::Converged { rounds: 0 }
        }
        (true, false) => scheduler.run_until_converged(reporter)?,
        (false, _) => scheduler.run_bounded(config.rounds_requested, reporter)?,
    };
    reporter.report(Progress::PhaseFinish);

    let snapshot = scheduler
        .snapshots()
        .latest()
        .ok_or_else(|| EngineError::Internal("no layout snapshot was published".to_string()))?;
    let context = scheduler.context();
    let result = ClusterResult {
        snapshot,
        outcome,
        session: context.to_session(),
        edge_count: context.connectivity().edges().len(),
        singletons: context.connectivity().singletons().to_vec(),
    };

    info!(
        ?outcome,
        round = result.snapshot.round,
        edges = result.edge_count,
        "Cluster workflow complete."
    );
    Ok(result)
}
