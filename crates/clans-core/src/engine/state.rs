use crate::core::models::coordinates::Coordinates;
use serde::{Deserialize, Serialize};

/// Which population the engine is currently simulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    Full,
    Subset,
}

/// The lifecycle of a [`LayoutScheduler`](super::scheduler::LayoutScheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    Uninitialized,
    Ready,
    Running,
    Paused,
    Converged,
}

/// An immutable view of a layout after a completed round.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSnapshot {
    pub round: u64,
    pub temperature: f64,
    pub mode: LayoutMode,
    /// Positions of the active population.
    pub coordinates: Coordinates,
    /// Global indices of the active population in subset mode, ascending.
    pub members: Option<Vec<usize>>,
}

