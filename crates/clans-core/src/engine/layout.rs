use super::config::LayoutParameters;
use super::forces;
use super::population::Population;
use super::state::{LayoutMode, LayoutSnapshot};
use crate::core::models::coordinates::Coordinates;
use crate::core::similarity::connectivity::{Connectivity, SubsetConnectivity};
use nalgebra::Vector3;
use rand::Rng;
use tracing::trace;

pub const INITIAL_TEMPERATURE: f64 = 1.0;

/// Force-directed layout over the full dataset or a subset of it.
///
/// Only one population is active at a time. While a subset is active the full
/// population is left untouched.
#[derive(Debug, Clone)]
pub struct ForceLayoutEngine {
    parameters: LayoutParameters,
    full: Population,
    subset: Option<Population>,
    temperature: f64,
    round: u64,
}

impl ForceLayoutEngine {
    pub fn new(parameters: LayoutParameters, full: Population) -> Self {
        Self {
            parameters,
            full,
            subset: None,
            temperature: INITIAL_TEMPERATURE,
            round: 0,
        }
    }

    pub fn parameters(&self) -> &LayoutParameters {
        &self.parameters
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn mode(&self) -> LayoutMode {
        if self.subset.is_some() {
            LayoutMode::Subset
        } else {
            LayoutMode::Full
        }
    }

    pub fn full(&self) -> &Population {
        &self.full
    }

    pub fn subset(&self) -> Option<&Population> {
        self.subset.as_ref()
    }

    pub(crate) fn full_mut(&mut self) -> &mut Population {
        &mut self.full
    }

    pub(crate) fn subset_mut(&mut self) -> Option<&mut Population> {
        self.subset.as_mut()
    }

    /// Returns the population that [`step`](Self::step) currently advances.
    pub fn active(&self) -> &Population {
        self.subset.as_ref().unwrap_or(&self.full)
    }

    fn active_mut(&mut self) -> &mut Population {
        self.subset.as_mut().unwrap_or(&mut self.full)
    }

    /// Advances the active population by one integration round.
    ///
    /// An empty population is left as is; the temperature and the round counter
    /// do not change either.
    pub fn step(&mut self) {
        let parameters = self.parameters;
        let temperature = self.temperature;
        let population = self.active_mut();
        let n = population.size();
        if n == 0 {
            return;
        }

        let mut movement = forces::accumulate_pairwise(
            population.coordinates.points(),
            &population.edges,
            &parameters,
        );

        let momentum = 1.0 - parameters.dampening;
        let scale = temperature / n as f64;
        for ((m, point), prior) in movement
            .iter_mut()
            .zip(population.coordinates.points())
            .zip(&population.prior_movement)
        {
            *m -= point * parameters.gravity;
            *m += prior * momentum;
            *m *= scale;
            clamp_movement(m, parameters.max_move);
        }

        for (point, m) in population
            .coordinates
            .points_mut()
            .iter_mut()
            .zip(&movement)
        {
            *point += m;
        }
        population.prior_movement = movement;

        self.temperature *= parameters.cooling;
        self.round += 1;
        trace!(
            round = self.round,
            temperature = self.temperature,
            n,
            "Layout step complete."
        );
    }

    /// Scatters the active population at random and resets its motion.
    pub fn initialize(&mut self, rng: &mut impl Rng) {
        let population = self.active_mut();
        let dimensions = population.coordinates.dimensions();
        population.coordinates = Coordinates::random(population.size(), dimensions, rng);
        population.reset_motion();
        self.reset_clock();
    }

    /// Makes `subset` the active population, replacing any previous subset.
    pub fn enter_subset(&mut self, subset: Population) {
        self.subset = Some(subset);
        self.reset_clock();
    }

    /// Drops the subset and resumes the full population with its motion reset.
    ///
    /// Returns the dropped subset, if there was one.
    pub fn leave_subset(&mut self) -> Option<Population> {
        let subset = self.subset.take();
        self.full.reset_motion();
        self.reset_clock();
        subset
    }

    pub fn set_full_edges(&mut self, connectivity: &Connectivity) {
        self.full.set_edges(connectivity.edges());
    }

    pub fn set_subset_edges(&mut self, connectivity: &SubsetConnectivity) {
        if let Some(subset) = self.subset.as_mut() {
            subset.set_edges(connectivity.local().edges());
        }
    }

    /// Restores the clock of a previously saved layout.
    pub(crate) fn restore_clock(&mut self, temperature: f64, round: u64) {
        self.temperature = temperature;
        self.round = round;
    }

    fn reset_clock(&mut self) {
        self.temperature = INITIAL_TEMPERATURE;
        self.round = 0;
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        let active = self.active();
        LayoutSnapshot {
            round: self.round,
            temperature: self.temperature,
            mode: self.mode(),
            coordinates: active.coordinates.clone(),
            members: active.members.clone(),
        }
    }
}

/// Scales `movement` down to at most `max_move`.
///
/// Overflowed components keep only their sign and NaN components are dropped, so
/// the result is always finite. The length is measured relative to the largest
/// component so huge but finite movements do not overflow either.
fn clamp_movement(movement: &mut Vector3<f64>, max_move: f64) {
    if !movement.iter().all(|c| c.is_finite()) {
        movement.apply(|c| {
            *c = if c.is_infinite() { c.signum() } else { 0.0 };
        });
    }
    let largest = movement.amax();
    if largest == 0.0 {
        return;
    }
    let unit = *movement / largest;
    let unit_length = unit.norm();
    if unit_length > max_move / largest {
        *movement = unit * (max_move / unit_length);
    }
}
