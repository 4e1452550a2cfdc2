use crate::core::models::coordinates::Dimensions;
use crate::core::similarity::connectivity::Threshold;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Parameter '{parameter}' = {value} is out of range; valid range is {valid}")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        valid: &'static str,
    },
}

/// Largest accepted distance exponent for either force.
pub const MAX_EXPONENT: u32 = 16;

/// The force-model parameters of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayoutParameters {
    /// Scale of the attractive force between connected pairs.
    pub att_val: f64,
    /// Distance exponent of the attractive force.
    pub att_exp: u32,
    /// Scale of the repulsive force between all pairs.
    pub rep_val: f64,
    /// Distance exponent (divisor) of the repulsive force.
    pub rep_exp: u32,
    /// Pull of every point towards the origin.
    pub gravity: f64,
    /// Fraction of the previous movement that is discarded each round.
    pub dampening: f64,
    /// Upper bound on the per-round displacement of a single point.
    pub max_move: f64,
    /// Geometric decay factor of the temperature per round.
    pub cooling: f64,
}

impl Default for LayoutParameters {
    fn default() -> Self {
        Self {
            att_val: 10.0,
            att_exp: 1,
            rep_val: 5.0,
            rep_exp: 1,
            gravity: 1.0,
            dampening: 0.2,
            max_move: 0.1,
            cooling: 1.0,
        }
    }
}

impl LayoutParameters {
    /// Checks every parameter against its documented domain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for the first offending parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("att-val", self.att_val)?;
        check_non_negative("rep-val", self.rep_val)?;
        check_non_negative("gravity", self.gravity)?;
        check_exponent("att-exp", self.att_exp)?;
        check_exponent("rep-exp", self.rep_exp)?;
        if !(0.0..=1.0).contains(&self.dampening) {
            return Err(ConfigError::OutOfRange {
                parameter: "dampening",
                value: self.dampening,
                valid: "[0, 1]",
            });
        }
        if !(self.max_move.is_finite() && self.max_move > 0.0) {
            return Err(ConfigError::OutOfRange {
                parameter: "max-move",
                value: self.max_move,
                valid: "(0, +inf)",
            });
        }
        if !(self.cooling > 0.0 && self.cooling <= 1.0) {
            return Err(ConfigError::OutOfRange {
                parameter: "cooling",
                value: self.cooling,
                valid: "(0, 1]",
            });
        }
        Ok(())
    }
}

fn check_exponent(parameter: &'static str, value: u32) -> Result<(), ConfigError> {
    if value <= MAX_EXPONENT {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            parameter,
            value: f64::from(value),
            valid: "[0, 16]",
        })
    }
}

fn check_non_negative(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            parameter,
            value,
            valid: "[0, +inf)",
        })
    }
}

/// A complete, validated configuration for a clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub parameters: LayoutParameters,
    pub threshold: Threshold,
    pub dimensions: Dimensions,
    /// Number of rounds to run; `0` means cool until converged.
    pub rounds_requested: u64,
    /// Seed for the initial random placement.
    pub seed: Option<u64>,
}

impl LayoutConfig {
    /// Returns `true` if the run should cool until converged rather than stop
    /// after a fixed number of rounds.
    pub fn cools_until_converged(&self) -> bool {
        self.rounds_requested == 0
    }
}

#[derive(Default)]
pub struct LayoutConfigBuilder {
    parameters: Option<LayoutParameters>,
    threshold: Option<Threshold>,
    dimensions: Option<Dimensions>,
    rounds_requested: Option<u64>,
    seed: Option<u64>,
}

impl LayoutConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameters(mut self, parameters: LayoutParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }
    pub fn threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = Some(threshold);
        self
    }
    pub fn dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
    pub fn rounds_requested(mut self, rounds: u64) -> Self {
        self.rounds_requested = Some(rounds);
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<LayoutConfig, ConfigError> {
        let parameters = self
            .parameters
            .ok_or(ConfigError::MissingParameter("parameters"))?;
        let threshold = self
            .threshold
            .ok_or(ConfigError::MissingParameter("threshold"))?;
        let dimensions = self
            .dimensions
            .ok_or(ConfigError::MissingParameter("dimensions"))?;
        let rounds_requested = self
            .rounds_requested
            .ok_or(ConfigError::MissingParameter("rounds_requested"))?;

        parameters.validate()?;
        threshold
            .validate()
            .map_err(|_| ConfigError::OutOfRange {
                parameter: "threshold",
                value: threshold.value,
                valid: threshold.valid_range(),
            })?;

        if rounds_requested == 0 && parameters.cooling >= 1.0 {
            return Err(ConfigError::OutOfRange {
                parameter: "cooling",
                value: parameters.cooling,
                valid: "(0, 1) when no round count is requested",
            });
        }

        Ok(LayoutConfig {
            parameters,
            threshold,
            dimensions,
            rounds_requested,
            seed: self.seed,
        })
    }
}
