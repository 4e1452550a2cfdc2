use super::config::ConfigError;
use super::session::SessionError;
use super::state::SchedulerState;
use crate::core::models::ModelError;
use crate::core::similarity::SimilarityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Similarity processing failed: {source}")]
    Similarity {
        #[from]
        source: SimilarityError,
    },

    #[error("Invalid input data: {source}")]
    Model {
        #[from]
        source: ModelError,
    },

    #[error("Session error: {source}")]
    Session {
        #[from]
        source: SessionError,
    },

    #[error("Cannot {action} while the scheduler is {state:?}")]
    InvalidTransition {
        state: SchedulerState,
        action: &'static str,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
