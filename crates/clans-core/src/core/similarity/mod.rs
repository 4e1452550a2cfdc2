//! # Similarity Processing Module
//!
//! Turns raw pairwise similarity scores into the two inputs the layout engine
//! consumes every step: normalized attraction strengths and a thresholded
//! connectivity graph.
//!
//! - [`attraction`] - Normalization of E-values or pass-through of attraction values
//! - [`connectivity`] - Thresholding into an adjacency matrix, an ordered edge list and
//!   the singleton set, for the full dataset and for arbitrary subsets
//!
//! Both stages validate their inputs eagerly so that problems surface before any
//! simulation starts.

pub mod attraction;
pub mod connectivity;

use super::models::similarity::ValueKind;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum SimilarityError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Numerically degenerate input: {0}")]
    NumericDegenerate(String),

    #[error("Parameter '{parameter}' = {value} is out of range; valid range is {valid}")]
    ConfigOutOfRange {
        parameter: &'static str,
        value: f64,
        valid: &'static str,
    },

    #[error("Size mismatch: {what} covers {actual} sequences, expected {expected}")]
    SizeMismatch {
        what: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("A {threshold} threshold cannot be applied to a matrix of {matrix} values")]
    IncompatibleThreshold {
        threshold: ValueKind,
        matrix: ValueKind,
    },
}
