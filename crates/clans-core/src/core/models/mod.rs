//! # Core Models Module
//!
//! This module contains the fundamental data structures used to represent a
//! similarity dataset and its spatial layout in CLANS++.
//!
//! ## Overview
//!
//! Every pairwise quantity in CLANS++ is an `N × N` matrix over the sequences of a
//! dataset. The models in this module encode those matrices together with the
//! invariants the rest of the library relies on:
//!
//! - **Square, symmetric storage** - [`matrix::SquareMatrix`] is the shared container
//! - **Validated raw scores** - [`similarity::SimilarityMatrix`] knows its [`similarity::ValueKind`]
//! - **Normalized strengths** - [`attraction::AttractionMatrix`] holds values in `[0, 1]`
//! - **Spatial state** - [`coordinates::Coordinates`] holds 2D or 3D point positions
//!
//! ## Usage
//!
//! ```ignore
//! use clanspp::core::models::similarity::{SimilarityMatrix, ValueKind};
//!
//! let matrix = SimilarityMatrix::from_triples(4, vec![(0, 1, 1e-50)], ValueKind::Evalue)?;
//! assert_eq!(matrix.get(2, 3), 100.0);
//! ```

pub mod attraction;
pub mod coordinates;
pub mod matrix;
pub mod similarity;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ModelError {
    #[error("Matrix is not square: row {row} has {len} entries, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("Matrix is not symmetric at ({i}, {j}): {upper} vs {lower}")]
    NotSymmetric {
        i: usize,
        j: usize,
        upper: f64,
        lower: f64,
    },

    #[error("Invalid value {value} at ({i}, {j}): {reason}")]
    InvalidValue {
        i: usize,
        j: usize,
        value: f64,
        reason: &'static str,
    },

    #[error("Sequence index {index} is out of range for a dataset of {size} sequences")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("Unknown value kind '{0}'. Expected 'evalue' or 'attraction'")]
    UnknownValueKind(String),

    #[error("Unsupported dimensionality {0}. Expected 2 or 3")]
    UnsupportedDimensions(u8),

    #[error("Coordinate row {index} has {len} values, expected {expected}")]
    RowWidth {
        index: usize,
        len: usize,
        expected: usize,
    },

    #[error("Point {index} has a non-zero z component in a 2D layout")]
    PlanarViolation { index: usize },
}
