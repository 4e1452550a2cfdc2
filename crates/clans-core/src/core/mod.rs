//! # Core Module
//!
//! This module provides the stateless foundation of CLANS++: the data models for
//! similarity datasets and layouts, the similarity processing pipeline, and file I/O.
//!
//! ## Architecture
//!
//! - **Data Representation** ([`models`]) - Square matrices, similarity scores,
//!   attraction strengths and point coordinates
//! - **Similarity Processing** ([`similarity`]) - Attraction normalization and
//!   threshold-based connectivity classification
//! - **File I/O** ([`io`]) - Similarity triple lists and edge list export
//!
//! Nothing in this module holds simulation state; the stateful layout machinery lives
//! in [`crate::engine`].

pub mod io;
pub mod models;
pub mod similarity;
