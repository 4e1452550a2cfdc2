//! # CLANS++ Core Library
//!
//! A high-performance library for visualizing pairwise sequence similarities by
//! force-directed clustering, based on the CLANS (CLuster ANalysis of Sequences) method.
//! Similar sequences attract, all sequences repel, and the layout cools into visually
//! separable clusters.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`SimilarityMatrix`,
//!   `AttractionMatrix`, `Coordinates`), the similarity → attraction → connectivity
//!   pipeline, and file I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful simulation: populations, the
//!   parallel pairwise force kernel, the `ForceLayoutEngine` integrator, the
//!   `LayoutContext` that owns all dataset state, and the `LayoutScheduler` state
//!   machine with pause/resume/cancel.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures that tie `core` and
//!   `engine` together, such as a complete headless clustering run.

pub mod core;
pub mod engine;
pub mod workflows;
