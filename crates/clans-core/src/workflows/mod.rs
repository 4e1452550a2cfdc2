//! # Workflows Module
//!
//! High-level entry points that run a complete CLANS++ clustering job.
//!
//! A workflow takes loaded similarity data and a validated configuration, builds
//! the layout context, drives the scheduler and hands back the final layout
//! together with a session that can be saved and resumed later. Progress is
//! reported in phases through a [`ProgressReporter`](crate::engine::progress::ProgressReporter).
//!
//! - **Cluster Workflow** ([`cluster`]) - Initialization or resumption, optional subset
//!   selection, and a bounded or cooling layout run.

pub mod cluster;
