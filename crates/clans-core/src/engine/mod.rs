//! # Engine Module
//!
//! This module implements the force-directed layout engine of CLANS++, turning a
//! thresholded similarity graph into 2D or 3D coordinates.
//!
//! ## Overview
//!
//! Every sequence is a point. All pairs repel each other, connected pairs attract
//! in proportion to their attraction value, and a weak gravity pulls everything
//! towards the origin. Movements carry momentum from the previous round, are
//! scaled by a temperature that cools geometrically, and are clamped to a maximum
//! step length.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Force parameters and the validated run configuration
//! - **Forces** ([`forces`]) - Pairwise force laws and their parallel accumulation
//! - **Populations** ([`population`]) - The full dataset or a subset as a self-contained point set
//! - **Layout** ([`layout`]) - The integration step over the active population
//! - **Context** ([`context`]) - Ownership of matrices, connectivity and the engine
//! - **Scheduling** ([`scheduler`]) - Run lifecycle, cancellation and snapshot publication
//! - **Sessions** ([`session`]) - Persisted layouts that can be resumed
//! - **Progress Monitoring** ([`progress`]) - Progress reporting callbacks
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod config;
pub mod context;
pub mod error;
pub mod forces;
pub mod layout;
pub mod population;
pub mod progress;
pub mod scheduler;
pub mod session;
pub mod state;
