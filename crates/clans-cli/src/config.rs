//! Configuration for the CLI commands.
//!
//! Values are resolved in this order, later sources winning: built-in defaults,
//! the TOML config file, `-S key=value` overrides, then dedicated flags.

mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{build_cluster_config, build_graph_config};
pub use models::{AppConfig, GraphConfig, InputSpec};
