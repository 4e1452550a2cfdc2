use crate::cli::InputFormat;
use clanspp::core::models::similarity::ValueKind;
use clanspp::core::similarity::connectivity::Threshold;
use clanspp::engine::config::LayoutConfig;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub path: PathBuf,
    pub format: InputFormat,
    pub kind: ValueKind,
    pub size: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input: InputSpec,
    pub output: PathBuf,
    pub resume: Option<PathBuf>,
    pub subset: Option<Vec<usize>>,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub input: InputSpec,
    pub threshold: Threshold,
    pub output: Option<PathBuf>,
}
