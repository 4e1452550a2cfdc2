use crate::cli::InputFormat;
use crate::error::{CliError, Result};
use clanspp::core::models::similarity::ValueKind;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub dimensions: Option<u8>,
    pub rounds: Option<u64>,
    pub seed: Option<u64>,
    pub input: Option<FileInputConfig>,
    pub threshold: Option<FileThresholdConfig>,
    pub layout: Option<FileLayoutConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileInputConfig {
    pub format: Option<InputFormat>,
    pub kind: Option<ValueKind>,
    pub size: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileThresholdConfig {
    pub value: Option<f64>,
    /// Defaults to the kind of the input values.
    pub kind: Option<ValueKind>,
}

/// Force parameters as written by users. Exponents are read as signed integers
/// so that negative values can be reported clearly instead of as parse failures.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileLayoutConfig {
    pub att_val: Option<f64>,
    pub att_exp: Option<i64>,
    pub rep_val: Option<f64>,
    pub rep_exp: Option<i64>,
    pub gravity: Option<f64>,
    pub dampening: Option<f64>,
    pub max_move: Option<f64>,
    pub cooling: Option<f64>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration file {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
