use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileLayoutConfig};
use super::models::{AppConfig, GraphConfig, InputSpec};
use crate::cli::{ClusterArgs, GraphArgs, InputArgs, InputFormat};
use crate::error::{CliError, Result};
use clap::ValueEnum;
use clanspp::core::models::coordinates::Dimensions;
use clanspp::core::models::similarity::ValueKind;
use clanspp::core::similarity::connectivity::Threshold;
use clanspp::engine::config::{LayoutConfigBuilder, LayoutParameters};
use std::str::FromStr;

pub fn build_cluster_config(args: &ClusterArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file_config(&args.input)?;

    let input = merge_input(&args.input, &file_config, &defaults);
    let threshold = merge_threshold(&args.input, &file_config, &defaults, input.kind);
    let parameters = merge_layout(file_config.layout.take(), &defaults.layout)?;

    let dimensions = args
        .dimensions
        .or(file_config.dimensions)
        .unwrap_or(defaults.dimensions);
    let dimensions = Dimensions::try_from(dimensions).map_err(|e| CliError::Config(e.to_string()))?;
    let rounds = args
        .rounds
        .or(file_config.rounds)
        .unwrap_or(defaults.rounds);
    let seed = args.seed.or(file_config.seed);

    let layout = LayoutConfigBuilder::new()
        .parameters(parameters)
        .threshold(threshold)
        .dimensions(dimensions)
        .rounds_requested(rounds)
        .seed(seed)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        input,
        output: args.output.clone(),
        resume: args.resume.clone(),
        subset: args.subset.clone(),
        layout,
    })
}

pub fn build_graph_config(args: &GraphArgs) -> Result<GraphConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = load_file_config(&args.input)?;

    let input = merge_input(&args.input, &file_config, &defaults);
    let threshold = merge_threshold(&args.input, &file_config, &defaults, input.kind);
    threshold
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(GraphConfig {
        input,
        threshold,
        output: args.output.clone(),
    })
}

fn load_file_config(args: &InputArgs) -> Result<FileConfig> {
    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };
    apply_set_values(file_config, &args.set_values)
}

fn merge_input(args: &InputArgs, file_config: &FileConfig, defaults: &DefaultsConfig) -> InputSpec {
    let file_input = file_config.input.clone().unwrap_or_default();
    InputSpec {
        path: args.input.clone(),
        format: args.format.or(file_input.format).unwrap_or(defaults.format),
        kind: args.kind.or(file_input.kind).unwrap_or(defaults.kind),
        size: args.size.or(file_input.size),
    }
}

fn merge_threshold(
    args: &InputArgs,
    file_config: &FileConfig,
    defaults: &DefaultsConfig,
    input_kind: ValueKind,
) -> Threshold {
    let file_threshold = file_config.threshold.clone().unwrap_or_default();
    let kind = file_threshold.kind.unwrap_or(input_kind);
    let value = args.threshold.or(file_threshold.value).unwrap_or(match kind {
        ValueKind::Evalue => defaults.threshold,
        // An attraction threshold has no meaningful counterpart to the E-value default.
        ValueKind::Attraction => 0.5,
    });
    Threshold { value, kind }
}

fn merge_layout(
    file_val: Option<FileLayoutConfig>,
    defaults: &LayoutParameters,
) -> Result<LayoutParameters> {
    let file_val = file_val.unwrap_or_default();
    Ok(LayoutParameters {
        att_val: file_val.att_val.unwrap_or(defaults.att_val),
        att_exp: exponent("att-exp", file_val.att_exp, defaults.att_exp)?,
        rep_val: file_val.rep_val.unwrap_or(defaults.rep_val),
        rep_exp: exponent("rep-exp", file_val.rep_exp, defaults.rep_exp)?,
        gravity: file_val.gravity.unwrap_or(defaults.gravity),
        dampening: file_val.dampening.unwrap_or(defaults.dampening),
        max_move: file_val.max_move.unwrap_or(defaults.max_move),
        cooling: file_val.cooling.unwrap_or(defaults.cooling),
    })
}

fn exponent(name: &str, value: Option<i64>, default: u32) -> Result<u32> {
    match value {
        None => Ok(default),
        Some(v) => u32::try_from(v).map_err(|_| {
            CliError::Config(format!(
                "`layout.{}` must be a non-negative integer, got {}",
                name, v
            ))
        }),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, what: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", what, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();
        let value_str = value_str.trim();

        match key {
            "dimensions" => config.dimensions = Some(parse_value(key, value_str, "integer")?),
            "rounds" => config.rounds = Some(parse_value(key, value_str, "integer")?),
            "seed" => config.seed = Some(parse_value(key, value_str, "integer")?),
            "input.format" => {
                config.input.get_or_insert_with(Default::default).format = Some(
                    InputFormat::from_str(value_str, true).map_err(|_| {
                        CliError::Config(format!("Invalid format for {}: {}", key, value_str))
                    })?,
                );
            }
            "input.kind" => {
                config.input.get_or_insert_with(Default::default).kind =
                    Some(parse_value(key, value_str, "value kind")?);
            }
            "input.size" => {
                config.input.get_or_insert_with(Default::default).size =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "threshold.value" => {
                config.threshold.get_or_insert_with(Default::default).value =
                    Some(parse_value(key, value_str, "float")?);
            }
            "threshold.kind" => {
                config.threshold.get_or_insert_with(Default::default).kind =
                    Some(parse_value(key, value_str, "value kind")?);
            }
            layout_key if layout_key.starts_with("layout.") => {
                let layout = config.layout.get_or_insert_with(Default::default);
                match &layout_key["layout.".len()..] {
                    "att-val" => layout.att_val = Some(parse_value(key, value_str, "float")?),
                    "att-exp" => layout.att_exp = Some(parse_value(key, value_str, "integer")?),
                    "rep-val" => layout.rep_val = Some(parse_value(key, value_str, "float")?),
                    "rep-exp" => layout.rep_exp = Some(parse_value(key, value_str, "integer")?),
                    "gravity" => layout.gravity = Some(parse_value(key, value_str, "float")?),
                    "dampening" => layout.dampening = Some(parse_value(key, value_str, "float")?),
                    "max-move" => layout.max_move = Some(parse_value(key, value_str, "float")?),
                    "cooling" => layout.cooling = Some(parse_value(key, value_str, "float")?),
                    _ => {
                        return Err(CliError::Config(format!(
                            "Unsupported configuration key for --set: '{}'",
                            key
                        )));
                    }
                }
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
