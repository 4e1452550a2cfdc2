use clap::{Args, Parser, Subcommand, ValueEnum};
use clanspp::core::models::similarity::ValueKind;
use serde::Deserialize;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "CLANS++ contributors",
    version,
    about = "CLANS++ CLI - Cluster protein sequences by laying out their pairwise similarities as a force-directed graph.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lay out a similarity dataset and save the result as a resumable session.
    Cluster(ClusterArgs),
    /// Threshold a similarity dataset and export its edge list.
    Graph(GraphArgs),
}

/// How the similarity file is laid out on disk.
#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum InputFormat {
    /// Headerless `query,hit,value` rows with 0-based indices.
    #[default]
    Triples,
    /// A square matrix, one headerless CSV row per sequence.
    Dense,
}

/// Options shared by every command that reads similarity data.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the similarity file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Layout of the similarity file.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<InputFormat>,

    /// Interpretation of the similarity values (evalue or attraction).
    #[arg(long, value_name = "KIND")]
    pub kind: Option<ValueKind>,

    /// Number of sequences. Defaults to the largest index in the file plus one.
    #[arg(long, value_name = "N")]
    pub size: Option<usize>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the connectivity threshold from the config file.
    #[arg(short, long, value_name = "FLOAT")]
    pub threshold: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S layout.cooling=0.95
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `cluster` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ClusterArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Path for the output session file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Number of rounds to run; 0 cools until the layout converges.
    #[arg(short, long, value_name = "INT")]
    pub rounds: Option<u64>,

    /// Number of layout dimensions.
    #[arg(short, long, value_name = "2|3", value_parser = clap::value_parser!(u8).range(2..=3))]
    pub dimensions: Option<u8>,

    /// Seed for the initial random placement.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Continue from a previously saved session.
    #[arg(long, value_name = "PATH")]
    pub resume: Option<PathBuf>,

    /// Lay out only these sequences (comma-separated 0-based indices).
    #[arg(long, value_name = "INDICES", value_delimiter = ',')]
    pub subset: Option<Vec<usize>>,
}

/// Arguments for the `graph` subcommand.
#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Path for the edge list CSV. Written to stdout if omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
