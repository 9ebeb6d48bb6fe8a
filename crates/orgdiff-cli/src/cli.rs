//! CLI argument definitions for orgdiff.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "orgdiff",
    version,
    about = "Compare record collections of the same object types across several sources",
    long_about = "Compare record collections exported from several sources.\n\n\
                  Each subdirectory of ROOT is a source holding one <Object>.parquet, \
                  .jsonl or .csv file per object type. A config_*.json file in ROOT \
                  names the key field of every object type."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow record values to appear in trace-level logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List sources, common object types and their key fields.
    Discover(DiscoverArgs),

    /// Scan every source for duplicate key values.
    Duplicates(DuplicatesArgs),

    /// Apply reviewed duplicate resolutions.
    Resolve(ResolveArgs),

    /// Compare all object types across all sources.
    Compare(CompareArgs),
}

#[derive(Parser)]
pub struct DiscoverArgs {
    /// Comparison root containing one directory per source.
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,
}

#[derive(Parser)]
pub struct DuplicatesArgs {
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Report file (default: <ROOT>/duplicate_fk_report.json).
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ResolveArgs {
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// JSON object keyed by "<source>:<object_type>:<key_value>".
    #[arg(value_name = "RESOLUTIONS_JSON")]
    pub resolutions: PathBuf,
}

#[derive(Parser)]
pub struct CompareArgs {
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Output directory (default: <ROOT>/comparison_results).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Additional field names to ignore, on top of the built-in audit fields.
    #[arg(long = "exclude-fields", value_name = "FIELD", value_delimiter = ',', num_args = 1..)]
    pub exclude_fields: Vec<String>,

    /// Restrict the run to these object types.
    #[arg(long = "object", value_name = "OBJECT")]
    pub objects: Vec<String>,

    /// Restrict the run to these sources.
    #[arg(long = "source", value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Output format to generate.
    #[arg(long = "format", value_enum, default_value = "both")]
    pub format: OutputFormatArg,

    /// Relative tolerance for numeric comparison.
    #[arg(long = "rtol", value_name = "FLOAT")]
    pub rtol: Option<f64>,

    /// Absolute tolerance for numeric comparison.
    #[arg(long = "atol", value_name = "FLOAT")]
    pub atol: Option<f64>,

    /// Ignore blacklisted_foreign_keys.json.
    #[arg(long = "no-blacklist")]
    pub no_blacklist: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Csv,
    Json,
    Both,
}

impl OutputFormatArg {
    pub fn wants_csv(self) -> bool {
        matches!(self, Self::Csv | Self::Both)
    }

    pub fn wants_json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
