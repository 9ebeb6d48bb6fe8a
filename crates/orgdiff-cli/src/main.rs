//! orgdiff command-line entry point.
//!
//! Exit codes: 0 success, 1 fatal error, 2 comparison finished with
//! object-level errors (or failed resolutions), 3 duplicate keys found.

use clap::{ColorChoice, Parser};
use orgdiff_cli::logging::{LogConfig, LogFormat, init_logging};
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;
mod types;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_compare, run_discover, run_duplicates, run_resolve};
use crate::summary::{print_comparison, print_discovery, print_duplicates, print_resolution};

const EXIT_OK: i32 = 0;
const EXIT_FATAL: i32 = 1;
const EXIT_OBJECT_ERRORS: i32 = 2;
const EXIT_DUPLICATES: i32 = 3;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(EXIT_FATAL);
    }
    let exit_code = match cli.command {
        Command::Discover(args) => match run_discover(&args) {
            Ok(discovery) => {
                print_discovery(&discovery);
                EXIT_OK
            }
            Err(error) => fatal(&error),
        },
        Command::Duplicates(args) => match run_duplicates(&args) {
            Ok((scan, path)) => {
                print_duplicates(&scan);
                println!("Report: {}", path.display());
                if scan.has_duplicates() {
                    EXIT_DUPLICATES
                } else {
                    EXIT_OK
                }
            }
            Err(error) => fatal(&error),
        },
        Command::Resolve(args) => match run_resolve(&args) {
            Ok(summary) => {
                print_resolution(&summary);
                if summary.is_clean() {
                    EXIT_OK
                } else {
                    EXIT_OBJECT_ERRORS
                }
            }
            Err(error) => fatal(&error),
        },
        Command::Compare(args) => match run_compare(&args) {
            Ok(result) => {
                print_comparison(&result);
                if result.has_errors() {
                    EXIT_OBJECT_ERRORS
                } else {
                    EXIT_OK
                }
            }
            Err(error) => fatal(&error),
        },
    };
    std::process::exit(exit_code);
}

fn fatal(error: &anyhow::Error) -> i32 {
    eprintln!("error: {error:#}");
    EXIT_FATAL
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
