//! Storeprobe CLI library
//!
//! Command-line front end for the storefront scenario suite: selection
//! flags, configuration layering, progress output and report files.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    BrowserArg, Cli, ColorArg, Commands, ConfigArgs, DataArgs, ListArgs, LogFormat, OutputFormat,
    RunArgs, SuiteArg,
};
pub use config::{apply_run_overrides, load_suite_config, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
