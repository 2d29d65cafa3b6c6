//! Storeprobe CLI: storefront end-to-end scenarios from the terminal
//!
//! ## Usage
//!
//! ```bash
//! storeprobe run                          # Every suite, config.properties
//! storeprobe run --suite cart --headless  # One suite without a window
//! storeprobe run --filter checkout -j 2   # Two browsers at once
//! storeprobe list --format json           # Catalogue as JSON
//! storeprobe config                       # Effective settings
//! storeprobe data --generate-user         # Fresh registration credentials
//! ```

use clap::Parser;
use std::process::ExitCode;
use storeprobe_cli::{
    handlers, load_suite_config, logging, Cli, CliConfig, CliResult, ColorChoice, Commands,
    Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init_logging(config.verbosity, cli.log_format, config.color.should_color());
    tracing::debug!(config = %cli.config.display(), "loading suite configuration");

    let suite_config = load_suite_config(&cli.config)?;
    match cli.command {
        Commands::Run(args) => handlers::run_scenarios(&config, suite_config, &args),
        Commands::List(args) => handlers::list_scenarios(&args),
        Commands::Config(args) => handlers::show_config(&suite_config, &args),
        Commands::Data(args) => handlers::show_data(&suite_config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(ColorChoice::from(cli.color))
}
