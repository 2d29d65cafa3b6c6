//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use storeprobe::config::DEFAULT_CONFIG_FILE;
use storeprobe::{BrowserKind, FailureMode, RunOptions, Suite};

/// Storeprobe: end-to-end scenarios for the demoblaze storefront
#[derive(Parser, Debug)]
#[command(name = "storeprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (failures and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Properties file with suite settings
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios against a live browser
    Run(RunArgs),

    /// List catalogued scenarios
    List(ListArgs),

    /// Show the effective configuration
    Config(ConfigArgs),

    /// Show fixture data or generate credentials
    Data(DataArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite to run (repeatable; default all)
    #[arg(short, long = "suite", value_enum)]
    pub suites: Vec<SuiteArg>,

    /// Only scenarios whose `<suite>::<name>` contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Browser to drive (overrides `browser`)
    #[arg(short, long, value_enum)]
    pub browser: Option<BrowserArg>,

    /// Run without a visible window (overrides `headless.mode`)
    #[arg(long)]
    pub headless: bool,

    /// Storefront root (overrides `base.url`)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Stop on the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Scenarios to run at once, each in its own browser
    #[arg(short = 'j', long, default_value = "1")]
    pub jobs: usize,

    /// Report directory (overrides `reports.directory`)
    #[arg(short, long = "reports")]
    pub reports_dir: Option<PathBuf>,

    /// Allure results directory (default `<reports>/allure-results`)
    #[arg(long)]
    pub allure: Option<PathBuf>,
}

impl RunArgs {
    /// Selection and execution options for the runner
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        let mut options = RunOptions::default()
            .with_jobs(self.jobs)
            .with_failure_mode(if self.fail_fast {
                FailureMode::FailFast
            } else {
                FailureMode::CollectAll
            });
        for suite in &self.suites {
            options = options.with_suite(Suite::from(*suite));
        }
        if let Some(filter) = &self.filter {
            options = options.with_filter(filter.as_str());
        }
        options
    }
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Suite to list (repeatable; default all)
    #[arg(short, long = "suite", value_enum)]
    pub suites: Vec<SuiteArg>,

    /// Only scenarios whose `<suite>::<name>` contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

impl ListArgs {
    /// Selection options
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        let mut options = RunOptions::default();
        for suite in &self.suites {
            options = options.with_suite(Suite::from(*suite));
        }
        if let Some(filter) = &self.filter {
            options = options.with_filter(filter.as_str());
        }
        options
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the data command
#[derive(Parser, Debug)]
pub struct DataArgs {
    /// Print a fresh unique username/password pair instead
    #[arg(long)]
    pub generate_user: bool,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Suite argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteArg {
    /// Registration, log-in, log-out
    Login,
    /// Grid, categories, search, detail page
    Product,
    /// Cart contents and totals
    Cart,
    /// Order modal and confirmation
    Checkout,
}

impl From<SuiteArg> for Suite {
    fn from(arg: SuiteArg) -> Self {
        match arg {
            SuiteArg::Login => Self::Login,
            SuiteArg::Product => Self::Product,
            SuiteArg::Cart => Self::Cart,
            SuiteArg::Checkout => Self::Checkout,
        }
    }
}

/// Browser argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserArg {
    /// Chrome or Chromium over CDP
    Chrome,
    /// Firefox over WebDriver
    Firefox,
    /// Microsoft Edge over CDP
    Edge,
}

impl BrowserArg {
    /// Library browser kind
    #[must_use]
    pub const fn kind(self) -> BrowserKind {
        match self {
            Self::Chrome => BrowserKind::Chrome,
            Self::Firefox => BrowserKind::Firefox,
            Self::Edge => BrowserKind::Edge,
        }
    }
}

/// Output format for list/config/data
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Log line format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Plain text lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Color argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
