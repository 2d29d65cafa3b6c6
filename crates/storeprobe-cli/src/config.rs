//! CLI configuration: verbosity, colour, and the layered suite configuration

use crate::commands::{BrowserArg, RunArgs};
use crate::error::{CliError, CliResult};
use std::path::Path;
use storeprobe::SuiteConfig;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Quiet - failures and errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - debug logging
    Verbose,
    /// Debug - trace logging
    Debug,
}

impl Verbosity {
    /// From `-q` and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Log level for the storeprobe crates
    #[must_use]
    pub const fn log_level(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "info",
            Self::Verbose => "debug",
            Self::Debug => "trace",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stderr().features().colors_supported(),
        }
    }
}

/// CLI presentation settings
#[derive(Debug, Clone, Copy, Default)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }
}

/// Properties file, then `STOREPROBE_*` variables
pub fn load_suite_config(path: &Path) -> CliResult<SuiteConfig> {
    let config = SuiteConfig::load(path)
        .map_err(|e| CliError::config(e.to_string()))?
        .with_env_overrides();
    Ok(config)
}

/// Command-line flags on top of file and environment values
#[must_use]
pub fn apply_run_overrides(mut config: SuiteConfig, args: &RunArgs) -> SuiteConfig {
    if let Some(browser) = args.browser {
        config = config.set("browser", BrowserArg::kind(browser).as_str());
    }
    if args.headless {
        config = config.set("headless.mode", "true");
    }
    if let Some(url) = &args.base_url {
        config = config.set("base.url", url.as_str());
    }
    if let Some(dir) = &args.reports_dir {
        config = config.set("reports.directory", dir.display().to_string());
    }
    config
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use clap::Parser;
    use storeprobe::BrowserKind;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(false, 3), Verbosity::Debug);
            assert_eq!(Verbosity::from_flags(true, 2), Verbosity::Quiet);
        }

        #[test]
        fn test_log_levels() {
            assert_eq!(Verbosity::Normal.log_level(), "info");
            assert_eq!(Verbosity::Verbose.log_level(), "debug");
            assert_eq!(Verbosity::Debug.log_level(), "trace");
            assert!(Verbosity::Debug.is_verbose());
            assert!(!Verbosity::Normal.is_verbose());
        }
    }

    mod color_choice_tests {
        use super::*;

        #[test]
        fn test_explicit_choices() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
            assert_eq!(ColorChoice::default(), ColorChoice::Auto);
        }
    }

    mod suite_config_tests {
        use super::*;

        fn run_args(argv: &[&str]) -> RunArgs {
            let cli = Cli::try_parse_from(argv).unwrap();
            match cli.command {
                Commands::Run(args) => args,
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn test_missing_file_gives_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let config = load_suite_config(&dir.path().join("absent.properties")).unwrap();
            assert_eq!(config.browser(), BrowserKind::Chrome);
        }

        #[test]
        fn test_flags_override_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("config.properties");
            std::fs::write(&path, "browser=edge\nbase.url=https://staging.example\n").unwrap();
            let file = load_suite_config(&path).unwrap();

            let args = run_args(&[
                "storeprobe",
                "run",
                "--browser",
                "firefox",
                "--headless",
                "--base-url",
                "http://localhost:8080/",
            ]);
            let config = apply_run_overrides(file, &args);
            assert_eq!(config.browser(), BrowserKind::Firefox);
            assert!(config.headless());
            assert_eq!(config.base_url(), "http://localhost:8080");
        }

        #[test]
        fn test_no_flags_keep_file_values() {
            let config = SuiteConfig::from_properties_str("browser=edge\nheadless.mode=false");
            let config = apply_run_overrides(config, &run_args(&["storeprobe", "run"]));
            assert_eq!(config.browser(), BrowserKind::Edge);
            assert!(!config.headless());
        }
    }
}
