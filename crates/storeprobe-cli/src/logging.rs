//! Tracing subscriber setup for the CLI
//!
//! Logs go to stderr so that `list --format json` and friends keep stdout
//! machine-readable. `RUST_LOG` replaces the verbosity-derived filter.

use crate::commands::LogFormat;
use crate::config::Verbosity;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives for a verbosity level
#[must_use]
pub fn default_directives(verbosity: Verbosity) -> String {
    let level = verbosity.log_level();
    format!("storeprobe={level},storeprobe_cli={level}")
}

fn build_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(verbosity: Verbosity, format: LogFormat, color: bool) {
    let filter = build_filter(verbosity);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_ansi(color)
                    .compact(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_follow_verbosity() {
        assert_eq!(
            default_directives(Verbosity::Normal),
            "storeprobe=info,storeprobe_cli=info"
        );
        assert_eq!(
            default_directives(Verbosity::Quiet),
            "storeprobe=error,storeprobe_cli=error"
        );
        assert!(default_directives(Verbosity::Debug).contains("trace"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(Verbosity::Normal, LogFormat::Text, false);
        init_logging(Verbosity::Verbose, LogFormat::Json, false);
    }
}
