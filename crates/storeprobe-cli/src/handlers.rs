//! Subcommand handlers

use crate::commands::{ConfigArgs, DataArgs, ListArgs, OutputFormat, RunArgs};
use crate::config::{apply_run_overrides, CliConfig};
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use serde_json::json;
use std::fmt::Write as _;
use storeprobe::{
    Credentials, DriverLauncher, Scenario, SuiteConfig, SuiteReport, SuiteRunner, TestData,
};

// =============================================================================
// RUN
// =============================================================================

/// Run the selected scenarios with real browsers
pub fn run_scenarios(config: &CliConfig, suite_config: SuiteConfig, args: &RunArgs) -> CliResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(execute(
        config,
        suite_config,
        args,
        &storeprobe::BrowserLauncher,
    ))?;
    finish_run(&report)
}

/// Select, run and report; the launcher decides where sessions come from
pub async fn execute(
    config: &CliConfig,
    suite_config: SuiteConfig,
    args: &RunArgs,
    launcher: &dyn DriverLauncher,
) -> CliResult<SuiteReport> {
    let suite_config = apply_run_overrides(suite_config, args);
    let options = args.run_options();
    let selected = SuiteRunner::select(&options);
    if selected.is_empty() {
        return Err(CliError::invalid_argument(
            "no scenarios match the given --suite/--filter",
        ));
    }

    let reports_dir = suite_config.reports_dir();
    let mut reporter = ProgressReporter::new(
        config.color.should_color(),
        config.verbosity.is_quiet(),
    );
    reporter.header(&format!(
        "{} scenario(s) on {} against {}",
        selected.len(),
        suite_config.browser(),
        suite_config.base_url()
    ));

    let runner = SuiteRunner::new(launcher, suite_config)?;
    reporter.start_progress(selected.len() as u64, "running");
    let report = runner
        .run_scenarios(&selected, &options, |result| reporter.scenario(result))
        .await;
    reporter.finish();

    let paths = report.write_all(&reports_dir, args.allure.as_deref())?;
    if let Some(reason) = &report.aborted {
        reporter.warning(&format!("run stopped early: {reason}"));
    }
    reporter.summary(
        report.passed_count(),
        report.failed_count(),
        report.skipped_count(),
        report.total_duration(),
    );
    reporter.info(&format!("JUnit report: {}", paths.junit.display()));
    reporter.info(&format!("JSON summary: {}", paths.json.display()));
    reporter.info(&format!("Allure results: {}", paths.allure.display()));
    Ok(report)
}

/// Map a finished report to the process outcome
pub fn finish_run(report: &SuiteReport) -> CliResult<()> {
    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::test_execution(report.summary()))
    }
}

// =============================================================================
// LIST
// =============================================================================

/// Render the selected catalogue entries
pub fn render_list(args: &ListArgs) -> CliResult<String> {
    let selected = SuiteRunner::select(&args.run_options());
    match args.format {
        OutputFormat::Json => {
            let items: Vec<_> = selected.iter().map(scenario_json).collect();
            Ok(serde_json::to_string_pretty(&items)?)
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for scenario in &selected {
                let _ = writeln!(
                    out,
                    "{:<48} {:<8} {}",
                    scenario.id(),
                    scenario.severity.as_str(),
                    scenario.description
                );
            }
            let _ = write!(out, "{} scenario(s)", selected.len());
            Ok(out)
        }
    }
}

fn scenario_json(scenario: &Scenario) -> serde_json::Value {
    json!({
        "id": scenario.id(),
        "suite": scenario.suite,
        "name": scenario.name,
        "story": scenario.story,
        "severity": scenario.severity,
        "description": scenario.description,
    })
}

/// Print the catalogue
pub fn list_scenarios(args: &ListArgs) -> CliResult<()> {
    println!("{}", render_list(args)?);
    Ok(())
}

// =============================================================================
// CONFIG
// =============================================================================

/// Render the effective configuration
pub fn render_config(suite_config: &SuiteConfig, args: &ConfigArgs) -> CliResult<String> {
    let source = suite_config
        .source()
        .map_or_else(|| "defaults".to_string(), |p| p.display().to_string());
    match args.format {
        OutputFormat::Json => {
            let entries: serde_json::Map<String, serde_json::Value> = suite_config
                .entries()
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect();
            Ok(serde_json::to_string_pretty(&json!({
                "source": source,
                "entries": entries,
            }))?)
        }
        OutputFormat::Text => {
            let mut out = format!("# source: {source}\n");
            for (key, value) in suite_config.entries() {
                let _ = writeln!(out, "{key}={value}");
            }
            Ok(out.trim_end().to_string())
        }
    }
}

/// Print the effective configuration
pub fn show_config(suite_config: &SuiteConfig, args: &ConfigArgs) -> CliResult<()> {
    println!("{}", render_config(suite_config, args)?);
    Ok(())
}

// =============================================================================
// DATA
// =============================================================================

/// Render the fixture summary, or fresh credentials with `--generate-user`
pub fn render_data(suite_config: &SuiteConfig, args: &DataArgs) -> CliResult<String> {
    if args.generate_user {
        let credentials = Credentials::generate();
        return match args.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&credentials)?),
            OutputFormat::Text => Ok(format!(
                "username={}\npassword={}",
                credentials.username, credentials.password
            )),
        };
    }

    let path = suite_config.test_data_file();
    let data = TestData::load(&path)?;
    let categories = data.categories();
    match args.format {
        OutputFormat::Json => {
            let products: serde_json::Map<String, serde_json::Value> = categories
                .iter()
                .map(|c| (c.clone(), json!(data.products_for(c))))
                .collect();
            Ok(serde_json::to_string_pretty(&json!({
                "file": path.display().to_string(),
                "validUser": data.valid_user().username,
                "customer": data.customer_info().name,
                "categories": categories,
                "products": products,
            }))?)
        }
        OutputFormat::Text => {
            let mut out = format!("# fixture: {}\n", path.display());
            let _ = writeln!(out, "valid user: {}", data.valid_user().username);
            let _ = writeln!(out, "customer: {}", data.customer_info().name);
            for category in &categories {
                let _ = writeln!(out, "{category}: {}", data.products_for(category).join(", "));
            }
            Ok(out.trim_end().to_string())
        }
    }
}

/// Print fixture data
pub fn show_data(suite_config: &SuiteConfig, args: &DataArgs) -> CliResult<()> {
    println!("{}", render_data(suite_config, args)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use crate::config::Verbosity;
    use clap::Parser;
    use storeprobe::mock::MockLauncher;

    fn command(argv: &[&str]) -> Commands {
        Cli::try_parse_from(argv).unwrap().command
    }

    fn quiet() -> CliConfig {
        CliConfig::new().with_verbosity(Verbosity::Quiet)
    }

    mod list_tests {
        use super::*;

        fn list_args(argv: &[&str]) -> ListArgs {
            match command(argv) {
                Commands::List(args) => args,
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn test_text_lists_every_scenario() {
            let out = render_list(&list_args(&["storeprobe", "list"])).unwrap();
            assert!(out.contains("cart::cart_total_calculation"));
            assert!(out.ends_with("23 scenario(s)"));
        }

        #[test]
        fn test_json_respects_suite() {
            let out = render_list(&list_args(&[
                "storeprobe", "list", "--suite", "login", "--format", "json",
            ]))
            .unwrap();
            let items: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
            assert_eq!(items.len(), 3);
            assert!(items.iter().all(|i| i["suite"] == "login"));
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_text_shows_defaults() {
            let out = render_config(
                &SuiteConfig::from_properties_str("browser=edge"),
                &ConfigArgs { format: OutputFormat::Text },
            )
            .unwrap();
            assert!(out.contains("browser=edge"));
            assert!(out.contains("base.url="));
        }

        #[test]
        fn test_json_has_source() {
            let out = render_config(&SuiteConfig::new(), &ConfigArgs { format: OutputFormat::Json })
                .unwrap();
            let value: serde_json::Value = serde_json::from_str(&out).unwrap();
            assert_eq!(value["source"], "defaults");
            assert!(value["entries"]["browser"].is_string());
        }
    }

    mod data_tests {
        use super::*;

        #[test]
        fn test_generate_user() {
            let args = DataArgs { generate_user: true, format: OutputFormat::Text };
            let out = render_data(&SuiteConfig::new(), &args).unwrap();
            assert!(out.starts_with("username=user_"));
            assert!(out.contains("password=pass_"));
        }

        #[test]
        fn test_missing_fixture_falls_back() {
            let dir = tempfile::tempdir().unwrap();
            let config = SuiteConfig::new().set(
                "test.data.file",
                dir.path().join("absent.json").display().to_string(),
            );
            let args = DataArgs { generate_user: false, format: OutputFormat::Text };
            let out = render_data(&config, &args).unwrap();
            assert!(out.contains("valid user: testuser123"));
            assert!(out.contains("customer: John Doe"));
        }

        #[test]
        fn test_malformed_fixture_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("data.json");
            std::fs::write(&path, "{ not json").unwrap();
            let config = SuiteConfig::new().set("test.data.file", path.display().to_string());
            let args = DataArgs { generate_user: false, format: OutputFormat::Json };
            assert!(matches!(
                render_data(&config, &args),
                Err(CliError::Probe(_))
            ));
        }
    }

    mod run_tests {
        use super::*;

        fn run_args(argv: &[&str]) -> RunArgs {
            match command(argv) {
                Commands::Run(args) => args,
                other => panic!("unexpected {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_empty_selection_is_rejected() {
            let args = run_args(&["storeprobe", "run", "--filter", "no-such-scenario"]);
            let err = execute(&quiet(), SuiteConfig::new(), &args, &MockLauncher::new())
                .await
                .unwrap_err();
            assert!(matches!(err, CliError::InvalidArgument { .. }));
        }

        #[tokio::test]
        async fn test_launch_failure_aborts_and_writes_reports() {
            let dir = tempfile::tempdir().unwrap();
            let reports = dir.path().join("reports");
            let config = SuiteConfig::new()
                .set("screenshots.directory", dir.path().join("shots").display().to_string())
                .set("test.data.file", dir.path().join("absent.json").display().to_string());
            let args = run_args(&[
                "storeprobe",
                "run",
                "--suite",
                "login",
                "--reports",
                reports.to_str().unwrap(),
            ]);

            let report = execute(&quiet(), config, &args, &MockLauncher::new().failing())
                .await
                .unwrap();
            assert_eq!(report.failed_count(), 1);
            assert_eq!(report.skipped_count(), 2);
            assert!(report.aborted.is_some());
            assert!(reports.join("junit.xml").exists());
            assert!(reports.join("summary.json").exists());
            assert!(reports.join("allure-results").is_dir());

            let err = finish_run(&report).unwrap_err();
            assert!(err.to_string().contains("1 failed"));
        }
    }
}
