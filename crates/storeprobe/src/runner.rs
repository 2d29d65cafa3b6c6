//! Suite runner: scenario selection, one session per scenario, fail-fast.

use crate::config::SuiteConfig;
use crate::driver::DriverLauncher;
use crate::fixture::TestData;
use crate::report::{ScenarioResult, SuiteReport};
use crate::result::{ProbeError, ProbeResult};
use crate::scenarios::{catalogue, Scenario, ScenarioContext, Suite};
use crate::session::with_session;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// What to do after a failed scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Stop on the first failure; the rest are reported as skipped
    FailFast,
    /// Run everything and report every failure
    #[default]
    CollectAll,
}

/// Scenario selection and execution options
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Suites to run; empty means all
    pub suites: Vec<Suite>,
    /// Case-insensitive substring of `<suite>::<name>`
    pub filter: Option<String>,
    /// Failure handling
    pub failure_mode: FailureMode,
    /// Scenarios in flight at once, each with its own browser
    pub jobs: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            suites: Vec::new(),
            filter: None,
            failure_mode: FailureMode::default(),
            jobs: 1,
        }
    }
}

impl RunOptions {
    /// Restrict to one more suite
    #[must_use]
    pub fn with_suite(mut self, suite: Suite) -> Self {
        if !self.suites.contains(&suite) {
            self.suites.push(suite);
        }
        self
    }

    /// Only scenarios whose id contains `filter`
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set the failure mode
    #[must_use]
    pub const fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Set the number of concurrent sessions (at least one)
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    fn accepts(&self, scenario: &Scenario) -> bool {
        (self.suites.is_empty() || self.suites.contains(&scenario.suite))
            && self.filter.as_deref().map_or(true, |f| scenario.matches(f))
    }
}

/// Runs catalogued scenarios against browsers from one launcher
pub struct SuiteRunner<'l> {
    launcher: &'l dyn DriverLauncher,
    config: SuiteConfig,
    context: Arc<ScenarioContext>,
}

impl std::fmt::Debug for SuiteRunner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteRunner")
            .field("config", &self.config)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl<'l> SuiteRunner<'l> {
    /// Runner with fixture data loaded from `test.data.file`
    pub fn new(launcher: &'l dyn DriverLauncher, config: SuiteConfig) -> ProbeResult<Self> {
        let data = TestData::load(config.test_data_file())?;
        Ok(Self::with_context(launcher, config, ScenarioContext::new(data)))
    }

    /// Runner over an explicit context
    #[must_use]
    pub fn with_context(
        launcher: &'l dyn DriverLauncher,
        config: SuiteConfig,
        context: ScenarioContext,
    ) -> Self {
        Self {
            launcher,
            config,
            context: Arc::new(context),
        }
    }

    /// Effective configuration
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Shared scenario context
    #[must_use]
    pub const fn context(&self) -> &Arc<ScenarioContext> {
        &self.context
    }

    /// Catalogued scenarios accepted by `options`, in catalogue order
    #[must_use]
    pub fn select(options: &RunOptions) -> Vec<Scenario> {
        catalogue()
            .iter()
            .filter(|s| options.accepts(s))
            .copied()
            .collect()
    }

    /// Run the selected scenarios
    pub async fn run(&self, options: &RunOptions) -> SuiteReport {
        self.run_with(options, |_| {}).await
    }

    /// Run the selected scenarios, calling `on_result` as each one settles
    pub async fn run_with<F>(&self, options: &RunOptions, on_result: F) -> SuiteReport
    where
        F: Fn(&ScenarioResult) + Sync,
    {
        let selected = Self::select(options);
        self.run_scenarios(&selected, options, on_result).await
    }

    /// Run an explicit scenario list, ignoring the selection in `options`
    pub async fn run_scenarios<F>(
        &self,
        scenarios: &[Scenario],
        options: &RunOptions,
        on_result: F,
    ) -> SuiteReport
    where
        F: Fn(&ScenarioResult) + Sync,
    {
        tracing::info!(
            scenarios = scenarios.len(),
            mode = ?options.failure_mode,
            jobs = options.jobs,
            base_url = %self.config.base_url(),
            "starting run"
        );
        let stop = AtomicBool::new(false);
        let stop_reason: OnceLock<String> = OnceLock::new();
        let (stop, stop_reason, on_result) = (&stop, &stop_reason, &on_result);

        let results: Vec<ScenarioResult> = stream::iter(scenarios.iter().copied())
            .map(|scenario| async move {
                if stop.load(Ordering::SeqCst) {
                    let reason = stop_reason.get().map_or("run stopped", String::as_str);
                    let result = ScenarioResult::skipped(&scenario, reason);
                    tracing::info!(scenario = %scenario.id(), "skipped");
                    on_result(&result);
                    return result;
                }
                let (result, launch_failed) = self.run_one(scenario).await;
                if result.status.is_failed() {
                    if launch_failed {
                        let _ = stop_reason.set(format!("browser launch failed in {}", result.id()));
                        stop.store(true, Ordering::SeqCst);
                    } else if options.failure_mode == FailureMode::FailFast {
                        let _ = stop_reason.set(format!("fail-fast after {}", result.id()));
                        stop.store(true, Ordering::SeqCst);
                    }
                }
                on_result(&result);
                result
            })
            .buffered(options.jobs.max(1))
            .collect()
            .await;

        let mut report = SuiteReport::new("storeprobe").with_target(
            self.config.base_url(),
            self.config.browser().to_string(),
            self.config.environment(),
        );
        for result in results {
            report.add(result);
        }
        if let Some(reason) = stop_reason.get() {
            report.abort(reason.clone());
        }
        tracing::info!(summary = %report.summary(), "run finished");
        report
    }

    async fn run_one(&self, scenario: Scenario) -> (ScenarioResult, bool) {
        tracing::info!(scenario = %scenario.id(), "scenario started");
        let started = Utc::now();
        let context = Arc::clone(&self.context);
        let run = with_session(self.launcher, &self.config, scenario.name, move |session| {
            scenario.run(session, context)
        })
        .await;

        let launch_failed = run.session_id.is_none()
            && matches!(run.result, Err(ProbeError::BrowserLaunch { .. }));
        let result = match run.result {
            Ok(()) => {
                tracing::info!(scenario = %scenario.id(), "scenario passed");
                ScenarioResult::passed(&scenario, started)
            }
            Err(e) => {
                tracing::error!(scenario = %scenario.id(), error = %e, "scenario failed");
                ScenarioResult::failed(&scenario, started, e.to_string())
            }
        };
        (
            result
                .with_screenshot(run.screenshot)
                .with_session(run.session_id),
            launch_failed,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::MockLauncher;
    use crate::report::ScenarioStatus;
    use crate::scenarios::Severity;
    use crate::session::Session;
    use futures::future::BoxFuture;
    use std::sync::Mutex;

    fn passes(session: &Session, _ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
        Box::pin(async move { session.driver().title().await.map(|_| ()) })
    }

    fn fails(_session: &Session, _ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
        Box::pin(async { Err(ProbeError::assertion("title", "STORE", "")) })
    }

    fn synthetic(name: &'static str, body: crate::scenarios::ScenarioFn) -> Scenario {
        Scenario::new(Suite::Product, name, "Synthetic", "synthetic", Severity::Minor, body)
    }

    fn config_in(dir: &tempfile::TempDir) -> SuiteConfig {
        SuiteConfig::new()
            .set(
                "screenshots.directory",
                dir.path().join("shots").display().to_string(),
            )
            .set(
                "test.data.file",
                dir.path().join("testdata.json").display().to_string(),
            )
    }

    fn statuses(report: &SuiteReport) -> Vec<ScenarioStatus> {
        report.results().iter().map(|r| r.status).collect()
    }

    mod selection_tests {
        use super::*;

        #[test]
        fn test_default_selects_everything() {
            assert_eq!(SuiteRunner::select(&RunOptions::default()).len(), catalogue().len());
        }

        #[test]
        fn test_suite_selection_keeps_catalogue_order() {
            let options = RunOptions::default()
                .with_suite(Suite::Checkout)
                .with_suite(Suite::Login);
            let selected = SuiteRunner::select(&options);
            assert_eq!(selected.len(), 9);
            assert_eq!(selected[0].suite, Suite::Login);
            assert_eq!(selected[8].suite, Suite::Checkout);
        }

        #[test]
        fn test_filter_and_suite_combine() {
            let options = RunOptions::default()
                .with_suite(Suite::Cart)
                .with_filter("TOTAL");
            let names: Vec<&str> = SuiteRunner::select(&options).iter().map(|s| s.name).collect();
            assert_eq!(names, ["cart_total_calculation"]);

            let none = RunOptions::default()
                .with_suite(Suite::Login)
                .with_filter("checkout");
            assert!(SuiteRunner::select(&none).is_empty());
        }

        #[test]
        fn test_jobs_at_least_one() {
            assert_eq!(RunOptions::default().with_jobs(0).jobs, 1);
            assert_eq!(RunOptions::default().failure_mode, FailureMode::CollectAll);
        }
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn test_missing_fixture_uses_default_data() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = MockLauncher::new();
            let runner = SuiteRunner::new(&launcher, config_in(&dir)).unwrap();
            assert_eq!(runner.context().data, TestData::default());
            assert!(runner.context().cache.is_empty());
        }

        #[test]
        fn test_malformed_fixture_is_rejected() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("testdata.json"), "{ not json").unwrap();
            let launcher = MockLauncher::new();
            let err = SuiteRunner::new(&launcher, config_in(&dir)).unwrap_err();
            assert!(matches!(err, ProbeError::Fixture { .. }));
        }
    }

    mod execution_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_collect_all_runs_everything() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = MockLauncher::new();
            let runner = SuiteRunner::with_context(&launcher, config_in(&dir), ScenarioContext::default());
            let scenarios = [synthetic("one", passes), synthetic("two", fails), synthetic("three", passes)];

            let report = runner
                .run_scenarios(&scenarios, &RunOptions::default(), |_| {})
                .await;

            assert_eq!(
                statuses(&report),
                [ScenarioStatus::Passed, ScenarioStatus::Failed, ScenarioStatus::Passed]
            );
            assert!(report.aborted.is_none());
            assert_eq!(launcher.launched().len(), 3);
            assert!(launcher.launched().iter().all(|d| d.is_quit()));
        }

        #[tokio::test(start_paused = true)]
        async fn test_failure_carries_screenshot_and_session() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = MockLauncher::new();
            let runner = SuiteRunner::with_context(&launcher, config_in(&dir), ScenarioContext::default());

            let report = runner
                .run_scenarios(&[synthetic("broken", fails)], &RunOptions::default(), |_| {})
                .await;

            let result = &report.results()[0];
            assert!(result.error.as_deref().unwrap().contains("title"));
            assert!(result.screenshot.as_ref().unwrap().exists());
            assert!(result.session_id.is_some());
        }

        #[tokio::test(start_paused = true)]
        async fn test_fail_fast_skips_the_rest() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = MockLauncher::new();
            let runner = SuiteRunner::with_context(&launcher, config_in(&dir), ScenarioContext::default());
            let scenarios = [synthetic("one", passes), synthetic("two", fails), synthetic("three", passes)];
            let options = RunOptions::default().with_failure_mode(FailureMode::FailFast);

            let seen = Mutex::new(Vec::new());
            let report = runner
                .run_scenarios(&scenarios, &options, |r| seen.lock().unwrap().push(r.name.clone()))
                .await;

            assert_eq!(
                statuses(&report),
                [ScenarioStatus::Passed, ScenarioStatus::Failed, ScenarioStatus::Skipped]
            );
            assert_eq!(launcher.launched().len(), 2);
            assert_eq!(*seen.lock().unwrap(), ["one", "two", "three"]);
            assert_eq!(report.aborted.as_deref(), Some("fail-fast after product::two"));
            assert!(!report.all_passed());
        }

        #[tokio::test(start_paused = true)]
        async fn test_launch_failure_aborts_run() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = MockLauncher::new().failing();
            let runner = SuiteRunner::with_context(&launcher, config_in(&dir), ScenarioContext::default());
            let scenarios = [synthetic("one", passes), synthetic("two", passes)];

            let report = runner
                .run_scenarios(&scenarios, &RunOptions::default(), |_| {})
                .await;

            assert_eq!(statuses(&report), [ScenarioStatus::Failed, ScenarioStatus::Skipped]);
            assert!(report.results()[0].session_id.is_none());
            assert!(report.aborted.as_deref().unwrap().starts_with("browser launch failed"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_parallel_jobs_keep_order() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = MockLauncher::new();
            let runner = SuiteRunner::with_context(&launcher, config_in(&dir), ScenarioContext::default());
            let scenarios = [
                synthetic("a", passes),
                synthetic("b", fails),
                synthetic("c", passes),
                synthetic("d", passes),
            ];

            let report = runner
                .run_scenarios(&scenarios, &RunOptions::default().with_jobs(3), |_| {})
                .await;

            let names: Vec<&str> = report.results().iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, ["a", "b", "c", "d"]);
            assert_eq!(report.failed_count(), 1);
            assert_eq!(launcher.launched().len(), 4);
        }
    }
}
