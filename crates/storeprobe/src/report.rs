//! Run reports: console summary, JUnit XML, JSON summary and Allure results.
//!
//! ```text
//! reports.directory/
//! ├── junit.xml
//! ├── summary.json
//! └── allure-results/
//!     ├── <uuid>-result.json
//!     └── <uuid>-attachment.png   (failure screenshot)
//! ```

use crate::result::ProbeResult;
use crate::scenarios::{Scenario, Severity, Suite};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// JUnit file name inside the reports directory
pub const JUNIT_FILE: &str = "junit.xml";

/// JSON summary file name inside the reports directory
pub const JSON_FILE: &str = "summary.json";

/// Allure results sub-directory used when no explicit one is given
pub const ALLURE_DIR: &str = "allure-results";

/// Scenario outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    /// Body returned `Ok`
    Passed,
    /// Body failed, or the session could not start
    Failed,
    /// Not run after a fail-fast stop
    Skipped,
}

impl ScenarioStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Lower-case name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

fn as_millis<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Result of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Report id, also the Allure file stem
    pub uuid: Uuid,
    /// Owning suite
    pub suite: Suite,
    /// Scenario name
    pub name: String,
    /// Allure story
    pub story: String,
    /// Scenario description
    pub description: String,
    /// Allure severity
    pub severity: Severity,
    /// Outcome
    pub status: ScenarioStatus,
    /// Wall time
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
    /// Error message for failures
    pub error: Option<String>,
    /// Failure screenshot
    pub screenshot: Option<PathBuf>,
    /// Browser session the scenario ran in
    pub session_id: Option<Uuid>,
    /// Start time
    pub started: DateTime<Utc>,
    /// Stop time
    pub stopped: DateTime<Utc>,
}

impl ScenarioResult {
    fn new(scenario: &Scenario, status: ScenarioStatus, started: DateTime<Utc>) -> Self {
        let stopped = Utc::now();
        Self {
            uuid: Uuid::new_v4(),
            suite: scenario.suite,
            name: scenario.name.to_string(),
            story: scenario.story.to_string(),
            description: scenario.description.to_string(),
            severity: scenario.severity,
            status,
            duration: (stopped - started).to_std().unwrap_or_default(),
            error: None,
            screenshot: None,
            session_id: None,
            started,
            stopped,
        }
    }

    /// Passed scenario that started at `started`
    #[must_use]
    pub fn passed(scenario: &Scenario, started: DateTime<Utc>) -> Self {
        Self::new(scenario, ScenarioStatus::Passed, started)
    }

    /// Failed scenario that started at `started`
    #[must_use]
    pub fn failed(scenario: &Scenario, started: DateTime<Utc>, error: impl Into<String>) -> Self {
        let mut result = Self::new(scenario, ScenarioStatus::Failed, started);
        result.error = Some(error.into());
        result
    }

    /// Scenario that never ran
    #[must_use]
    pub fn skipped(scenario: &Scenario, reason: impl Into<String>) -> Self {
        let mut result = Self::new(scenario, ScenarioStatus::Skipped, Utc::now());
        result.error = Some(reason.into());
        result
    }

    /// Attach a failure screenshot
    #[must_use]
    pub fn with_screenshot(mut self, path: Option<PathBuf>) -> Self {
        self.screenshot = path;
        self
    }

    /// Record the session id
    #[must_use]
    pub fn with_session(mut self, id: Option<Uuid>) -> Self {
        self.session_id = id;
        self
    }

    /// `<suite>::<name>`
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}::{}", self.suite, self.name)
    }

    /// Allure `<uuid>-result.json` body.
    ///
    /// `attachment` is the file name of the copied screenshot, if any.
    #[must_use]
    pub fn to_allure(&self, attachment: Option<&str>) -> serde_json::Value {
        let labels = [
            ("epic", self.suite.epic()),
            ("feature", self.suite.feature()),
            ("story", self.story.as_str()),
            ("severity", self.severity.as_str()),
            ("suite", self.suite.as_str()),
            ("framework", "storeprobe"),
        ];
        let attachments: Vec<serde_json::Value> = attachment
            .map(|source| {
                json!({
                    "name": "Failure screenshot",
                    "source": source,
                    "type": "image/png",
                })
            })
            .into_iter()
            .collect();
        let mut body = json!({
            "uuid": self.uuid,
            "historyId": self.id(),
            "fullName": self.id(),
            "name": self.name,
            "description": self.description,
            "status": self.status.as_str(),
            "stage": "finished",
            "start": self.started.timestamp_millis(),
            "stop": self.stopped.timestamp_millis(),
            "labels": labels
                .iter()
                .map(|(name, value)| json!({ "name": name, "value": value }))
                .collect::<Vec<_>>(),
            "attachments": attachments,
        });
        if let Some(message) = &self.error {
            body["statusDetails"] = json!({ "message": message });
        }
        body
    }
}

/// Files produced by [`SuiteReport::write_all`]
#[derive(Debug, Clone)]
pub struct ReportPaths {
    /// JUnit XML
    pub junit: PathBuf,
    /// JSON summary
    pub json: PathBuf,
    /// Allure results directory
    pub allure: PathBuf,
}

/// Results of one run
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    /// Report title
    pub name: String,
    /// Storefront root
    pub base_url: String,
    /// Browser name
    pub browser: String,
    /// Environment label
    pub environment: String,
    /// Set when the run stopped early
    pub aborted: Option<String>,
    results: Vec<ScenarioResult>,
}

impl SuiteReport {
    /// Empty report
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: String::new(),
            browser: String::new(),
            environment: String::new(),
            aborted: None,
            results: Vec::new(),
        }
    }

    /// Record the target of the run
    #[must_use]
    pub fn with_target(
        mut self,
        base_url: impl Into<String>,
        browser: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        self.base_url = base_url.into();
        self.browser = browser.into();
        self.environment = environment.into();
        self
    }

    /// Add a result
    pub fn add(&mut self, result: ScenarioResult) {
        self.results.push(result);
    }

    /// Mark the run as stopped early
    pub fn abort(&mut self, reason: impl Into<String>) {
        self.aborted = Some(reason.into());
    }

    /// Results in run order
    #[must_use]
    pub fn results(&self) -> &[ScenarioResult] {
        &self.results
    }

    /// Get passed count
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_passed()).count()
    }

    /// Get failed count
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_failed()).count()
    }

    /// Get skipped count
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == ScenarioStatus::Skipped)
            .count()
    }

    /// Get total count
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// Pass rate in percent
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        (self.passed_count() as f64 / self.total_count() as f64) * 100.0
    }

    /// No failures, no skips and no abort
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.aborted.is_none() && self.results.iter().all(|r| r.status.is_passed())
    }

    /// Sum of scenario durations
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    /// Failed results
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results.iter().filter(|r| r.status.is_failed()).collect()
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}: {}/{} passed ({:.1}%)",
            self.name,
            self.passed_count(),
            self.total_count(),
            self.pass_rate()
        );
        if self.failed_count() > 0 {
            line.push_str(&format!(", {} failed", self.failed_count()));
        }
        if self.skipped_count() > 0 {
            line.push_str(&format!(", {} skipped", self.skipped_count()));
        }
        line
    }

    /// JUnit XML, one `<testsuite>` per suite
    #[must_use]
    pub fn render_junit(&self) -> String {
        let mut xml = String::new();

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<testsuites name="{}" tests="{}" failures="{}" skipped="{}" time="{:.3}">"#,
            escape_xml(&self.name),
            self.total_count(),
            self.failed_count(),
            self.skipped_count(),
            self.total_duration().as_secs_f64()
        ));
        xml.push('\n');

        for suite in Suite::ALL {
            let results: Vec<&ScenarioResult> =
                self.results.iter().filter(|r| r.suite == suite).collect();
            if results.is_empty() {
                continue;
            }
            let failures = results.iter().filter(|r| r.status.is_failed()).count();
            let skipped = results
                .iter()
                .filter(|r| r.status == ScenarioStatus::Skipped)
                .count();
            let time: Duration = results.iter().map(|r| r.duration).sum();
            xml.push_str(&format!(
                r#"  <testsuite name="{}" tests="{}" failures="{}" skipped="{}" time="{:.3}">"#,
                suite,
                results.len(),
                failures,
                skipped,
                time.as_secs_f64()
            ));
            xml.push('\n');

            for result in results {
                xml.push_str(&format!(
                    r#"    <testcase name="{}" classname="{}" time="{:.3}">"#,
                    escape_xml(&result.name),
                    suite,
                    result.duration.as_secs_f64()
                ));
                xml.push('\n');

                match (result.status, &result.error) {
                    (ScenarioStatus::Failed, error) => {
                        let error = error.as_deref().unwrap_or("failed");
                        xml.push_str(&format!(
                            r#"      <failure message="{}">{}</failure>"#,
                            escape_xml(error),
                            escape_xml(error)
                        ));
                        xml.push('\n');
                    }
                    (ScenarioStatus::Skipped, reason) => {
                        xml.push_str(&format!(
                            r#"      <skipped message="{}"/>"#,
                            escape_xml(reason.as_deref().unwrap_or("skipped"))
                        ));
                        xml.push('\n');
                    }
                    (ScenarioStatus::Passed, _) => {}
                }
                if let Some(shot) = &result.screenshot {
                    xml.push_str(&format!(
                        "      <system-out>[[ATTACHMENT|{}]]</system-out>\n",
                        escape_xml(&shot.display().to_string())
                    ));
                }

                xml.push_str("    </testcase>\n");
            }

            xml.push_str("  </testsuite>\n");
        }

        xml.push_str("</testsuites>\n");
        xml
    }

    /// JSON summary with every result
    pub fn render_json(&self) -> ProbeResult<String> {
        let body = json!({
            "name": self.name,
            "base_url": self.base_url,
            "browser": self.browser,
            "environment": self.environment,
            "aborted": self.aborted,
            "total": self.total_count(),
            "passed": self.passed_count(),
            "failed": self.failed_count(),
            "skipped": self.skipped_count(),
            "pass_rate": self.pass_rate(),
            "duration_ms": u64::try_from(self.total_duration().as_millis()).unwrap_or(u64::MAX),
            "results": self.results,
        });
        Ok(serde_json::to_string_pretty(&body)?)
    }

    /// Write JUnit XML to a file
    pub fn write_junit(&self, path: &Path) -> ProbeResult<()> {
        ensure_parent(path)?;
        std::fs::write(path, self.render_junit())?;
        tracing::info!(path = %path.display(), "junit report written");
        Ok(())
    }

    /// Write the JSON summary to a file
    pub fn write_json(&self, path: &Path) -> ProbeResult<()> {
        ensure_parent(path)?;
        std::fs::write(path, self.render_json()?)?;
        tracing::info!(path = %path.display(), "json summary written");
        Ok(())
    }

    /// Write one Allure result per scenario into `dir`.
    ///
    /// Screenshots are copied next to the results; a screenshot that cannot
    /// be copied is left out of the result instead of failing the write.
    pub fn write_allure(&self, dir: &Path) -> ProbeResult<usize> {
        std::fs::create_dir_all(dir)?;
        for result in &self.results {
            let attachment = result.screenshot.as_deref().and_then(|shot| {
                let name = format!("{}-attachment.png", result.uuid);
                match std::fs::copy(shot, dir.join(&name)) {
                    Ok(_) => Some(name),
                    Err(e) => {
                        tracing::warn!(screenshot = %shot.display(), error = %e, "screenshot not attached");
                        None
                    }
                }
            });
            let body = result.to_allure(attachment.as_deref());
            std::fs::write(
                dir.join(format!("{}-result.json", result.uuid)),
                serde_json::to_vec_pretty(&body)?,
            )?;
        }
        tracing::info!(dir = %dir.display(), results = self.results.len(), "allure results written");
        Ok(self.results.len())
    }

    /// Write every format under `dir`; Allure goes to `allure` or `dir/allure-results`
    pub fn write_all(&self, dir: &Path, allure: Option<&Path>) -> ProbeResult<ReportPaths> {
        let paths = ReportPaths {
            junit: dir.join(JUNIT_FILE),
            json: dir.join(JSON_FILE),
            allure: allure.map_or_else(|| dir.join(ALLURE_DIR), Path::to_path_buf),
        };
        self.write_junit(&paths.junit)?;
        self.write_json(&paths.json)?;
        self.write_allure(&paths.allure)?;
        Ok(paths)
    }
}

fn ensure_parent(path: &Path) -> ProbeResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
