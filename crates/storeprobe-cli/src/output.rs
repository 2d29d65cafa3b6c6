//! Terminal output and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use storeprobe::{ScenarioResult, ScenarioStatus};

/// Progress reporter for a scenario run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn line(&self, text: &str) {
        match self.progress_bar {
            Some(ref pb) if !pb.is_finished() => pb.println(text),
            _ => {
                let _ = self.term.write_line(text);
            }
        }
    }

    fn prefixed(&self, glyph: &str, plain: &str, paint: fn(&str) -> String, message: &str) {
        let prefix = if self.use_color {
            paint(glyph)
        } else {
            plain.to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed("✓", "PASS", |g| style(g).green().bold().to_string(), message);
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        self.prefixed("✗", "FAIL", |g| style(g).red().bold().to_string(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed("⚠", "WARN", |g| style(g).yellow().bold().to_string(), message);
    }

    /// Print a skip message
    pub fn skipped(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed("○", "SKIP", |g| style(g).yellow().to_string(), message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.prefixed("ℹ", "INFO", |g| style(g).blue().bold().to_string(), message);
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.line("");
        self.line(&styled);
    }

    /// One line per settled scenario, plus its error and screenshot
    pub fn scenario(&self, result: &ScenarioResult) {
        let label = format!(
            "{} ({:.2}s)",
            result.id(),
            result.duration.as_secs_f64()
        );
        match result.status {
            ScenarioStatus::Passed => self.success(&label),
            ScenarioStatus::Skipped => {
                let reason = result.error.as_deref().unwrap_or("skipped");
                self.skipped(&format!("{}: {reason}", result.id()));
            }
            ScenarioStatus::Failed => {
                self.failure(&label);
                if let Some(error) = &result.error {
                    self.line(&format!("    {error}"));
                }
                if let Some(shot) = &result.screenshot {
                    self.line(&format!("    screenshot: {}", shot.display()));
                }
            }
        }
        self.increment(1);
    }

    /// Print the run summary
    pub fn summary(&self, passed: usize, failed: usize, skipped: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }

        self.line("");

        let total = passed + failed + skipped;
        let duration_secs = duration.as_secs_f64();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let skipped_style = Style::new().yellow();

            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };

            self.line(&format!(
                "{} {} scenarios in {:.2}s ({} passed, {} failed, {} skipped)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                skipped_style.apply_to(skipped)
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            self.line(&format!(
                "{status} {total} scenarios in {duration_secs:.2}s ({passed} passed, {failed} failed, {skipped} skipped)"
            ));
        }
    }
}
