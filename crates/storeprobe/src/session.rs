//! Browser session lifecycle.
//!
//! A [`Session`] is the only handle page action sets hold. It is opened per
//! scenario and quit on every exit path by [`with_session`].

use crate::config::SuiteConfig;
use crate::driver::{DriverLauncher, SessionDriver, SessionOptions};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{TimeoutTier, Waiter};
use futures::future::BoxFuture;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// One browser session
pub struct Session {
    id: Uuid,
    driver: Box<dyn SessionDriver>,
    config: SuiteConfig,
    closed: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("base_url", &self.config.base_url())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Wrap an already launched driver
    #[must_use]
    pub fn from_driver(driver: Box<dyn SessionDriver>, config: SuiteConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver,
            config,
            closed: false,
        }
    }

    /// Launch a browser, clear cookies and open the storefront.
    ///
    /// The browser is quit again if anything after launch fails.
    pub async fn start(launcher: &dyn DriverLauncher, config: &SuiteConfig) -> ProbeResult<Self> {
        let options = SessionOptions::from_config(config);
        let driver = launcher.launch(&options).await?;
        let mut session = Self::from_driver(driver, config.clone());
        tracing::info!(session = %session.id, browser = %options.browser, "session started");
        if let Err(e) = session.prepare().await {
            tracing::error!(session = %session.id, error = %e, "session setup failed");
            let _ = session.quit().await;
            return Err(e);
        }
        Ok(session)
    }

    async fn prepare(&self) -> ProbeResult<()> {
        self.driver.delete_cookies().await?;
        self.open_home().await
    }

    /// Session id
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Suite configuration
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Whether [`Session::quit`] has run
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Fail with [`ProbeError::SessionClosed`] once quit
    pub fn ensure_open(&self) -> ProbeResult<()> {
        if self.closed {
            Err(ProbeError::SessionClosed)
        } else {
            Ok(())
        }
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &dyn SessionDriver {
        self.driver.as_ref()
    }

    /// Wait primitives with the configured extended budget
    #[must_use]
    pub fn waiter(&self) -> Waiter<'_> {
        Waiter::new(self.driver()).with_extended_timeout(self.config.explicit_wait())
    }

    /// Navigate to an absolute URL
    pub async fn navigate(&self, url: &str) -> ProbeResult<()> {
        self.ensure_open()?;
        tracing::debug!(session = %self.id, url, "navigate");
        self.driver.navigate(url).await
    }

    /// Open the storefront root and wait for it to settle
    pub async fn open_home(&self) -> ProbeResult<()> {
        let url = self.config.base_url();
        self.navigate(&url).await?;
        self.waiter()
            .wait_for_page_ready(TimeoutTier::Extended)
            .await
            .map_err(|e| ProbeError::Navigation {
                url,
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Write a PNG to `<screenshots dir>/<name>_<timestamp>.png`
    pub async fn capture_screenshot(&self, name: &str) -> ProbeResult<PathBuf> {
        self.ensure_open()?;
        let bytes = self.driver.screenshot().await?;
        let dir = self.config.screenshots_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{}_{stamp}.png", sanitize(name)));
        tokio::fs::write(&path, bytes).await?;
        tracing::info!(session = %self.id, path = %path.display(), "screenshot captured");
        Ok(path)
    }

    /// Accept any open native dialog, returning its text
    pub async fn dismiss_dialog(&self) -> Option<String> {
        let text = self.driver.alert_text().await.ok().flatten()?;
        match self.driver.accept_alert().await {
            Ok(_) => {
                tracing::info!(session = %self.id, alert = %text, "dismissed dialog");
                Some(text)
            }
            Err(e) => {
                tracing::warn!(session = %self.id, alert = %text, error = %e, "could not dismiss dialog");
                None
            }
        }
    }

    /// Quit the browser; repeated calls are no-ops
    pub async fn quit(&mut self) -> ProbeResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        tracing::info!(session = %self.id, "session quit");
        self.driver.quit().await
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Outcome of [`with_session`]
#[derive(Debug)]
pub struct SessionRun<T> {
    /// Session id, absent when launch failed
    pub session_id: Option<Uuid>,
    /// Scenario result
    pub result: ProbeResult<T>,
    /// Screenshot captured on failure
    pub screenshot: Option<PathBuf>,
}

/// Run `body` in a fresh session.
///
/// A failing body gets a screenshot named after `name`, taken once any open
/// dialog has been accepted. The session is quit
/// on every path, including a failed screenshot.
pub async fn with_session<T, F>(
    launcher: &dyn DriverLauncher,
    config: &SuiteConfig,
    name: &str,
    body: F,
) -> SessionRun<T>
where
    F: for<'s> FnOnce(&'s Session) -> BoxFuture<'s, ProbeResult<T>>,
{
    let mut session = match Session::start(launcher, config).await {
        Ok(session) => session,
        Err(e) => {
            return SessionRun {
                session_id: None,
                result: Err(e),
                screenshot: None,
            }
        }
    };

    let result = body(&session).await;

    let screenshot = match &result {
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(scenario = name, error = %e, "scenario failed, capturing screenshot");
            session.dismiss_dialog().await;
            match session.capture_screenshot(name).await {
                Ok(path) => Some(path),
                Err(shot_err) => {
                    tracing::warn!(scenario = name, error = %shot_err, "screenshot failed");
                    None
                }
            }
        }
    };

    if let Err(e) = session.quit().await {
        tracing::warn!(session = %session.id(), error = %e, "quit failed");
    }

    SessionRun {
        session_id: Some(session.id()),
        result,
        screenshot,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::{MockLauncher, MOCK_PNG};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn config_in(dir: &tempfile::TempDir) -> SuiteConfig {
        SuiteConfig::new().set(
            "screenshots.directory",
            dir.path().join("shots").display().to_string(),
        )
    }

    fn all_quit(launcher: &MockLauncher) -> bool {
        launcher.launched().iter().all(|d| d.is_quit())
    }

    mod lifecycle_tests {
        use super::*;

        #[tokio::test]
        async fn test_start_clears_cookies_and_opens_base_url() {
            let launcher = MockLauncher::new();
            let session = Session::start(&launcher, &SuiteConfig::new()).await.unwrap();
            let url = session.driver().current_url().await.unwrap();
            assert_eq!(url, "https://www.demoblaze.com");
            assert!(launcher.launched()[0].was_called("delete_cookies"));
            assert!(!session.is_closed());
        }

        #[tokio::test]
        async fn test_quit_is_idempotent() {
            let launcher = MockLauncher::new();
            let mut session = Session::start(&launcher, &SuiteConfig::new()).await.unwrap();
            session.quit().await.unwrap();
            session.quit().await.unwrap();
            assert!(session.is_closed());
            let quits = launcher.launched()[0]
                .history()
                .iter()
                .filter(|c| *c == "quit")
                .count();
            assert_eq!(quits, 1);
            assert!(matches!(session.ensure_open(), Err(ProbeError::SessionClosed)));
            assert!(matches!(
                session.navigate("https://x").await,
                Err(ProbeError::SessionClosed)
            ));
        }

        #[tokio::test]
        async fn test_failed_setup_quits_browser() {
            let launcher = MockLauncher::new().with_setup(|d| d.fail_navigation());
            let err = Session::start(&launcher, &SuiteConfig::new()).await.unwrap_err();
            assert!(matches!(err, ProbeError::Navigation { .. }));
            assert!(all_quit(&launcher));
        }

        #[tokio::test]
        async fn test_screenshot_written_to_configured_dir() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = MockLauncher::new();
            let session = Session::start(&launcher, &config_in(&dir)).await.unwrap();
            let path = session.capture_screenshot("cart total/check").await.unwrap();
            assert!(path.starts_with(dir.path().join("shots")));
            let file_name = path.file_name().unwrap().to_string_lossy().to_string();
            assert!(file_name.starts_with("cart_total_check_"));
            assert!(file_name.ends_with(".png"));
            assert_eq!(std::fs::read(&path).unwrap(), MOCK_PNG);
        }
    }

    mod with_session_tests {
        use super::*;

        #[tokio::test]
        async fn test_success_quits_without_screenshot() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = MockLauncher::new();
            let run = with_session(&launcher, &config_in(&dir), "ok", |s| {
                Box::pin(async move { s.driver().title().await })
            })
            .await;
            assert!(run.result.is_ok());
            assert!(run.screenshot.is_none());
            assert!(run.session_id.is_some());
            assert!(all_quit(&launcher));
        }

        #[tokio::test]
        async fn test_failure_captures_screenshot_and_quits() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = MockLauncher::new();
            let run: SessionRun<()> = with_session(&launcher, &config_in(&dir), "boom", |_s| {
                Box::pin(async { Err(ProbeError::assertion("cart count", 1, 0)) })
            })
            .await;
            assert!(run.result.unwrap_err().is_assertion());
            assert!(run.screenshot.unwrap().exists());
            assert!(all_quit(&launcher));
        }

        #[tokio::test]
        async fn test_open_dialog_accepted_before_screenshot() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = MockLauncher::new().with_setup(|d| d.push_alert("Product added."));
            let run: SessionRun<()> = with_session(&launcher, &config_in(&dir), "dialog", |_s| {
                Box::pin(async {
                    Err(ProbeError::UnexpectedAlert {
                        text: "Product added.".to_string(),
                    })
                })
            })
            .await;
            assert!(run.screenshot.is_some());
            let history = launcher.launched()[0].history();
            let accepted = history
                .iter()
                .position(|c| c == "accept_alert:Product added.")
                .unwrap();
            let shot = history.iter().position(|c| c == "screenshot").unwrap();
            assert!(accepted < shot);
            assert!(all_quit(&launcher));
        }

        #[tokio::test]
        async fn test_screenshot_failure_still_quits() {
            let dir = tempfile::tempdir().unwrap();
            let blocker = dir.path().join("blocked");
            std::fs::write(&blocker, b"file, not a directory").unwrap();
            let config = SuiteConfig::new().set(
                "screenshots.directory",
                blocker.join("shots").display().to_string(),
            );
            let launcher = MockLauncher::new();
            let run: SessionRun<()> = with_session(&launcher, &config, "boom", |_s| {
                Box::pin(async { Err(ProbeError::driver("gone")) })
            })
            .await;
            assert!(run.result.is_err());
            assert!(run.screenshot.is_none());
            assert!(all_quit(&launcher));
        }

        #[tokio::test]
        async fn test_launch_failure_aborts_without_running_body() {
            let launcher = MockLauncher::new().failing();
            let ran = AtomicBool::new(false);
            let run: SessionRun<()> = with_session(&launcher, &SuiteConfig::new(), "never", |_s| {
                ran.store(true, Ordering::SeqCst);
                Box::pin(async { Ok(()) })
            })
            .await;
            assert!(matches!(run.result, Err(ProbeError::BrowserLaunch { .. })));
            assert!(run.session_id.is_none());
            assert!(!ran.load(Ordering::SeqCst));
        }
    }
}
