//! SessionDriver - Abstract Browser Automation Trait
//!
//! Every page action reaches the browser through [`SessionDriver`]. Backends:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  SessionDriver (async trait)                                     │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌────────────────┐  │
//! │  │  CdpDriver       │  │  WebDriverDriver │  │  MockDriver    │  │
//! │  │  chrome / edge   │  │  firefox         │  │  unit tests    │  │
//! │  │  chromiumoxide   │  │  fantoccini      │  │  in-memory DOM │  │
//! │  └──────────────────┘  └──────────────────┘  └────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Element queries take a [`Locator`] and act on its first match; a missing
//! element is reported as a [`crate::ProbeError::Driver`] so the wait layer can keep
//! polling.

use crate::config::{BrowserKind, SuiteConfig};
use crate::locator::Locator;
use crate::result::ProbeResult;
use async_trait::async_trait;
use std::time::Duration;

/// Chromium switches applied to every launch
pub const CHROMIUM_ARGS: &[&str] = &[
    "--disable-extensions",
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
];

/// Options recognised when opening a browser session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Which browser to drive
    pub browser: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Maximize the window after launch
    pub maximize: bool,
    /// Implicit element wait applied by WebDriver backends
    pub implicit_wait: Duration,
    /// Page load budget
    pub page_load_timeout: Duration,
    /// Browser executable override
    pub binary: Option<String>,
    /// WebDriver endpoint for the firefox backend
    pub webdriver_url: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chrome,
            headless: false,
            window_width: 1920,
            window_height: 1080,
            maximize: true,
            implicit_wait: Duration::from_secs(10),
            page_load_timeout: Duration::from_secs(30),
            binary: None,
            webdriver_url: "http://localhost:4444".to_string(),
        }
    }
}

impl SessionOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive options from suite configuration
    #[must_use]
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self {
            browser: config.browser(),
            headless: config.headless(),
            window_width: config.window_width(),
            window_height: config.window_height(),
            maximize: config.maximize(),
            implicit_wait: config.implicit_wait(),
            page_load_timeout: config.page_load_timeout(),
            binary: config.browser_binary(),
            webdriver_url: config.webdriver_url(),
        }
    }

    /// Set browser kind
    #[must_use]
    pub const fn with_browser(mut self, browser: BrowserKind) -> Self {
        self.browser = browser;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set window dimensions
    #[must_use]
    pub const fn with_window(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Set browser executable
    #[must_use]
    pub fn with_binary(mut self, path: impl Into<String>) -> Self {
        self.binary = Some(path.into());
        self
    }

    /// Chromium command-line switches for these options
    #[must_use]
    pub fn chromium_args(&self) -> Vec<String> {
        let mut args: Vec<String> = CHROMIUM_ARGS.iter().map(|a| (*a).to_string()).collect();
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if self.maximize {
            args.push("--start-maximized".to_string());
        }
        args.push(format!(
            "--window-size={},{}",
            self.window_width, self.window_height
        ));
        args
    }
}

/// Abstract driver trait for one browser session.
///
/// Implementations must be usable from a single task at a time; sessions are
/// never shared across concurrent scenarios.
#[async_trait]
pub trait SessionDriver: Send + Sync {
    /// Navigate to URL
    async fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// Current URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Document title
    async fn title(&self) -> ProbeResult<String>;

    /// Execute JavaScript in page context
    async fn execute_script(&self, script: &str) -> ProbeResult<serde_json::Value>;

    /// Number of elements matching the locator
    async fn count(&self, locator: &Locator) -> ProbeResult<usize>;

    /// First match exists and is displayed
    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool>;

    /// First match exists and is not disabled
    async fn is_enabled(&self, locator: &Locator) -> ProbeResult<bool>;

    /// Visible text of the first match
    async fn text(&self, locator: &Locator) -> ProbeResult<String>;

    /// Visible text of every match, in document order
    async fn texts(&self, locator: &Locator) -> ProbeResult<Vec<String>>;

    /// Attribute of the first match
    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>>;

    /// Click the first match
    async fn click(&self, locator: &Locator) -> ProbeResult<()>;

    /// Clear the first match and type text into it
    async fn type_text(&self, locator: &Locator, text: &str) -> ProbeResult<()>;

    /// Scroll the first match into the viewport
    async fn scroll_into_view(&self, locator: &Locator) -> ProbeResult<()>;

    /// Message of the open native dialog, if any
    async fn alert_text(&self) -> ProbeResult<Option<String>>;

    /// Accept the open native dialog; false when none is open
    async fn accept_alert(&self) -> ProbeResult<bool>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> ProbeResult<Vec<u8>>;

    /// Go back in history
    async fn go_back(&self) -> ProbeResult<()>;

    /// Reload page
    async fn reload(&self) -> ProbeResult<()>;

    /// Delete all cookies
    async fn delete_cookies(&self) -> ProbeResult<()>;

    /// End the session and release the browser process
    async fn quit(&mut self) -> ProbeResult<()>;
}

/// Creates browser sessions
#[async_trait]
pub trait DriverLauncher: Send + Sync {
    /// Launch a browser configured by `options`
    async fn launch(&self, options: &SessionOptions) -> ProbeResult<Box<dyn SessionDriver>>;
}

/// Launcher choosing the backend by browser kind
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserLauncher;

#[async_trait]
impl DriverLauncher for BrowserLauncher {
    async fn launch(&self, options: &SessionOptions) -> ProbeResult<Box<dyn SessionDriver>> {
        tracing::info!(browser = %options.browser, headless = options.headless, "launching browser");
        match options.browser {
            BrowserKind::Chrome | BrowserKind::Edge => launch_chromium(options).await,
            BrowserKind::Firefox => launch_webdriver(options).await,
        }
    }
}

#[cfg(feature = "browser")]
async fn launch_chromium(options: &SessionOptions) -> ProbeResult<Box<dyn SessionDriver>> {
    let driver = crate::cdp::CdpDriver::launch(options).await?;
    Ok(Box::new(driver))
}

#[cfg(not(feature = "browser"))]
async fn launch_chromium(options: &SessionOptions) -> ProbeResult<Box<dyn SessionDriver>> {
    Err(crate::result::ProbeError::BrowserLaunch {
        message: format!(
            "{} requires the `browser` feature (rebuild with --features browser)",
            options.browser
        ),
    })
}

#[cfg(feature = "webdriver")]
async fn launch_webdriver(options: &SessionOptions) -> ProbeResult<Box<dyn SessionDriver>> {
    let driver = crate::webdriver::WebDriverDriver::connect(options).await?;
    Ok(Box::new(driver))
}

#[cfg(not(feature = "webdriver"))]
async fn launch_webdriver(options: &SessionOptions) -> ProbeResult<Box<dyn SessionDriver>> {
    Err(crate::result::ProbeError::BrowserLaunch {
        message: format!(
            "{} requires the `webdriver` feature (rebuild with --features webdriver)",
            options.browser
        ),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    #[cfg(not(feature = "webdriver"))]
    use crate::result::ProbeError;

    mod session_options_tests {
        use super::*;

        #[test]
        fn test_options_default() {
            let opts = SessionOptions::default();
            assert_eq!(opts.browser, BrowserKind::Chrome);
            assert!(!opts.headless);
            assert_eq!(opts.window_width, 1920);
            assert_eq!(opts.page_load_timeout, Duration::from_secs(30));
        }

        #[test]
        fn test_options_builder() {
            let opts = SessionOptions::new()
                .with_browser(BrowserKind::Edge)
                .with_headless(true)
                .with_window(800, 600)
                .with_binary("/usr/bin/msedge");
            assert_eq!(opts.browser, BrowserKind::Edge);
            assert!(opts.headless);
            assert_eq!((opts.window_width, opts.window_height), (800, 600));
            assert_eq!(opts.binary.as_deref(), Some("/usr/bin/msedge"));
        }

        #[test]
        fn test_chromium_args_include_stability_switches() {
            let args = SessionOptions::new().with_headless(true).chromium_args();
            for required in CHROMIUM_ARGS {
                assert!(args.iter().any(|a| a == required), "missing {required}");
            }
            assert!(args.iter().any(|a| a == "--headless=new"));
            assert!(args.iter().any(|a| a == "--window-size=1920,1080"));
        }

        #[test]
        fn test_chromium_args_headed() {
            let args = SessionOptions::new().chromium_args();
            assert!(!args.iter().any(|a| a.starts_with("--headless")));
        }

        #[test]
        fn test_options_from_config() {
            let config = SuiteConfig::from_properties_str(
                "browser=firefox\nheadless.mode=true\npage.load.timeout=12\n",
            );
            let opts = SessionOptions::from_config(&config);
            assert_eq!(opts.browser, BrowserKind::Firefox);
            assert!(opts.headless);
            assert_eq!(opts.page_load_timeout, Duration::from_secs(12));
        }
    }

    #[cfg(not(feature = "webdriver"))]
    #[tokio::test]
    async fn test_firefox_without_webdriver_feature_fails_to_launch() {
        let opts = SessionOptions::new().with_browser(BrowserKind::Firefox);
        let err = BrowserLauncher.launch(&opts).await.err().unwrap();
        assert!(matches!(err, ProbeError::BrowserLaunch { .. }));
    }
}
