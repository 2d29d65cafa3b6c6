//! Suite configuration
//!
//! Settings come from a `.properties` file (`key=value` per line,
//! `#` or `!` comments). Every recognised key has a default, so a missing file
//! yields a usable configuration. Environment variables named
//! `STOREPROBE_<KEY>` (dots replaced by underscores) take precedence over the
//! file.

use crate::result::{ProbeError, ProbeResult};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default properties file name
pub const DEFAULT_CONFIG_FILE: &str = "config.properties";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "STOREPROBE_";

/// Recognised keys and their defaults
pub const DEFAULTS: &[(&str, &str)] = &[
    ("base.url", "https://www.demoblaze.com"),
    ("browser", "chrome"),
    ("implicit.wait", "10"),
    ("explicit.wait", "10"),
    ("page.load.timeout", "30"),
    ("headless.mode", "false"),
    ("environment", "prod"),
    ("test.data.file", "testdata.json"),
    ("reports.directory", "test-output/reports"),
    ("screenshots.directory", "test-output/screenshots"),
    ("webdriver.url", "http://localhost:4444"),
    ("window.width", "1920"),
    ("window.height", "1080"),
    ("window.maximize", "true"),
];

// =============================================================================
// BROWSER KIND
// =============================================================================

/// Browser families the suite can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BrowserKind {
    /// Google Chrome / Chromium
    #[default]
    Chrome,
    /// Mozilla Firefox
    Firefox,
    /// Microsoft Edge (Chromium based)
    Edge,
}

impl BrowserKind {
    /// All supported kinds
    pub const ALL: [Self; 3] = [Self::Chrome, Self::Firefox, Self::Edge];

    /// Lower-case name as used in configuration
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
            Self::Edge => "edge",
        }
    }

    /// Parse a configured name, falling back to chrome for unknown names
    #[must_use]
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(browser = name, "unknown browser, using chrome");
            Self::Chrome
        })
    }
}

impl FromStr for BrowserKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Self::Chrome),
            "firefox" => Ok(Self::Firefox),
            "edge" | "msedge" => Ok(Self::Edge),
            other => Err(ProbeError::Config {
                message: format!("unsupported browser '{other}'"),
            }),
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SUITE CONFIG
// =============================================================================

/// Key/value suite configuration with defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteConfig {
    values: BTreeMap<String, String>,
    source: Option<PathBuf>,
}

impl SuiteConfig {
    /// Configuration made only of defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a properties file; a missing file yields the defaults
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                tracing::info!(path = %path.display(), "loaded configuration");
                let mut config = Self::from_properties_str(&content);
                config.source = Some(path.to_path_buf());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "configuration file not found, using defaults");
                Ok(Self::new())
            }
            Err(e) => Err(ProbeError::Config {
                message: format!("cannot read {}: {e}", path.display()),
            }),
        }
    }

    /// Parse properties text
    #[must_use]
    pub fn from_properties_str(content: &str) -> Self {
        let mut values = BTreeMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let split = line.find(['=', ':']);
            let (key, value) = match split {
                Some(idx) => (&line[..idx], &line[idx + 1..]),
                None => (line, ""),
            };
            let _ = values.insert(key.trim().to_string(), value.trim().to_string());
        }
        Self {
            values,
            source: None,
        }
    }

    /// Apply `STOREPROBE_*` variables from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(std::env::vars())
    }

    /// Apply `STOREPROBE_*` variables from an explicit set
    #[must_use]
    pub fn with_overrides_from<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(suffix) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let key = suffix.to_ascii_lowercase().replace('_', ".");
            tracing::debug!(key = %key, "configuration override from environment");
            let _ = self.values.insert(key, value);
        }
        self
    }

    /// Set a value
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.values.insert(key.into(), value.into());
        self
    }

    /// File the configuration was read from
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Raw value, falling back to the built-in default
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .or_else(|| default_for(key))
    }

    /// Raw value or an explicit fallback
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.get(key).unwrap_or(fallback)
    }

    /// Effective key/value pairs: defaults merged with explicit values
    #[must_use]
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut merged: BTreeMap<String, String> = DEFAULTS
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        for (k, v) in &self.values {
            let _ = merged.insert(k.clone(), v.clone());
        }
        merged.into_iter().collect()
    }

    fn parsed<T: FromStr + Default>(&self, key: &str) -> T {
        let fallback = || {
            default_for(key)
                .and_then(|d| d.parse().ok())
                .unwrap_or_default()
        };
        match self.values.get(key) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(key, value = %raw, "malformed configuration value, using default");
                fallback()
            }),
            None => fallback(),
        }
    }

    fn seconds(&self, key: &str) -> Duration {
        Duration::from_secs(self.parsed::<u64>(key))
    }

    /// Storefront root URL
    #[must_use]
    pub fn base_url(&self) -> String {
        self.get_or("base.url", "").trim_end_matches('/').to_string()
    }

    /// Browser to drive
    #[must_use]
    pub fn browser(&self) -> BrowserKind {
        BrowserKind::from_name_or_default(self.get_or("browser", "chrome"))
    }

    /// Implicit element wait
    #[must_use]
    pub fn implicit_wait(&self) -> Duration {
        self.seconds("implicit.wait")
    }

    /// Explicit wait budget for page transitions
    #[must_use]
    pub fn explicit_wait(&self) -> Duration {
        self.seconds("explicit.wait")
    }

    /// Page load budget
    #[must_use]
    pub fn page_load_timeout(&self) -> Duration {
        self.seconds("page.load.timeout")
    }

    /// Run without a visible window
    #[must_use]
    pub fn headless(&self) -> bool {
        self.parsed("headless.mode")
    }

    /// Environment label
    #[must_use]
    pub fn environment(&self) -> String {
        self.get_or("environment", "prod").to_string()
    }

    /// Fixture file path
    #[must_use]
    pub fn test_data_file(&self) -> PathBuf {
        PathBuf::from(self.get_or("test.data.file", "testdata.json"))
    }

    /// Report output directory
    #[must_use]
    pub fn reports_dir(&self) -> PathBuf {
        PathBuf::from(self.get_or("reports.directory", "test-output/reports"))
    }

    /// Screenshot output directory
    #[must_use]
    pub fn screenshots_dir(&self) -> PathBuf {
        PathBuf::from(self.get_or("screenshots.directory", "test-output/screenshots"))
    }

    /// WebDriver endpoint
    #[must_use]
    pub fn webdriver_url(&self) -> String {
        self.get_or("webdriver.url", "http://localhost:4444").to_string()
    }

    /// Browser executable override
    #[must_use]
    pub fn browser_binary(&self) -> Option<String> {
        self.values
            .get("browser.binary")
            .filter(|v| !v.is_empty())
            .cloned()
    }

    /// Window width
    #[must_use]
    pub fn window_width(&self) -> u32 {
        self.parsed("window.width")
    }

    /// Window height
    #[must_use]
    pub fn window_height(&self) -> u32 {
        self.parsed("window.height")
    }

    /// Maximize window after launch
    #[must_use]
    pub fn maximize(&self) -> bool {
        self.parsed("window.maximize")
    }
}

fn default_for(key: &str) -> Option<&'static str> {
    DEFAULTS.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::io::Write;

    mod browser_kind_tests {
        use super::*;

        #[test]
        fn test_parse_known_names() {
            assert_eq!("chrome".parse::<BrowserKind>().unwrap(), BrowserKind::Chrome);
            assert_eq!("Firefox".parse::<BrowserKind>().unwrap(), BrowserKind::Firefox);
            assert_eq!(" EDGE ".parse::<BrowserKind>().unwrap(), BrowserKind::Edge);
        }

        #[test]
        fn test_unknown_name_is_error() {
            assert!("safari".parse::<BrowserKind>().is_err());
        }

        #[test]
        fn test_unknown_name_defaults_to_chrome() {
            assert_eq!(BrowserKind::from_name_or_default("opera"), BrowserKind::Chrome);
        }

        #[test]
        fn test_display_round_trips() {
            for kind in BrowserKind::ALL {
                assert_eq!(kind.to_string().parse::<BrowserKind>().unwrap(), kind);
            }
        }
    }

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_every_documented_key_has_default() {
            let config = SuiteConfig::new();
            assert_eq!(config.base_url(), "https://www.demoblaze.com");
            assert_eq!(config.browser(), BrowserKind::Chrome);
            assert_eq!(config.implicit_wait(), Duration::from_secs(10));
            assert_eq!(config.explicit_wait(), Duration::from_secs(10));
            assert_eq!(config.page_load_timeout(), Duration::from_secs(30));
            assert!(!config.headless());
            assert_eq!(config.environment(), "prod");
            assert_eq!(config.test_data_file(), PathBuf::from("testdata.json"));
            assert_eq!(config.reports_dir(), PathBuf::from("test-output/reports"));
            assert_eq!(
                config.screenshots_dir(),
                PathBuf::from("test-output/screenshots")
            );
        }

        #[test]
        fn test_entries_merge_defaults() {
            let config = SuiteConfig::new().set("browser", "edge");
            let entries = config.entries();
            assert_eq!(entries.len(), DEFAULTS.len());
            assert!(entries.contains(&("browser".to_string(), "edge".to_string())));
        }

        #[test]
        fn test_browser_binary_absent_by_default() {
            assert!(SuiteConfig::new().browser_binary().is_none());
        }
    }

    mod parsing_tests {
        use super::*;

        #[test]
        fn test_properties_parsing() {
            let config = SuiteConfig::from_properties_str(
                "# comment\n! also comment\n\nbase.url = http://localhost:8080/\nbrowser:firefox\nheadless.mode=true\n",
            );
            assert_eq!(config.base_url(), "http://localhost:8080");
            assert_eq!(config.browser(), BrowserKind::Firefox);
            assert!(config.headless());
        }

        #[test]
        fn test_malformed_number_falls_back() {
            let config = SuiteConfig::from_properties_str("explicit.wait=soon\n");
            assert_eq!(config.explicit_wait(), Duration::from_secs(10));
        }

        #[test]
        fn test_unknown_keys_are_kept() {
            let config = SuiteConfig::from_properties_str("custom.key=42\n");
            assert_eq!(config.get("custom.key"), Some("42"));
            assert_eq!(config.get("missing.key"), None);
        }

        #[test]
        fn test_env_overrides() {
            let config = SuiteConfig::from_properties_str("browser=firefox\n").with_overrides_from(
                vec![
                    ("STOREPROBE_BROWSER".to_string(), "edge".to_string()),
                    ("STOREPROBE_BASE_URL".to_string(), "http://shop.test".to_string()),
                    ("UNRELATED".to_string(), "x".to_string()),
                ],
            );
            assert_eq!(config.browser(), BrowserKind::Edge);
            assert_eq!(config.base_url(), "http://shop.test");
            assert_eq!(config.get("unrelated"), None);
        }
    }

    mod load_tests {
        use super::*;

        #[test]
        fn test_load_missing_file_uses_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let config = SuiteConfig::load(dir.path().join("absent.properties")).unwrap();
            assert_eq!(config, SuiteConfig::new());
        }

        #[test]
        fn test_load_reads_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("config.properties");
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "environment=staging").unwrap();
            writeln!(file, "page.load.timeout=45").unwrap();

            let config = SuiteConfig::load(&path).unwrap();
            assert_eq!(config.environment(), "staging");
            assert_eq!(config.page_load_timeout(), Duration::from_secs(45));
            assert_eq!(config.source(), Some(path.as_path()));
        }
    }
}
