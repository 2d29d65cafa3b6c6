//! W3C WebDriver backend (firefox through geckodriver, or any remote end).

#![allow(clippy::missing_errors_doc)]

use crate::config::BrowserKind;
use crate::driver::{SessionDriver, SessionOptions};
use crate::locator::{Locator, SelectorKind};
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;

fn wd_err(e: CmdError) -> ProbeError {
    ProbeError::driver(e.to_string())
}

fn wd_locator(locator: &Locator) -> fantoccini::Locator<'_> {
    match locator.kind() {
        SelectorKind::XPath => fantoccini::Locator::XPath(locator.expr()),
        SelectorKind::Css => fantoccini::Locator::Css(locator.expr()),
    }
}

/// Capabilities for the configured browser
#[must_use]
pub fn capabilities(options: &SessionOptions) -> serde_json::Map<String, serde_json::Value> {
    let mut caps = serde_json::Map::new();
    match options.browser {
        BrowserKind::Firefox => {
            let mut args = Vec::new();
            if options.headless {
                args.push("--headless".to_string());
            }
            args.push(format!("--width={}", options.window_width));
            args.push(format!("--height={}", options.window_height));
            let mut firefox = serde_json::Map::new();
            firefox.insert("args".to_string(), json!(args));
            if let Some(binary) = &options.binary {
                firefox.insert("binary".to_string(), json!(binary));
            }
            caps.insert("browserName".to_string(), json!("firefox"));
            caps.insert("moz:firefoxOptions".to_string(), json!(firefox));
        }
        BrowserKind::Chrome | BrowserKind::Edge => {
            let key = if options.browser == BrowserKind::Edge {
                "ms:edgeOptions"
            } else {
                "goog:chromeOptions"
            };
            let mut chrome = serde_json::Map::new();
            chrome.insert("args".to_string(), json!(options.chromium_args()));
            if let Some(binary) = &options.binary {
                chrome.insert("binary".to_string(), json!(binary));
            }
            caps.insert(key.to_string(), json!(chrome));
        }
    }
    caps
}

/// Session on a WebDriver remote end
#[derive(Debug)]
pub struct WebDriverDriver {
    client: Client,
}

impl WebDriverDriver {
    /// Open a session on `options.webdriver_url`
    pub async fn connect(options: &SessionOptions) -> ProbeResult<Self> {
        let launch_err = |message: String| ProbeError::BrowserLaunch { message };
        let client = ClientBuilder::rustls()
            .capabilities(capabilities(options))
            .connect(&options.webdriver_url)
            .await
            .map_err(|e| {
                launch_err(format!(
                    "cannot open a session on {}: {e}",
                    options.webdriver_url
                ))
            })?;

        // implicit element wait stays zero; the wait layer owns element timing
        let timeouts = TimeoutConfiguration::new(
            Some(options.implicit_wait),
            Some(options.page_load_timeout),
            Some(std::time::Duration::ZERO),
        );
        client.update_timeouts(timeouts).await.map_err(|e| launch_err(e.to_string()))?;

        if options.maximize {
            if let Err(e) = client.maximize_window().await {
                tracing::debug!(error = %e, "maximize not supported");
            }
        } else if let Err(e) = client
            .set_window_size(options.window_width, options.window_height)
            .await
        {
            tracing::debug!(error = %e, "window size not supported");
        }

        tracing::info!(browser = %options.browser, url = %options.webdriver_url, "webdriver session opened");
        Ok(Self { client })
    }

    async fn first(&self, locator: &Locator) -> ProbeResult<Element> {
        self.client
            .find(wd_locator(locator))
            .await
            .map_err(|e| ProbeError::driver(format!("{locator}: {e}")))
    }

    async fn first_if_present(&self, locator: &Locator) -> ProbeResult<Option<Element>> {
        match self.client.find(wd_locator(locator)).await {
            Ok(el) => Ok(Some(el)),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(wd_err(e)),
        }
    }
}

#[async_trait]
impl SessionDriver for WebDriverDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        self.client.goto(url).await.map_err(|e| ProbeError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.client.current_url().await.map_err(wd_err)?.to_string())
    }

    async fn title(&self) -> ProbeResult<String> {
        self.client.title().await.map_err(wd_err)
    }

    async fn execute_script(&self, script: &str) -> ProbeResult<serde_json::Value> {
        self.client
            .execute(&format!("return ({script});"), Vec::new())
            .await
            .map_err(wd_err)
    }

    async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
        Ok(self
            .client
            .find_all(wd_locator(locator))
            .await
            .map_err(wd_err)?
            .len())
    }

    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool> {
        match self.first_if_present(locator).await? {
            Some(el) => el.is_displayed().await.map_err(wd_err),
            None => Ok(false),
        }
    }

    async fn is_enabled(&self, locator: &Locator) -> ProbeResult<bool> {
        match self.first_if_present(locator).await? {
            Some(el) => el.is_enabled().await.map_err(wd_err),
            None => Ok(false),
        }
    }

    async fn text(&self, locator: &Locator) -> ProbeResult<String> {
        self.first(locator).await?.text().await.map_err(wd_err)
    }

    async fn texts(&self, locator: &Locator) -> ProbeResult<Vec<String>> {
        let elements = self
            .client
            .find_all(wd_locator(locator))
            .await
            .map_err(wd_err)?;
        let mut texts = Vec::with_capacity(elements.len());
        for el in elements {
            texts.push(el.text().await.map_err(wd_err)?);
        }
        Ok(texts)
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        let el = self.first(locator).await?;
        if name == "value" {
            return el.prop("value").await.map_err(wd_err);
        }
        el.attr(name).await.map_err(wd_err)
    }

    async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        self.first(locator).await?.click().await.map_err(wd_err)
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        let el = self.first(locator).await?;
        el.clear().await.map_err(wd_err)?;
        el.send_keys(text).await.map_err(wd_err)
    }

    async fn scroll_into_view(&self, locator: &Locator) -> ProbeResult<()> {
        let el = self.first(locator).await?;
        let arg = serde_json::to_value(&el)?;
        self.client
            .execute(
                "arguments[0].scrollIntoView({ block: 'center' });",
                vec![arg],
            )
            .await
            .map_err(wd_err)?;
        Ok(())
    }

    async fn alert_text(&self) -> ProbeResult<Option<String>> {
        match self.client.get_alert_text().await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.is_no_such_alert() => Ok(None),
            Err(e) => Err(wd_err(e)),
        }
    }

    async fn accept_alert(&self) -> ProbeResult<bool> {
        match self.client.accept_alert().await {
            Ok(()) => Ok(true),
            Err(e) if e.is_no_such_alert() => Ok(false),
            Err(e) => Err(wd_err(e)),
        }
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        self.client
            .screenshot()
            .await
            .map_err(|e| ProbeError::Screenshot {
                message: e.to_string(),
            })
    }

    async fn go_back(&self) -> ProbeResult<()> {
        self.client.back().await.map_err(wd_err)
    }

    async fn reload(&self) -> ProbeResult<()> {
        self.client.refresh().await.map_err(wd_err)
    }

    async fn delete_cookies(&self) -> ProbeResult<()> {
        self.client.delete_all_cookies().await.map_err(wd_err)
    }

    async fn quit(&mut self) -> ProbeResult<()> {
        self.client.clone().close().await.map_err(wd_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_firefox_capabilities() {
        let opts = SessionOptions::new()
            .with_browser(BrowserKind::Firefox)
            .with_headless(true);
        let caps = capabilities(&opts);
        let args = caps["moz:firefoxOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless"));
        assert_eq!(caps["browserName"], "firefox");
    }

    #[test]
    fn test_chrome_capabilities_carry_chromium_args() {
        let opts = SessionOptions::new().with_binary("/opt/chrome/chrome");
        let caps = capabilities(&opts);
        let chrome = &caps["goog:chromeOptions"];
        assert!(chrome["args"].as_array().unwrap().iter().any(|a| a == "--no-sandbox"));
        assert_eq!(chrome["binary"], "/opt/chrome/chrome");
    }

    #[test]
    fn test_edge_capabilities_key() {
        let opts = SessionOptions::new().with_browser(BrowserKind::Edge);
        assert!(capabilities(&opts).contains_key("ms:edgeOptions"));
    }

    #[test]
    fn test_locator_mapping() {
        let xpath = Locator::xpath("X", "//a");
        let css = Locator::css("C", ".spinner");
        assert!(matches!(wd_locator(&xpath), fantoccini::Locator::XPath("//a")));
        assert!(matches!(wd_locator(&css), fantoccini::Locator::Css(".spinner")));
    }
}
