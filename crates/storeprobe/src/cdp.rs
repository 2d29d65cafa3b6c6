//! Chrome DevTools Protocol backend (chrome, edge).
//!
//! Element operations are evaluated as JavaScript built from the locator
//! queries. While a native dialog is open the page cannot evaluate anything,
//! so element operations fail fast with a driver error until the dialog is
//! accepted; the wait layer treats that as transient.

#![allow(clippy::missing_errors_doc)]

use crate::config::BrowserKind;
use crate::driver::{SessionDriver, SessionOptions};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::ClearBrowserCookiesParams;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, EventJavascriptDialogOpening,
    HandleJavaScriptDialogParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Upper bound for a single script evaluation
const EVAL_TIMEOUT: Duration = Duration::from_secs(5);

fn cdp_err(e: impl std::fmt::Display) -> ProbeError {
    ProbeError::driver(e.to_string())
}

fn lock(slot: &Mutex<Option<String>>) -> MutexGuard<'_, Option<String>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One chromium process with one page
pub struct CdpDriver {
    browser: Browser,
    page: Page,
    dialog: Arc<Mutex<Option<String>>>,
    handler_task: JoinHandle<()>,
    dialog_task: JoinHandle<()>,
}

impl std::fmt::Debug for CdpDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpDriver")
            .field("dialog", &*lock(&self.dialog))
            .finish_non_exhaustive()
    }
}

impl CdpDriver {
    /// Launch chromium (or edge through its binary) and open a blank page
    pub async fn launch(options: &SessionOptions) -> ProbeResult<Self> {
        let launch_err = |message: String| ProbeError::BrowserLaunch { message };

        let mut builder = BrowserConfig::builder()
            .window_size(options.window_width, options.window_height)
            .request_timeout(options.page_load_timeout)
            .args(
                options
                    .chromium_args()
                    .into_iter()
                    .filter(|a| !a.starts_with("--headless")),
            );
        if !options.headless {
            builder = builder.with_head();
        }
        match (&options.binary, options.browser) {
            (Some(path), _) => builder = builder.chrome_executable(path),
            (None, BrowserKind::Edge) => {
                return Err(launch_err(
                    "edge needs browser.binary pointing at msedge".to_string(),
                ))
            }
            (None, _) => {}
        }
        let config = builder.build().map_err(launch_err)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| launch_err(e.to_string()))?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| launch_err(e.to_string()))?;

        let dialog = Arc::new(Mutex::new(None));
        let mut dialogs = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| launch_err(e.to_string()))?;
        let slot = Arc::clone(&dialog);
        let dialog_task = tokio::spawn(async move {
            while let Some(event) = dialogs.next().await {
                tracing::debug!(message = %event.message, "dialog opened");
                *lock(&slot) = Some(event.message.clone());
            }
        });

        tracing::info!(browser = %options.browser, headless = options.headless, "chromium launched");
        Ok(Self {
            browser,
            page,
            dialog,
            handler_task,
            dialog_task,
        })
    }

    fn dialog_open(&self) -> bool {
        lock(&self.dialog).is_some()
    }

    async fn eval(&self, expr: &str) -> ProbeResult<serde_json::Value> {
        if self.dialog_open() {
            return Err(ProbeError::driver("native dialog is open"));
        }
        let result = tokio::time::timeout(EVAL_TIMEOUT, self.page.evaluate(expr))
            .await
            .map_err(|_| ProbeError::driver("script evaluation timed out"))?
            .map_err(cdp_err)?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn eval_bool(&self, expr: &str) -> ProbeResult<bool> {
        Ok(self.eval(expr).await?.as_bool().unwrap_or(false))
    }

    /// Run `body` against the first match; `el` is bound inside `body`
    async fn with_element(&self, locator: &Locator, body: &str) -> ProbeResult<serde_json::Value> {
        let script = format!(
            "(el => {{ if (!el) {{ return {{ missing: true }}; }} return {{ value: (() => {{ {body} }})() }}; }})({})",
            locator.to_query()
        );
        let value = self.eval(&script).await?;
        if value.get("missing").is_some() {
            return Err(ProbeError::driver(format!("no element matches {locator}")));
        }
        Ok(value.get("value").cloned().unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl SessionDriver for CdpDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        self.page.goto(url).await.map_err(|e| ProbeError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.page.url().await.map_err(cdp_err)?.unwrap_or_default())
    }

    async fn title(&self) -> ProbeResult<String> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(cdp_err)?
            .unwrap_or_default())
    }

    async fn execute_script(&self, script: &str) -> ProbeResult<serde_json::Value> {
        self.eval(script).await
    }

    async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
        let value = self.eval(&locator.to_count_query()).await?;
        Ok(value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0))
    }

    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool> {
        self.eval_bool(&locator.to_visible_query()).await
    }

    async fn is_enabled(&self, locator: &Locator) -> ProbeResult<bool> {
        self.eval_bool(&locator.to_enabled_query()).await
    }

    async fn text(&self, locator: &Locator) -> ProbeResult<String> {
        let value = self
            .with_element(locator, "return el.innerText || el.textContent || '';")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn texts(&self, locator: &Locator) -> ProbeResult<Vec<String>> {
        let script = format!(
            "{}.map(el => el.innerText || el.textContent || '')",
            locator.to_all_query()
        );
        let value = self.eval(&script).await?;
        Ok(value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|v| v.as_str().unwrap_or_default().to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        let body = if name == "value" {
            "return el.value;".to_string()
        } else {
            format!("return el.getAttribute({name:?});")
        };
        let value = self.with_element(locator, &body).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        self.with_element(locator, "el.click(); return true;").await?;
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        let body = format!(
            "el.focus(); el.value = {text:?}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true;"
        );
        self.with_element(locator, &body).await?;
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> ProbeResult<()> {
        self.with_element(locator, "el.scrollIntoView({ block: 'center' }); return true;")
            .await?;
        Ok(())
    }

    async fn alert_text(&self) -> ProbeResult<Option<String>> {
        Ok(lock(&self.dialog).clone())
    }

    async fn accept_alert(&self) -> ProbeResult<bool> {
        let Some(message) = lock(&self.dialog).take() else {
            return Ok(false);
        };
        self.page
            .execute(HandleJavaScriptDialogParams::new(true))
            .await
            .map_err(cdp_err)?;
        tracing::debug!(%message, "dialog accepted");
        Ok(true)
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self
            .page
            .execute(params)
            .await
            .map_err(|e| ProbeError::Screenshot {
                message: e.to_string(),
            })?;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(|e| ProbeError::Screenshot {
                message: e.to_string(),
            })
    }

    async fn go_back(&self) -> ProbeResult<()> {
        self.eval("history.back(); true").await?;
        Ok(())
    }

    async fn reload(&self) -> ProbeResult<()> {
        self.page.reload().await.map_err(cdp_err)?;
        Ok(())
    }

    async fn delete_cookies(&self) -> ProbeResult<()> {
        self.page
            .execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(cdp_err)?;
        Ok(())
    }

    async fn quit(&mut self) -> ProbeResult<()> {
        self.dialog_task.abort();
        let closed = self.browser.close().await.map_err(cdp_err);
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "chromium exit status unavailable");
        }
        self.handler_task.abort();
        closed.map(|_| ())
    }
}
