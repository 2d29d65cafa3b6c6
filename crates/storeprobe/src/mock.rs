//! In-memory [`SessionDriver`] for tests.
//!
//! Elements are keyed by locator expression. Each element has a visibility
//! flag, an enabled flag, one text per match and a bag of attributes. Clicks
//! and navigations can trigger scripted reactions that mutate the DOM, which
//! is enough to replay modal, alert and cart behaviour without a browser.
//!
//! ```
//! use storeprobe::locators::login;
//! use storeprobe::mock::MockDriver;
//!
//! let driver = MockDriver::new();
//! driver.show(&login::LOGIN_BUTTON);
//! driver.on_click(&login::LOGIN_BUTTON, |dom| dom.hide(&login::LOGIN_MODAL));
//! ```

use crate::driver::{DriverLauncher, SessionDriver, SessionOptions};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Bytes returned by [`MockDriver::screenshot`]: a PNG signature
pub const MOCK_PNG: &[u8] = b"\x89PNG\r\n\x1a\nmock";

type Reaction = Arc<dyn Fn(&mut MockDom) + Send + Sync>;

/// One simulated element (possibly matching several nodes)
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    /// Rendered visible
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Text of each matching node
    pub texts: Vec<String>,
    /// Attributes of the first node
    pub attrs: BTreeMap<String, String>,
}

impl MockElement {
    fn visible() -> Self {
        Self {
            visible: true,
            enabled: true,
            texts: vec![String::new()],
            attrs: BTreeMap::new(),
        }
    }
}

/// Mutable page state seen by reactions
#[derive(Default)]
pub struct MockDom {
    url: String,
    title: String,
    elements: HashMap<String, MockElement>,
    alerts: VecDeque<String>,
    scripts: HashMap<String, serde_json::Value>,
    back_stack: Vec<String>,
    typed: HashMap<String, String>,
}

impl fmt::Debug for MockDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDom")
            .field("url", &self.url)
            .field("elements", &self.elements.len())
            .field("alerts", &self.alerts)
            .finish_non_exhaustive()
    }
}

impl MockDom {
    /// Make an element present and visible, keeping existing text
    pub fn show(&mut self, locator: &Locator) {
        let el = self
            .elements
            .entry(locator.expr().to_string())
            .or_insert_with(MockElement::visible);
        el.visible = true;
    }

    /// Keep the element in the DOM but hidden
    pub fn hide(&mut self, locator: &Locator) {
        if let Some(el) = self.elements.get_mut(locator.expr()) {
            el.visible = false;
        }
    }

    /// Remove the element from the DOM
    pub fn remove(&mut self, locator: &Locator) {
        self.elements.remove(locator.expr());
    }

    /// Show an element with a single text
    pub fn set_text(&mut self, locator: &Locator, text: &str) {
        self.set_texts(locator, &[text]);
    }

    /// Show an element matching one node per text
    pub fn set_texts(&mut self, locator: &Locator, texts: &[&str]) {
        self.show(locator);
        if let Some(el) = self.elements.get_mut(locator.expr()) {
            el.texts = texts.iter().map(|t| (*t).to_string()).collect();
        }
    }

    /// Set an attribute on an element
    pub fn set_attr(&mut self, locator: &Locator, name: &str, value: &str) {
        self.show(locator);
        if let Some(el) = self.elements.get_mut(locator.expr()) {
            el.attrs.insert(name.to_string(), value.to_string());
        }
    }

    /// Set the enabled flag
    pub fn set_enabled(&mut self, locator: &Locator, enabled: bool) {
        self.show(locator);
        if let Some(el) = self.elements.get_mut(locator.expr()) {
            el.enabled = enabled;
        }
    }

    /// Queue a native dialog
    pub fn push_alert(&mut self, text: &str) {
        self.alerts.push_back(text.to_string());
    }

    /// Change the current URL
    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    /// Whether the element is present and visible
    #[must_use]
    pub fn is_shown(&self, locator: &Locator) -> bool {
        self.elements
            .get(locator.expr())
            .is_some_and(|el| el.visible)
    }

    /// Texts of an element, empty when absent
    #[must_use]
    pub fn texts(&self, locator: &Locator) -> Vec<String> {
        self.elements
            .get(locator.expr())
            .map(|el| el.texts.clone())
            .unwrap_or_default()
    }

    /// Last value typed into an input
    #[must_use]
    pub fn typed(&self, locator: &Locator) -> Option<&str> {
        self.typed.get(locator.expr()).map(String::as_str)
    }

    fn element(&self, locator: &Locator) -> ProbeResult<&MockElement> {
        self.elements
            .get(locator.expr())
            .ok_or_else(|| ProbeError::driver(format!("no element matches {locator}")))
    }
}

#[derive(Default)]
struct MockState {
    dom: MockDom,
    click_reactions: HashMap<String, Vec<Reaction>>,
    navigate_reactions: Vec<(String, Reaction)>,
    failing_clicks: HashSet<String>,
    failing_visibility: HashSet<String>,
    fail_navigation: bool,
    call_history: Vec<String>,
    quit: bool,
}

/// Scriptable driver for unit tests.
///
/// Clones share state, so a test can keep a handle to a driver it gave away.
#[derive(Clone)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MockDriver")
            .field("dom", &state.dom)
            .field("calls", &state.call_history.len())
            .field("quit", &state.quit)
            .finish()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Create a mock with an empty, ready page
    #[must_use]
    pub fn new() -> Self {
        let mut state = MockState::default();
        state.dom.scripts.insert(
            crate::wait::PAGE_READY_SCRIPT.to_string(),
            serde_json::Value::Bool(true),
        );
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: String) {
        self.lock().call_history.push(call);
    }

    /// Mutate the DOM directly
    pub fn with_dom<R>(&self, f: impl FnOnce(&mut MockDom) -> R) -> R {
        f(&mut self.lock().dom)
    }

    /// Make an element present and visible
    pub fn show(&self, locator: &Locator) {
        self.with_dom(|dom| dom.show(locator));
    }

    /// Hide an element
    pub fn hide(&self, locator: &Locator) {
        self.with_dom(|dom| dom.hide(locator));
    }

    /// Show an element with a single text
    pub fn set_text(&self, locator: &Locator, text: &str) {
        self.with_dom(|dom| dom.set_text(locator, text));
    }

    /// Show an element matching one node per text
    pub fn set_texts(&self, locator: &Locator, texts: &[&str]) {
        self.with_dom(|dom| dom.set_texts(locator, texts));
    }

    /// Set an attribute on an element
    pub fn set_attr(&self, locator: &Locator, name: &str, value: &str) {
        self.with_dom(|dom| dom.set_attr(locator, name, value));
    }

    /// Set the enabled flag
    pub fn set_enabled(&self, locator: &Locator, enabled: bool) {
        self.with_dom(|dom| dom.set_enabled(locator, enabled));
    }

    /// Queue a native dialog
    pub fn push_alert(&self, text: &str) {
        self.with_dom(|dom| dom.push_alert(text));
    }

    /// Set the document title
    pub fn set_title(&self, title: &str) {
        self.with_dom(|dom| dom.title = title.to_string());
    }

    /// Result returned for an exact script
    pub fn set_script_result(&self, script: &str, value: serde_json::Value) {
        self.with_dom(|dom| {
            dom.scripts.insert(script.to_string(), value);
        });
    }

    /// Run `reaction` whenever `locator` is clicked
    pub fn on_click<F>(&self, locator: &Locator, reaction: F)
    where
        F: Fn(&mut MockDom) + Send + Sync + 'static,
    {
        self.lock()
            .click_reactions
            .entry(locator.expr().to_string())
            .or_default()
            .push(Arc::new(reaction));
    }

    /// Run `reaction` whenever a URL containing `fragment` is opened
    pub fn on_navigate<F>(&self, fragment: &str, reaction: F)
    where
        F: Fn(&mut MockDom) + Send + Sync + 'static,
    {
        self.lock()
            .navigate_reactions
            .push((fragment.to_string(), Arc::new(reaction)));
    }

    /// Make clicks on `locator` fail even when it is visible
    pub fn fail_clicks_on(&self, locator: &Locator) {
        self.lock()
            .failing_clicks
            .insert(locator.expr().to_string());
    }

    /// Make visibility checks on `locator` fail, like a driver blocked by a dialog
    pub fn fail_visibility_of(&self, locator: &Locator) {
        self.lock()
            .failing_visibility
            .insert(locator.expr().to_string());
    }

    /// Undo [`MockDriver::fail_visibility_of`]
    pub fn restore_visibility_of(&self, locator: &Locator) {
        self.lock().failing_visibility.remove(locator.expr());
    }

    /// Make every navigation fail
    pub fn fail_navigation(&self) {
        self.lock().fail_navigation = true;
    }

    /// Call history, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Whether any recorded call starts with `prefix`
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock()
            .call_history
            .iter()
            .any(|c| c.starts_with(prefix))
    }

    /// Whether `locator` was clicked
    #[must_use]
    pub fn was_clicked(&self, locator: &Locator) -> bool {
        self.was_called(&format!("click:{}", locator.expr()))
    }

    /// Last value typed into `locator`
    #[must_use]
    pub fn typed_value(&self, locator: &Locator) -> Option<String> {
        self.lock().dom.typed(locator).map(str::to_string)
    }

    /// Whether the element is visible right now
    #[must_use]
    pub fn is_shown(&self, locator: &Locator) -> bool {
        self.with_dom(|dom| dom.is_shown(locator))
    }

    /// Dialogs still waiting to be accepted
    #[must_use]
    pub fn pending_alerts(&self) -> usize {
        self.with_dom(|dom| dom.alerts.len())
    }

    /// Whether `quit` was called
    #[must_use]
    pub fn is_quit(&self) -> bool {
        self.lock().quit
    }
}

#[async_trait]
impl SessionDriver for MockDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        let mut state = self.lock();
        state.call_history.push(format!("navigate:{url}"));
        if state.fail_navigation {
            return Err(ProbeError::Navigation {
                url: url.to_string(),
                message: "navigation disabled by mock".to_string(),
            });
        }
        let previous = std::mem::replace(&mut state.dom.url, url.to_string());
        if !previous.is_empty() {
            state.dom.back_stack.push(previous);
        }
        let reactions: Vec<Reaction> = state
            .navigate_reactions
            .iter()
            .filter(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, r)| Arc::clone(r))
            .collect();
        for reaction in reactions {
            reaction(&mut state.dom);
        }
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.lock().dom.url.clone())
    }

    async fn title(&self) -> ProbeResult<String> {
        Ok(self.lock().dom.title.clone())
    }

    async fn execute_script(&self, script: &str) -> ProbeResult<serde_json::Value> {
        let state = self.lock();
        Ok(state
            .dom
            .scripts
            .get(script)
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
        Ok(self.with_dom(|dom| {
            dom.elements
                .get(locator.expr())
                .map_or(0, |el| el.texts.len())
        }))
    }

    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool> {
        let state = self.lock();
        if state.failing_visibility.contains(locator.expr()) {
            return Err(ProbeError::driver(format!("visibility of {locator} unknown")));
        }
        Ok(state.dom.is_shown(locator))
    }

    async fn is_enabled(&self, locator: &Locator) -> ProbeResult<bool> {
        Ok(self.with_dom(|dom| {
            dom.elements
                .get(locator.expr())
                .is_some_and(|el| el.enabled)
        }))
    }

    async fn text(&self, locator: &Locator) -> ProbeResult<String> {
        let state = self.lock();
        let el = state.dom.element(locator)?;
        Ok(el.texts.first().cloned().unwrap_or_default())
    }

    async fn texts(&self, locator: &Locator) -> ProbeResult<Vec<String>> {
        Ok(self.with_dom(|dom| dom.texts(locator)))
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        let state = self.lock();
        let el = state.dom.element(locator)?;
        if name == "value" {
            if let Some(typed) = state.dom.typed.get(locator.expr()) {
                return Ok(Some(typed.clone()));
            }
        }
        Ok(el.attrs.get(name).cloned())
    }

    async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        let mut state = self.lock();
        let key = locator.expr().to_string();
        if !state.dom.is_shown(locator) {
            return Err(ProbeError::driver(format!("{locator} is not clickable")));
        }
        if state.failing_clicks.contains(&key) {
            return Err(ProbeError::driver(format!("click on {locator} intercepted")));
        }
        state.call_history.push(format!("click:{key}"));
        let reactions = state.click_reactions.get(&key).cloned().unwrap_or_default();
        for reaction in reactions {
            reaction(&mut state.dom);
        }
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        let mut state = self.lock();
        state.dom.element(locator)?;
        state
            .call_history
            .push(format!("type:{}={text}", locator.expr()));
        state.dom.typed.insert(locator.expr().to_string(), text.to_string());
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> ProbeResult<()> {
        let mut state = self.lock();
        state.dom.element(locator)?;
        state.call_history.push(format!("scroll:{}", locator.expr()));
        Ok(())
    }

    async fn alert_text(&self) -> ProbeResult<Option<String>> {
        Ok(self.with_dom(|dom| dom.alerts.front().cloned()))
    }

    async fn accept_alert(&self) -> ProbeResult<bool> {
        let mut state = self.lock();
        let accepted = state.dom.alerts.pop_front();
        if let Some(text) = &accepted {
            state.call_history.push(format!("accept_alert:{text}"));
        }
        Ok(accepted.is_some())
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        self.record("screenshot".to_string());
        Ok(MOCK_PNG.to_vec())
    }

    async fn go_back(&self) -> ProbeResult<()> {
        let mut state = self.lock();
        state.call_history.push("back".to_string());
        if let Some(previous) = state.dom.back_stack.pop() {
            state.dom.url = previous;
        }
        Ok(())
    }

    async fn reload(&self) -> ProbeResult<()> {
        self.record("reload".to_string());
        Ok(())
    }

    async fn delete_cookies(&self) -> ProbeResult<()> {
        self.record("delete_cookies".to_string());
        Ok(())
    }

    async fn quit(&mut self) -> ProbeResult<()> {
        let mut state = self.lock();
        state.call_history.push("quit".to_string());
        state.quit = true;
        Ok(())
    }
}

type Setup = Box<dyn Fn(&MockDriver) + Send + Sync>;

/// Launcher producing a fresh [`MockDriver`] per session
#[derive(Default)]
pub struct MockLauncher {
    setup: Option<Setup>,
    fail_launch: bool,
    launched: Mutex<Vec<MockDriver>>,
}

impl fmt::Debug for MockLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockLauncher")
            .field("fail_launch", &self.fail_launch)
            .field("launched", &self.launched().len())
            .finish_non_exhaustive()
    }
}

impl MockLauncher {
    /// Launcher for blank pages
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script every new driver with `setup`
    #[must_use]
    pub fn with_setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&MockDriver) + Send + Sync + 'static,
    {
        self.setup = Some(Box::new(setup));
        self
    }

    /// Make every launch fail
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    /// Drivers handed out so far
    #[must_use]
    pub fn launched(&self) -> Vec<MockDriver> {
        self.launched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl DriverLauncher for MockLauncher {
    async fn launch(&self, options: &SessionOptions) -> ProbeResult<Box<dyn SessionDriver>> {
        if self.fail_launch {
            return Err(ProbeError::BrowserLaunch {
                message: format!("mock launcher refused {}", options.browser),
            });
        }
        let driver = MockDriver::new();
        if let Some(setup) = &self.setup {
            setup(&driver);
        }
        self.launched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(driver.clone());
        Ok(Box::new(driver))
    }
}
