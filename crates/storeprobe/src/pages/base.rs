//! Shared wait-then-act primitives for every page action set.

use crate::fallback::{self, Readiness, Resolution};
use crate::locator::{FallbackChain, Locator};
use crate::locators::base::LOADING_INDICATORS;
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use crate::wait::{TimeoutTier, Waiter};
use crate::SessionDriver;

/// Base actions bound to a live session
#[derive(Debug, Clone, Copy)]
pub struct Actions<'s> {
    session: &'s Session,
}

impl<'s> Actions<'s> {
    /// Bind to a session; fails once the session has quit
    pub fn new(session: &'s Session) -> ProbeResult<Self> {
        session.ensure_open()?;
        Ok(Self { session })
    }

    /// Owning session
    #[must_use]
    pub const fn session(&self) -> &'s Session {
        self.session
    }

    /// Driver of the session
    #[must_use]
    pub fn driver(&self) -> &'s dyn SessionDriver {
        self.session.driver()
    }

    /// Waiter over the session
    #[must_use]
    pub fn waiter(&self) -> Waiter<'s> {
        self.session.waiter()
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Wait until clickable, then click
    pub async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        self.drain_alert().await;
        let waiter = self.waiter();
        let target = waiter
            .wait_until_clickable(locator, TimeoutTier::Default)
            .await
            .map_err(|e| ProbeError::interaction(locator.name(), e))?;
        target
            .click()
            .await
            .map_err(|e| ProbeError::interaction(locator.name(), e))?;
        tracing::debug!(locator = locator.name(), "clicked");
        Ok(())
    }

    /// Wait until visible, clear and type
    pub async fn type_into(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        self.waiter()
            .wait_until_visible(locator, TimeoutTier::Default)
            .await
            .map_err(|e| ProbeError::interaction(locator.name(), e))?;
        self.driver()
            .type_text(locator, text)
            .await
            .map_err(|e| ProbeError::interaction(locator.name(), e))?;
        tracing::debug!(locator = locator.name(), "typed text");
        Ok(())
    }

    /// Scroll the element into view
    pub async fn scroll_to(&self, locator: &Locator) -> ProbeResult<()> {
        self.driver()
            .scroll_into_view(locator)
            .await
            .map_err(|e| ProbeError::interaction(locator.name(), e))
    }

    /// Text of a visible element under a tier; times out as an error
    pub async fn require_text(&self, locator: &Locator, tier: TimeoutTier) -> ProbeResult<String> {
        self.waiter().wait_until_visible(locator, tier).await?;
        Ok(self.driver().text(locator).await?.trim().to_string())
    }

    /// Click the first clickable candidate of a chain bound to `value`
    pub async fn click_first_of(&self, chain: &FallbackChain, value: &str) -> ProbeResult<Resolution> {
        self.drain_alert().await;
        let candidates = chain.bind(value);
        tracing::debug!(operation = chain.operation, candidates = candidates.len(), "resolving chain");
        let resolution = fallback::click_first(&self.waiter(), &candidates, TimeoutTier::Short).await?;
        tracing::info!(
            operation = chain.operation,
            locator = resolution.locator.name(),
            index = resolution.index,
            "chain resolved"
        );
        Ok(resolution)
    }

    /// First visible candidate of a chain bound to `value`
    pub async fn first_visible_of(
        &self,
        chain: &FallbackChain,
        value: &str,
        tier: TimeoutTier,
    ) -> ProbeResult<Resolution> {
        fallback::resolve(&self.waiter(), &chain.bind(value), Readiness::Visible, tier).await
    }

    /// Wait for the document and jQuery to settle
    pub async fn wait_for_page_ready(&self) -> ProbeResult<()> {
        self.waiter()
            .wait_for_page_ready(TimeoutTier::Extended)
            .await
            .map(|_| ())
    }

    // =========================================================================
    // CHECKS
    // =========================================================================

    /// Visible within the ultra-short budget
    pub async fn is_displayed(&self, locator: &Locator) -> bool {
        self.is_displayed_within(locator, TimeoutTier::UltraShort).await
    }

    /// Visible within a tier budget
    pub async fn is_displayed_within(&self, locator: &Locator, tier: TimeoutTier) -> bool {
        self.waiter().is_visible_within(locator, tier).await
    }

    /// Trimmed text of the element, empty when it is not shown in time
    pub async fn text_of(&self, locator: &Locator) -> String {
        match self.require_text(locator, TimeoutTier::Short).await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(locator = locator.name(), error = %e, "no text");
                String::new()
            }
        }
    }

    /// Trimmed texts of every match, empty when none show up in time
    pub async fn texts_of(&self, locator: &Locator) -> Vec<String> {
        if !self.is_displayed_within(locator, TimeoutTier::Short).await {
            return Vec::new();
        }
        match self.driver().texts(locator).await {
            Ok(texts) => texts.into_iter().map(|t| t.trim().to_string()).collect(),
            Err(e) => {
                tracing::debug!(locator = locator.name(), error = %e, "no texts");
                Vec::new()
            }
        }
    }

    /// Attribute of the element, `None` when absent
    pub async fn attribute_of(&self, locator: &Locator, name: &str) -> Option<String> {
        if !self.is_displayed(locator).await {
            return None;
        }
        self.driver().attribute(locator, name).await.ok().flatten()
    }

    /// Number of matches right now
    pub async fn count_of(&self, locator: &Locator) -> usize {
        self.driver().count(locator).await.unwrap_or(0)
    }

    /// Accept an open dialog and return its text
    pub async fn drain_alert(&self) -> Option<String> {
        self.session().dismiss_dialog().await
    }

    /// Wait for a dialog within a tier, accept it and return its text
    pub async fn accept_alert_within(&self, tier: TimeoutTier) -> Option<String> {
        match self.waiter().wait_for_alert(tier).await {
            Ok(_) => self.drain_alert().await,
            Err(_) => None,
        }
    }

    /// Fail with [`ProbeError::UnexpectedAlert`] if a dialog is open, after accepting it
    pub async fn expect_no_alert(&self) -> ProbeResult<()> {
        match self.drain_alert().await {
            Some(text) => Err(ProbeError::UnexpectedAlert { text }),
            None => Ok(()),
        }
    }

    /// Whether loading indicators cleared within the short budget
    pub async fn wait_for_spinners_gone(&self) -> bool {
        let gone = self
            .waiter()
            .is_gone_within(&LOADING_INDICATORS, TimeoutTier::Short)
            .await;
        if !gone {
            tracing::debug!("loading indicators still visible");
        }
        gone
    }

    /// Whether the element disappears within a tier budget
    pub async fn is_gone_within(&self, locator: &Locator, tier: TimeoutTier) -> bool {
        self.waiter().is_gone_within(locator, tier).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::SuiteConfig;
    use crate::locators::base::{CART_LINK, GO_HOME, LOGO};
    use crate::mock::MockDriver;

    fn session_with(driver: &MockDriver) -> Session {
        Session::from_driver(Box::new(driver.clone()), SuiteConfig::new())
    }

    mod construction_tests {
        use super::*;

        #[tokio::test]
        async fn test_closed_session_is_rejected() {
            let driver = MockDriver::new();
            let mut session = session_with(&driver);
            session.quit().await.unwrap();
            assert!(matches!(Actions::new(&session), Err(ProbeError::SessionClosed)));
        }
    }

    mod command_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_click_missing_element_is_interaction_failure() {
            let driver = MockDriver::new();
            let session = session_with(&driver);
            let actions = Actions::new(&session).unwrap();
            match actions.click(&CART_LINK).await.unwrap_err() {
                ProbeError::InteractionFailed { locator, .. } => assert_eq!(locator, "CART_LINK"),
                other => panic!("unexpected {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_click_drains_stray_alert_first() {
            let driver = MockDriver::new();
            driver.show(&CART_LINK);
            driver.push_alert("stray");
            let session = session_with(&driver);
            let actions = Actions::new(&session).unwrap();
            actions.click(&CART_LINK).await.unwrap();
            assert_eq!(driver.pending_alerts(), 0);
            assert!(driver.was_clicked(&CART_LINK));
        }

        #[tokio::test]
        async fn test_type_into() {
            let driver = MockDriver::new();
            let field = Locator::xpath("FIELD", "//input[@id='name']");
            driver.show(&field);
            let session = session_with(&driver);
            let actions = Actions::new(&session).unwrap();
            actions.type_into(&field, "John").await.unwrap();
            assert_eq!(driver.typed_value(&field).as_deref(), Some("John"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_first_of_uses_later_candidate() {
            let driver = MockDriver::new();
            driver.show(&LOGO);
            let session = session_with(&driver);
            let actions = Actions::new(&session).unwrap();
            let res = actions.click_first_of(&GO_HOME, "").await.unwrap();
            assert_eq!(res.locator.name(), "LOGO");
            assert_eq!(res.index, GO_HOME.len() - 1);
        }
    }

    mod check_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_checks_swallow_timeouts() {
            let driver = MockDriver::new();
            let session = session_with(&driver);
            let actions = Actions::new(&session).unwrap();
            assert!(!actions.is_displayed(&LOGO).await);
            assert_eq!(actions.text_of(&LOGO).await, "");
            assert!(actions.texts_of(&LOGO).await.is_empty());
            assert!(actions.attribute_of(&LOGO, "href").await.is_none());
            assert_eq!(actions.count_of(&LOGO).await, 0);
        }

        #[tokio::test]
        async fn test_text_is_trimmed() {
            let driver = MockDriver::new();
            driver.set_text(&LOGO, "  PRODUCT STORE \n");
            let session = session_with(&driver);
            let actions = Actions::new(&session).unwrap();
            assert_eq!(actions.text_of(&LOGO).await, "PRODUCT STORE");
        }

        #[tokio::test]
        async fn test_expect_no_alert() {
            let driver = MockDriver::new();
            let session = session_with(&driver);
            let actions = Actions::new(&session).unwrap();
            actions.expect_no_alert().await.unwrap();
            driver.push_alert("Wrong password.");
            match actions.expect_no_alert().await.unwrap_err() {
                ProbeError::UnexpectedAlert { text } => assert_eq!(text, "Wrong password."),
                other => panic!("unexpected {other:?}"),
            }
            assert_eq!(driver.pending_alerts(), 0);
        }

        #[tokio::test]
        async fn test_spinners_gone_when_absent() {
            let driver = MockDriver::new();
            let session = session_with(&driver);
            let actions = Actions::new(&session).unwrap();
            assert!(actions.wait_for_spinners_gone().await);
        }

        #[tokio::test]
        async fn test_page_ready() {
            let driver = MockDriver::new();
            let session = session_with(&driver);
            Actions::new(&session).unwrap().wait_for_page_ready().await.unwrap();
        }
    }
}
