//! Wait Mechanisms
//!
//! Bounded polling over browser state. Every wait runs under a [`WaitPolicy`]
//! chosen from a [`TimeoutTier`]:
//!
//! | Tier         | Budget | Poll  | Used for                               |
//! |--------------|--------|-------|----------------------------------------|
//! | `UltraShort` | 1s     | 100ms | cosmetic presence checks               |
//! | `Short`      | 3s     | 100ms | modal/alert appearance, removals       |
//! | `Default`    | 8s     | 200ms | state-changing commands                |
//! | `Extended`   | config | 200ms | page transitions (`explicit.wait`)     |
//!
//! Checks (`is_*_within`) reduce a timeout to `false`. Waits return
//! [`ProbeError::ElementNotReady`] and leave the decision to the caller.

use crate::driver::SessionDriver;
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Ultra-short budget for cosmetic checks (1 second)
pub const ULTRA_SHORT_TIMEOUT_MS: u64 = 1_000;

/// Short budget (3 seconds)
pub const SHORT_TIMEOUT_MS: u64 = 3_000;

/// Default budget for commands (8 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 8_000;

/// Extended budget for page transitions when no configuration is given
pub const EXTENDED_TIMEOUT_MS: u64 = 10_000;

/// Fast polling interval (100ms)
pub const FAST_POLL_INTERVAL_MS: u64 = 100;

/// Relaxed polling interval (200ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;

/// Document ready, and jQuery idle when the page uses jQuery
pub const PAGE_READY_SCRIPT: &str = "document.readyState === 'complete' && \
     (typeof jQuery === 'undefined' || jQuery.active === 0)";

// =============================================================================
// TIMEOUT TIER
// =============================================================================

/// Named timeout budgets, picked per call site by risk tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeoutTier {
    /// Cosmetic presence checks
    UltraShort,
    /// Modal and alert appearance
    Short,
    /// State-changing commands
    #[default]
    Default,
    /// Page transitions
    Extended,
}

impl TimeoutTier {
    /// Built-in policy for this tier
    #[must_use]
    pub const fn policy(self) -> WaitPolicy {
        match self {
            Self::UltraShort => WaitPolicy::new(ULTRA_SHORT_TIMEOUT_MS, FAST_POLL_INTERVAL_MS),
            Self::Short => WaitPolicy::new(SHORT_TIMEOUT_MS, FAST_POLL_INTERVAL_MS),
            Self::Default => WaitPolicy::new(DEFAULT_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS),
            Self::Extended => WaitPolicy::new(EXTENDED_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl std::fmt::Display for TimeoutTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::UltraShort => "ultra-short",
            Self::Short => "short",
            Self::Default => "default",
            Self::Extended => "extended",
        };
        f.write_str(name)
    }
}

// =============================================================================
// WAIT POLICY
// =============================================================================

/// How long and how often a condition is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Budget in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Keep polling through transient driver errors (missing or stale nodes)
    pub ignore_transient: bool,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        TimeoutTier::Default.policy()
    }
}

impl WaitPolicy {
    /// Create a policy that ignores transient errors
    #[must_use]
    pub const fn new(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            timeout_ms,
            poll_interval_ms,
            ignore_transient: true,
        }
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Propagate every driver error instead of polling through it
    #[must_use]
    pub const fn strict(mut self) -> Self {
        self.ignore_transient = false;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

impl WaitResult {
    /// Create a wait result
    #[must_use]
    pub fn success(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            elapsed,
            waited_for: waited_for.into(),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Errors the poller treats as "not yet"
const fn is_transient(err: &ProbeError) -> bool {
    matches!(err, ProbeError::Driver { .. })
}

/// Poll `probe` until it yields `true` or the policy budget is spent.
///
/// The probe runs at least once, even with a zero budget.
pub async fn poll_until<F, Fut>(
    policy: &WaitPolicy,
    waited_for: &str,
    mut probe: F,
) -> ProbeResult<WaitResult>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<bool>>,
{
    let start = Instant::now();
    let timeout = policy.timeout();
    loop {
        match probe().await {
            Ok(true) => return Ok(WaitResult::success(start.elapsed(), waited_for)),
            Ok(false) => {}
            Err(e) if policy.ignore_transient && is_transient(&e) => {
                tracing::trace!(waited_for, error = %e, "transient error while polling");
            }
            Err(e) => return Err(e),
        }
        if start.elapsed() >= timeout {
            break;
        }
        tokio::time::sleep(policy.poll_interval()).await;
    }
    tracing::debug!(waited_for, timeout_ms = policy.timeout_ms, "wait timed out");
    Err(ProbeError::ElementNotReady {
        target: waited_for.to_string(),
        timeout_ms: policy.timeout_ms,
    })
}

// =============================================================================
// WAITER
// =============================================================================

/// Element located and ready for a click
#[derive(Debug)]
pub struct ClickTarget<'w, 'd> {
    waiter: &'w Waiter<'d>,
    locator: Locator,
}

impl ClickTarget<'_, '_> {
    /// Locator that became clickable
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Click it
    pub async fn click(self) -> ProbeResult<()> {
        self.waiter.driver.click(&self.locator).await
    }
}

/// Wait primitives bound to one session driver
pub struct Waiter<'d> {
    driver: &'d dyn SessionDriver,
    extended_timeout_ms: u64,
}

impl std::fmt::Debug for Waiter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waiter")
            .field("extended_timeout_ms", &self.extended_timeout_ms)
            .finish_non_exhaustive()
    }
}

impl<'d> Waiter<'d> {
    /// Create a waiter over a driver
    #[must_use]
    pub fn new(driver: &'d dyn SessionDriver) -> Self {
        Self {
            driver,
            extended_timeout_ms: EXTENDED_TIMEOUT_MS,
        }
    }

    /// Override the extended tier budget (from `explicit.wait`)
    #[must_use]
    pub fn with_extended_timeout(mut self, timeout: Duration) -> Self {
        self.extended_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Policy for a tier
    #[must_use]
    pub const fn policy(&self, tier: TimeoutTier) -> WaitPolicy {
        match tier {
            TimeoutTier::Extended => tier.policy().with_timeout(self.extended_timeout_ms),
            _ => tier.policy(),
        }
    }

    /// Wait until the element exists and is visible
    pub async fn wait_until_visible(
        &self,
        locator: &Locator,
        tier: TimeoutTier,
    ) -> ProbeResult<WaitResult> {
        let driver = self.driver;
        poll_until(&self.policy(tier), locator.name(), || {
            driver.is_visible(locator)
        })
        .await
    }

    /// Wait until the element is visible and enabled
    pub async fn wait_until_clickable<'w>(
        &'w self,
        locator: &Locator,
        tier: TimeoutTier,
    ) -> ProbeResult<ClickTarget<'w, 'd>> {
        let driver = self.driver;
        poll_until(&self.policy(tier), locator.name(), || async move {
            Ok(driver.is_visible(locator).await? && driver.is_enabled(locator).await?)
        })
        .await?;
        Ok(ClickTarget {
            waiter: self,
            locator: locator.clone(),
        })
    }

    /// Wait until the element is absent or hidden
    pub async fn wait_until_gone(
        &self,
        locator: &Locator,
        tier: TimeoutTier,
    ) -> ProbeResult<WaitResult> {
        let driver = self.driver;
        let target = format!("{} gone", locator.name());
        poll_until(&self.policy(tier), &target, || async move {
            Ok(!driver.is_visible(locator).await?)
        })
        .await
    }

    /// Poll an arbitrary predicate over session state
    pub async fn wait_for_condition<F, Fut>(
        &self,
        description: &str,
        policy: &WaitPolicy,
        predicate: F,
    ) -> ProbeResult<WaitResult>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeResult<bool>>,
    {
        poll_until(policy, description, predicate).await
    }

    /// Wait for the document and any in-flight jQuery requests to settle
    pub async fn wait_for_page_ready(&self, tier: TimeoutTier) -> ProbeResult<WaitResult> {
        let driver = self.driver;
        poll_until(&self.policy(tier), "page ready", || async move {
            let value = driver.execute_script(PAGE_READY_SCRIPT).await?;
            Ok(value.as_bool().unwrap_or(false))
        })
        .await
    }

    /// Wait until the URL contains a fragment
    pub async fn wait_for_url_contains(
        &self,
        fragment: &str,
        tier: TimeoutTier,
    ) -> ProbeResult<WaitResult> {
        let driver = self.driver;
        let target = format!("url contains '{fragment}'");
        poll_until(&self.policy(tier), &target, || async move {
            Ok(driver.current_url().await?.contains(fragment))
        })
        .await
    }

    /// Wait until the title contains a fragment
    pub async fn wait_for_title_contains(
        &self,
        fragment: &str,
        tier: TimeoutTier,
    ) -> ProbeResult<WaitResult> {
        let driver = self.driver;
        let target = format!("title contains '{fragment}'");
        poll_until(&self.policy(tier), &target, || async move {
            Ok(driver.title().await?.contains(fragment))
        })
        .await
    }

    /// Wait until the element's text contains a fragment
    pub async fn wait_for_text_present(
        &self,
        locator: &Locator,
        text: &str,
        tier: TimeoutTier,
    ) -> ProbeResult<WaitResult> {
        let driver = self.driver;
        let target = format!("{} text '{text}'", locator.name());
        poll_until(&self.policy(tier), &target, || async move {
            Ok(driver.text(locator).await?.contains(text))
        })
        .await
    }

    /// Wait until at least `min` elements match; returns the final count
    pub async fn wait_for_element_count(
        &self,
        locator: &Locator,
        min: usize,
        tier: TimeoutTier,
    ) -> ProbeResult<usize> {
        let driver = self.driver;
        let target = format!("{} count >= {min}", locator.name());
        poll_until(&self.policy(tier), &target, || async move {
            Ok(driver.count(locator).await? >= min)
        })
        .await?;
        driver.count(locator).await
    }

    /// Wait until any of the locators is visible; returns its index
    pub async fn wait_for_any_visible(
        &self,
        locators: &[Locator],
        tier: TimeoutTier,
    ) -> ProbeResult<usize> {
        let driver = self.driver;
        let names: Vec<&str> = locators.iter().map(Locator::name).collect();
        let target = format!("any of [{}]", names.join(", "));
        let found = Mutex::new(None);
        poll_until(&self.policy(tier), &target, || {
            let found = &found;
            async move {
                for (idx, locator) in locators.iter().enumerate() {
                    if driver.is_visible(locator).await.unwrap_or(false) {
                        *lock(found) = Some(idx);
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        })
        .await?;
        let idx = *lock(&found);
        idx.ok_or_else(|| ProbeError::ElementNotReady {
            target,
            timeout_ms: self.policy(tier).timeout_ms,
        })
    }

    /// Wait for a native dialog; returns its message
    pub async fn wait_for_alert(&self, tier: TimeoutTier) -> ProbeResult<String> {
        let driver = self.driver;
        let message = Mutex::new(None);
        poll_until(&self.policy(tier), "alert", || {
            let message = &message;
            async move {
                let text = driver.alert_text().await?;
                let open = text.is_some();
                *lock(message) = text;
                Ok(open)
            }
        })
        .await?;
        let text = lock(&message).take();
        Ok(text.unwrap_or_default())
    }

    /// Check: element becomes visible within the tier budget
    pub async fn is_visible_within(&self, locator: &Locator, tier: TimeoutTier) -> bool {
        self.wait_until_visible(locator, tier).await.is_ok()
    }

    /// Check: element disappears within the tier budget
    pub async fn is_gone_within(&self, locator: &Locator, tier: TimeoutTier) -> bool {
        self.wait_until_gone(locator, tier).await.is_ok()
    }
}

// =============================================================================
// TESTS
// =============================================================================
