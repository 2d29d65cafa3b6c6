//! Ordered locator resolution.
//!
//! Candidates are tried front to back, each under the same wait budget. The
//! first candidate that becomes ready wins and later candidates are never
//! probed. When every candidate fails, the last failure is reported as
//! [`ProbeError::InteractionFailed`].

use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{TimeoutTier, Waiter};

/// What a candidate must satisfy to be chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Present and visible
    Visible,
    /// Visible and enabled
    Clickable,
}

/// The candidate that won
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Position in the candidate list
    pub index: usize,
    /// Winning locator
    pub locator: Locator,
}

fn exhausted(candidates: &[Locator], cause: Option<ProbeError>) -> ProbeError {
    let locator = candidates
        .last()
        .map_or_else(|| "<empty chain>".to_string(), |l| l.name().to_string());
    let cause = cause.map_or_else(|| "no candidates".to_string(), |e| e.to_string());
    tracing::warn!(%locator, %cause, "all locator candidates failed");
    ProbeError::interaction(locator, cause)
}

/// Resolve the first ready candidate
pub async fn resolve(
    waiter: &Waiter<'_>,
    candidates: &[Locator],
    readiness: Readiness,
    tier: TimeoutTier,
) -> ProbeResult<Resolution> {
    let mut last_error = None;
    for (index, locator) in candidates.iter().enumerate() {
        let attempt = match readiness {
            Readiness::Visible => waiter.wait_until_visible(locator, tier).await.map(|_| ()),
            Readiness::Clickable => waiter
                .wait_until_clickable(locator, tier)
                .await
                .map(|_| ()),
        };
        match attempt {
            Ok(()) => {
                tracing::debug!(locator = locator.name(), index, "candidate resolved");
                return Ok(Resolution {
                    index,
                    locator: locator.clone(),
                });
            }
            Err(e) => {
                tracing::debug!(locator = locator.name(), index, error = %e, "candidate not ready");
                last_error = Some(e);
            }
        }
    }
    Err(exhausted(candidates, last_error))
}

/// Click the first clickable candidate.
///
/// A candidate that resolves but rejects the click hands over to the next.
pub async fn click_first(
    waiter: &Waiter<'_>,
    candidates: &[Locator],
    tier: TimeoutTier,
) -> ProbeResult<Resolution> {
    let mut last_error = None;
    for (index, locator) in candidates.iter().enumerate() {
        let clicked = match waiter.wait_until_clickable(locator, tier).await {
            Ok(target) => target.click().await,
            Err(e) => Err(e),
        };
        match clicked {
            Ok(()) => {
                tracing::debug!(locator = locator.name(), index, "clicked candidate");
                return Ok(Resolution {
                    index,
                    locator: locator.clone(),
                });
            }
            Err(e) => {
                tracing::debug!(locator = locator.name(), index, error = %e, "candidate failed");
                last_error = Some(e);
            }
        }
    }
    Err(exhausted(candidates, last_error))
}
