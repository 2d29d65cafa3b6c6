//! Result and error types for Storeprobe.
//!
//! The taxonomy follows the two-tier model used throughout the crate:
//! presence checks reduce [`ProbeError::ElementNotReady`] to `false` or an
//! empty default, while commands surface [`ProbeError::InteractionFailed`]
//! to the scenario.

use thiserror::Error;

/// Result type for Storeprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving the storefront
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A wait exhausted its budget
    #[error("{target} not ready after {timeout_ms}ms")]
    ElementNotReady {
        /// Locator name or condition description
        target: String,
        /// Budget that was exhausted
        timeout_ms: u64,
    },

    /// Every candidate locator for a command failed
    #[error("Interaction with {locator} failed: {cause}")]
    InteractionFailed {
        /// Last locator that was attempted
        locator: String,
        /// Underlying failure of the last attempt
        cause: String,
    },

    /// A native dialog appeared where none was expected
    #[error("Unexpected alert: {text}")]
    UnexpectedAlert {
        /// Dialog message
        text: String,
    },

    /// Scenario-level expectation violated
    #[error("Assertion failed: {message} (expected: {expected}, actual: {actual})")]
    AssertionFailed {
        /// What was being checked
        message: String,
        /// Expected value
        expected: String,
        /// Observed value
        actual: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Session already quit
    #[error("Browser session is closed")]
    SessionClosed,

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Low-level driver failure (element lookup, script evaluation)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Fixture data error
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// State machine received an action that is not valid in its state
    #[error("{flow}: cannot {action} from state {from}")]
    InvalidTransition {
        /// Flow name
        flow: &'static str,
        /// Current state
        from: String,
        /// Attempted action
        action: &'static str,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// Driver failure with a message
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Interaction failure for a locator
    #[must_use]
    pub fn interaction(locator: impl Into<String>, cause: impl ToString) -> Self {
        Self::InteractionFailed {
            locator: locator.into(),
            cause: cause.to_string(),
        }
    }

    /// Assertion failure with expected/actual values
    #[must_use]
    pub fn assertion(
        message: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::AssertionFailed {
            message: message.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Whether the caller may fall back or default instead of failing
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::ElementNotReady { .. })
    }

    /// Whether this error should trigger failure evidence capture
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::AssertionFailed { .. })
    }
}
