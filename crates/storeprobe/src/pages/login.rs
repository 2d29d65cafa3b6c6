//! Sign-up and log-in modals.
//!
//! ```text
//! Anonymous ──open──▶ ModalOpen ──submit──▶ Submitted ─┬─▶ LoggedIn
//!     ▲                  ▲                             ├─▶ ModalOpen   (no response)
//!     └──close/logout────┴──────dismiss─── AlertShown ◀┘
//! ```

use super::base::Actions;
use crate::locators::{base, login};
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use crate::wait::TimeoutTier;
use std::fmt;

/// Text of the storefront's successful sign-up dialog
pub const SIGN_UP_SUCCESS: &str = "Sign up successful";

/// Greeting prefix of the logged-in user link
pub const WELCOME_PREFIX: &str = "Welcome ";

// =============================================================================
// STATE MACHINE
// =============================================================================

/// State of the login/registration flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    /// No modal open, nobody logged in
    Anonymous,
    /// Sign-up or log-in modal open
    ModalOpen,
    /// Form submitted, outcome pending
    Submitted,
    /// Logged in as the named user
    LoggedIn(String),
    /// A native dialog answered the submission
    AlertShown(String),
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::ModalOpen => f.write_str("ModalOpen"),
            Self::Submitted => f.write_str("Submitted"),
            Self::LoggedIn(user) => write!(f, "LoggedIn({user})"),
            Self::AlertShown(text) => write!(f, "AlertShown({text})"),
        }
    }
}

/// Typed transitions of [`LoginState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginFlow {
    state: LoginState,
}

impl Default for LoginFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginFlow {
    /// Start anonymous
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: LoginState::Anonymous,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &LoginState {
        &self.state
    }

    fn invalid(&self, action: &'static str) -> ProbeError {
        ProbeError::InvalidTransition {
            flow: "login",
            from: self.state.to_string(),
            action,
        }
    }

    fn step(&mut self, next: LoginState) -> ProbeResult<&LoginState> {
        tracing::debug!(from = %self.state, to = %next, "login flow");
        self.state = next;
        Ok(&self.state)
    }

    /// Anonymous -> ModalOpen
    pub fn open_modal(&mut self) -> ProbeResult<&LoginState> {
        match self.state {
            LoginState::Anonymous => self.step(LoginState::ModalOpen),
            _ => Err(self.invalid("open modal")),
        }
    }

    /// ModalOpen -> Submitted
    pub fn submit(&mut self) -> ProbeResult<&LoginState> {
        match self.state {
            LoginState::ModalOpen => self.step(LoginState::Submitted),
            _ => Err(self.invalid("submit")),
        }
    }

    /// Submitted -> LoggedIn
    pub fn logged_in(&mut self, user: impl Into<String>) -> ProbeResult<&LoginState> {
        match self.state {
            LoginState::Submitted => self.step(LoginState::LoggedIn(user.into())),
            _ => Err(self.invalid("log in")),
        }
    }

    /// Submitted -> AlertShown
    pub fn alert(&mut self, text: impl Into<String>) -> ProbeResult<&LoginState> {
        match self.state {
            LoginState::Submitted => self.step(LoginState::AlertShown(text.into())),
            _ => Err(self.invalid("show alert")),
        }
    }

    /// Submitted -> ModalOpen, nothing happened
    pub fn no_response(&mut self) -> ProbeResult<&LoginState> {
        match self.state {
            LoginState::Submitted => self.step(LoginState::ModalOpen),
            _ => Err(self.invalid("retry")),
        }
    }

    /// AlertShown -> ModalOpen
    pub fn dismiss_alert(&mut self) -> ProbeResult<&LoginState> {
        match self.state {
            LoginState::AlertShown(_) => self.step(LoginState::ModalOpen),
            _ => Err(self.invalid("dismiss alert")),
        }
    }

    /// ModalOpen or AlertShown -> Anonymous
    pub fn close_modal(&mut self) -> ProbeResult<&LoginState> {
        match self.state {
            LoginState::ModalOpen | LoginState::AlertShown(_) => self.step(LoginState::Anonymous),
            _ => Err(self.invalid("close modal")),
        }
    }

    /// LoggedIn -> Anonymous
    pub fn logout(&mut self) -> ProbeResult<&LoginState> {
        match self.state {
            LoginState::LoggedIn(_) => self.step(LoginState::Anonymous),
            _ => Err(self.invalid("log out")),
        }
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Result of a log-in attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Logged in; carries the displayed user name
    LoggedIn(String),
    /// Modal still open without a dialog
    ModalOpen,
    /// Rejected with a dialog (`"Wrong password."`, `"User does not exist."`)
    AlertShown(String),
}

impl LoginOutcome {
    /// Whether the user ended up logged in
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn(_))
    }
}

/// Result of a sign-up attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Accepted; carries the dialog text
    Registered(String),
    /// Refused (`"This user already exist."`)
    Rejected(String),
    /// No dialog within the budget
    NoResponse,
}

impl RegistrationOutcome {
    fn from_alert(text: Option<String>) -> Self {
        match text {
            Some(t) if t.contains(SIGN_UP_SUCCESS) => Self::Registered(t),
            Some(t) => Self::Rejected(t),
            None => Self::NoResponse,
        }
    }

    /// Whether the account was created
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        matches!(self, Self::Registered(_))
    }
}

// =============================================================================
// PAGE
// =============================================================================

/// Sign-up and log-in modals of the navigation bar
#[derive(Debug, Clone, Copy)]
pub struct LoginPage<'s> {
    actions: Actions<'s>,
}

impl<'s> LoginPage<'s> {
    /// Bind to a live session
    pub fn new(session: &'s Session) -> ProbeResult<Self> {
        Ok(Self {
            actions: Actions::new(session)?,
        })
    }

    /// Open the sign-up modal
    pub async fn open_signup_modal(&self) -> ProbeResult<()> {
        self.actions.click(&base::SIGN_UP_LINK).await?;
        self.actions
            .waiter()
            .wait_until_visible(&login::SIGNUP_MODAL, TimeoutTier::Short)
            .await?;
        tracing::info!("sign up modal opened");
        Ok(())
    }

    /// Open the log-in modal
    pub async fn open_login_modal(&self) -> ProbeResult<()> {
        self.actions.click(&base::LOGIN_LINK).await?;
        self.actions
            .waiter()
            .wait_until_visible(&login::LOGIN_MODAL, TimeoutTier::Short)
            .await?;
        tracing::info!("login modal opened");
        Ok(())
    }

    /// Register a new account and accept the answering dialog
    pub async fn register(&self, username: &str, password: &str) -> ProbeResult<RegistrationOutcome> {
        tracing::info!(username, "registering user");
        let mut flow = LoginFlow::new();
        self.open_signup_modal().await?;
        flow.open_modal()?;
        self.actions.type_into(&login::SIGNUP_USERNAME, username).await?;
        self.actions.type_into(&login::SIGNUP_PASSWORD, password).await?;
        self.actions.click(&login::SIGNUP_BUTTON).await?;
        flow.submit()?;

        let alert = self.actions.accept_alert_within(TimeoutTier::Default).await;
        let outcome = RegistrationOutcome::from_alert(alert);
        match &outcome {
            RegistrationOutcome::Registered(text) | RegistrationOutcome::Rejected(text) => {
                flow.alert(text.as_str())?;
                flow.dismiss_alert()?;
            }
            RegistrationOutcome::NoResponse => {
                flow.no_response()?;
            }
        }

        if outcome.is_registered()
            && self
                .actions
                .is_gone_within(&login::SIGNUP_MODAL, TimeoutTier::Short)
                .await
        {
            flow.close_modal()?;
        }
        tracing::info!(username, outcome = ?outcome, state = %flow.state(), "registration finished");
        Ok(outcome)
    }

    /// Log in, resolving the race between the greeting and a rejection dialog
    pub async fn login(&self, username: &str, password: &str) -> ProbeResult<LoginOutcome> {
        tracing::info!(username, "logging in");
        let mut flow = LoginFlow::new();
        self.open_login_modal().await?;
        flow.open_modal()?;
        self.actions.type_into(&login::LOGIN_USERNAME, username).await?;
        self.actions.type_into(&login::LOGIN_PASSWORD, password).await?;
        self.actions.click(&login::LOGIN_BUTTON).await?;
        flow.submit()?;

        let waiter = self.actions.waiter();
        let driver = self.actions.driver();
        let settled = waiter
            .wait_for_condition(
                "logged in or alert",
                &waiter.policy(TimeoutTier::Default),
                || async move {
                    Ok(driver.alert_text().await?.is_some()
                        || driver.is_visible(&base::LOGGED_USER).await?)
                },
            )
            .await;

        if let Some(text) = self.actions.drain_alert().await {
            flow.alert(text.as_str())?;
            tracing::warn!(username, alert = %text, "login rejected");
            return Ok(LoginOutcome::AlertShown(text));
        }

        if settled.is_ok() && self.is_user_logged_in().await {
            if !self
                .actions
                .is_gone_within(&login::LOGIN_MODAL, TimeoutTier::Short)
                .await
            {
                tracing::warn!("login modal still visible after login");
            }
            let name = self.logged_in_username().await;
            flow.logged_in(name.as_str())?;
            tracing::info!(user = %name, "logged in");
            return Ok(LoginOutcome::LoggedIn(name));
        }

        flow.no_response()?;
        if self.is_login_modal_displayed().await {
            tracing::warn!(username, "login modal still open without response");
            Ok(LoginOutcome::ModalOpen)
        } else {
            Err(ProbeError::interaction(
                login::LOGIN_BUTTON.name(),
                "neither greeting nor dialog appeared and the modal closed",
            ))
        }
    }

    /// Log out; `false` when nobody was logged in
    pub async fn logout(&self) -> ProbeResult<bool> {
        if !self.is_user_logged_in().await {
            tracing::warn!("no user to log out");
            return Ok(false);
        }
        let user = self.logged_in_username().await;
        self.actions.click(&base::LOGOUT_LINK).await?;
        self.actions
            .waiter()
            .wait_until_gone(&base::LOGGED_USER, TimeoutTier::Default)
            .await?;
        tracing::info!(user = %user, "logged out");
        Ok(true)
    }

    /// Greeting link visible
    pub async fn is_user_logged_in(&self) -> bool {
        self.actions.is_displayed(&base::LOGGED_USER).await
    }

    /// Name from `"Welcome <name>"`, empty when logged out
    pub async fn logged_in_username(&self) -> String {
        if !self.is_user_logged_in().await {
            return String::new();
        }
        let greeting = self.actions.text_of(&base::LOGGED_USER).await;
        greeting
            .strip_prefix(WELCOME_PREFIX)
            .unwrap_or(&greeting)
            .trim()
            .to_string()
    }

    /// Sign-up modal visible
    pub async fn is_signup_modal_displayed(&self) -> bool {
        self.actions.is_displayed(&login::SIGNUP_MODAL).await
    }

    /// Log-in modal visible
    pub async fn is_login_modal_displayed(&self) -> bool {
        self.actions.is_displayed(&login::LOGIN_MODAL).await
    }

    /// Close the log-in modal if open
    pub async fn close_login_modal(&self) -> ProbeResult<()> {
        if self.is_login_modal_displayed().await {
            self.actions.click(&login::LOGIN_CLOSE).await?;
            self.actions
                .waiter()
                .wait_until_gone(&login::LOGIN_MODAL, TimeoutTier::Short)
                .await?;
            tracing::info!("login modal closed");
        }
        Ok(())
    }

    /// Close the sign-up modal if open
    pub async fn close_signup_modal(&self) -> ProbeResult<()> {
        if self.is_signup_modal_displayed().await {
            self.actions.click(&login::SIGNUP_CLOSE).await?;
            self.actions
                .waiter()
                .wait_until_gone(&login::SIGNUP_MODAL, TimeoutTier::Short)
                .await?;
            tracing::info!("sign up modal closed");
        }
        Ok(())
    }
}
