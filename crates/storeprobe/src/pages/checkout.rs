//! Order modal and purchase confirmation.
//!
//! ```text
//! CartView ──place order──▶ OrderModalOpen ──fill──▶ FormFilled ──purchase──▶ Submitted
//!    ▲                          │   ▲                                            │
//!    └──────────close───────────┘   └──────fill── ValidationBlocked ◀──alert────┤
//!    └───────────────ok────────────────────────── Confirmed ◀──────────────────┘
//! ```

use super::base::Actions;
use super::cart::CartPage;
use crate::confirmation::OrderConfirmation;
use crate::fixture::CustomerInfo;
use crate::locators::checkout;
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use crate::wait::TimeoutTier;
use std::fmt;

// =============================================================================
// STATE MACHINE
// =============================================================================

/// State of the checkout flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    /// Cart page, no modal
    CartView,
    /// Order modal open with an untouched form
    OrderModalOpen,
    /// Form filled, not yet submitted
    FormFilled,
    /// Purchase clicked, outcome pending
    Submitted,
    /// Confirmation shown
    Confirmed(OrderConfirmation),
    /// A dialog refused the form
    ValidationBlocked(String),
}

impl CheckoutState {
    /// Whether the order went through
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CartView => f.write_str("CartView"),
            Self::OrderModalOpen => f.write_str("OrderModalOpen"),
            Self::FormFilled => f.write_str("FormFilled"),
            Self::Submitted => f.write_str("Submitted"),
            Self::Confirmed(order) => write!(f, "Confirmed({})", order.id),
            Self::ValidationBlocked(text) => write!(f, "ValidationBlocked({text})"),
        }
    }
}

/// Typed transitions of [`CheckoutState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutFlow {
    state: CheckoutState,
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutFlow {
    /// Start on the cart page
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: CheckoutState::CartView,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Consume the flow, keeping its final state
    #[must_use]
    pub fn into_state(self) -> CheckoutState {
        self.state
    }

    fn invalid(&self, action: &'static str) -> ProbeError {
        ProbeError::InvalidTransition {
            flow: "checkout",
            from: self.state.to_string(),
            action,
        }
    }

    fn step(&mut self, next: CheckoutState) -> ProbeResult<&CheckoutState> {
        tracing::debug!(from = %self.state, to = %next, "checkout flow");
        self.state = next;
        Ok(&self.state)
    }

    /// CartView -> OrderModalOpen
    pub fn open_modal(&mut self) -> ProbeResult<&CheckoutState> {
        match self.state {
            CheckoutState::CartView => self.step(CheckoutState::OrderModalOpen),
            _ => Err(self.invalid("open order modal")),
        }
    }

    /// OrderModalOpen or ValidationBlocked -> FormFilled
    pub fn fill(&mut self) -> ProbeResult<&CheckoutState> {
        match self.state {
            CheckoutState::OrderModalOpen | CheckoutState::ValidationBlocked(_) => {
                self.step(CheckoutState::FormFilled)
            }
            _ => Err(self.invalid("fill form")),
        }
    }

    /// FormFilled or OrderModalOpen -> Submitted
    pub fn submit(&mut self) -> ProbeResult<&CheckoutState> {
        match self.state {
            CheckoutState::FormFilled | CheckoutState::OrderModalOpen => {
                self.step(CheckoutState::Submitted)
            }
            _ => Err(self.invalid("purchase")),
        }
    }

    /// Submitted -> Confirmed
    pub fn confirmed(&mut self, order: OrderConfirmation) -> ProbeResult<&CheckoutState> {
        match self.state {
            CheckoutState::Submitted => self.step(CheckoutState::Confirmed(order)),
            _ => Err(self.invalid("confirm")),
        }
    }

    /// Submitted -> ValidationBlocked
    pub fn blocked(&mut self, alert: impl Into<String>) -> ProbeResult<&CheckoutState> {
        match self.state {
            CheckoutState::Submitted => self.step(CheckoutState::ValidationBlocked(alert.into())),
            _ => Err(self.invalid("block")),
        }
    }

    /// Any open-modal state -> CartView
    pub fn close_modal(&mut self) -> ProbeResult<&CheckoutState> {
        match self.state {
            CheckoutState::OrderModalOpen
            | CheckoutState::FormFilled
            | CheckoutState::ValidationBlocked(_) => self.step(CheckoutState::CartView),
            _ => Err(self.invalid("close order modal")),
        }
    }

    /// Confirmed -> CartView
    pub fn acknowledge(&mut self) -> ProbeResult<&CheckoutState> {
        match self.state {
            CheckoutState::Confirmed(_) => self.step(CheckoutState::CartView),
            _ => Err(self.invalid("acknowledge")),
        }
    }
}

// =============================================================================
// PAGE
// =============================================================================

/// Order modal of the cart page
#[derive(Debug, Clone, Copy)]
pub struct CheckoutPage<'s> {
    actions: Actions<'s>,
}

impl<'s> CheckoutPage<'s> {
    /// Bind to a live session
    pub fn new(session: &'s Session) -> ProbeResult<Self> {
        Ok(Self {
            actions: Actions::new(session)?,
        })
    }

    /// Order modal visible
    pub async fn is_order_modal_displayed(&self) -> bool {
        self.actions
            .is_displayed_within(&checkout::ORDER_MODAL, TimeoutTier::Short)
            .await
    }

    /// Customer name
    pub async fn enter_name(&self, name: &str) -> ProbeResult<()> {
        self.actions.type_into(&checkout::NAME, name).await
    }

    /// Country
    pub async fn enter_country(&self, country: &str) -> ProbeResult<()> {
        self.actions.type_into(&checkout::COUNTRY, country).await
    }

    /// City
    pub async fn enter_city(&self, city: &str) -> ProbeResult<()> {
        self.actions.type_into(&checkout::CITY, city).await
    }

    /// Credit card number
    pub async fn enter_card(&self, card: &str) -> ProbeResult<()> {
        self.actions.type_into(&checkout::CARD, card).await
    }

    /// Expiry month
    pub async fn enter_month(&self, month: &str) -> ProbeResult<()> {
        self.actions.type_into(&checkout::MONTH, month).await
    }

    /// Expiry year
    pub async fn enter_year(&self, year: &str) -> ProbeResult<()> {
        self.actions.type_into(&checkout::YEAR, year).await
    }

    /// Fill every form field
    pub async fn fill_form(&self, info: &CustomerInfo) -> ProbeResult<()> {
        tracing::info!(name = %info.name, "filling order form");
        self.enter_name(&info.name).await?;
        self.enter_country(&info.country).await?;
        self.enter_city(&info.city).await?;
        self.enter_card(&info.credit_card).await?;
        self.enter_month(&info.month).await?;
        self.enter_year(&info.year).await
    }

    /// Total label of the modal (`"Total: 790"`)
    pub async fn order_total_text(&self) -> String {
        self.actions.text_of(&checkout::ORDER_TOTAL).await
    }

    /// Click purchase
    pub async fn purchase(&self) -> ProbeResult<()> {
        self.actions.click(&checkout::PURCHASE).await
    }

    /// Click purchase and accept a validation dialog if one shows up
    pub async fn try_purchase(&self) -> ProbeResult<Option<String>> {
        self.purchase().await?;
        let alert = self.actions.accept_alert_within(TimeoutTier::Short).await;
        if let Some(text) = &alert {
            tracing::info!(alert = %text, "purchase refused");
        }
        Ok(alert)
    }

    /// Open the modal if needed, fill it, purchase and wait for the outcome.
    ///
    /// A refusing dialog is an outcome, not an error: it comes back as
    /// [`CheckoutState::ValidationBlocked`] with the modal still open.
    pub async fn complete_purchase(&self, info: &CustomerInfo) -> ProbeResult<CheckoutState> {
        let mut flow = CheckoutFlow::new();
        if !self.is_order_modal_displayed().await {
            CartPage::new(self.actions.session())?
                .click_place_order()
                .await?;
        }
        flow.open_modal()?;
        self.fill_form(info).await?;
        flow.fill()?;
        self.purchase().await?;
        flow.submit()?;

        let waiter = self.actions.waiter();
        let driver = self.actions.driver();
        let candidates = checkout::AWAIT_CONFIRMATION.locators();
        let candidates = &candidates;
        let settled = waiter
            .wait_for_condition(
                "confirmation or alert",
                &waiter.policy(TimeoutTier::Default),
                || async move {
                    if driver.alert_text().await?.is_some() {
                        return Ok(true);
                    }
                    for locator in candidates {
                        if driver.is_visible(locator).await? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                },
            )
            .await;

        if let Some(text) = self.actions.drain_alert().await {
            tracing::warn!(alert = %text, "purchase blocked");
            flow.blocked(text)?;
            return Ok(flow.into_state());
        }
        if let Err(e) = settled {
            return Err(ProbeError::interaction(checkout::PURCHASE.name(), e));
        }

        let order = self.order_confirmation().await;
        tracing::info!(order_id = %order.id, amount = %order.amount, "purchase confirmed");
        flow.confirmed(order)?;
        Ok(flow.into_state())
    }

    /// Wait for any confirmation marker; returns the index of the one found
    pub async fn wait_for_confirmation(&self) -> ProbeResult<usize> {
        self.actions
            .waiter()
            .wait_for_any_visible(&checkout::AWAIT_CONFIRMATION.locators(), TimeoutTier::Default)
            .await
    }

    /// Confirmation visible right now
    pub async fn is_confirmation_displayed(&self) -> bool {
        self.actions
            .waiter()
            .wait_for_any_visible(
                &checkout::AWAIT_CONFIRMATION.locators(),
                TimeoutTier::UltraShort,
            )
            .await
            .is_ok()
    }

    /// Raw confirmation message
    pub async fn confirmation_text(&self) -> String {
        self.actions.text_of(&checkout::CONFIRMATION_MESSAGE).await
    }

    /// Parsed confirmation message
    pub async fn order_confirmation(&self) -> OrderConfirmation {
        OrderConfirmation::parse(&self.confirmation_text().await)
    }

    /// Order id, empty when none is shown
    pub async fn order_id(&self) -> String {
        self.order_confirmation().await.id
    }

    /// Amount line (`"790 USD"`)
    pub async fn order_amount(&self) -> String {
        self.order_confirmation().await.amount
    }

    /// Date line
    pub async fn order_date(&self) -> String {
        self.order_confirmation().await.date
    }

    /// Dismiss the confirmation
    pub async fn confirm_ok(&self) -> ProbeResult<()> {
        self.actions.click_first_of(&checkout::CONFIRM_OK, "").await?;
        if !self
            .actions
            .is_gone_within(&checkout::CONFIRMATION, TimeoutTier::Short)
            .await
        {
            tracing::warn!("confirmation still visible after OK");
        }
        Ok(())
    }

    /// Close the order modal if open
    pub async fn close_order_modal(&self) -> ProbeResult<()> {
        if self.is_order_modal_displayed().await {
            self.actions.click(&checkout::CLOSE_ORDER_MODAL).await?;
            self.actions
                .waiter()
                .wait_until_gone(&checkout::ORDER_MODAL, TimeoutTier::Short)
                .await?;
            tracing::info!("order modal closed");
        }
        Ok(())
    }

    /// Whether any sign of a completed order is shown
    pub async fn verify_order_completion(&self) -> bool {
        let confirmation = self.wait_for_confirmation().await.is_ok();
        let order = self.order_confirmation().await;
        let thank_you = self.actions.is_displayed(&checkout::THANK_YOU).await;
        let complete = confirmation || order.has_id() || !order.amount.is_empty() || thank_you;
        tracing::info!(
            complete,
            confirmation,
            order_id = order.has_id(),
            thank_you,
            "order completion"
        );
        complete
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::SuiteConfig;
    use crate::locators::cart;
    use crate::mock::{MockDom, MockDriver};

    const MESSAGE: &str =
        "Id: 4711\nAmount: 790 USD\nCard Number: 1234567890123456\nName: John Doe\nDate: 17/10/2026";
    const VALIDATION: &str = "Please fill out Name and Creditcard.";

    fn session_with(driver: &MockDriver) -> Session {
        Session::from_driver(Box::new(driver.clone()), SuiteConfig::new())
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "John Doe".into(),
            country: "United States".into(),
            city: "New York".into(),
            credit_card: "1234567890123456".into(),
            month: "12".into(),
            year: "2025".into(),
        }
    }

    fn show_confirmation(dom: &mut MockDom) {
        dom.show(&checkout::CONFIRMATION);
        dom.set_text(&checkout::CONFIRMATION_MESSAGE, MESSAGE);
        dom.set_text(&checkout::THANK_YOU, "Thank you for your purchase!");
        dom.show(&checkout::CONFIRM_OK.locators()[0]);
    }

    /// Cart page whose order modal accepts or refuses the form
    fn order_modal(accepts: bool) -> MockDriver {
        let driver = MockDriver::new();
        driver.show(&cart::PLACE_ORDER);
        driver.on_click(&cart::PLACE_ORDER, |dom| {
            dom.show(&checkout::ORDER_MODAL);
            for field in [
                checkout::NAME,
                checkout::COUNTRY,
                checkout::CITY,
                checkout::CARD,
                checkout::MONTH,
                checkout::YEAR,
            ] {
                dom.show(&field);
            }
            dom.set_text(&checkout::ORDER_TOTAL, "Total: 790");
            dom.show(&checkout::PURCHASE);
            dom.show(&checkout::CLOSE_ORDER_MODAL);
        });
        driver.on_click(&checkout::PURCHASE, move |dom| {
            if accepts {
                dom.hide(&checkout::ORDER_MODAL);
                show_confirmation(dom);
            } else {
                dom.push_alert(VALIDATION);
            }
        });
        driver.on_click(&checkout::CLOSE_ORDER_MODAL, |dom| dom.hide(&checkout::ORDER_MODAL));
        driver.on_click(&checkout::CONFIRM_OK.locators()[0], |dom| {
            dom.hide(&checkout::CONFIRMATION);
        });
        driver
    }

    mod flow_tests {
        use super::*;

        #[test]
        fn test_happy_path() {
            let mut flow = CheckoutFlow::new();
            flow.open_modal().unwrap();
            flow.fill().unwrap();
            flow.submit().unwrap();
            let state = flow.confirmed(OrderConfirmation::parse(MESSAGE)).unwrap();
            assert!(state.is_confirmed());
            assert_eq!(state.to_string(), "Confirmed(4711)");
            assert_eq!(flow.acknowledge().unwrap(), &CheckoutState::CartView);
        }

        #[test]
        fn test_blocked_form_can_be_refilled_or_closed() {
            let mut flow = CheckoutFlow::new();
            flow.open_modal().unwrap();
            flow.submit().unwrap();
            flow.blocked(VALIDATION).unwrap();
            assert_eq!(flow.clone().close_modal().unwrap(), &CheckoutState::CartView);
            assert_eq!(flow.fill().unwrap(), &CheckoutState::FormFilled);
        }

        #[test]
        fn test_invalid_transitions() {
            let mut flow = CheckoutFlow::new();
            match flow.submit().unwrap_err() {
                ProbeError::InvalidTransition { flow, from, action } => {
                    assert_eq!(flow, "checkout");
                    assert_eq!(from, "CartView");
                    assert_eq!(action, "purchase");
                }
                other => panic!("unexpected {other:?}"),
            }
            assert!(flow.confirmed(OrderConfirmation::default()).is_err());
            assert!(flow.acknowledge().is_err());
            assert_eq!(flow.state(), &CheckoutState::CartView);
        }
    }

    mod purchase_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_complete_purchase_confirms_order() {
            let driver = order_modal(true);
            let session = session_with(&driver);
            let page = CheckoutPage::new(&session).unwrap();
            let state = page.complete_purchase(&customer()).await.unwrap();
            let CheckoutState::Confirmed(order) = state else {
                panic!("expected a confirmed order");
            };
            assert_eq!(order.id, "4711");
            assert_eq!(order.amount, "790 USD");
            assert_eq!(order.name, "John Doe");
            assert_eq!(driver.typed_value(&checkout::CARD).as_deref(), Some("1234567890123456"));
            assert!(page.verify_order_completion().await);
            assert_eq!(page.order_id().await, "4711");
            assert_eq!(page.order_date().await, "17/10/2026");
        }

        #[tokio::test(start_paused = true)]
        async fn test_validation_dialog_blocks_purchase() {
            let driver = order_modal(false);
            let session = session_with(&driver);
            let page = CheckoutPage::new(&session).unwrap();
            let state = page.complete_purchase(&CustomerInfo::default()).await.unwrap();
            assert_eq!(state, CheckoutState::ValidationBlocked(VALIDATION.to_string()));
            assert!(page.is_order_modal_displayed().await);
            assert_eq!(driver.pending_alerts(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_try_purchase_returns_validation_dialog() {
            let driver = order_modal(false);
            let session = session_with(&driver);
            CartPage::new(&session).unwrap().click_place_order().await.unwrap();
            let page = CheckoutPage::new(&session).unwrap();
            assert_eq!(page.try_purchase().await.unwrap().as_deref(), Some(VALIDATION));
            assert_eq!(driver.pending_alerts(), 0);
            assert!(page.is_order_modal_displayed().await);
        }

        #[tokio::test(start_paused = true)]
        async fn test_rejected_purchase_click_fails() {
            let driver = order_modal(true);
            driver.fail_clicks_on(&checkout::PURCHASE);
            let session = session_with(&driver);
            let page = CheckoutPage::new(&session).unwrap();
            let err = page.complete_purchase(&customer()).await.unwrap_err();
            assert!(matches!(err, ProbeError::InteractionFailed { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_modal_total_and_close() {
            let driver = order_modal(true);
            let session = session_with(&driver);
            CartPage::new(&session).unwrap().click_place_order().await.unwrap();
            let page = CheckoutPage::new(&session).unwrap();
            assert!(page.is_order_modal_displayed().await);
            assert_eq!(page.order_total_text().await, "Total: 790");
            page.close_order_modal().await.unwrap();
            assert!(!driver.is_shown(&checkout::ORDER_MODAL));
        }

        #[tokio::test(start_paused = true)]
        async fn test_confirm_ok_dismisses_confirmation() {
            let driver = order_modal(true);
            driver.with_dom(show_confirmation);
            let session = session_with(&driver);
            let page = CheckoutPage::new(&session).unwrap();
            assert_eq!(page.wait_for_confirmation().await.unwrap(), 0);
            page.confirm_ok().await.unwrap();
            assert!(!driver.is_shown(&checkout::CONFIRMATION));
        }

        #[tokio::test(start_paused = true)]
        async fn test_nothing_to_verify() {
            let driver = MockDriver::new();
            let session = session_with(&driver);
            let page = CheckoutPage::new(&session).unwrap();
            assert!(!page.verify_order_completion().await);
            assert!(!page.is_confirmation_displayed().await);
            assert_eq!(page.order_id().await, "");
        }
    }
}
