//! Cart table, totals and the order trigger.

use super::base::Actions;
use super::{contains_ignore_case, PageObject};
use crate::locators::{base, cart, checkout};
use crate::price::{normalize_price, prices_match, sum_prices};
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use crate::wait::TimeoutTier;

/// Cart page
#[derive(Debug, Clone, Copy)]
pub struct CartPage<'s> {
    actions: Actions<'s>,
}

impl PageObject for CartPage<'_> {
    fn url_pattern(&self) -> &'static str {
        "cart.html"
    }

    fn page_name(&self) -> &'static str {
        "cart"
    }
}

impl<'s> CartPage<'s> {
    /// Bind to a live session
    pub fn new(session: &'s Session) -> ProbeResult<Self> {
        Ok(Self {
            actions: Actions::new(session)?,
        })
    }

    /// Open the cart through the nav bar and wait for the table to load
    pub async fn open(&self) -> ProbeResult<()> {
        self.actions.click_first_of(&base::OPEN_CART, "").await?;
        self.actions
            .waiter()
            .wait_for_url_contains(self.url_pattern(), TimeoutTier::Default)
            .await
            .map_err(|e| ProbeError::interaction(base::OPEN_CART.operation, e))?;
        self.actions.wait_for_page_ready().await?;
        self.actions.wait_for_spinners_gone().await;
        // rows arrive after the page itself; an empty cart never gets any
        let _ = self
            .actions
            .waiter()
            .wait_for_element_count(&cart::ITEM_TITLES, 1, TimeoutTier::Short)
            .await;
        tracing::info!(page = self.page_name(), "cart opened");
        Ok(())
    }

    // =========================================================================
    // ITEMS
    // =========================================================================

    /// Names of the items in the cart, in table order
    pub async fn item_names(&self) -> Vec<String> {
        self.actions
            .texts_of(&cart::ITEM_TITLES)
            .await
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Number of rows in the cart
    pub async fn item_count(&self) -> usize {
        self.item_names().await.len()
    }

    /// Whether the cart is empty
    pub async fn is_cart_empty(&self) -> bool {
        self.item_count().await == 0
    }

    /// Whether any row name contains `name`, ignoring case
    pub async fn is_item_in_cart(&self, name: &str) -> bool {
        self.find_item(name).await.is_some()
    }

    async fn find_item(&self, name: &str) -> Option<String> {
        self.item_names()
            .await
            .into_iter()
            .find(|item| contains_ignore_case(item, name))
    }

    /// Price label of a row, empty when the item is not in the cart
    pub async fn item_price(&self, name: &str) -> String {
        match self.find_item(name).await {
            Some(item) => self.actions.text_of(&cart::ITEM_PRICE_BY_NAME.bind(&item)).await,
            None => String::new(),
        }
    }

    /// Delete one row and wait for the table to shrink
    pub async fn remove_item(&self, name: &str) -> ProbeResult<()> {
        let Some(item) = self.find_item(name).await else {
            return Err(ProbeError::interaction(
                cart::ITEM_ROW_BY_NAME.bind(name).name(),
                "item not in cart",
            ));
        };
        tracing::info!(item = %item, "removing from cart");
        let before = self.actions.count_of(&cart::ITEM_TITLES).await;
        self.actions.click_first_of(&cart::REMOVE_ITEM, &item).await?;
        self.wait_for_count_below(before, cart::REMOVE_ITEM.operation)
            .await
    }

    /// Delete every row; returns how many were removed
    pub async fn clear_cart(&self) -> ProbeResult<usize> {
        let initial = self.item_count().await;
        let mut removed = 0;
        while removed < initial {
            let before = self.actions.count_of(&cart::ITEM_TITLES).await;
            if before == 0 {
                break;
            }
            self.actions.click(&cart::FIRST_DELETE).await?;
            self.wait_for_count_below(before, "clear cart").await?;
            removed += 1;
        }
        tracing::info!(removed, "cart cleared");
        Ok(removed)
    }

    async fn wait_for_count_below(&self, before: usize, operation: &str) -> ProbeResult<()> {
        let waiter = self.actions.waiter();
        let driver = self.actions.driver();
        waiter
            .wait_for_condition(
                "cart row removed",
                &waiter.policy(TimeoutTier::Default),
                || async move { Ok(driver.count(&cart::ITEM_TITLES).await? < before) },
            )
            .await
            .map_err(|e| ProbeError::interaction(operation, e))?;
        Ok(())
    }

    // =========================================================================
    // TOTALS
    // =========================================================================

    /// Total label, `"0"` when blank or missing
    pub async fn total_text(&self) -> String {
        let text = self.actions.text_of(&cart::TOTAL).await;
        if text.is_empty() {
            "0".to_string()
        } else {
            text
        }
    }

    /// Numeric total
    pub async fn total(&self) -> f64 {
        normalize_price(&self.total_text().await)
    }

    /// Sum of the row prices
    pub async fn sum_of_item_prices(&self) -> f64 {
        sum_prices(&self.actions.texts_of(&cart::ITEM_PRICES).await)
    }

    /// Whether the total matches `expected` within the price tolerance
    pub async fn verify_total(&self, expected: f64) -> bool {
        let actual = self.total().await;
        let matched = prices_match(actual, expected);
        if !matched {
            tracing::warn!(actual, expected, "cart total mismatch");
        }
        matched
    }

    /// Open the order modal
    pub async fn click_place_order(&self) -> ProbeResult<()> {
        self.actions
            .click_first_of(&cart::PLACE_ORDER_CHAIN, "")
            .await?;
        self.actions
            .waiter()
            .wait_until_visible(&checkout::ORDER_MODAL, TimeoutTier::Short)
            .await
            .map_err(|e| ProbeError::interaction(cart::PLACE_ORDER_CHAIN.operation, e))?;
        tracing::info!("order modal opened");
        Ok(())
    }
}
