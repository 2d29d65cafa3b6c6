//! Product detail page.

use super::base::Actions;
use super::PageObject;
use crate::locators::product;
use crate::price::normalize_price;
use crate::result::ProbeResult;
use crate::session::Session;
use crate::wait::TimeoutTier;

/// Detail page of a single product
#[derive(Debug, Clone, Copy)]
pub struct ProductPage<'s> {
    actions: Actions<'s>,
}

impl PageObject for ProductPage<'_> {
    fn url_pattern(&self) -> &'static str {
        "prod.html"
    }

    fn page_name(&self) -> &'static str {
        "product"
    }
}

impl<'s> ProductPage<'s> {
    /// Bind to a live session
    pub fn new(session: &'s Session) -> ProbeResult<Self> {
        Ok(Self {
            actions: Actions::new(session)?,
        })
    }

    /// Whether the browser is on a product page
    pub async fn is_current(&self) -> bool {
        match self.actions.driver().current_url().await {
            Ok(url) => self.matches_url(&url),
            Err(_) => false,
        }
    }

    /// Product name, empty when not shown
    pub async fn name(&self) -> String {
        self.actions.text_of(&product::NAME).await
    }

    /// Price label such as `"$360 *includes tax"`
    pub async fn price(&self) -> String {
        self.actions.text_of(&product::PRICE).await
    }

    /// Numeric price, `0.0` when not shown
    pub async fn price_value(&self) -> f64 {
        normalize_price(&self.price().await)
    }

    /// Description paragraph
    pub async fn description(&self) -> String {
        self.actions.text_of(&product::DESCRIPTION).await
    }

    /// Image source URL
    pub async fn image_src(&self) -> Option<String> {
        self.actions.attribute_of(&product::IMAGE, "src").await
    }

    /// Whether the add-to-cart button is shown
    pub async fn is_add_to_cart_visible(&self) -> bool {
        self.actions
            .is_displayed_within(&product::ADD_TO_CART, TimeoutTier::Short)
            .await
    }

    /// Add the product to the cart and accept the confirmation dialog.
    ///
    /// Returns the dialog text, `None` if the storefront stayed silent.
    pub async fn add_to_cart(&self) -> ProbeResult<Option<String>> {
        let name = self.name().await;
        tracing::info!(product = %name, "adding to cart");
        self.actions.click(&product::ADD_TO_CART).await?;
        let alert = self.actions.accept_alert_within(TimeoutTier::Default).await;
        match &alert {
            Some(text) => tracing::info!(product = %name, alert = %text, "added to cart"),
            None => tracing::warn!(product = %name, "no confirmation after add to cart"),
        }
        Ok(alert)
    }

    /// `"<name> - <price>"`
    pub async fn details(&self) -> String {
        format!("{} - {}", self.name().await, self.price().await)
    }

    /// Back to the grid through the breadcrumb, else browser history
    pub async fn back_to_home(&self) -> ProbeResult<()> {
        if self
            .actions
            .is_displayed_within(&product::HOME_BREADCRUMB, TimeoutTier::Short)
            .await
        {
            self.actions.click(&product::HOME_BREADCRUMB).await?;
        } else {
            tracing::debug!("no breadcrumb, going back");
            self.actions.driver().go_back().await?;
        }
        self.actions.wait_for_page_ready().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::SuiteConfig;
    use crate::mock::MockDriver;

    fn session_with(driver: &MockDriver) -> Session {
        Session::from_driver(Box::new(driver.clone()), SuiteConfig::new())
    }

    fn detail_page() -> MockDriver {
        let driver = MockDriver::new();
        driver.set_text(&product::NAME, "Samsung galaxy s6");
        driver.set_text(&product::PRICE, "$360 *includes tax");
        driver.set_text(&product::DESCRIPTION, "The Samsung Galaxy S6 is powered by...");
        driver.set_attr(&product::IMAGE, "src", "imgs/galaxy_s6.jpg");
        driver.show(&product::ADD_TO_CART);
        driver
    }

    mod detail_tests {
        use super::*;

        #[tokio::test]
        async fn test_details() {
            let driver = detail_page();
            let session = session_with(&driver);
            let page = ProductPage::new(&session).unwrap();
            assert_eq!(page.name().await, "Samsung galaxy s6");
            assert!((page.price_value().await - 360.0).abs() < f64::EPSILON);
            assert_eq!(page.details().await, "Samsung galaxy s6 - $360 *includes tax");
            assert!(page.description().await.starts_with("The Samsung"));
            assert_eq!(page.image_src().await.as_deref(), Some("imgs/galaxy_s6.jpg"));
            assert!(page.is_add_to_cart_visible().await);
        }

        #[tokio::test(start_paused = true)]
        async fn test_missing_details_default() {
            let driver = MockDriver::new();
            let session = session_with(&driver);
            let page = ProductPage::new(&session).unwrap();
            assert_eq!(page.name().await, "");
            assert!(page.price_value().await.abs() < f64::EPSILON);
            assert!(page.image_src().await.is_none());
            assert!(!page.is_add_to_cart_visible().await);
        }

        #[tokio::test]
        async fn test_is_current_matches_url() {
            let driver = detail_page();
            let session = session_with(&driver);
            let page = ProductPage::new(&session).unwrap();
            session.navigate("https://www.demoblaze.com/prod.html?idp_=1").await.unwrap();
            assert!(page.is_current().await);
            session.navigate("https://www.demoblaze.com/cart.html").await.unwrap();
            assert!(!page.is_current().await);
        }
    }

    mod cart_action_tests {
        use super::*;

        #[tokio::test]
        async fn test_add_to_cart_accepts_confirmation() {
            let driver = detail_page();
            driver.on_click(&product::ADD_TO_CART, |dom| dom.push_alert("Product added"));
            let session = session_with(&driver);
            let page = ProductPage::new(&session).unwrap();
            assert_eq!(page.add_to_cart().await.unwrap().as_deref(), Some("Product added"));
            assert_eq!(driver.pending_alerts(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_add_to_cart_without_dialog() {
            let driver = detail_page();
            let session = session_with(&driver);
            let page = ProductPage::new(&session).unwrap();
            assert!(page.add_to_cart().await.unwrap().is_none());
        }

        #[tokio::test(start_paused = true)]
        async fn test_back_to_home_uses_history_without_breadcrumb() {
            let driver = detail_page();
            let session = session_with(&driver);
            session.navigate("https://www.demoblaze.com/").await.unwrap();
            session.navigate("https://www.demoblaze.com/prod.html?idp_=1").await.unwrap();
            ProductPage::new(&session).unwrap().back_to_home().await.unwrap();
            assert!(driver.was_called("back"));
            let url = session.driver().current_url().await.unwrap();
            assert_eq!(url, "https://www.demoblaze.com/");
        }

        #[tokio::test]
        async fn test_back_to_home_prefers_breadcrumb() {
            let driver = detail_page();
            driver.show(&product::HOME_BREADCRUMB);
            let session = session_with(&driver);
            ProductPage::new(&session).unwrap().back_to_home().await.unwrap();
            assert!(driver.was_clicked(&product::HOME_BREADCRUMB));
            assert!(!driver.was_called("back"));
        }
    }
}
