//! Product grid, category filters and pagination.

use super::base::Actions;
use super::contains_ignore_case;
use crate::locator::Locator;
use crate::locators::{base, home, product};
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use crate::wait::TimeoutTier;
use std::fmt;
use std::str::FromStr;

/// Storefront product category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Phones
    Phones,
    /// Laptops
    Laptops,
    /// Monitors
    Monitors,
}

impl Category {
    /// Every category, in menu order
    pub const ALL: [Self; 3] = [Self::Phones, Self::Laptops, Self::Monitors];

    /// Fixture key of the category
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Phones => "phones",
            Self::Laptops => "laptops",
            Self::Monitors => "monitors",
        }
    }

    /// Menu link of the category
    #[must_use]
    pub const fn locator(&self) -> Locator {
        match self {
            Self::Phones => home::PHONES,
            Self::Laptops => home::LAPTOPS,
            Self::Monitors => home::MONITORS,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "phones" => Ok(Self::Phones),
            "laptops" => Ok(Self::Laptops),
            "monitors" => Ok(Self::Monitors),
            other => Err(ProbeError::Fixture {
                message: format!("unknown category '{other}'"),
            }),
        }
    }
}

/// Landing page with the product grid
#[derive(Debug, Clone, Copy)]
pub struct HomePage<'s> {
    actions: Actions<'s>,
}

impl<'s> HomePage<'s> {
    /// Bind to a live session
    pub fn new(session: &'s Session) -> ProbeResult<Self> {
        Ok(Self {
            actions: Actions::new(session)?,
        })
    }

    // =========================================================================
    // CATEGORIES
    // =========================================================================

    /// Select a category and wait for the grid to reload
    pub async fn click_category(&self, category: Category) -> ProbeResult<()> {
        tracing::info!(%category, "selecting category");
        self.actions.click(&category.locator()).await?;
        self.actions.wait_for_page_ready().await?;
        self.actions.wait_for_spinners_gone().await;
        Ok(())
    }

    /// Select phones
    pub async fn click_phones(&self) -> ProbeResult<()> {
        self.click_category(Category::Phones).await
    }

    /// Select laptops
    pub async fn click_laptops(&self) -> ProbeResult<()> {
        self.click_category(Category::Laptops).await
    }

    /// Select monitors
    pub async fn click_monitors(&self) -> ProbeResult<()> {
        self.click_category(Category::Monitors).await
    }

    /// Select a category by name and return the titles it shows.
    ///
    /// Unknown names select nothing and give an empty list.
    pub async fn filter_by_category(&self, name: &str) -> ProbeResult<Vec<String>> {
        let Ok(category) = name.parse::<Category>() else {
            tracing::warn!(category = name, "unknown category");
            return Ok(Vec::new());
        };
        self.click_category(category).await?;
        let titles = self.product_titles().await;
        tracing::info!(%category, products = titles.len(), "category filtered");
        Ok(titles)
    }

    // =========================================================================
    // GRID
    // =========================================================================

    /// Non-empty product titles of the current grid page
    pub async fn product_titles(&self) -> Vec<String> {
        if !self
            .actions
            .is_displayed_within(&home::PRODUCTS_CONTAINER, TimeoutTier::Short)
            .await
        {
            tracing::warn!("product grid not visible");
            return Vec::new();
        }
        self.actions.wait_for_spinners_gone().await;
        let _ = self
            .actions
            .waiter()
            .wait_for_element_count(&home::PRODUCT_TITLES, 1, TimeoutTier::Short)
            .await;
        let titles: Vec<String> = self
            .actions
            .texts_of(&home::PRODUCT_TITLES)
            .await
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect();
        if titles.is_empty() {
            let cards = self.actions.count_of(&home::PRODUCT_CARDS).await;
            tracing::warn!(cards, "no product titles found");
        }
        titles
    }

    /// Non-empty price labels of the current grid page
    pub async fn product_prices(&self) -> Vec<String> {
        if !self
            .actions
            .is_displayed_within(&home::PRODUCTS_CONTAINER, TimeoutTier::Short)
            .await
        {
            return Vec::new();
        }
        self.actions
            .texts_of(&home::PRODUCT_PRICES)
            .await
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Number of product cards on the current grid page
    pub async fn product_count(&self) -> usize {
        if !self
            .actions
            .is_displayed_within(&home::PRODUCTS_CONTAINER, TimeoutTier::Short)
            .await
        {
            return 0;
        }
        let count = self.actions.count_of(&home::PRODUCT_CARDS).await;
        tracing::debug!(count, "product cards");
        count
    }

    /// Open a product's detail page
    pub async fn click_product(&self, name: &str) -> ProbeResult<()> {
        tracing::info!(product = name, "opening product");
        let link = home::PRODUCT_LINK_BY_NAME.bind(name);
        self.actions
            .waiter()
            .wait_until_visible(&link, TimeoutTier::Default)
            .await
            .map_err(|e| ProbeError::interaction(link.name(), e))?;
        self.actions.scroll_to(&link).await?;
        self.actions.click(&link).await?;
        self.actions
            .waiter()
            .wait_until_visible(&product::NAME, TimeoutTier::Extended)
            .await
            .map_err(|e| ProbeError::interaction(link.name(), e))?;
        Ok(())
    }

    /// Grid price label of a product, empty when not shown
    pub async fn product_price(&self, name: &str) -> String {
        self.actions
            .text_of(&home::PRODUCT_PRICE_BY_NAME.bind(name))
            .await
    }

    /// Whether a product link is visible on the current grid page
    pub async fn is_product_displayed(&self, name: &str) -> bool {
        self.actions
            .is_displayed(&home::PRODUCT_LINK_BY_NAME.bind(name))
            .await
    }

    /// Titles containing `text`, ignoring case
    pub async fn search(&self, text: &str) -> Vec<String> {
        let matches: Vec<String> = self
            .product_titles()
            .await
            .into_iter()
            .filter(|title| contains_ignore_case(title, text))
            .collect();
        tracing::info!(query = text, matches = matches.len(), "search");
        matches
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Next grid page; `false` when the button is not shown
    pub async fn next_page(&self) -> ProbeResult<bool> {
        self.paginate(&home::NEXT).await
    }

    /// Previous grid page; `false` when the button is not shown
    pub async fn previous_page(&self) -> ProbeResult<bool> {
        self.paginate(&home::PREVIOUS).await
    }

    async fn paginate(&self, button: &Locator) -> ProbeResult<bool> {
        if !self.actions.is_displayed(button).await {
            tracing::warn!(button = button.name(), "pagination button not visible");
            return Ok(false);
        }
        self.actions.click(button).await?;
        self.actions.wait_for_page_ready().await?;
        self.actions.wait_for_spinners_gone().await;
        Ok(true)
    }

    /// Return to the landing page through the nav links, else the base URL
    pub async fn navigate_home(&self) -> ProbeResult<()> {
        match self.actions.click_first_of(&base::GO_HOME, "").await {
            Ok(_) => self.actions.wait_for_page_ready().await,
            Err(e) => {
                tracing::info!(error = %e, "home links not clickable, opening base url");
                self.actions.session().open_home().await
            }
        }
    }

    /// Reload the current page and wait for it to settle
    pub async fn reload(&self) -> ProbeResult<()> {
        tracing::info!("reloading page");
        self.actions.driver().reload().await?;
        self.actions.wait_for_page_ready().await?;
        self.actions.wait_for_spinners_gone().await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::SuiteConfig;
    use crate::mock::{MockDom, MockDriver};

    const PHONES: &[&str] = &["Samsung galaxy s6", "Nokia lumia 1520", "Nexus 6"];
    const LAPTOPS: &[&str] = &["Sony vaio i5", "Sony vaio i7", "MacBook air"];

    fn session_with(driver: &MockDriver) -> Session {
        Session::from_driver(Box::new(driver.clone()), SuiteConfig::new())
    }

    fn show_grid(dom: &mut MockDom, titles: &[&str]) {
        dom.show(&home::PRODUCTS_CONTAINER);
        dom.set_texts(&home::PRODUCT_TITLES, titles);
        dom.set_texts(&home::PRODUCT_CARDS, titles);
        let prices: Vec<String> = (0..titles.len()).map(|i| format!("${}", 360 + i * 10)).collect();
        let prices: Vec<&str> = prices.iter().map(String::as_str).collect();
        dom.set_texts(&home::PRODUCT_PRICES, &prices);
    }

    fn storefront() -> MockDriver {
        let driver = MockDriver::new();
        driver.with_dom(|dom| show_grid(dom, PHONES));
        driver.show(&home::PHONES);
        driver.show(&home::LAPTOPS);
        driver.show(&home::MONITORS);
        driver.on_click(&home::PHONES, |dom| show_grid(dom, PHONES));
        driver.on_click(&home::LAPTOPS, |dom| show_grid(dom, LAPTOPS));
        driver.on_click(&home::MONITORS, |dom| dom.remove(&home::PRODUCT_TITLES));
        driver
    }

    mod category_tests {
        use super::*;

        #[test]
        fn test_parse_ignores_case() {
            assert_eq!("PHONES".parse::<Category>().unwrap(), Category::Phones);
            assert_eq!(" Laptops ".parse::<Category>().unwrap(), Category::Laptops);
            assert!("tablets".parse::<Category>().is_err());
            assert_eq!(Category::Monitors.to_string(), "monitors");
        }

        #[tokio::test(start_paused = true)]
        async fn test_filter_by_category() {
            let driver = storefront();
            let session = session_with(&driver);
            let page = HomePage::new(&session).unwrap();
            let titles = page.filter_by_category("Laptops").await.unwrap();
            assert_eq!(titles, LAPTOPS);
            assert!(driver.was_clicked(&home::LAPTOPS));
        }

        #[tokio::test(start_paused = true)]
        async fn test_unknown_category_is_empty_without_clicking() {
            let driver = storefront();
            let session = session_with(&driver);
            let page = HomePage::new(&session).unwrap();
            assert!(page.filter_by_category("tablets").await.unwrap().is_empty());
            assert!(!driver.was_called("click:"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_empty_grid_gives_no_titles() {
            let driver = storefront();
            let session = session_with(&driver);
            let page = HomePage::new(&session).unwrap();
            assert!(page.filter_by_category("monitors").await.unwrap().is_empty());
        }
    }

    mod grid_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_titles_prices_and_count() {
            let driver = storefront();
            let session = session_with(&driver);
            let page = HomePage::new(&session).unwrap();
            assert_eq!(page.product_titles().await, PHONES);
            assert_eq!(page.product_prices().await, ["$360", "$370", "$380"]);
            assert_eq!(page.product_count().await, 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_hidden_grid_reads_as_empty() {
            let driver = MockDriver::new();
            let session = session_with(&driver);
            let page = HomePage::new(&session).unwrap();
            assert!(page.product_titles().await.is_empty());
            assert!(page.product_prices().await.is_empty());
            assert_eq!(page.product_count().await, 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_search_ignores_case() {
            let driver = storefront();
            let session = session_with(&driver);
            let page = HomePage::new(&session).unwrap();
            assert_eq!(page.search("SAMSUNG").await, ["Samsung galaxy s6"]);
            assert!(page.search("iphone").await.is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_product_scrolls_then_opens_details() {
            let driver = storefront();
            let link = home::PRODUCT_LINK_BY_NAME.bind("Nexus 6");
            driver.show(&link);
            driver.on_click(&link, |dom| dom.set_text(&product::NAME, "Nexus 6"));
            let session = session_with(&driver);
            let page = HomePage::new(&session).unwrap();
            page.click_product("Nexus 6").await.unwrap();
            let history = driver.history();
            let scroll = history.iter().position(|c| c.starts_with("scroll:")).unwrap();
            let click = history.iter().position(|c| c.starts_with("click:")).unwrap();
            assert!(scroll < click);
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_missing_product_fails() {
            let driver = storefront();
            let session = session_with(&driver);
            let page = HomePage::new(&session).unwrap();
            let err = page.click_product("Nokia 3310").await.unwrap_err();
            assert!(matches!(err, ProbeError::InteractionFailed { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_product_price_and_presence() {
            let driver = storefront();
            let link = home::PRODUCT_LINK_BY_NAME.bind("Nexus 6");
            driver.show(&link);
            driver.set_text(&home::PRODUCT_PRICE_BY_NAME.bind("Nexus 6"), "$650");
            let session = session_with(&driver);
            let page = HomePage::new(&session).unwrap();
            assert!(page.is_product_displayed("Nexus 6").await);
            assert_eq!(page.product_price("Nexus 6").await, "$650");
            assert!(!page.is_product_displayed("Nokia 3310").await);
            assert_eq!(page.product_price("Nokia 3310").await, "");
        }
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_pagination_without_buttons() {
            let driver = storefront();
            let session = session_with(&driver);
            let page = HomePage::new(&session).unwrap();
            assert!(!page.next_page().await.unwrap());
            assert!(!page.previous_page().await.unwrap());
        }

        #[tokio::test(start_paused = true)]
        async fn test_next_page_reloads_grid() {
            let driver = storefront();
            driver.show(&home::NEXT);
            driver.on_click(&home::NEXT, |dom| show_grid(dom, LAPTOPS));
            let session = session_with(&driver);
            let page = HomePage::new(&session).unwrap();
            assert!(page.next_page().await.unwrap());
            assert_eq!(page.product_titles().await, LAPTOPS);
        }

        #[tokio::test(start_paused = true)]
        async fn test_navigate_home_prefers_nav_link() {
            let driver = storefront();
            driver.show(&base::HOME_LINK);
            let session = session_with(&driver);
            HomePage::new(&session).unwrap().navigate_home().await.unwrap();
            assert!(driver.was_clicked(&base::HOME_LINK));
            assert!(!driver.was_called("navigate:"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_navigate_home_falls_back_to_base_url() {
            let driver = storefront();
            let session = session_with(&driver);
            HomePage::new(&session).unwrap().navigate_home().await.unwrap();
            assert_eq!(
                driver.history().last().map(String::as_str),
                Some("navigate:https://www.demoblaze.com")
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_reload() {
            let driver = storefront();
            let session = session_with(&driver);
            HomePage::new(&session).unwrap().reload().await.unwrap();
            assert!(driver.was_called("reload"));
        }
    }
}
