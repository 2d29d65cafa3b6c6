//! Scenario catalogue.
//!
//! Scenarios are grouped by [`Suite`]. Each one gets its own [`Session`] and a
//! shared [`ScenarioContext`] holding the fixture data and the product cache.
//! The cache only shortens setup: every scenario passes with it empty.

use crate::cache::ProductCache;
use crate::fixture::{Credentials, TestData};
use crate::locators::home as grid;
use crate::pages::{
    contains_ignore_case, CartPage, Category, CheckoutPage, CheckoutState, HomePage, LoginPage,
    ProductPage,
};
use crate::price::prices_match;
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Categories tried after the primary one, in order
pub const FALLBACK_CATEGORIES: [Category; 3] =
    [Category::Laptops, Category::Phones, Category::Monitors];

/// Terms used by the varied search scenario
pub const SEARCH_TERMS: [&str; 4] = ["Samsung", "Sony", "Apple", "Nokia"];

// =============================================================================
// SUITES
// =============================================================================

/// Group of related scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suite {
    /// Registration, log-in, log-out
    Login,
    /// Grid, categories, search, detail page
    Product,
    /// Cart contents and totals
    Cart,
    /// Order modal and confirmation
    Checkout,
}

impl Suite {
    /// Every suite in run order
    pub const ALL: [Self; 4] = [Self::Login, Self::Product, Self::Cart, Self::Checkout];

    /// Lower-case name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Product => "product",
            Self::Cart => "cart",
            Self::Checkout => "checkout",
        }
    }

    /// Report epic label
    #[must_use]
    pub const fn epic(&self) -> &'static str {
        match self {
            Self::Login => "User Management",
            Self::Product => "Product Management",
            Self::Cart | Self::Checkout => "E-commerce",
        }
    }

    /// Report feature label
    #[must_use]
    pub const fn feature(&self) -> &'static str {
        match self {
            Self::Login => "Login and Registration",
            Self::Product => "Product Search and Filter",
            Self::Cart => "Shopping Cart Management",
            Self::Checkout => "Checkout Process",
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Suite {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|suite| suite.as_str() == wanted)
            .ok_or_else(|| ProbeError::Config {
                message: format!("unknown suite '{s}' (expected login, product, cart or checkout)"),
            })
    }
}

/// Report severity label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Core purchase path
    Critical,
    /// Regular behaviour
    Normal,
    /// Cosmetic or edge behaviour
    Minor,
}

impl Severity {
    /// Lower-case name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Normal => "normal",
            Self::Minor => "minor",
        }
    }
}

// =============================================================================
// SCENARIOS
// =============================================================================

/// State shared by every scenario of a run
#[derive(Debug, Default)]
pub struct ScenarioContext {
    /// Fixture data, read-only
    pub data: TestData,
    /// Last known-good product per category
    pub cache: ProductCache,
}

impl ScenarioContext {
    /// Context over loaded fixture data with an empty cache
    #[must_use]
    pub fn new(data: TestData) -> Self {
        Self {
            data,
            cache: ProductCache::new(),
        }
    }
}

/// Scenario body
pub type ScenarioFn =
    for<'s> fn(&'s Session, Arc<ScenarioContext>) -> BoxFuture<'s, ProbeResult<()>>;

/// One catalogued scenario
#[derive(Clone, Copy)]
pub struct Scenario {
    /// Owning suite
    pub suite: Suite,
    /// Unique snake_case name
    pub name: &'static str,
    /// Report story label
    pub story: &'static str,
    /// What the scenario checks
    pub description: &'static str,
    /// Report severity
    pub severity: Severity,
    body: ScenarioFn,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("suite", &self.suite)
            .field("name", &self.name)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    /// Describe a scenario
    #[must_use]
    pub const fn new(
        suite: Suite,
        name: &'static str,
        story: &'static str,
        description: &'static str,
        severity: Severity,
        body: ScenarioFn,
    ) -> Self {
        Self {
            suite,
            name,
            story,
            description,
            severity,
            body,
        }
    }

    /// `<suite>::<name>`
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}::{}", self.suite, self.name)
    }

    /// Whether the id contains `filter`, ignoring case
    #[must_use]
    pub fn matches(&self, filter: &str) -> bool {
        contains_ignore_case(&self.id(), filter)
    }

    /// Run the body in `session`
    pub fn run<'s>(
        &self,
        session: &'s Session,
        ctx: Arc<ScenarioContext>,
    ) -> BoxFuture<'s, ProbeResult<()>> {
        (self.body)(session, ctx)
    }
}

static CATALOGUE: [Scenario; 23] = [
    // login
    Scenario::new(
        Suite::Login,
        "user_registration",
        "User Registration",
        "A new user can register and then log in",
        Severity::Critical,
        user_registration,
    ),
    Scenario::new(
        Suite::Login,
        "valid_user_login",
        "User Login",
        "Correct credentials log in and land on the home page",
        Severity::Critical,
        valid_user_login,
    ),
    Scenario::new(
        Suite::Login,
        "user_logout",
        "User Management",
        "Logging out removes the greeting",
        Severity::Normal,
        user_logout,
    ),
    // product
    Scenario::new(
        Suite::Product,
        "product_search",
        "Product Search",
        "Searching the grid returns only matching products",
        Severity::Critical,
        product_search,
    ),
    Scenario::new(
        Suite::Product,
        "product_category_filter",
        "Product Filter",
        "Each category shows its own products",
        Severity::Critical,
        product_category_filter,
    ),
    Scenario::new(
        Suite::Product,
        "product_details_display",
        "Product Display",
        "Grid cards show a price with a currency symbol",
        Severity::Normal,
        product_details_display,
    ),
    Scenario::new(
        Suite::Product,
        "product_detail_navigation",
        "Product Navigation",
        "A product opens its detail page with name, price and add-to-cart",
        Severity::Normal,
        product_detail_navigation,
    ),
    Scenario::new(
        Suite::Product,
        "product_count_per_category",
        "Product Search",
        "Every category has at least one product",
        Severity::Minor,
        product_count_per_category,
    ),
    Scenario::new(
        Suite::Product,
        "multiple_category_filtering",
        "Product Filter",
        "Category counts are stable when revisited and differ between categories",
        Severity::Normal,
        multiple_category_filtering,
    ),
    Scenario::new(
        Suite::Product,
        "various_search_terms",
        "Product Search",
        "Search results contain the term for several brands",
        Severity::Normal,
        various_search_terms,
    ),
    // cart
    Scenario::new(
        Suite::Cart,
        "add_product_to_cart",
        "Add to Cart",
        "An added product shows up in the cart with a non-zero total",
        Severity::Critical,
        add_product_to_cart,
    ),
    Scenario::new(
        Suite::Cart,
        "remove_product_from_cart",
        "Remove from Cart",
        "Removing a product shrinks the cart",
        Severity::Critical,
        remove_product_from_cart,
    ),
    Scenario::new(
        Suite::Cart,
        "add_multiple_products",
        "Cart Management",
        "Products from two categories end up in the cart together",
        Severity::Normal,
        add_multiple_products,
    ),
    Scenario::new(
        Suite::Cart,
        "cart_total_calculation",
        "Cart Management",
        "The cart total is the sum of the product prices",
        Severity::Normal,
        cart_total_calculation,
    ),
    Scenario::new(
        Suite::Cart,
        "cart_persistence_during_navigation",
        "Cart Management",
        "Cart contents survive browsing other categories",
        Severity::Normal,
        cart_persistence_during_navigation,
    ),
    Scenario::new(
        Suite::Cart,
        "empty_cart_state",
        "Cart Management",
        "A cleared cart has no rows and a zero total",
        Severity::Minor,
        empty_cart_state,
    ),
    Scenario::new(
        Suite::Cart,
        "cart_item_details",
        "Cart Management",
        "Cart rows show the product name and price",
        Severity::Minor,
        cart_item_details,
    ),
    // checkout
    Scenario::new(
        Suite::Checkout,
        "complete_checkout",
        "Checkout Process",
        "A filled order form completes the purchase with a confirmation",
        Severity::Critical,
        complete_checkout,
    ),
    Scenario::new(
        Suite::Checkout,
        "checkout_multiple_products",
        "Checkout Process",
        "An order with products from two categories completes",
        Severity::Normal,
        checkout_multiple_products,
    ),
    Scenario::new(
        Suite::Checkout,
        "checkout_form_validation",
        "Checkout Process",
        "Incomplete order forms do not complete the purchase",
        Severity::Normal,
        checkout_form_validation,
    ),
    Scenario::new(
        Suite::Checkout,
        "checkout_modal_functionality",
        "Checkout Process",
        "The order modal opens with a total and closes again",
        Severity::Minor,
        checkout_modal_functionality,
    ),
    Scenario::new(
        Suite::Checkout,
        "order_confirmation_details",
        "Checkout Process",
        "The confirmation carries a numeric order id",
        Severity::Normal,
        order_confirmation_details,
    ),
    Scenario::new(
        Suite::Checkout,
        "checkout_from_empty_cart",
        "Checkout Process",
        "Placing an order from an empty cart never completes a purchase",
        Severity::Minor,
        checkout_from_empty_cart,
    ),
];

/// Every scenario, grouped by suite
#[must_use]
pub fn catalogue() -> &'static [Scenario] {
    &CATALOGUE
}

/// Scenarios of one suite
pub fn suite(suite: Suite) -> impl Iterator<Item = &'static Scenario> {
    CATALOGUE.iter().filter(move |s| s.suite == suite)
}

/// Scenario by exact name
#[must_use]
pub fn find(name: &str) -> Option<&'static Scenario> {
    CATALOGUE.iter().find(|s| s.name == name)
}

// =============================================================================
// HELPERS
// =============================================================================

fn check(
    condition: bool,
    message: &str,
    expected: impl ToString,
    actual: impl ToString,
) -> ProbeResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ProbeError::assertion(message, expected, actual))
    }
}

fn check_eq<T: PartialEq + fmt::Debug>(message: &str, expected: T, actual: T) -> ProbeResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ProbeError::assertion(
            message,
            format!("{expected:?}"),
            format!("{actual:?}"),
        ))
    }
}

fn non_empty(message: &str, value: &str) -> ProbeResult<()> {
    check(!value.is_empty(), message, "non-empty", "\"\"")
}

/// Product chosen by [`product_with_fallback`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedProduct {
    /// Category whose grid shows the product
    pub category: Category,
    /// Product title
    pub name: String,
    /// Served from the cache
    pub from_cache: bool,
}

async fn first_product_in(home: &HomePage<'_>, category: Category) -> ProbeResult<Option<String>> {
    home.navigate_home().await?;
    home.click_category(category).await?;
    Ok(home.product_titles().await.into_iter().next())
}

/// Find a product to work with, leaving the grid on its category.
///
/// Order: the cached product of `primary` if still displayed, the first
/// product of `primary`, the first product of each of `fallbacks`, and
/// finally `primary` again after a reload. A stale cache entry is dropped
/// and every product found is cached for its category.
pub async fn product_with_fallback(
    home: &HomePage<'_>,
    cache: &ProductCache,
    primary: Category,
    fallbacks: &[Category],
) -> ProbeResult<PickedProduct> {
    if let Some(cached) = cache.get(primary.as_str()) {
        home.navigate_home().await?;
        home.click_category(primary).await?;
        if home.is_product_displayed(&cached).await {
            tracing::debug!(category = %primary, product = %cached, "using cached product");
            return Ok(PickedProduct {
                category: primary,
                name: cached,
                from_cache: true,
            });
        }
        tracing::info!(category = %primary, product = %cached, "cached product not displayed");
        cache.invalidate(primary.as_str());
    }

    let order = std::iter::once(primary).chain(fallbacks.iter().copied().filter(|c| *c != primary));
    for category in order {
        match first_product_in(home, category).await {
            Ok(Some(name)) => {
                if category != primary {
                    tracing::warn!(%primary, fallback = %category, "using fallback category");
                }
                cache.store(category.as_str(), &name);
                return Ok(PickedProduct {
                    category,
                    name,
                    from_cache: false,
                });
            }
            Ok(None) => tracing::warn!(%category, "no products in category"),
            Err(e) => tracing::warn!(%category, error = %e, "category navigation failed"),
        }
    }

    tracing::error!(%primary, "all categories empty, reloading");
    home.reload().await?;
    home.click_category(primary).await?;
    match home.product_titles().await.into_iter().next() {
        Some(name) => {
            cache.store(primary.as_str(), &name);
            Ok(PickedProduct {
                category: primary,
                name,
                from_cache: false,
            })
        }
        None => Err(ProbeError::interaction(
            grid::PRODUCT_TITLES.name(),
            "no products in any category",
        )),
    }
}

struct AddedProduct {
    name: String,
    price: f64,
}

/// Pick a product of `category`, open it and add it to the cart
async fn add_product(
    session: &Session,
    ctx: &ScenarioContext,
    category: Category,
) -> ProbeResult<AddedProduct> {
    let home = HomePage::new(session)?;
    let picked = product_with_fallback(&home, &ctx.cache, category, &FALLBACK_CATEGORIES).await?;
    if let Err(e) = home.click_product(&picked.name).await {
        ctx.cache.invalidate(picked.category.as_str());
        return Err(e);
    }
    let page = ProductPage::new(session)?;
    let price = page.price_value().await;
    page.add_to_cart().await?;
    Ok(AddedProduct {
        name: picked.name,
        price,
    })
}

async fn log_in(login: &LoginPage<'_>, user: &Credentials) -> ProbeResult<()> {
    let outcome = login.login(&user.username, &user.password).await?;
    check(outcome.is_logged_in(), "user logged in", "LoggedIn", format!("{outcome:?}"))?;
    check_eq(
        "displayed username",
        user.username.as_str(),
        login.logged_in_username().await.as_str(),
    )
}

async fn register(login: &LoginPage<'_>, user: &Credentials) -> ProbeResult<()> {
    let outcome = login.register(&user.username, &user.password).await?;
    check(outcome.is_registered(), "registration accepted", "Registered", format!("{outcome:?}"))
}

fn confirmed_order(state: CheckoutState) -> ProbeResult<crate::OrderConfirmation> {
    match state {
        CheckoutState::Confirmed(order) => Ok(order),
        other => Err(ProbeError::assertion("order confirmed", "Confirmed", other)),
    }
}

async fn dismiss_confirmation(checkout: &CheckoutPage<'_>) {
    if let Err(e) = checkout.confirm_ok().await {
        tracing::warn!(error = %e, "could not dismiss confirmation");
    }
}

// =============================================================================
// LOGIN SUITE
// =============================================================================

fn user_registration(session: &Session, _ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let user = Credentials::generate();
        let login = LoginPage::new(session)?;
        register(&login, &user).await?;
        log_in(&login, &user).await
    })
}

fn valid_user_login(session: &Session, _ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let user = Credentials::generate();
        let login = LoginPage::new(session)?;
        register(&login, &user).await?;
        if login.is_user_logged_in().await {
            login.logout().await?;
        }
        log_in(&login, &user).await?;
        let title = session.driver().title().await?;
        check(contains_ignore_case(&title, "STORE"), "home page title", "STORE", title)
    })
}

fn user_logout(session: &Session, _ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let user = Credentials::generate();
        let login = LoginPage::new(session)?;
        register(&login, &user).await?;
        log_in(&login, &user).await?;
        login.logout().await?;
        check(!login.is_user_logged_in().await, "greeting gone after logout", false, true)
    })
}

// =============================================================================
// PRODUCT SUITE
// =============================================================================

fn product_search(session: &Session, _ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let home = HomePage::new(session)?;
        let all = home.product_titles().await;
        check(!all.is_empty(), "products on the home page", "at least one", 0)?;
        let matches = home.search("Samsung").await;
        check(!matches.is_empty(), "search results for Samsung", "at least one", 0)?;
        for title in &matches {
            check(contains_ignore_case(title, "samsung"), "result contains Samsung", "Samsung", title)?;
        }
        tracing::info!(?matches, "search verified");
        Ok(())
    })
}

fn product_category_filter(session: &Session, _ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let home = HomePage::new(session)?;
        home.click_phones().await?;
        let phones = home.product_titles().await;
        home.click_laptops().await?;
        let laptops = home.product_titles().await;
        home.click_monitors().await?;
        let monitors = home.product_titles().await;
        for (category, titles) in [("phones", &phones), ("laptops", &laptops), ("monitors", &monitors)] {
            check(!titles.is_empty(), &format!("{category} show products"), "at least one", 0)?;
        }
        check(phones != laptops, "phones differ from laptops", "different lists", format!("{phones:?}"))?;
        check(laptops != monitors, "laptops differ from monitors", "different lists", format!("{laptops:?}"))
    })
}

fn product_details_display(session: &Session, _ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let home = HomePage::new(session)?;
        home.click_phones().await?;
        let Some(first) = home.product_titles().await.into_iter().next() else {
            return Err(ProbeError::assertion("phones to inspect", "at least one", 0));
        };
        let price = home.product_price(&first).await;
        non_empty(&format!("grid price of {first}"), &price)?;
        check(price.contains('$'), "price has a currency symbol", "$", &price)?;
        check(home.is_product_displayed(&first).await, "product link displayed", true, false)
    })
}

fn product_detail_navigation(session: &Session, ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let home = HomePage::new(session)?;
        home.click_phones().await?;
        let wanted = ctx.data.random_product("phones");
        let product = if !wanted.is_empty() && home.is_product_displayed(&wanted).await {
            wanted
        } else {
            match home.product_titles().await.into_iter().next() {
                Some(first) => first,
                None => return Err(ProbeError::assertion("phones available", "at least one", 0)),
            }
        };
        home.click_product(&product).await?;
        let page = ProductPage::new(session)?;
        non_empty("product name on detail page", &page.name().await)?;
        non_empty("product price on detail page", &page.price().await)?;
        check(page.is_add_to_cart_visible().await, "add to cart visible", true, false)
    })
}

fn product_count_per_category(session: &Session, _ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let home = HomePage::new(session)?;
        for category in Category::ALL {
            let titles = home.filter_by_category(category.as_str()).await?;
            check(!titles.is_empty(), &format!("{category} has products"), "at least one", 0)?;
            let count = home.product_count().await;
            check(count > 0, &format!("{category} card count"), "> 0", count)?;
            tracing::info!(%category, count, "category counted");
        }
        Ok(())
    })
}

fn multiple_category_filtering(session: &Session, _ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let home = HomePage::new(session)?;
        home.click_phones().await?;
        let phones = home.product_count().await;
        home.click_laptops().await?;
        let laptops = home.product_count().await;
        home.click_monitors().await?;
        let monitors = home.product_count().await;
        home.click_phones().await?;
        let phones_again = home.product_count().await;
        tracing::info!(phones, laptops, monitors, "category counts");
        check_eq("phones count when revisited", phones, phones_again)?;
        check(
            phones != laptops || laptops != monitors || phones != monitors,
            "categories differ in size",
            "at least one different count",
            format!("{phones}/{laptops}/{monitors}"),
        )
    })
}

fn various_search_terms(session: &Session, _ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let home = HomePage::new(session)?;
        for term in SEARCH_TERMS {
            let matches = home.search(term).await;
            for title in &matches {
                check(contains_ignore_case(title, term), &format!("result for {term}"), term, title)?;
            }
        }
        Ok(())
    })
}

// =============================================================================
// CART SUITE
// =============================================================================

fn add_product_to_cart(session: &Session, ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let added = add_product(session, &ctx, Category::Phones).await?;
        let cart = CartPage::new(session)?;
        cart.open().await?;
        check(cart.is_item_in_cart(&added.name).await, "product in cart", &added.name, "missing")?;
        check_eq("row count", 1, cart.item_count().await)?;
        let total = cart.total().await;
        check(prices_match(total, added.price), "cart total equals product price", added.price, total)?;
        tracing::info!(product = %added.name, total, "product added to cart");
        Ok(())
    })
}

fn remove_product_from_cart(session: &Session, ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let added = add_product(session, &ctx, Category::Phones).await?;
        let cart = CartPage::new(session)?;
        cart.open().await?;
        check(cart.is_item_in_cart(&added.name).await, "product in cart before removal", &added.name, "missing")?;
        check_eq("row count before removal", 1, cart.item_count().await)?;
        cart.remove_item(&added.name).await?;
        check_eq("row count after removal", 0, cart.item_count().await)?;
        check(cart.is_cart_empty().await, "cart empty after removal", true, false)
    })
}

fn add_multiple_products(session: &Session, ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let phone = add_product(session, &ctx, Category::Phones).await?;
        HomePage::new(session)?.navigate_home().await?;
        let laptop = add_product(session, &ctx, Category::Laptops).await?;
        let cart = CartPage::new(session)?;
        cart.open().await?;
        for name in [&phone.name, &laptop.name] {
            check(cart.is_item_in_cart(name).await, "product in cart", name, "missing")?;
        }
        let count = cart.item_count().await;
        check(count >= 2, "cart holds both products", ">= 2", count)
    })
}

fn cart_total_calculation(session: &Session, ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let cart = CartPage::new(session)?;
        cart.open().await?;
        cart.clear_cart().await?;

        let first = add_product(session, &ctx, Category::Phones).await?;
        cart.open().await?;
        let total = cart.total().await;
        check(prices_match(total, first.price), "total after first product", first.price, total)?;

        let second = add_product(session, &ctx, Category::Laptops).await?;
        cart.open().await?;
        let expected = first.price + second.price;
        let total = cart.total().await;
        check(prices_match(total, expected), "total after second product", expected, total)?;
        let rows = cart.sum_of_item_prices().await;
        check(cart.verify_total(rows).await, "total equals sum of rows", rows, total)
    })
}

fn cart_persistence_during_navigation(session: &Session, ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let added = add_product(session, &ctx, Category::Phones).await?;
        let home = HomePage::new(session)?;
        for category in [Category::Laptops, Category::Monitors] {
            if let Err(e) =
                product_with_fallback(&home, &ctx.cache, category, &FALLBACK_CATEGORIES).await
            {
                tracing::warn!(%category, error = %e, "browsing failed during persistence check");
            }
        }
        let cart = CartPage::new(session)?;
        cart.open().await?;
        check(cart.is_item_in_cart(&added.name).await, "product persisted", &added.name, "missing")?;
        let count = cart.item_count().await;
        check(count > 0, "cart keeps its rows", "> 0", count)
    })
}

fn empty_cart_state(session: &Session, _ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let cart = CartPage::new(session)?;
        cart.open().await?;
        cart.clear_cart().await?;
        check(cart.is_cart_empty().await, "cart empty after clearing", true, false)?;
        check_eq("row count", 0, cart.item_count().await)?;
        let total = cart.total().await;
        check(prices_match(total, 0.0), "empty cart total", 0.0, total)
    })
}

fn cart_item_details(session: &Session, ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let added = add_product(session, &ctx, Category::Phones).await?;
        let cart = CartPage::new(session)?;
        cart.open().await?;
        check(cart.is_item_in_cart(&added.name).await, "product name in cart", &added.name, "missing")?;
        let price = cart.item_price(&added.name).await;
        non_empty("row price", &price)?;
        tracing::info!(product = %added.name, %price, "cart row verified");
        Ok(())
    })
}

// =============================================================================
// CHECKOUT SUITE
// =============================================================================

fn complete_checkout(session: &Session, ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let added = add_product(session, &ctx, Category::Phones).await?;
        let cart = CartPage::new(session)?;
        cart.open().await?;
        check(cart.is_item_in_cart(&added.name).await, "product in cart before checkout", &added.name, "missing")?;
        non_empty("cart total", &cart.total_text().await)?;
        cart.click_place_order().await?;
        let checkout = CheckoutPage::new(session)?;
        check(checkout.is_order_modal_displayed().await, "order modal open", true, false)?;

        let state = checkout.complete_purchase(&ctx.data.customer_info()).await?;
        let order = confirmed_order(state)?;
        check(checkout.verify_order_completion().await, "order completed", true, false)?;
        tracing::info!(id = %order.id, amount = %order.amount, date = %order.date, "order placed");
        dismiss_confirmation(&checkout).await;
        Ok(())
    })
}

fn checkout_multiple_products(session: &Session, ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        add_product(session, &ctx, Category::Phones).await?;
        add_product(session, &ctx, Category::Laptops).await?;
        let cart = CartPage::new(session)?;
        cart.open().await?;
        let count = cart.item_count().await;
        check(count >= 2, "cart holds both products", ">= 2", count)?;
        let total = cart.total().await;
        check(total > 0.0, "cart total positive", "> 0", total)?;

        cart.click_place_order().await?;
        let checkout = CheckoutPage::new(session)?;
        non_empty("order total in modal", &checkout.order_total_text().await)?;
        let state = checkout.complete_purchase(&ctx.data.customer_info()).await?;
        confirmed_order(state)?;
        check(checkout.verify_order_completion().await, "multi-product order completed", true, false)?;
        checkout.confirm_ok().await
    })
}

fn checkout_form_validation(session: &Session, ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        add_product(session, &ctx, Category::Phones).await?;
        let cart = CartPage::new(session)?;
        cart.open().await?;
        cart.click_place_order().await?;
        let checkout = CheckoutPage::new(session)?;
        check(checkout.is_order_modal_displayed().await, "order modal open", true, false)?;

        let alert = checkout.try_purchase().await?;
        tracing::info!(?alert, "empty form submitted");
        check(checkout.is_order_modal_displayed().await, "modal stays open for an empty form", true, false)?;

        checkout.enter_name("Test User").await?;
        checkout.enter_country("Test Country").await?;
        let alert = checkout.try_purchase().await?;
        tracing::info!(?alert, "partial form submitted");
        check(!checkout.is_confirmation_displayed().await, "partial form not confirmed", false, true)?;

        checkout.close_order_modal().await
    })
}

fn checkout_modal_functionality(session: &Session, ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        add_product(session, &ctx, Category::Phones).await?;
        let cart = CartPage::new(session)?;
        cart.open().await?;
        cart.click_place_order().await?;
        let checkout = CheckoutPage::new(session)?;
        check(checkout.is_order_modal_displayed().await, "order modal open", true, false)?;
        non_empty("order total in modal", &checkout.order_total_text().await)?;
        checkout.close_order_modal().await?;
        check(!checkout.is_order_modal_displayed().await, "order modal closed", false, true)
    })
}

fn order_confirmation_details(session: &Session, ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        add_product(session, &ctx, Category::Phones).await?;
        let cart = CartPage::new(session)?;
        cart.open().await?;
        cart.click_place_order().await?;
        let checkout = CheckoutPage::new(session)?;
        let state = checkout.complete_purchase(&ctx.data.customer_info()).await?;
        let order = confirmed_order(state)?;
        check(checkout.verify_order_completion().await, "order completed", true, false)?;
        if order.has_id() {
            check(
                order.id.chars().all(|c| c.is_ascii_digit()),
                "order id is numeric",
                "digits",
                &order.id,
            )?;
        }
        tracing::info!(
            id = %order.id,
            amount = %order.amount,
            date = %order.date,
            "order confirmation details"
        );
        dismiss_confirmation(&checkout).await;
        Ok(())
    })
}

fn checkout_from_empty_cart(session: &Session, _ctx: Arc<ScenarioContext>) -> BoxFuture<'_, ProbeResult<()>> {
    Box::pin(async move {
        let cart = CartPage::new(session)?;
        cart.open().await?;
        cart.clear_cart().await?;
        check(cart.is_cart_empty().await, "cart empty", true, false)?;
        match cart.click_place_order().await {
            Ok(()) => {
                let checkout = CheckoutPage::new(session)?;
                if checkout.is_order_modal_displayed().await {
                    let total = checkout.order_total_text().await;
                    tracing::info!(%total, "order modal for empty cart");
                    checkout.close_order_modal().await?;
                }
            }
            Err(e) => tracing::info!(error = %e, "place order unavailable for an empty cart"),
        }
        Ok(())
    })
}
