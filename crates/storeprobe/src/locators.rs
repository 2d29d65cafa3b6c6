//! Locator tables for the demoblaze storefront, one module per page.
//!
//! Fallback chains live next to the page they serve and are ordered from the
//! strictest expression to the loosest.

#![allow(missing_docs)]

use crate::locator::{FallbackChain, Locator, LocatorTemplate};

/// Navigation bar and elements shared by every page
pub mod base {
    use super::{FallbackChain, Locator, LocatorTemplate};

    pub const HOME_LINK: Locator =
        Locator::xpath("HOME_LINK", "//a[@class='nav-link' and text()='Home']");
    pub const CART_LINK: Locator = Locator::xpath("CART_LINK", "//a[@id='cartur']");
    pub const LOGIN_LINK: Locator = Locator::xpath("LOGIN_LINK", "//a[@id='login2']");
    pub const SIGN_UP_LINK: Locator = Locator::xpath("SIGN_UP_LINK", "//a[@id='signin2']");
    pub const LOGOUT_LINK: Locator = Locator::xpath("LOGOUT_LINK", "//a[@id='logout2']");
    pub const LOGGED_USER: Locator = Locator::xpath("LOGGED_USER", "//a[@id='nameofuser']");
    pub const MODAL_CLOSE_X: Locator = Locator::xpath("MODAL_CLOSE_X", "//button[@class='close']");
    pub const LOGO: Locator = Locator::xpath("LOGO", "//a[@class='navbar-brand']");
    pub const LOADING_INDICATORS: Locator = Locator::css(
        "LOADING_INDICATORS",
        ".spinner, .loading, .loader, [class*='loading'], [class*='spinner']",
    );

    pub const OPEN_CART: FallbackChain = FallbackChain {
        operation: "open cart",
        candidates: &[
            LocatorTemplate::xpath("CART_LINK", "//a[@id='cartur']"),
            LocatorTemplate::xpath("CART_NAV_ITEM", "//*[@id='navbarExample']/ul/li[4]"),
            LocatorTemplate::xpath("CART_TEXT_LINK", "//a[contains(text(),'Cart')]"),
        ],
    };

    pub const GO_HOME: FallbackChain = FallbackChain {
        operation: "navigate home",
        candidates: &[
            LocatorTemplate::xpath("HOME_LINK", "//a[@class='nav-link' and text()='Home']"),
            LocatorTemplate::xpath(
                "HOME_NAV_LINK",
                "//a[contains(@class,'nav-link') and contains(text(),'Home')]",
            ),
            LocatorTemplate::xpath("HOME_TEXT_LINK", "//a[text()='Home']"),
            LocatorTemplate::xpath("HOME_INDEX_LINK", "//a[@href='index.html']"),
            LocatorTemplate::xpath("LOGO", "//a[@class='navbar-brand']"),
        ],
    };
}

/// Sign-up and log-in modals
pub mod login {
    use super::Locator;

    pub const SIGNUP_MODAL: Locator = Locator::xpath("SIGNUP_MODAL", "//div[@id='signInModal']");
    pub const SIGNUP_USERNAME: Locator =
        Locator::xpath("SIGNUP_USERNAME", "//input[@id='sign-username']");
    pub const SIGNUP_PASSWORD: Locator =
        Locator::xpath("SIGNUP_PASSWORD", "//input[@id='sign-password']");
    pub const SIGNUP_BUTTON: Locator =
        Locator::xpath("SIGNUP_BUTTON", "//button[@onclick='register()']");
    pub const SIGNUP_CLOSE: Locator = Locator::xpath(
        "SIGNUP_CLOSE",
        "//div[@id='signInModal']//button[@class='close']",
    );

    pub const LOGIN_MODAL: Locator = Locator::xpath("LOGIN_MODAL", "//div[@id='logInModal']");
    pub const LOGIN_USERNAME: Locator =
        Locator::xpath("LOGIN_USERNAME", "//input[@id='loginusername']");
    pub const LOGIN_PASSWORD: Locator =
        Locator::xpath("LOGIN_PASSWORD", "//input[@id='loginpassword']");
    pub const LOGIN_BUTTON: Locator = Locator::xpath("LOGIN_BUTTON", "//button[@onclick='logIn()']");
    pub const LOGIN_CLOSE: Locator = Locator::xpath(
        "LOGIN_CLOSE",
        "//div[@id='logInModal']//button[@class='close']",
    );
}

/// Product grid, categories and pagination
pub mod home {
    use super::{Locator, LocatorTemplate};

    pub const PHONES: Locator = Locator::xpath("PHONES", "//a[@onclick=\"byCat('phone')\"]");
    pub const LAPTOPS: Locator = Locator::xpath("LAPTOPS", "//a[@onclick=\"byCat('notebook')\"]");
    pub const MONITORS: Locator = Locator::xpath("MONITORS", "//a[@onclick=\"byCat('monitor')\"]");

    pub const PRODUCTS_CONTAINER: Locator =
        Locator::xpath("PRODUCTS_CONTAINER", "//div[@id='tbodyid']");
    pub const PRODUCT_CARDS: Locator = Locator::xpath("PRODUCT_CARDS", "//div[@class='card h-100']");
    pub const PRODUCT_TITLES: Locator =
        Locator::xpath("PRODUCT_TITLES", "//h4[@class='card-title']//a");
    pub const PRODUCT_PRICES: Locator =
        Locator::xpath("PRODUCT_PRICES", "//h5[contains(text(),'$')]");

    pub const PRODUCT_LINK_BY_NAME: LocatorTemplate =
        LocatorTemplate::xpath("PRODUCT_LINK", "//a[contains(text(),%s)]");
    pub const PRODUCT_PRICE_BY_NAME: LocatorTemplate = LocatorTemplate::xpath(
        "PRODUCT_PRICE",
        "//a[contains(text(),%s)]/ancestor::div[@class='card-block']//h5",
    );

    pub const NEXT: Locator = Locator::xpath("NEXT", "//button[@id='next2']");
    pub const PREVIOUS: Locator = Locator::xpath("PREVIOUS", "//button[@id='prev2']");
}

/// Product detail page
pub mod product {
    use super::Locator;

    pub const NAME: Locator = Locator::xpath("PRODUCT_NAME", "//h2[@class='name']");
    pub const PRICE: Locator = Locator::xpath("PRODUCT_PRICE", "//h3[@class='price-container']");
    pub const IMAGE: Locator = Locator::xpath("PRODUCT_IMAGE", "//img[@class='img-fluid']");
    pub const DESCRIPTION: Locator =
        Locator::xpath("PRODUCT_DESCRIPTION", "//div[@id='more-information']//p");
    pub const ADD_TO_CART: Locator = Locator::xpath(
        "ADD_TO_CART",
        "//a[@onclick='addToCart(1)' or contains(@onclick,'addToCart')]",
    );
    pub const HOME_BREADCRUMB: Locator = Locator::xpath("HOME_BREADCRUMB", "//a[text()='Home']");
}

/// Cart table and order trigger
pub mod cart {
    use super::{FallbackChain, Locator, LocatorTemplate};

    pub const ITEMS: Locator = Locator::xpath("CART_ITEMS", "//tbody[@id='tbodyid']//tr");
    pub const ITEM_TITLES: Locator =
        Locator::xpath("CART_ITEM_TITLES", "//tbody[@id='tbodyid']//tr/td[2]");
    pub const ITEM_PRICES: Locator =
        Locator::xpath("CART_ITEM_PRICES", "//tbody[@id='tbodyid']//tr/td[3]");
    pub const TOTAL: Locator = Locator::xpath("CART_TOTAL", "//h3[@id='totalp']");
    pub const PLACE_ORDER: Locator = Locator::xpath(
        "PLACE_ORDER",
        "//button[@class='btn btn-success' and text()='Place Order']",
    );

    pub const ITEM_ROW_BY_NAME: LocatorTemplate =
        LocatorTemplate::xpath("CART_ROW", "//td[contains(text(),%s)]/parent::tr");
    pub const ITEM_PRICE_BY_NAME: LocatorTemplate = LocatorTemplate::xpath(
        "CART_ROW_PRICE",
        "//td[contains(text(),%s)]/following-sibling::td[1]",
    );

    pub const REMOVE_ITEM: FallbackChain = FallbackChain {
        operation: "remove cart item",
        candidates: &[
            LocatorTemplate::xpath(
                "DELETE_BY_NAME",
                "//td[contains(text(),%s)]/following-sibling::td//a[text()='Delete']",
            ),
            LocatorTemplate::xpath(
                "DELETE_SIBLING_CONTAINS",
                "//td[contains(text(),%s)]/following-sibling::td//a[contains(text(),'Delete')]",
            ),
            LocatorTemplate::xpath(
                "DELETE_IN_ROW",
                "//tr[td[contains(text(),%s)]]//a[contains(text(),'Delete')]",
            ),
            LocatorTemplate::xpath("ROW_ANY_LINK", "//tr[contains(.,%s)]//a"),
            LocatorTemplate::xpath(
                "TBODY_ROW_LINK",
                "//tbody[@id='tbodyid']//tr[td[contains(text(),%s)]]//a",
            ),
        ],
    };

    pub const FIRST_DELETE: Locator =
        Locator::xpath("FIRST_DELETE", "(//tbody[@id='tbodyid']//tr//a[text()='Delete'])[1]");

    pub const PLACE_ORDER_CHAIN: FallbackChain = FallbackChain {
        operation: "place order",
        candidates: &[
            LocatorTemplate::xpath(
                "PLACE_ORDER",
                "//button[@class='btn btn-success' and text()='Place Order']",
            ),
            LocatorTemplate::xpath(
                "PLACE_ORDER_CONTAINS",
                "//button[contains(@class,'btn-success') and contains(text(),'Place Order')]",
            ),
            LocatorTemplate::xpath("PLACE_ORDER_TEXT", "//button[text()='Place Order']"),
        ],
    };
}

/// Order modal and purchase confirmation
pub mod checkout {
    use super::{FallbackChain, Locator, LocatorTemplate};

    pub const ORDER_MODAL: Locator = Locator::xpath("ORDER_MODAL", "//div[@id='orderModal']");
    pub const NAME: Locator = Locator::xpath("ORDER_NAME", "//input[@id='name']");
    pub const COUNTRY: Locator = Locator::xpath("ORDER_COUNTRY", "//input[@id='country']");
    pub const CITY: Locator = Locator::xpath("ORDER_CITY", "//input[@id='city']");
    pub const CARD: Locator = Locator::xpath("ORDER_CARD", "//input[@id='card']");
    pub const MONTH: Locator = Locator::xpath("ORDER_MONTH", "//input[@id='month']");
    pub const YEAR: Locator = Locator::xpath("ORDER_YEAR", "//input[@id='year']");
    pub const ORDER_TOTAL: Locator = Locator::xpath("ORDER_TOTAL", "//label[@id='totalm']");
    pub const PURCHASE: Locator =
        Locator::xpath("PURCHASE", "//button[@onclick='purchaseOrder()']");
    pub const CLOSE_ORDER_MODAL: Locator = Locator::xpath(
        "CLOSE_ORDER_MODAL",
        "//div[@id='orderModal']//button[@class='close']",
    );

    pub const CONFIRMATION: Locator = Locator::xpath(
        "CONFIRMATION",
        "//div[@class='sweet-alert  showSweetAlert visible' or @class='sweet-alert show-sweet-alert visible']",
    );
    pub const CONFIRMATION_MESSAGE: Locator =
        Locator::xpath("CONFIRMATION_MESSAGE", "//p[@class='lead text-muted ']|//p[@class='lead text-muted']");
    pub const THANK_YOU: Locator =
        Locator::xpath("THANK_YOU", "//h2[contains(text(),'Thank you')]");

    pub const AWAIT_CONFIRMATION: FallbackChain = FallbackChain {
        operation: "await confirmation",
        candidates: &[
            LocatorTemplate::xpath(
                "CONFIRMATION",
                "//div[@class='sweet-alert  showSweetAlert visible' or @class='sweet-alert show-sweet-alert visible']",
            ),
            LocatorTemplate::xpath("SWEET_ALERT", "//div[contains(@class,'sweet-alert')]"),
            LocatorTemplate::xpath("SWAL", "//div[contains(@class,'swal')]"),
            LocatorTemplate::xpath("SWAL_MODAL", "//div[@class='swal-modal']"),
            LocatorTemplate::xpath("THANK_YOU", "//h2[contains(text(),'Thank you')]"),
        ],
    };

    pub const CONFIRM_OK: FallbackChain = FallbackChain {
        operation: "confirm order",
        candidates: &[
            LocatorTemplate::xpath("OK_BUTTON", "//button[@class='confirm btn btn-lg btn-primary']"),
            LocatorTemplate::xpath("OK_TEXT", "//button[text()='OK']"),
            LocatorTemplate::xpath("CONFIRM_CLASS", "//button[contains(@class,'confirm')]"),
        ],
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::locator::SelectorKind;

    #[test]
    fn test_remove_chain_binds_every_candidate() {
        let locs = cart::REMOVE_ITEM.bind("Sony vaio i5");
        assert_eq!(locs.len(), 5);
        assert!(locs.iter().all(|l| l.expr().contains("'Sony vaio i5'")));
        assert_eq!(locs[0].name(), "DELETE_BY_NAME[Sony vaio i5]");
    }

    #[test]
    fn test_fixed_chains_have_no_placeholders() {
        for chain in [
            base::OPEN_CART,
            base::GO_HOME,
            cart::PLACE_ORDER_CHAIN,
            checkout::AWAIT_CONFIRMATION,
            checkout::CONFIRM_OK,
        ] {
            assert!(
                chain.candidates.iter().all(|t| !t.is_parameterized()),
                "{} should not take a value",
                chain.operation
            );
        }
    }

    #[test]
    fn test_chain_heads_match_primary_locators() {
        assert_eq!(base::OPEN_CART.locators()[0].expr(), base::CART_LINK.expr());
        assert_eq!(base::GO_HOME.locators()[0].expr(), base::HOME_LINK.expr());
        assert_eq!(cart::PLACE_ORDER_CHAIN.locators()[0].expr(), cart::PLACE_ORDER.expr());
        assert_eq!(
            checkout::AWAIT_CONFIRMATION.locators()[0].expr(),
            checkout::CONFIRMATION.expr()
        );
    }

    #[test]
    fn test_product_price_template() {
        let loc = home::PRODUCT_PRICE_BY_NAME.bind("Nexus 6");
        assert_eq!(
            loc.expr(),
            "//a[contains(text(),'Nexus 6')]/ancestor::div[@class='card-block']//h5"
        );
    }

    #[test]
    fn test_loading_indicators_is_css() {
        assert_eq!(base::LOADING_INDICATORS.kind(), SelectorKind::Css);
    }
}
