//! Page action sets.
//!
//! One set per logical page of the storefront. Every set borrows the
//! [`Session`](crate::Session) it was built from and refuses to be built from
//! a session that has quit.
//!
//! Operations follow the two-tier error model:
//! - checks (`is_*`, text getters) reduce timeouts to `false` or empty values
//! - commands (clicks, typing, submissions) return [`ProbeResult`](crate::ProbeResult)

pub mod base;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod login;
pub mod product;

pub use base::Actions;
pub use cart::CartPage;
pub use checkout::{CheckoutFlow, CheckoutPage, CheckoutState};
pub use home::{Category, HomePage};
pub use login::{LoginFlow, LoginOutcome, LoginPage, LoginState, RegistrationOutcome};
pub use product::ProductPage;

/// A page or component of the storefront
pub trait PageObject {
    /// URL fragment identifying the page
    fn url_pattern(&self) -> &'static str;

    /// Name for logs
    fn page_name(&self) -> &'static str;

    /// Whether `url` belongs to this page
    fn matches_url(&self, url: &str) -> bool {
        url.contains(self.url_pattern())
    }
}

/// Case-insensitive substring match used for product and cart lookups
#[must_use]
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
