//! Storeprobe: browser-driven end-to-end checks for the demoblaze storefront
//!
//! Scenarios drive a real browser through page action sets (login, home,
//! product, cart, checkout). Every action goes through one wait layer with
//! tiered timeouts and through ordered locator fallback chains.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐   ┌─────────────┐
//! │ SuiteRunner │──►│  Scenario    │──►│ Page action  │──►│ Waiter +    │
//! │ (selection, │   │  (one        │   │ sets (login, │   │ fallback    │
//! │  reports)   │   │  session)    │   │ cart, ...)   │   │ chains      │
//! └─────────────┘   └──────────────┘   └──────────────┘   └──────┬──────┘
//!                                                                │
//!                                      ┌─────────────────────────▼──────┐
//!                                      │ SessionDriver                   │
//!                                      │  CdpDriver (chromiumoxide)      │
//!                                      │  WebDriverDriver (fantoccini)   │
//!                                      │  MockDriver (in-memory)         │
//!                                      └─────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use storeprobe::{BrowserLauncher, RunOptions, SuiteConfig, SuiteRunner};
//!
//! # async fn run() -> storeprobe::ProbeResult<()> {
//! let config = SuiteConfig::load("config.properties")?.with_env_overrides();
//! let runner = SuiteRunner::new(&BrowserLauncher, config)?;
//! let report = runner.run(&RunOptions::default()).await;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod confirmation;
pub mod driver;
pub mod fallback;
pub mod fixture;
pub mod locator;
pub mod locators;
pub mod mock;
pub mod pages;
pub mod price;
pub mod report;
pub mod result;
pub mod runner;
pub mod scenarios;
pub mod session;
pub mod wait;

#[cfg(feature = "browser")]
pub mod cdp;

#[cfg(feature = "webdriver")]
pub mod webdriver;

pub use cache::ProductCache;
pub use config::{BrowserKind, SuiteConfig};
pub use confirmation::OrderConfirmation;
pub use driver::{BrowserLauncher, DriverLauncher, SessionDriver, SessionOptions};
pub use fixture::{Credentials, CustomerInfo, TestData};
pub use locator::{FallbackChain, Locator, LocatorTemplate, SelectorKind};
pub use pages::{CartPage, CheckoutPage, HomePage, LoginPage, ProductPage};
pub use price::normalize_price;
pub use report::{ScenarioResult, ScenarioStatus, SuiteReport};
pub use result::{ProbeError, ProbeResult};
pub use runner::{FailureMode, RunOptions, SuiteRunner};
pub use scenarios::{Scenario, ScenarioContext, Suite};
pub use session::{with_session, Session, SessionRun};
pub use wait::{TimeoutTier, WaitPolicy, Waiter};
