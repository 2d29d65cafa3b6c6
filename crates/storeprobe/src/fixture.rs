//! Fixture data: credentials, product names, checkout form values.
//!
//! Loaded once from the JSON file named by `test.data.file` and read-only
//! afterwards. A missing file falls back to [`DEFAULT_TEST_DATA`].

use crate::result::{ProbeError, ProbeResult};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Document used when no fixture file exists
pub const DEFAULT_TEST_DATA: &str = r#"{
  "users": {
    "validUser": { "username": "testuser123", "password": "testpass123" },
    "invalidUser": { "username": "invaliduser", "password": "wrongpass" }
  },
  "products": {
    "phones": ["Samsung galaxy s6", "Nokia lumia 1520", "Nexus 6"],
    "laptops": ["Sony vaio i5", "Sony vaio i7", "MacBook air"],
    "monitors": ["Apple monitor 24", "ASUS Full HD"]
  },
  "checkout": {
    "customerInfo": {
      "name": "John Doe",
      "country": "United States",
      "city": "New York",
      "creditCard": "1234567890123456",
      "month": "12",
      "year": "2025"
    }
  },
  "categories": ["Phones", "Laptops", "Monitors"]
}"#;

/// Username and password pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Fresh credentials for a registration
    #[must_use]
    pub fn generate() -> Self {
        Self::new(unique_username(), unique_password())
    }
}

/// Checkout form values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    /// Name
    pub name: String,
    /// Country
    pub country: String,
    /// City
    pub city: String,
    /// Credit card number
    pub credit_card: String,
    /// Expiry month
    pub month: String,
    /// Expiry year
    pub year: String,
}

/// Loaded fixture document
#[derive(Debug, Clone, PartialEq)]
pub struct TestData {
    root: Value,
}

impl Default for TestData {
    fn default() -> Self {
        Self {
            root: serde_json::from_str(DEFAULT_TEST_DATA).unwrap_or(Value::Null),
        }
    }
}

impl TestData {
    /// Parse a fixture document
    pub fn from_json(json: &str) -> ProbeResult<Self> {
        let root: Value = serde_json::from_str(json)?;
        if !root.is_object() {
            return Err(ProbeError::Fixture {
                message: "fixture document must be a JSON object".to_string(),
            });
        }
        Ok(Self { root })
    }

    /// Load from a file; a missing file yields the default document
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let data = Self::from_json(&json).map_err(|e| ProbeError::Fixture {
                    message: format!("{}: {e}", path.display()),
                })?;
                tracing::info!(path = %path.display(), "loaded test data");
                Ok(data)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "test data file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Raw document
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.root
    }

    fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.root, |node, part| node.get(part))
    }

    /// Scalar at a dotted path; empty when the path is missing or not a scalar
    #[must_use]
    pub fn get(&self, path: &str) -> String {
        match self.lookup(path) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(_) => String::new(),
            None => {
                tracing::warn!(path, "test data path not found");
                String::new()
            }
        }
    }

    fn strings_at(&self, path: &str) -> Vec<String> {
        self.lookup(path)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Credentials expected to log in
    #[must_use]
    pub fn valid_user(&self) -> Credentials {
        Credentials::new(
            self.get("users.validUser.username"),
            self.get("users.validUser.password"),
        )
    }

    /// Credentials expected to be rejected
    #[must_use]
    pub fn invalid_user(&self) -> Credentials {
        Credentials::new(
            self.get("users.invalidUser.username"),
            self.get("users.invalidUser.password"),
        )
    }

    /// Checkout form values
    #[must_use]
    pub fn customer_info(&self) -> CustomerInfo {
        let field = |name: &str| self.get(&format!("checkout.customerInfo.{name}"));
        CustomerInfo {
            name: field("name"),
            country: field("country"),
            city: field("city"),
            credit_card: field("creditCard"),
            month: field("month"),
            year: field("year"),
        }
    }

    /// Product names listed for a category (case-insensitive)
    #[must_use]
    pub fn products_for(&self, category: &str) -> Vec<String> {
        self.strings_at(&format!("products.{}", category.to_lowercase()))
    }

    /// Category names
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.strings_at("categories")
    }

    /// Random product of a category; empty when the category has none
    #[must_use]
    pub fn random_product(&self, category: &str) -> String {
        let products = self.products_for(category);
        let product = products
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default();
        tracing::debug!(category, product = %product, "picked random product");
        product
    }

    /// Random category; empty when none are listed
    #[must_use]
    pub fn random_category(&self) -> String {
        self.categories()
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }
}

fn epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `user_<epoch_ms>_<0..1000>`
#[must_use]
pub fn unique_username() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("user_{}_{suffix}", epoch_millis())
}

/// `pass_<epoch_ms>`
#[must_use]
pub fn unique_password() -> String {
    format!("pass_{}", epoch_millis())
}

/// `test_<epoch_ms>_<0..1000>@test.com`
#[must_use]
pub fn random_email() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("test_{}_{suffix}@test.com", epoch_millis())
}

/// `+1` followed by ten random digits
#[must_use]
pub fn random_phone() -> String {
    let mut rng = rand::thread_rng();
    let digits: String = (0..10)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect();
    format!("+1{digits}")
}
