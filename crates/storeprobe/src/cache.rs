//! Cache of the last product known to be displayed, per category.
//!
//! Only saves category navigation during scenario setup. Scenarios must pass
//! with an empty cache, and a cached name that fails a lookup is dropped.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Last known-good product name per category
#[derive(Debug, Default)]
pub struct ProductCache {
    entries: Mutex<HashMap<String, String>>,
}

impl ProductCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached product for a category
    #[must_use]
    pub fn get(&self, category: &str) -> Option<String> {
        self.lock().get(&category.to_lowercase()).cloned()
    }

    /// Remember a product that was just seen displayed
    pub fn store(&self, category: &str, product: &str) {
        tracing::debug!(category, product, "caching product");
        self.lock()
            .insert(category.to_lowercase(), product.to_string());
    }

    /// Forget the cached product for a category
    pub fn invalidate(&self, category: &str) {
        if let Some(stale) = self.lock().remove(&category.to_lowercase()) {
            tracing::debug!(category, product = %stale, "invalidated cached product");
        }
    }

    /// Forget everything
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of cached categories
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
