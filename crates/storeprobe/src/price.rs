//! Currency text normalisation.
//!
//! Prices are scraped as display text (`"$360 *includes tax"`, `"1,234.50"`)
//! and compared as numbers within [`PRICE_TOLERANCE`].

/// Absolute tolerance for price equality
pub const PRICE_TOLERANCE: f64 = 0.01;

/// Strip every character outside `[0-9.]` and parse the rest.
///
/// Text that leaves nothing parsable (empty, `"."`, `"1.2.3"`) yields `0.0`.
#[must_use]
pub fn normalize_price(text: &str) -> f64 {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().unwrap_or(0.0)
}

/// Whether two amounts agree within [`PRICE_TOLERANCE`]
#[must_use]
pub fn prices_match(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() <= PRICE_TOLERANCE
}

/// Sum of normalised prices
#[must_use]
pub fn sum_prices<S: AsRef<str>>(texts: &[S]) -> f64 {
    texts.iter().map(|t| normalize_price(t.as_ref())).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod normalize_tests {
        use super::*;

        #[test]
        fn test_currency_with_grouping() {
            assert!(prices_match(normalize_price("$1,234.50"), 1234.50));
        }

        #[test]
        fn test_storefront_price_label() {
            assert_eq!(normalize_price("$360 *includes tax"), 360.0);
        }

        #[test]
        fn test_empty_is_zero() {
            assert_eq!(normalize_price(""), 0.0);
            assert_eq!(normalize_price("free"), 0.0);
        }

        #[test]
        fn test_unparsable_remainder_is_zero() {
            assert_eq!(normalize_price("1.2.3"), 0.0);
            assert_eq!(normalize_price("."), 0.0);
        }
    }

    mod arithmetic_tests {
        use super::*;

        #[test]
        fn test_sum_of_cart_cells() {
            let total = sum_prices(&["360", "650", "820"]);
            assert!(prices_match(total, 1830.0));
        }

        #[test]
        fn test_tolerance_boundaries() {
            assert!(prices_match(10.0, 10.005));
            assert!(!prices_match(10.0, 10.02));
        }

        #[test]
        fn test_sum_of_nothing_is_zero() {
            let empty: [&str; 0] = [];
            assert_eq!(sum_prices(&empty), 0.0);
        }
    }

    proptest! {
        #[test]
        fn prop_normalize_never_panics(s in ".*") {
            let _ = normalize_price(&s);
        }

        #[test]
        fn prop_decorations_are_ignored(cents in 0u32..10_000_000, prefix in "[$€ a-zA-Z]{0,4}", suffix in "[ *a-z]{0,12}") {
            let amount = f64::from(cents) / 100.0;
            let text = format!("{prefix}{amount:.2}{suffix}");
            prop_assert!(prices_match(normalize_price(&text), amount));
        }

        #[test]
        fn prop_cart_total_is_sum_of_items(cells in proptest::collection::vec(1u32..5_000, 1..8)) {
            let texts: Vec<String> = cells.iter().map(u32::to_string).collect();
            let expected: u32 = cells.iter().sum();
            prop_assert!(prices_match(sum_prices(&texts), f64::from(expected)));
        }
    }
}
