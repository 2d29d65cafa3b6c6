//! Order confirmation parsing.
//!
//! The storefront confirms a purchase with free text such as:
//!
//! ```text
//! Id: 8132946
//! Amount: 790 USD
//! Card Number: 1234567890123456
//! Name: John Doe
//! Date: 17/9/2026
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

fn digit_run() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").ok()).as_ref()
}

/// Remainder of the line following `label`, trimmed; `None` if the label is absent
#[must_use]
pub fn extract_labeled<'t>(text: &'t str, label: &str) -> Option<&'t str> {
    let start = text.find(label)? + label.len();
    let rest = &text[start..];
    let line = rest.lines().next().unwrap_or("");
    Some(line.trim())
}

/// Order id: the digits of the `Id:` line, else the first digit run, else empty
#[must_use]
pub fn extract_order_id(text: &str) -> String {
    if let Some(line) = extract_labeled(text, "Id:") {
        return line.chars().filter(char::is_ascii_digit).collect();
    }
    digit_run()
        .and_then(|re| re.find(text))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Parsed confirmation message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    /// Order id digits
    pub id: String,
    /// Amount as displayed (`"790 USD"`)
    pub amount: String,
    /// Card number line
    pub card_number: String,
    /// Customer name line
    pub name: String,
    /// Date line
    pub date: String,
    /// Full message
    pub raw: String,
}

impl OrderConfirmation {
    /// Parse a confirmation message; missing labels become empty fields
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let field = |label: &str| extract_labeled(text, label).unwrap_or("").to_string();
        Self {
            id: extract_order_id(text),
            amount: field("Amount:"),
            card_number: field("Card Number:"),
            name: field("Name:"),
            date: field("Date:"),
            raw: text.to_string(),
        }
    }

    /// Amount as a number (`0.0` when absent)
    #[must_use]
    pub fn amount_value(&self) -> f64 {
        crate::price::normalize_price(&self.amount)
    }

    /// Whether the message carries an order id
    #[must_use]
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MESSAGE: &str =
        "Id: 8132946\nAmount: 790 USD\nCard Number: 1234567890123456\nName: John Doe\nDate: 17/9/2026";

    mod order_id_tests {
        use super::*;

        #[test]
        fn test_labeled_id() {
            assert_eq!(extract_order_id("Id: 42\nAmount: 100\n"), "42");
        }

        #[test]
        fn test_first_digit_run_without_label() {
            assert_eq!(extract_order_id("Thank you! Order 777 placed on 12/3"), "777");
        }

        #[test]
        fn test_no_digits_is_empty() {
            assert_eq!(extract_order_id("Thank you for your purchase!"), "");
            assert_eq!(extract_order_id(""), "");
        }

        #[test]
        fn test_label_line_only() {
            assert_eq!(extract_order_id("Id: \nAmount: 100"), "");
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_full_message() {
            let c = OrderConfirmation::parse(MESSAGE);
            assert_eq!(c.id, "8132946");
            assert_eq!(c.amount, "790 USD");
            assert_eq!(c.card_number, "1234567890123456");
            assert_eq!(c.name, "John Doe");
            assert_eq!(c.date, "17/9/2026");
            assert_eq!(c.amount_value(), 790.0);
            assert!(c.has_id());
        }

        #[test]
        fn test_card_number_does_not_shadow_name() {
            let c = OrderConfirmation::parse("Card Number: 1\nName: Ann");
            assert_eq!(c.name, "Ann");
        }

        #[test]
        fn test_missing_labels() {
            let c = OrderConfirmation::parse("Thank you for your purchase!");
            assert!(!c.has_id());
            assert!(c.amount.is_empty());
            assert_eq!(c.amount_value(), 0.0);
        }

        #[test]
        fn test_labeled_remainder_is_trimmed() {
            assert_eq!(extract_labeled("Amount:   5 USD  \nx", "Amount:"), Some("5 USD"));
            assert_eq!(extract_labeled("nothing", "Amount:"), None);
        }
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(s in "\\PC*") {
            let _ = OrderConfirmation::parse(&s);
        }

        #[test]
        fn prop_labeled_id_roundtrips(id in 0u64..10_000_000_000, tail in "[A-Za-z :\\n]{0,30}") {
            let text = format!("Id: {id}\n{tail}");
            prop_assert_eq!(extract_order_id(&text), id.to_string());
        }
    }
}
