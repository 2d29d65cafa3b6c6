//! Locator abstraction for element selection.
//!
//! A [`Locator`] pairs a symbolic name with a query expression. Locators are
//! static data; parameterized ones are written as [`LocatorTemplate`]s and
//! bound to a runtime value (a product name, say) right before use.
//!
//! Commands that tolerate markup drift declare a [`FallbackChain`]: an ordered
//! list of templates tried front to back until one resolves.

use std::borrow::Cow;
use std::fmt;

/// Placeholder replaced by [`LocatorTemplate::bind`]
pub const PLACEHOLDER: &str = "%s";

/// Query language of a locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    /// XPath 1.0 expression
    XPath,
    /// CSS selector
    Css,
}

/// A named query expression identifying a DOM element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    name: Cow<'static, str>,
    kind: SelectorKind,
    expr: Cow<'static, str>,
}

impl Locator {
    /// Create a static XPath locator
    #[must_use]
    pub const fn xpath(name: &'static str, expr: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind: SelectorKind::XPath,
            expr: Cow::Borrowed(expr),
        }
    }

    /// Create a static CSS locator
    #[must_use]
    pub const fn css(name: &'static str, expr: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind: SelectorKind::Css,
            expr: Cow::Borrowed(expr),
        }
    }

    /// Create a locator from owned parts
    #[must_use]
    pub fn owned(name: impl Into<String>, kind: SelectorKind, expr: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            kind,
            expr: Cow::Owned(expr.into()),
        }
    }

    /// Symbolic name, used in logs and errors
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Query language
    #[must_use]
    pub const fn kind(&self) -> SelectorKind {
        self.kind
    }

    /// Raw query expression
    #[must_use]
    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// JavaScript expression evaluating to the first matching node (or null)
    #[must_use]
    pub fn to_query(&self) -> String {
        let s = self.expr();
        match self.kind {
            SelectorKind::Css => format!("document.querySelector({s:?})"),
            SelectorKind::XPath => format!(
                "document.evaluate({s:?}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
            ),
        }
    }

    /// JavaScript expression evaluating to an array of all matching nodes
    #[must_use]
    pub fn to_all_query(&self) -> String {
        let s = self.expr();
        match self.kind {
            SelectorKind::Css => format!("Array.from(document.querySelectorAll({s:?}))"),
            SelectorKind::XPath => format!(
                "(() => {{ const r = document.evaluate({s:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 const out = []; for (let i = 0; i < r.snapshotLength; i++) {{ out.push(r.snapshotItem(i)); }} return out; }})()"
            ),
        }
    }

    /// JavaScript expression evaluating to the number of matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        let s = self.expr();
        match self.kind {
            SelectorKind::Css => format!("document.querySelectorAll({s:?}).length"),
            SelectorKind::XPath => format!(
                "document.evaluate({s:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength"
            ),
        }
    }

    /// JavaScript expression: first match exists and is rendered visible
    #[must_use]
    pub fn to_visible_query(&self) -> String {
        format!(
            "(el => !!el && !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length) \
             && window.getComputedStyle(el).visibility !== 'hidden')({})",
            self.to_query()
        )
    }

    /// JavaScript expression: first match is visible and not disabled
    #[must_use]
    pub fn to_enabled_query(&self) -> String {
        format!(
            "(el => !!el && !el.disabled && !el.classList.contains('disabled'))({})",
            self.to_query()
        )
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.expr)
    }
}

/// A locator parameterized by one runtime value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorTemplate {
    name: &'static str,
    kind: SelectorKind,
    pattern: &'static str,
}

impl LocatorTemplate {
    /// Create an XPath template; `%s` marks where the quoted value goes.
    ///
    /// A pattern without a placeholder is a fixed candidate.
    #[must_use]
    pub const fn xpath(name: &'static str, pattern: &'static str) -> Self {
        Self {
            name,
            kind: SelectorKind::XPath,
            pattern,
        }
    }

    /// Template name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the template takes a value
    #[must_use]
    pub fn is_parameterized(&self) -> bool {
        self.pattern.contains(PLACEHOLDER)
    }

    /// Substitute `value` for every placeholder.
    ///
    /// XPath values are emitted as string literals, so names containing
    /// quotes still produce a valid expression.
    #[must_use]
    pub fn bind(&self, value: &str) -> Locator {
        if !self.is_parameterized() {
            return Locator::owned(self.name, self.kind, self.pattern);
        }
        let literal = match self.kind {
            SelectorKind::XPath => xpath_literal(value),
            SelectorKind::Css => format!("{value:?}"),
        };
        Locator::owned(
            format!("{}[{value}]", self.name),
            self.kind,
            self.pattern.replace(PLACEHOLDER, &literal),
        )
    }
}

/// Quote a string as an XPath 1.0 literal
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value.split('\'').map(|p| format!("'{p}'")).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Ordered candidate locators for one operation
#[derive(Debug, Clone, Copy)]
pub struct FallbackChain {
    /// Operation the chain serves
    pub operation: &'static str,
    /// Candidates, tried in order
    pub candidates: &'static [LocatorTemplate],
}

impl FallbackChain {
    /// Bind every candidate to `value` (ignored by fixed candidates)
    #[must_use]
    pub fn bind(&self, value: &str) -> Vec<Locator> {
        self.candidates.iter().map(|t| t.bind(value)).collect()
    }

    /// Candidates of a chain that takes no value
    #[must_use]
    pub fn locators(&self) -> Vec<Locator> {
        self.bind("")
    }

    /// Number of candidates
    #[must_use]
    pub const fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the chain is empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    const ROW: LocatorTemplate =
        LocatorTemplate::xpath("ITEM_ROW", "//td[contains(text(),%s)]/parent::tr");
    const TOTAL: Locator = Locator::xpath("TOTAL", "//h3[@id='totalp']");

    mod query_tests {
        use super::*;

        #[test]
        fn test_xpath_query() {
            let q = TOTAL.to_query();
            assert!(q.starts_with("document.evaluate(\"//h3[@id='totalp']\""));
            assert!(q.contains("FIRST_ORDERED_NODE_TYPE"));
        }

        #[test]
        fn test_css_count_query() {
            let loc = Locator::css("SPINNER", ".spinner, .loading");
            assert_eq!(
                loc.to_count_query(),
                "document.querySelectorAll(\".spinner, .loading\").length"
            );
        }

        #[test]
        fn test_xpath_all_query_uses_snapshot() {
            let q = TOTAL.to_all_query();
            assert!(q.contains("ORDERED_NODE_SNAPSHOT_TYPE"));
            assert!(q.contains("snapshotItem"));
        }

        #[test]
        fn test_visible_query_wraps_first_match() {
            let q = TOTAL.to_visible_query();
            assert!(q.contains(&TOTAL.to_query()));
            assert!(q.contains("visibility"));
        }

        #[test]
        fn test_display() {
            assert_eq!(TOTAL.to_string(), "TOTAL (//h3[@id='totalp'])");
        }
    }

    mod template_tests {
        use super::*;

        #[test]
        fn test_bind_substitutes_quoted_value() {
            let loc = ROW.bind("Nexus 6");
            assert_eq!(loc.expr(), "//td[contains(text(),'Nexus 6')]/parent::tr");
            assert_eq!(loc.name(), "ITEM_ROW[Nexus 6]");
        }

        #[test]
        fn test_bind_value_with_single_quote() {
            let loc = ROW.bind("Bob's phone");
            assert_eq!(
                loc.expr(),
                "//td[contains(text(),\"Bob's phone\")]/parent::tr"
            );
        }

        #[test]
        fn test_fixed_template_ignores_value() {
            let fixed = LocatorTemplate::xpath("TOTAL", "//h3[@id='totalp']");
            assert!(!fixed.is_parameterized());
            assert_eq!(fixed.bind("anything"), TOTAL);
        }

        #[test]
        fn test_xpath_literal_mixed_quotes() {
            assert_eq!(
                xpath_literal("a'b\"c"),
                "concat('a', \"'\", 'b\"c')"
            );
        }
    }

    mod chain_tests {
        use super::*;

        const CHAIN: FallbackChain = FallbackChain {
            operation: "remove",
            candidates: &[ROW, LocatorTemplate::xpath("TOTAL", "//h3[@id='totalp']")],
        };

        #[test]
        fn test_chain_bind_preserves_order() {
            let locs = CHAIN.bind("Nokia");
            assert_eq!(locs.len(), 2);
            assert!(locs[0].expr().contains("'Nokia'"));
            assert_eq!(locs[1].name(), "TOTAL");
        }

        #[test]
        fn test_chain_len() {
            assert_eq!(CHAIN.len(), 2);
            assert!(!CHAIN.is_empty());
        }
    }
}
