//! Locator abstraction for element selection.
//!
//! A [`Locator`] is a chain of [`Selector`]s, each optionally narrowed to
//! its n-th match and scoped to the element its parent resolves to. The
//! chain renders two ways: a stable `css=... >> nth=0` description used in
//! logs, errors and the mock driver, and a JavaScript expression the CDP
//! driver evaluates in the page.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath selector, evaluated relative to the parent element when scoped
    Xpath(String),
    /// ARIA role with an accessible name (e.g., button "Reserve")
    Role {
        /// ARIA role
        role: String,
        /// Accessible name, matched case-insensitively as a substring
        name: String,
    },
    /// Leaf element whose text contains the given string
    Text(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::Xpath(selector.into())
    }

    /// Create a role selector
    #[must_use]
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.into(),
        }
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// JavaScript expression producing an array of matches under `root`
    fn to_elements_js(&self, root: &str) -> String {
        match self {
            Self::Css(s) => format!("Array.from(({root}).querySelectorAll({}))", js_string(s)),
            Self::Xpath(s) => format!(
                "(() => {{ const r = document.evaluate({}, {root}, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
                 for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
                 return out; }})()",
                js_string(s)
            ),
            Self::Role { role, name } => format!(
                "Array.from(({root}).querySelectorAll({})).filter(el => \
                 (el.getAttribute('aria-label') || el.textContent || '').trim().toLowerCase()\
                 .includes({}.toLowerCase()))",
                js_string(&implicit_role_css(role)),
                js_string(name)
            ),
            Self::Text(t) => format!(
                "Array.from(({root}).querySelectorAll('*')).filter(el => \
                 el.childElementCount === 0 && (el.textContent || '').includes({}))",
                js_string(t)
            ),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::Xpath(s) => write!(f, "xpath={s}"),
            Self::Role { role, name } => write!(f, "role={role}[name=\"{name}\"]"),
            Self::Text(t) => write!(f, "text=\"{t}\""),
        }
    }
}

/// CSS covering the elements that carry `role` implicitly or explicitly
fn implicit_role_css(role: &str) -> String {
    match role {
        "button" => {
            "button, [role=\"button\"], input[type=\"button\"], input[type=\"submit\"]".to_string()
        }
        "link" => "a[href], [role=\"link\"]".to_string(),
        "textbox" => {
            "input:not([type]), input[type=\"text\"], input[type=\"tel\"], textarea, [role=\"textbox\"]"
                .to_string()
        }
        "checkbox" => "input[type=\"checkbox\"], [role=\"checkbox\"]".to_string(),
        other => format!("[role=\"{other}\"]"),
    }
}

/// Render a Rust string as a JavaScript string literal
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

/// A chain of selectors identifying one element (or a set of elements).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    nth: Option<usize>,
    parent: Option<Box<Locator>>,
}

impl Locator {
    /// Create a top-level locator from a selector
    #[must_use]
    pub const fn new(selector: Selector) -> Self {
        Self {
            selector,
            nth: None,
            parent: None,
        }
    }

    /// Top-level CSS locator
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Selector::css(selector))
    }

    /// Top-level XPath locator
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::new(Selector::xpath(selector))
    }

    /// Top-level role locator
    #[must_use]
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(Selector::role(role, name))
    }

    /// Narrow to the n-th match (0-based)
    #[must_use]
    pub fn nth(&self, index: usize) -> Self {
        Self {
            nth: Some(index),
            ..self.clone()
        }
    }

    /// Narrow to the first match
    #[must_use]
    pub fn first(&self) -> Self {
        self.nth(0)
    }

    /// Drop the n-th narrowing, addressing every match
    #[must_use]
    pub fn all(&self) -> Self {
        Self {
            nth: None,
            ..self.clone()
        }
    }

    /// Locate `selector` inside the element this locator resolves to
    #[must_use]
    pub fn locator(&self, selector: Selector) -> Self {
        Self {
            selector,
            nth: None,
            parent: Some(Box::new(self.clone())),
        }
    }

    /// The last selector in the chain
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Index of the addressed match (first when not narrowed)
    #[must_use]
    pub fn index(&self) -> usize {
        self.nth.unwrap_or(0)
    }

    /// Parent locator, if scoped
    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        self.parent.as_deref()
    }

    /// JavaScript expression evaluating to every match, ignoring this
    /// locator's own n-th narrowing
    #[must_use]
    pub fn to_elements_js(&self) -> String {
        let root = self.parent.as_ref().map_or_else(
            || "document".to_string(),
            |p| format!("({} || document.createDocumentFragment())", p.to_element_js()),
        );
        self.selector.to_elements_js(&root)
    }

    /// JavaScript expression evaluating to the addressed element or `null`
    #[must_use]
    pub fn to_element_js(&self) -> String {
        format!("(({})[{}] || null)", self.to_elements_js(), self.index())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = &self.parent {
            write!(f, "{parent} >> ")?;
        }
        write!(f, "{}", self.selector)?;
        if let Some(n) = self.nth {
            write!(f, " >> nth={n}")?;
        }
        Ok(())
    }
}

impl From<Selector> for Locator {
    fn from(selector: Selector) -> Self {
        Self::new(selector)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod selector_tests {
        use super::*;

        #[test]
        fn test_display() {
            assert_eq!(Selector::css("#a").to_string(), "css=#a");
            assert_eq!(Selector::xpath("//div").to_string(), "xpath=//div");
            assert_eq!(
                Selector::role("button", "Reserve").to_string(),
                "role=button[name=\"Reserve\"]"
            );
            assert_eq!(Selector::text("per night").to_string(), "text=\"per night\"");
        }

        #[test]
        fn test_deserialize_tagged() {
            let css: Selector = serde_json::from_str(r##"{"css": "#phone"}"##).unwrap();
            assert_eq!(css, Selector::css("#phone"));

            let role: Selector =
                serde_json::from_str(r#"{"role": {"role": "button", "name": "Next"}}"#).unwrap();
            assert_eq!(role, Selector::role("button", "Next"));
        }

        #[test]
        fn test_css_js_escapes_quotes() {
            let js = Selector::css("button[data-date=\"2025-06-01\"]").to_elements_js("document");
            assert!(js.contains(r#"querySelectorAll("button[data-date=\"2025-06-01\"]")"#));
        }

        #[test]
        fn test_role_js_uses_implicit_roles() {
            let js = Selector::role("button", "Reserve").to_elements_js("document");
            assert!(js.contains("input[type=\\\"submit\\\"]"));
            assert!(js.contains("\"Reserve\".toLowerCase()"));
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_nth_and_first() {
            let cards = Locator::xpath("//div[@data-testid=\"card-container\"]");
            assert_eq!(cards.index(), 0);
            assert_eq!(cards.nth(3).index(), 3);
            assert_eq!(cards.first().to_string(), format!("{cards} >> nth=0"));
            assert_eq!(cards.nth(3).all(), cards);
        }

        #[test]
        fn test_scoped_display() {
            let price = Locator::css(".card")
                .nth(2)
                .locator(Selector::xpath(".//span"));
            assert_eq!(price.to_string(), "css=.card >> nth=2 >> xpath=.//span");
            assert_eq!(price.parent().unwrap().index(), 2);
        }

        #[test]
        fn test_scoped_js_roots_at_parent() {
            let anchor = Locator::css(".card").nth(1).locator(Selector::css("a"));
            let js = anchor.to_element_js();
            assert!(js.contains("document.createDocumentFragment()"));
            assert!(js.contains("[1] || null"));
            assert!(js.ends_with("[0] || null)"));
        }
    }
}
