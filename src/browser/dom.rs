//! Ordered selector-fallback chains over an unstable DOM.
//!
//! The portal ships several co-existing class-name schemes for the same
//! widgets, and button labels are localized. A [`Locator`] is one strategy
//! (a CSS selector, optionally narrowed by visible-text containment, which
//! CSS alone cannot express over CDP); a chain is an ordered slice of them.
//! The first locator that resolves to at least one element wins.

use chromiumoxide::element::Element;
use chromiumoxide::Page;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub css: &'static str,
    pub text_contains: Option<&'static str>,
}

impl Locator {
    pub const fn css(css: &'static str) -> Self {
        Self {
            css,
            text_contains: None,
        }
    }

    pub const fn with_text(css: &'static str, text: &'static str) -> Self {
        Self {
            css,
            text_contains: Some(text),
        }
    }

    /// All elements this locator matches right now; empty on any DOM error.
    pub async fn resolve(&self, page: &Page) -> Vec<Element> {
        let elements = page.find_elements(self.css).await.unwrap_or_default();
        let Some(needle) = self.text_contains else {
            return elements;
        };
        let mut matched = Vec::new();
        for element in elements {
            if let Some(text) = text_of(&element).await {
                if text.contains(needle) {
                    matched.push(element);
                }
            }
        }
        matched
    }
}

/// Walk the chain in order; the first locator yielding ≥1 element wins.
pub async fn resolve_chain(page: &Page, chain: &[Locator]) -> Vec<Element> {
    for locator in chain {
        let elements = locator.resolve(page).await;
        if !elements.is_empty() {
            debug!(
                selector = locator.css,
                matches = elements.len(),
                "selector chain resolved"
            );
            return elements;
        }
    }
    Vec::new()
}

/// First element of the first resolving locator, if any.
pub async fn first_from_chain(page: &Page, chain: &[Locator]) -> Option<Element> {
    resolve_chain(page, chain).await.into_iter().next()
}

/// Walk the chain and click the first candidate that accepts a click.
///
/// A resolved element can still refuse the click (covered, detached,
/// zero-sized); those are skipped, not fatal.
pub async fn click_first_clickable(page: &Page, chain: &[Locator]) -> bool {
    for locator in chain {
        for element in locator.resolve(page).await {
            match element.click().await {
                Ok(_) => {
                    debug!(selector = locator.css, "clicked");
                    return true;
                }
                Err(e) => {
                    warn!(selector = locator.css, "candidate not clickable: {e}");
                }
            }
        }
    }
    false
}

/// Trimmed, non-empty visible text of an element.
pub async fn text_of(element: &Element) -> Option<String> {
    element
        .inner_text()
        .await
        .ok()
        .flatten()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_constructors_keep_text_filter() {
        let plain = Locator::css("button[type=\"submit\"]");
        assert!(plain.text_contains.is_none());

        let localized = Locator::with_text("button", "إستمرار");
        assert_eq!(localized.css, "button");
        assert_eq!(localized.text_contains, Some("إستمرار"));
    }
}
