//! Enumerates the program-selection widget's options.
//!
//! Extraction never propagates an error past this boundary. The strategy is
//! two-tier: open the dropdown and read every option; if anything in that
//! sequence raises, degrade to reading the control's single currently-selected
//! value; if even the control is missing, the snapshot is simply empty and the
//! cycle goes on.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Context;
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use tracing::{debug, warn};

use crate::browser::{dom, wait_until_ready};
use crate::portal::selectors;

/// Program names observed in one check cycle. Unordered; recomputed each
/// cycle.
pub type ListingSnapshot = HashSet<String>;

const PAGE_LOAD_TIMEOUT_MS: u64 = 30_000;
/// The dropdown's open animation has no network-idle signal to wait on.
const MENU_RENDER_DELAY_MS: u64 = 800;
/// Option texts this short are decorative (placeholders, separators).
const MIN_OPTION_TEXT_LEN: usize = 3;

pub struct ListingExtractor {
    request_url: String,
}

impl ListingExtractor {
    pub fn new(request_url: impl Into<String>) -> Self {
        Self {
            request_url: request_url.into(),
        }
    }

    /// Observe the widget once. Soft-fails to a smaller — possibly empty —
    /// snapshot; never returns an error.
    pub async fn extract(&self, page: &Page) -> ListingSnapshot {
        if let Err(e) = page.goto(self.request_url.as_str()).await {
            warn!("application page navigation failed: {e}");
            return ListingSnapshot::new();
        }
        wait_until_ready(page, 1_500, PAGE_LOAD_TIMEOUT_MS).await;

        let Some(control) = dom::first_from_chain(page, selectors::COMBOBOX_CONTROLS).await else {
            warn!("no combobox control matched any known scheme; empty snapshot");
            return ListingSnapshot::new();
        };

        match self.enumerate_options(page, &control).await {
            Ok(snapshot) => {
                debug!("enumerated {} program listings", snapshot.len());
                snapshot
            }
            Err(e) => {
                warn!("option enumeration failed ({e}); falling back to current value");
                current_value_snapshot(page).await
            }
        }
    }

    async fn enumerate_options(
        &self,
        page: &Page,
        control: &Element,
    ) -> anyhow::Result<ListingSnapshot> {
        control.click().await.context("expanding the option list")?;
        tokio::time::sleep(Duration::from_millis(MENU_RENDER_DELAY_MS)).await;

        let options = dom::resolve_chain(page, selectors::OPTION_ITEMS).await;
        let mut snapshot = ListingSnapshot::new();
        for option in &options {
            if let Some(text) = dom::text_of(option).await {
                if text.chars().count() > MIN_OPTION_TEXT_LEN {
                    snapshot.insert(text);
                }
            }
        }

        // Close the list so later interactions start from a neutral widget.
        if control.press_key("Escape").await.is_err() {
            let _ = control.click().await;
        }

        Ok(snapshot)
    }
}

/// Degraded read: the control's single selected value as a one-element
/// snapshot, or empty.
async fn current_value_snapshot(page: &Page) -> ListingSnapshot {
    let mut snapshot = ListingSnapshot::new();
    if let Some(value) = dom::first_from_chain(page, selectors::SINGLE_VALUE).await {
        if let Some(text) = dom::text_of(&value).await {
            debug!("current selected value: {text}");
            snapshot.insert(text);
        }
    }
    snapshot
}

#[cfg(test)]
mod tests {
    #[test]
    fn min_length_filter_drops_decorative_entries() {
        // The filter keeps strictly-longer-than-threshold texts only.
        let keep = |text: &str| text.chars().count() > super::MIN_OPTION_TEXT_LEN;
        assert!(!keep("—"));
        assert!(!keep("..."));
        assert!(keep("BSc Computer Science"));
        // Multi-byte safety: three Arabic letters are three chars, not nine bytes.
        assert!(!keep("طبّ"));
    }
}
