//! Drives the portal's login form.
//!
//! Every step walks an ordered selector chain so a front-end redeploy that
//! renames half the classes degrades to the next strategy instead of crashing
//! the run. Login failure is fatal to the monitor, so this is the one place
//! that collects aggressive diagnostics on the way out.

use std::time::Duration;

use chromiumoxide::element::Element;
use chromiumoxide::Page;
use rand::distr::{Distribution, Uniform};
use tracing::{info, warn};

use crate::artifacts;
use crate::browser::{dom, wait_for_element, wait_until_ready};
use crate::core::config::MonitorConfig;
use crate::core::error::{InputProbe, LoginFailure, LoginFailureKind};
use crate::portal::selectors;

/// Bounded page-load wait for the login form (the portal renders slowly under
/// load at announcement time).
const LOGIN_LOAD_TIMEOUT_MS: u64 = 30_000;
const INPUTS_APPEAR_TIMEOUT_MS: u64 = 30_000;
/// Floor after submit before re-deriving state from the address; the portal
/// does a client-side redirect with no reliable readiness signal of its own.
const POST_SUBMIT_SETTLE_MS: u64 = 1_000;

const INPUT_PROBE_JS: &str = r#"
Array.from(document.querySelectorAll('input')).slice(0, 8).map(el => ({
    type: el.type || '',
    name: el.name || '',
    id: el.id || '',
    class: el.className || '',
    placeholder: el.placeholder || '',
}))
"#;

pub struct Authenticator<'a> {
    cfg: &'a MonitorConfig,
}

impl<'a> Authenticator<'a> {
    pub fn new(cfg: &'a MonitorConfig) -> Self {
        Self { cfg }
    }

    /// Log in once. On any failure, capture a screenshot and page dump before
    /// returning the classified failure.
    pub async fn login(&self, page: &Page) -> Result<(), LoginFailure> {
        match self.attempt(page).await {
            Ok(()) => {
                info!("login succeeded");
                Ok(())
            }
            Err(kind) => {
                warn!("login failed: {kind}");
                let screenshot = artifacts::capture_screenshot(page, "login_failed").await;
                let page_dump = artifacts::dump_page_html(page, "login_failed").await;
                Err(LoginFailure {
                    kind,
                    screenshot,
                    page_dump,
                })
            }
        }
    }

    async fn attempt(&self, page: &Page) -> Result<(), LoginFailureKind> {
        let login_url = self.cfg.login_url();
        info!("opening login page: {login_url}");
        page.goto(login_url.as_str())
            .await
            .map_err(|e| LoginFailureKind::PageUnreachable(e.to_string()))?;
        wait_until_ready(page, 1_500, LOGIN_LOAD_TIMEOUT_MS).await;

        if wait_for_element(page, "input", INPUTS_APPEAR_TIMEOUT_MS)
            .await
            .is_none()
        {
            return Err(LoginFailureKind::NoInputFields);
        }

        let username_field = dom::first_from_chain(page, selectors::USERNAME_FIELDS).await;
        let password_field = dom::first_from_chain(page, selectors::PASSWORD_FIELDS).await;
        let (Some(username_field), Some(password_field)) = (username_field, password_field) else {
            return Err(LoginFailureKind::FieldsNotFound {
                observed: probe_inputs(page).await,
            });
        };

        info!("filling credentials for {}", self.cfg.credentials.username);
        self.fill_field(&username_field, &self.cfg.credentials.username)
            .await
            .map_err(|e| LoginFailureKind::FormInteraction(format!("username fill: {e}")))?;
        self.fill_field(&password_field, &self.cfg.credentials.password)
            .await
            .map_err(|e| LoginFailureKind::FormInteraction(format!("password fill: {e}")))?;

        if dom::click_first_clickable(page, selectors::SUBMIT_BUTTONS).await {
            info!("submit button clicked");
        } else {
            // No clickable submit anywhere in the chain — a plain form still
            // submits from the password field.
            info!("no clickable submit button; falling back to keyboard submit");
            if password_field.focus().await.is_err()
                || password_field.press_key("Enter").await.is_err()
            {
                return Err(LoginFailureKind::SubmitNotFound);
            }
        }

        wait_until_ready(page, 1_200, 15_000).await;
        tokio::time::sleep(Duration::from_millis(POST_SUBMIT_SETTLE_MS)).await;

        let current_url = page
            .url()
            .await
            .map_err(|e| LoginFailureKind::FormInteraction(format!("read address: {e}")))?
            .unwrap_or_default();
        info!("post-login address: {current_url}");

        if !is_still_on_login(&current_url) {
            return Ok(());
        }

        // Still on the login page: harvest whatever the portal has to say.
        let messages = harvest_error_messages(page).await;
        if messages.is_empty() {
            Err(LoginFailureKind::Undiagnosed { url: current_url })
        } else {
            Err(LoginFailureKind::Rejected { messages })
        }
    }

    /// Fill one field, instantly or with the configured typing cadence.
    ///
    /// With a cadence range, each character lands with its own uniformly-drawn
    /// delay; delays are drawn up front so the RNG never crosses an await.
    async fn fill_field(&self, field: &Element, value: &str) -> anyhow::Result<()> {
        field.click().await?;

        let Some((min_ms, max_ms)) = self.cfg.typing_delay_ms else {
            field.type_str(value).await?;
            return Ok(());
        };

        let delays: Vec<u64> = {
            let mut rng = rand::rng();
            let dist = (min_ms < max_ms)
                .then(|| Uniform::new_inclusive(min_ms, max_ms).ok())
                .flatten();
            value
                .chars()
                .map(|_| dist.as_ref().map_or(min_ms, |d| d.sample(&mut rng)))
                .collect()
        };

        for (ch, delay_ms) in value.chars().zip(delays) {
            field.type_str(ch.to_string()).await?;
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        Ok(())
    }
}

/// Success is re-derived from the resulting address: the portal keeps
/// `/login` in the path until authentication goes through.
fn is_still_on_login(url: &str) -> bool {
    url.to_lowercase().contains("/login")
}

/// Attributes of the first few inputs on the page, for the fields-not-found
/// diagnostic. Best-effort; an empty vec just means the probe itself failed.
async fn probe_inputs(page: &Page) -> Vec<InputProbe> {
    page.evaluate(INPUT_PROBE_JS)
        .await
        .ok()
        .and_then(|v| v.into_value::<Vec<InputProbe>>().ok())
        .unwrap_or_default()
}

/// Texts from the first error-message chain entry that resolves.
async fn harvest_error_messages(page: &Page) -> Vec<String> {
    let elements = dom::resolve_chain(page, selectors::LOGIN_ERROR_MESSAGES).await;
    let mut messages = Vec::new();
    for element in &elements {
        if let Some(text) = dom::text_of(element).await {
            messages.push(text);
        }
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_classification_keys_on_the_login_path_marker() {
        assert!(!is_still_on_login("https://portal.example/dashboard"));
        assert!(is_still_on_login("https://portal.example/login"));
        assert!(is_still_on_login("https://portal.example/LOGIN?error=1"));
        assert!(!is_still_on_login("https://portal.example/requests/new"));
    }
}
