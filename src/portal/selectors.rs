//! Selector chains for the monitored portal, ordered most-specific first.
//!
//! The portal's front-end has shipped several class-name schemes for the same
//! widgets over time (default react-select prefixes, custom prefixes, raw
//! emotion hashes), and its buttons carry Arabic labels with spelling
//! variants. Each chain walks from the scheme seen most recently down to
//! generic ARIA fallbacks.

use crate::browser::dom::Locator;

pub const USERNAME_FIELDS: &[Locator] = &[
    Locator::css(r#"input[name="username"]"#),
    Locator::css(r#"input[name="email"]"#),
    Locator::css(r#"input[type="email"]"#),
    Locator::css(r#"input[autocomplete="username"]"#),
    Locator::css(r#"input[id*="user"]"#),
];

pub const PASSWORD_FIELDS: &[Locator] = &[
    Locator::css(r#"input[name="password"]"#),
    Locator::css(r#"input[type="password"]"#),
];

pub const SUBMIT_BUTTONS: &[Locator] = &[
    Locator::with_text("button", "تسجيل الدخول"),
    Locator::css(r#"button[type="submit"]"#),
    Locator::with_text("button", "دخول"),
    Locator::with_text("button", "Login"),
    Locator::with_text("button", "Sign in"),
    Locator::css(r#"input[type="submit"]"#),
];

/// Where the portal renders login rejections, across its framework variants.
pub const LOGIN_ERROR_MESSAGES: &[Locator] = &[
    Locator::css(".alert-danger"),
    Locator::css(r#"[role="alert"]"#),
    Locator::css(".invalid-feedback"),
    Locator::css(".error-message"),
    Locator::css(".text-danger"),
];

/// The searchable program dropdown's clickable control.
pub const COMBOBOX_CONTROLS: &[Locator] = &[
    Locator::css(r#"div[class*="react-select__control"]"#),
    Locator::css(r#"div[class*="select__control"]"#),
    Locator::css(r#"div[class*="css-"][class*="-control"]"#),
    Locator::css(r#"[role="combobox"]"#),
];

/// Entries of the expanded option list.
pub const OPTION_ITEMS: &[Locator] = &[
    Locator::css(r#"div[class*="react-select__option"]"#),
    Locator::css(r#"div[class*="select__option"]"#),
    Locator::css(r#"div[class*="css-"][class*="-option"]"#),
    Locator::css(r#"[role="option"]"#),
];

/// The control's currently-selected value, for the degraded read path.
pub const SINGLE_VALUE: &[Locator] = &[
    Locator::css(r#"div[class*="react-select__single-value"]"#),
    Locator::css(r#"div[class*="select__single-value"]"#),
    Locator::css(r#"div[class*="-singleValue"]"#),
];

pub const CONTINUE_BUTTONS: &[Locator] = &[
    Locator::with_text("button", "إستمرار"),
    Locator::with_text("button", "استمرار"),
    Locator::with_text("button", "متابعة"),
    Locator::with_text("button", "Continue"),
    Locator::css(r#"button[type="submit"]"#),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_chains_lead_with_the_portal_names() {
        assert_eq!(USERNAME_FIELDS[0].css, r#"input[name="username"]"#);
        assert_eq!(PASSWORD_FIELDS[0].css, r#"input[name="password"]"#);
    }

    #[test]
    fn continue_chain_covers_both_arabic_spellings() {
        let labels: Vec<_> = CONTINUE_BUTTONS
            .iter()
            .filter_map(|l| l.text_contains)
            .collect();
        assert!(labels.contains(&"إستمرار"));
        assert!(labels.contains(&"استمرار"));
    }

    #[test]
    fn every_chain_has_a_generic_fallback() {
        // Text-filtered locators alone would miss a redesigned widget; each
        // chain must end in at least one structural selector.
        for chain in [SUBMIT_BUTTONS, COMBOBOX_CONTROLS, OPTION_ITEMS, CONTINUE_BUTTONS] {
            assert!(
                chain.iter().any(|l| l.text_contains.is_none()),
                "chain lacks a structural fallback"
            );
        }
    }
}
