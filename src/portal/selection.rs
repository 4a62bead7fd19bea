//! Acts on a matched listing: re-open the widget, click the option, then the
//! continue control.
//!
//! Both operations are soft — a `false` abandons the current attempt and the
//! monitor moves on. Matching is substring containment, not equality, so
//! whitespace or formatting drift between enumeration and re-enumeration
//! doesn't lose the click.

use std::time::Duration;

use chromiumoxide::Page;
use tracing::{info, warn};

use crate::browser::dom;
use crate::portal::selectors;

const MENU_RENDER_DELAY_MS: u64 = 800;
/// Give the widget's change handler time to commit before the next click.
const POST_CLICK_SETTLE_MS: u64 = 1_000;

/// Re-open the combobox and click the option containing `program_name`.
pub async fn select_program(page: &Page, program_name: &str) -> bool {
    info!("selecting program: {program_name}");

    let Some(control) = dom::first_from_chain(page, selectors::COMBOBOX_CONTROLS).await else {
        warn!("combobox control vanished before selection");
        return false;
    };
    if let Err(e) = control.click().await {
        warn!("could not re-open the option list: {e}");
        return false;
    }
    tokio::time::sleep(Duration::from_millis(MENU_RENDER_DELAY_MS)).await;

    let options = dom::resolve_chain(page, selectors::OPTION_ITEMS).await;
    for option in &options {
        let Some(text) = dom::text_of(option).await else {
            continue;
        };
        if text.contains(program_name) {
            match option.click().await {
                Ok(_) => {
                    tokio::time::sleep(Duration::from_millis(POST_CLICK_SETTLE_MS)).await;
                    info!("program option clicked");
                    return true;
                }
                Err(e) => {
                    warn!("option click failed: {e}");
                    return false;
                }
            }
        }
    }

    warn!("option containing {program_name:?} not present on re-enumeration");
    false
}

/// Click the first clickable "continue" control.
pub async fn click_continue(page: &Page) -> bool {
    if dom::click_first_clickable(page, selectors::CONTINUE_BUTTONS).await {
        tokio::time::sleep(Duration::from_millis(POST_CLICK_SETTLE_MS)).await;
        info!("continue button clicked");
        true
    } else {
        warn!("no continue button matched any known label");
        false
    }
}
