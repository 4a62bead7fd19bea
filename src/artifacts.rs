//! Timestamp-named diagnostic artifacts: screenshots and page dumps.
//!
//! Capture is always best-effort — an unwritable disk costs the artifact, not
//! the run.

use std::path::PathBuf;

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use chrono::{DateTime, Local};
use tracing::{info, warn};

/// Artifact directory: `ADMITWATCH_ARTIFACTS_DIR` → `~/.admitwatch/artifacts`
/// → a temp-dir fallback for homeless environments (containers).
pub fn artifacts_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ADMITWATCH_ARTIFACTS_DIR") {
        let dir = dir.trim();
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".admitwatch").join("artifacts"))
        .unwrap_or_else(|| std::env::temp_dir().join("admitwatch-artifacts"))
}

/// `label_20260804_153000.ext`
pub fn artifact_filename(label: &str, ext: &str, at: DateTime<Local>) -> String {
    format!("{label}_{}.{ext}", at.format("%Y%m%d_%H%M%S"))
}

/// Capture a full-viewport PNG of the current page.
pub async fn capture_screenshot(page: &Page, label: &str) -> Option<PathBuf> {
    let bytes = match page
        .screenshot(
            ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build(),
        )
        .await
    {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("screenshot capture failed: {e}");
            return None;
        }
    };
    write_artifact(&artifact_filename(label, "png", Local::now()), &bytes)
}

/// Dump the page's rendered HTML.
pub async fn dump_page_html(page: &Page, label: &str) -> Option<PathBuf> {
    let html = match page.content().await {
        Ok(html) => html,
        Err(e) => {
            warn!("page dump failed: {e}");
            return None;
        }
    };
    write_artifact(
        &artifact_filename(label, "html", Local::now()),
        html.as_bytes(),
    )
}

fn write_artifact(filename: &str, bytes: &[u8]) -> Option<PathBuf> {
    let dir = artifacts_dir();
    if let Err(e) = std::fs::create_dir_all(&dir) {
        warn!("cannot create artifacts dir {}: {e}", dir.display());
        return None;
    }
    let path = dir.join(filename);
    match std::fs::write(&path, bytes) {
        Ok(()) => {
            info!("saved artifact: {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("cannot write artifact {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn filenames_are_label_stamped_and_extensioned() {
        let at = Local.with_ymd_and_hms(2026, 8, 4, 15, 30, 0).unwrap();
        assert_eq!(
            artifact_filename("success", "png", at),
            "success_20260804_153000.png"
        );
        assert_eq!(
            artifact_filename("login_failed", "html", at),
            "login_failed_20260804_153000.html"
        );
    }

    #[test]
    fn artifacts_dir_always_resolves_somewhere() {
        assert!(!artifacts_dir().as_os_str().is_empty());
    }
}
