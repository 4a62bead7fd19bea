//! Native browser session management using `chromiumoxide`.
//!
//! This module is the single source of truth for:
//! * Finding a usable browser executable (env override → PATH → well-known paths).
//! * Launching one headless session with anti-fingerprinting configuration.
//! * Readiness waits bounded by timeouts (preferred over fixed sleeps).
//! * Scoped teardown on every exit path.
//!
//! JS-level fingerprint masking lives in [`stealth`]; selector-chain
//! resolution over the unstable DOM lives in [`dom`].

pub mod dom;
pub mod stealth;

use std::path::Path;
use std::time::Duration;

use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::cdp::browser_protocol::emulation::SetTimezoneOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::element::Element;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::error::MonitorError;

/// Fixed, realistic desktop profile. The portal sees the same fingerprint on
/// every visit; rotating it per-run would itself be a tell for a monitor that
/// logs in once and stays.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36";

const PORTAL_TIMEZONE: &str = "Africa/Cairo";
const VIEWPORT_WIDTH: u32 = 1920;
const VIEWPORT_HEIGHT: u32 = 1080;

/// Find a usable Chromium-family browser executable.
///
/// Resolution order:
/// 1. `CHROME_EXECUTABLE` env var (explicit override)
/// 2. PATH scan — finds package-manager installs on all platforms.
/// 3. OS-specific well-known install paths.
pub fn find_browser_executable() -> Option<String> {
    if let Ok(p) = std::env::var("CHROME_EXECUTABLE") {
        if Path::new(&p).exists() {
            return Some(p);
        }
    }

    if let Ok(path_var) = std::env::var("PATH") {
        let candidates = [
            "google-chrome",
            "chromium",
            "chromium-browser",
            "chrome",
            "brave-browser",
        ];
        for dir in std::env::split_paths(&path_var) {
            for exe in candidates {
                let full = dir.join(exe);
                if full.exists() {
                    return Some(full.to_string_lossy().to_string());
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/local/bin/chromium",
            "/usr/bin/brave-browser",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    None
}

/// Build a headless `BrowserConfig` with the anti-fingerprinting defaults.
///
/// Flags chosen for:
/// * Compatibility with CI / container environments (`--no-sandbox`,
///   `--disable-dev-shm-usage`).
/// * Stealth — `--disable-blink-features=AutomationControlled` hides the
///   `navigator.webdriver` flag at the process level; the fixed UA and the
///   portal locale complete the profile.
fn build_headless_config(exe: &str) -> Result<BrowserConfig, MonitorError> {
    BrowserConfig::builder()
        .chrome_executable(exe)
        .viewport(Viewport {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .arg("--disable-background-networking")
        .arg("--disable-sync")
        .arg("--disable-translate")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--hide-scrollbars")
        .arg("--mute-audio")
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--lang=ar-EG,en-US")
        .arg(format!("--user-agent={}", USER_AGENT))
        .build()
        .map_err(|e| MonitorError::BrowserInit(format!("browser config: {e}")))
}

/// One headless browser process plus the single page the monitor drives.
///
/// The session exclusively owns the browser; the page handle is never shared
/// across tasks.
pub struct BrowserSession {
    browser: Browser,
    pub page: Page,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch the browser and return a ready, stealth-configured page.
    ///
    /// Fatal on any failure — the monitoring run never starts without a
    /// working session.
    pub async fn acquire() -> Result<Self, MonitorError> {
        let exe = find_browser_executable().ok_or_else(|| {
            MonitorError::BrowserInit(
                "no browser found. Install Chrome or Chromium, or set CHROME_EXECUTABLE".into(),
            )
        })?;

        info!("launching headless browser: {exe}");
        let config = build_headless_config(&exe)?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .map_err(|e| MonitorError::BrowserInit(format!("launch ({exe}): {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    warn!("CDP handler error: {e}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| MonitorError::BrowserInit(format!("open page: {e}")))?;

        // Mask automation fingerprints before any portal document runs.
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
            stealth::STEALTH_SCRIPT,
        ))
        .await
        .map_err(|e| MonitorError::BrowserInit(format!("stealth injection: {e}")))?;

        // Pin the clock to the portal's timezone. Soft: an old browser build
        // without the override still works, just with a mismatched clock.
        if let Err(e) = page
            .execute(SetTimezoneOverrideParams::new(PORTAL_TIMEZONE))
            .await
        {
            warn!("timezone override failed (continuing): {e}");
        }

        info!("browser session ready");
        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Cheap CDP round-trip probe. `false` means the connection (or the
    /// browser process) is gone and no further cycle can observe anything.
    pub async fn is_alive(&self) -> bool {
        self.page.url().await.is_ok()
    }

    /// Scoped teardown; runs on every exit path, fatal or not.
    pub async fn release(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("browser close error (non-fatal): {e}");
        }
        self.handler.abort();
        info!("browser session released");
    }
}

/// Wait until the page looks rendered: `document.readyState === "complete"`
/// and no new resource entries for `quiet_ms` consecutive ms, bounded by
/// `timeout_ms`.
///
/// Polls `performance.getEntriesByType("resource").length` every 250 ms — a
/// network-idle heuristic that needs no CDP Network events. Timeouts are not
/// errors here; callers re-derive state from the DOM afterwards.
pub async fn wait_until_ready(page: &Page, quiet_ms: u64, timeout_ms: u64) {
    let poll_ms = 250u64;
    let start = std::time::Instant::now();
    let mut last_count: u64 = 0;
    let mut stable_since = std::time::Instant::now();

    loop {
        if start.elapsed().as_millis() as u64 >= timeout_ms {
            debug!("wait_until_ready: timeout after {timeout_ms}ms");
            return;
        }

        let count: u64 = page
            .evaluate("performance.getEntriesByType('resource').length")
            .await
            .ok()
            .and_then(|v| v.into_value::<serde_json::Value>().ok())
            .and_then(|j| j.as_u64())
            .unwrap_or(0);

        let ready_complete: bool = page
            .evaluate("document.readyState")
            .await
            .ok()
            .and_then(|v| v.into_value::<serde_json::Value>().ok())
            .and_then(|j| j.as_str().map(|s| s == "complete"))
            .unwrap_or(false);

        if !ready_complete {
            // DOM not fully loaded; don't let "idle" trigger yet.
            stable_since = std::time::Instant::now();
            last_count = count;
        } else if count != last_count {
            last_count = count;
            stable_since = std::time::Instant::now();
        } else if stable_since.elapsed().as_millis() as u64 >= quiet_ms {
            debug!(
                "wait_until_ready: idle after {}ms ({count} resources)",
                start.elapsed().as_millis()
            );
            return;
        }

        tokio::time::sleep(Duration::from_millis(poll_ms)).await;
    }
}

/// Poll for the first element matching `css`, bounded by `timeout_ms`.
pub async fn wait_for_element(page: &Page, css: &str, timeout_ms: u64) -> Option<Element> {
    let start = std::time::Instant::now();
    loop {
        if let Ok(element) = page.find_element(css).await {
            return Some(element);
        }
        if start.elapsed().as_millis() as u64 >= timeout_ms {
            debug!("wait_for_element: {css} absent after {timeout_ms}ms");
            return None;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}
