//! Best-effort operator alerts over the Telegram Bot API.
//!
//! Every send is fire-and-forget: a network or API failure is logged and
//! swallowed — a flaky webhook must never take down the monitoring loop.

use std::path::Path;

use chrono::Local;
use tracing::{debug, warn};

use crate::core::status::TIMESTAMP_FORMAT;

const API_BASE: &str = "https://api.telegram.org";

/// Bot token + recipient chat, resolved once at startup.
#[derive(Debug, Clone)]
pub struct TelegramTarget {
    pub token: String,
    pub chat_id: String,
}

pub struct Notifier {
    client: reqwest::Client,
    target: Option<TelegramTarget>,
}

impl Notifier {
    pub fn new(client: reqwest::Client, target: Option<TelegramTarget>) -> Self {
        Self { client, target }
    }

    pub fn enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Send an HTML-formatted text alert.
    pub async fn send_alert(&self, text: &str) {
        let Some(target) = &self.target else {
            debug!("alerts disabled; dropping message");
            return;
        };
        let url = format!("{API_BASE}/bot{}/sendMessage", target.token);
        let params = [
            ("chat_id", target.chat_id.as_str()),
            ("text", text),
            ("parse_mode", "HTML"),
        ];
        match self.client.post(&url).form(&params).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => warn!("telegram sendMessage rejected: {}", resp.status()),
            Err(e) => warn!("telegram sendMessage failed: {e}"),
        }
    }

    /// Deliver a screenshot.
    pub async fn send_photo(&self, path: &Path, caption: &str) {
        self.send_file("sendPhoto", "photo", path, caption).await;
    }

    /// Deliver an arbitrary diagnostic file (page dumps).
    pub async fn send_document(&self, path: &Path, caption: &str) {
        self.send_file("sendDocument", "document", path, caption)
            .await;
    }

    async fn send_file(&self, method: &str, part_name: &str, path: &Path, caption: &str) {
        let Some(target) = &self.target else {
            return;
        };
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("cannot read attachment {}: {e}", path.display());
                return;
            }
        };
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "attachment".to_string());
        let form = reqwest::multipart::Form::new()
            .text("chat_id", target.chat_id.clone())
            .text("caption", caption.to_string())
            .part(
                part_name.to_string(),
                reqwest::multipart::Part::bytes(bytes).file_name(filename),
            );
        let url = format!("{API_BASE}/bot{}/{method}", target.token);
        match self.client.post(&url).multipart(form).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => warn!("telegram {method} rejected: {}", resp.status()),
            Err(e) => warn!("telegram {method} failed: {e}"),
        }
    }
}

// ── Message builders ─────────────────────────────────────────────────────────

pub fn run_started_message(targets: &[String], interval_secs: u64) -> String {
    format!(
        "🚀 <b>Monitoring started</b>\n\n📚 Watching: {}\n⏱️ Interval: {interval_secs}s",
        html_escape(&targets.join(", "))
    )
}

pub fn success_message(program: &str, request_url: &str) -> String {
    format!(
        "🎉 <b>Target program found!</b>\n\n\
         📚 <b>Program:</b>\n{}\n\n\
         ✅ Selected and continue clicked.\n\n\
         ⏰ {}\n\
         🔗 {}\n\n\
         ⚡ Go finish the application now!",
        html_escape(program),
        Local::now().format(TIMESTAMP_FORMAT),
        html_escape(request_url),
    )
}

pub fn stopped_message() -> String {
    "⛔ Monitoring stopped".to_string()
}

pub fn fatal_message(detail: &str) -> String {
    format!("❌ <b>Monitoring aborted</b>\n\n{}", html_escape(detail))
}

/// Minimal escaping for Telegram's HTML parse mode; program names and error
/// details are interpolated verbatim otherwise.
fn html_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifier_without_target_is_disabled() {
        let notifier = Notifier::new(reqwest::Client::new(), None);
        assert!(!notifier.enabled());
    }

    #[test]
    fn success_message_carries_program_and_link() {
        let msg = success_message("BSc Computer Science", "https://portal.example/apply");
        assert!(msg.contains("BSc Computer Science"));
        assert!(msg.contains("https://portal.example/apply"));
    }

    #[test]
    fn html_is_escaped_in_interpolated_values() {
        let msg = fatal_message("selector <button> & co failed");
        assert!(msg.contains("&lt;button&gt;"));
        assert!(msg.contains("&amp; co"));
        assert!(!msg.contains("<button>"));
    }
}
