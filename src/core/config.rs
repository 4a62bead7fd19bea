use std::fmt;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

use crate::notify::TelegramTarget;

// ---------------------------------------------------------------------------
// MonitorConfig — file-based config loader (admitwatch.json) with env-var
// fallback
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://admission.study-in-egypt.gov.eg";
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_STATUS_PORT: u16 = 8080;

/// Portal credentials, supplied once at startup and never mutated.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// Never log the password.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Raw shape of `admitwatch.json`. Every field is optional; anything absent
/// falls back to its env var, then to the built-in default (or a hard error
/// for the required fields).
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FileConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub base_url: Option<String>,
    pub request_url: Option<String>,
    pub target_programs: Option<Vec<String>>,
    pub check_interval_secs: Option<u64>,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    /// `[min_ms, max_ms]` per-keystroke delay. Absent ⇒ instant field fill.
    pub typing_delay_ms: Option<[u64; 2]>,
    pub status_port: Option<u16>,
}

/// Fully-resolved startup configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub credentials: Credentials,
    pub base_url: String,
    /// The application page carrying the program-selection widget.
    pub request_url: String,
    /// Operator-supplied target substrings, in configured order.
    pub targets: Vec<String>,
    pub check_interval: Duration,
    pub telegram: Option<TelegramTarget>,
    /// Per-keystroke delay range; `None` disables the typing-cadence strategy.
    pub typing_delay_ms: Option<(u64, u64)>,
    pub status_port: u16,
}

impl MonitorConfig {
    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url.trim_end_matches('/'))
    }

    /// Load `admitwatch.json` from standard locations, then resolve every
    /// field against the process environment.
    ///
    /// Search order (first found wins):
    /// 1. `ADMITWATCH_CONFIG` env var path
    /// 2. `./admitwatch.json`
    /// 3. `../admitwatch.json`
    ///
    /// Missing file → env vars only. Parse error → warn and fall back to env.
    pub fn load() -> anyhow::Result<Self> {
        let file = load_file_config();
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Pure resolver, separated from the process environment for tests.
    pub fn from_sources(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let pick = |file_val: Option<String>, keys: &[&str]| -> Option<String> {
            file_val
                .or_else(|| keys.iter().find_map(|k| env(k)))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let username = pick(file.username, &["ADMITWATCH_USERNAME"])
            .context("username not configured (admitwatch.json or ADMITWATCH_USERNAME)")?;
        let password = pick(file.password, &["ADMITWATCH_PASSWORD"])
            .context("password not configured (admitwatch.json or ADMITWATCH_PASSWORD)")?;

        let base_url = pick(file.base_url, &["ADMITWATCH_BASE_URL"])
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let request_url = pick(file.request_url, &["ADMITWATCH_REQUEST_URL"])
            .context("request_url not configured (admitwatch.json or ADMITWATCH_REQUEST_URL)")?;
        Url::parse(&request_url)
            .with_context(|| format!("request_url is not a valid URL: {request_url}"))?;

        let targets: Vec<String> = file
            .target_programs
            .unwrap_or_default()
            .into_iter()
            .chain(
                env("ADMITWATCH_TARGET_PROGRAMS")
                    .unwrap_or_default()
                    .split(',')
                    .map(str::to_string),
            )
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if targets.is_empty() {
            bail!("no target programs configured (admitwatch.json target_programs or ADMITWATCH_TARGET_PROGRAMS)");
        }

        let check_interval_secs = file
            .check_interval_secs
            .or_else(|| env("ADMITWATCH_CHECK_INTERVAL_SECS").and_then(|v| v.trim().parse().ok()))
            .unwrap_or(DEFAULT_CHECK_INTERVAL_SECS);

        let telegram_token = pick(
            file.telegram_token,
            &["ADMITWATCH_TELEGRAM_TOKEN", "TELEGRAM_TOKEN"],
        );
        let telegram_chat_id = pick(
            file.telegram_chat_id,
            &["ADMITWATCH_TELEGRAM_CHAT_ID", "TELEGRAM_CHAT_ID"],
        );
        let telegram = match (telegram_token, telegram_chat_id) {
            (Some(token), Some(chat_id)) => Some(TelegramTarget { token, chat_id }),
            (None, None) => None,
            _ => {
                tracing::warn!("telegram token and chat id must both be set; alerts disabled");
                None
            }
        };

        let typing_delay_ms = file
            .typing_delay_ms
            .map(|[min, max]| (min, max))
            .or_else(|| {
                env("ADMITWATCH_TYPING_DELAY_MS")
                    .as_deref()
                    .and_then(parse_delay_range)
            })
            .map(|(min, max)| if min <= max { (min, max) } else { (max, min) });

        let status_port = file
            .status_port
            .or_else(|| {
                ["ADMITWATCH_PORT", "PORT"]
                    .iter()
                    .find_map(|k| env(k).and_then(|v| v.trim().parse().ok()))
            })
            .unwrap_or(DEFAULT_STATUS_PORT);

        Ok(Self {
            credentials: Credentials { username, password },
            base_url,
            request_url,
            targets,
            check_interval: Duration::from_secs(check_interval_secs),
            telegram,
            typing_delay_ms,
            status_port,
        })
    }
}

/// Parse a `"40-120"`-style keystroke-delay range.
fn parse_delay_range(raw: &str) -> Option<(u64, u64)> {
    let (min, max) = raw.split_once('-')?;
    Some((min.trim().parse().ok()?, max.trim().parse().ok()?))
}

fn load_file_config() -> FileConfig {
    let mut candidates = vec![
        std::path::PathBuf::from("admitwatch.json"),
        std::path::PathBuf::from("../admitwatch.json"),
    ];
    if let Ok(env_path) = std::env::var("ADMITWATCH_CONFIG") {
        candidates.insert(0, std::path::PathBuf::from(env_path));
    }

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<FileConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("admitwatch.json loaded from {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    tracing::warn!(
                        "admitwatch.json parse error at {}: {} — falling back to env vars",
                        path.display(),
                        e
                    );
                    return FileConfig::default();
                }
            },
            Err(_) => continue, // not found at this path — try next
        }
    }

    FileConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn minimal_file() -> FileConfig {
        FileConfig {
            username: Some("student".into()),
            password: Some("hunter2".into()),
            request_url: Some("https://portal.example/requests/new".into()),
            target_programs: Some(vec!["Computer Science".into()]),
            ..FileConfig::default()
        }
    }

    #[test]
    fn resolves_defaults_for_optional_fields() {
        let cfg = MonitorConfig::from_sources(minimal_file(), |_| None).unwrap();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.check_interval, Duration::from_secs(30));
        assert_eq!(cfg.status_port, 8080);
        assert!(cfg.telegram.is_none());
        assert!(cfg.typing_delay_ms.is_none());
        assert_eq!(cfg.login_url(), format!("{DEFAULT_BASE_URL}/login"));
    }

    #[test]
    fn env_fallback_fills_missing_fields() {
        let file = FileConfig {
            username: Some("student".into()),
            password: Some("hunter2".into()),
            ..FileConfig::default()
        };
        let env = env_of(&[
            ("ADMITWATCH_REQUEST_URL", "https://portal.example/apply"),
            ("ADMITWATCH_TARGET_PROGRAMS", "Dentistry, Computer Science ,"),
            ("ADMITWATCH_CHECK_INTERVAL_SECS", "60"),
            ("TELEGRAM_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "42"),
        ]);
        let cfg = MonitorConfig::from_sources(file, env).unwrap();
        assert_eq!(cfg.targets, vec!["Dentistry", "Computer Science"]);
        assert_eq!(cfg.check_interval, Duration::from_secs(60));
        let tg = cfg.telegram.expect("telegram configured");
        assert_eq!(tg.chat_id, "42");
    }

    #[test]
    fn missing_required_fields_error_out() {
        let err = MonitorConfig::from_sources(FileConfig::default(), |_| None).unwrap_err();
        assert!(err.to_string().contains("username"));
    }

    #[test]
    fn empty_target_list_is_rejected() {
        let mut file = minimal_file();
        file.target_programs = Some(vec!["  ".into()]);
        let err = MonitorConfig::from_sources(file, |_| None).unwrap_err();
        assert!(err.to_string().contains("target programs"));
    }

    #[test]
    fn typing_delay_parses_and_normalizes() {
        assert_eq!(parse_delay_range("40-120"), Some((40, 120)));
        assert_eq!(parse_delay_range(" 40 - 120 "), Some((40, 120)));
        assert_eq!(parse_delay_range("nope"), None);

        let mut file = minimal_file();
        file.typing_delay_ms = Some([150, 50]); // reversed bounds get swapped
        let cfg = MonitorConfig::from_sources(file, |_| None).unwrap();
        assert_eq!(cfg.typing_delay_ms, Some((50, 150)));
    }

    #[test]
    fn invalid_request_url_is_rejected() {
        let mut file = minimal_file();
        file.request_url = Some("not a url".into());
        assert!(MonitorConfig::from_sources(file, |_| None).is_err());
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "student".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("student"));
    }
}
