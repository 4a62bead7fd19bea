use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures of the browser session itself.
///
/// A fatal login failure is its own type ([`LoginFailure`], returned straight
/// from the authenticator). Everything else — an unresolved selector, a
/// failed option click, a navigation timeout mid-cycle — is a *soft* failure
/// and surfaces as a degraded value (`false`, empty snapshot) at the method
/// boundary, never as an `Err`.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The browser could not be launched; the run never starts.
    #[error("browser init failed: {0}")]
    BrowserInit(String),

    /// The CDP connection died mid-run. Without it every later cycle would
    /// observe an empty page forever, so this aborts the loop.
    #[error("browser connection lost: {0}")]
    BrowserGone(String),
}

/// Attributes of one `<input>` element, harvested for diagnostics when the
/// username/password selector chains are exhausted.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct InputProbe {
    #[serde(default, rename = "type")]
    pub input_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub placeholder: String,
}

#[derive(Debug, Error)]
pub enum LoginFailureKind {
    #[error("login page unreachable: {0}")]
    PageUnreachable(String),

    #[error("no input fields ever appeared on the login page")]
    NoInputFields,

    #[error("username/password fields not found; first inputs on page: {observed:?}")]
    FieldsNotFound { observed: Vec<InputProbe> },

    #[error("interacting with the login form failed: {0}")]
    FormInteraction(String),

    #[error("no submit control could be activated")]
    SubmitNotFound,

    /// The portal showed a visible error message — bad credentials or a
    /// validation problem.
    #[error("portal rejected the login: {}", .messages.join("; "))]
    Rejected { messages: Vec<String> },

    /// Still on the login page but nothing in the error-message chains
    /// matched.
    #[error("still on the login page with no visible error message ({url})")]
    Undiagnosed { url: String },
}

/// A classified login failure plus whatever diagnostic artifacts were captured
/// on the way out.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct LoginFailure {
    pub kind: LoginFailureKind,
    /// Artifact capture is best-effort; `None` means it failed too.
    pub screenshot: Option<PathBuf>,
    pub page_dump: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_joins_portal_errors() {
        let kind = LoginFailureKind::Rejected {
            messages: vec!["bad password".into(), "account locked".into()],
        };
        assert_eq!(
            kind.to_string(),
            "portal rejected the login: bad password; account locked"
        );
    }

    #[test]
    fn login_failure_displays_its_kind() {
        let failure = LoginFailure {
            kind: LoginFailureKind::NoInputFields,
            screenshot: None,
            page_dump: None,
        };
        assert_eq!(
            failure.to_string(),
            "no input fields ever appeared on the login page"
        );
    }
}
