use std::sync::{Arc, RwLock};

use chrono::Local;
use serde::Serialize;

/// Timestamp format used in the status record and in log-friendly contexts.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The monitor's state machine.
///
/// `Initializing → BrowserReady → LoggedIn → Checking ⟳` and then one of the
/// terminal states. `Stopped` is only entered from an external stop signal,
/// checked at cycle boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Initializing,
    BrowserReady,
    LoggedIn,
    Checking,
    FoundAndSelected,
    Error,
    Stopped,
}

/// The process-wide status record served by the read-only HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorStatus {
    pub state: MonitorState,
    pub last_check: Option<String>,
    pub checks_count: u64,
}

impl Default for MonitorStatus {
    fn default() -> Self {
        Self {
            state: MonitorState::Initializing,
            last_check: None,
            checks_count: 0,
        }
    }
}

/// Shared handle to the status record.
///
/// Written only by the monitor loop, read by the status endpoints. Explicitly
/// passed to both tasks — there is no ambient global.
#[derive(Clone, Default)]
pub struct StatusStore(Arc<RwLock<MonitorStatus>>);

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&self, state: MonitorState) {
        self.write(|s| s.state = state);
    }

    /// Stamp the current time and bump the check counter; called once per
    /// completed extraction cycle.
    pub fn record_check(&self) {
        let now = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.write(|s| {
            s.checks_count += 1;
            s.last_check = Some(now);
        });
    }

    pub fn state(&self) -> MonitorState {
        self.snapshot().state
    }

    pub fn snapshot(&self) -> MonitorStatus {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write(&self, mutate: impl FnOnce(&mut MonitorStatus)) {
        match self.0.write() {
            Ok(mut guard) => mutate(&mut guard),
            Err(poisoned) => mutate(&mut poisoned.into_inner()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_initializing_with_zero_checks() {
        let store = StatusStore::new();
        let snap = store.snapshot();
        assert_eq!(snap.state, MonitorState::Initializing);
        assert_eq!(snap.checks_count, 0);
        assert!(snap.last_check.is_none());
    }

    #[test]
    fn record_check_bumps_counter_and_stamps_time() {
        let store = StatusStore::new();
        store.record_check();
        store.record_check();
        let snap = store.snapshot();
        assert_eq!(snap.checks_count, 2);
        let stamp = snap.last_check.expect("last_check set after a cycle");
        chrono::NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT)
            .expect("stamp round-trips through the declared format");
    }

    #[test]
    fn state_transitions_are_visible_to_clones() {
        let store = StatusStore::new();
        let reader = store.clone();
        store.set_state(MonitorState::Checking);
        assert_eq!(reader.state(), MonitorState::Checking);
    }

    #[test]
    fn state_serializes_snake_case() {
        let json = serde_json::to_string(&MonitorState::FoundAndSelected).unwrap();
        assert_eq!(json, "\"found_and_selected\"");
    }
}
