use std::collections::HashSet;

use admitwatch::core::config::{FileConfig, MonitorConfig};
use admitwatch::matcher::{fresh_matches, new_since};
use admitwatch::{MonitorState, StatusStore, TargetProgramSet};

fn snapshot(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The end-to-end matching walk an operator actually sees: two quiet cycles,
/// then the target appears and fires exactly once.
#[test]
fn appearance_scenario_alerts_once_and_only_once() {
    let targets = TargetProgramSet::new(["Computer Science"]);
    let mut found: HashSet<String> = HashSet::new();
    let mut previous = HashSet::new();

    for _ in 0..2 {
        let snap = snapshot(&["Intro to Art"]);
        assert!(fresh_matches(&snap, &targets, &found).is_empty());
        previous = snap;
    }

    let snap = snapshot(&["Intro to Art", "BSc Computer Science"]);
    assert_eq!(new_since(&previous, &snap), vec!["BSc Computer Science"]);

    let matches = fresh_matches(&snap, &targets, &found);
    assert_eq!(matches, vec!["BSc Computer Science".to_string()]);
    found.extend(matches);

    // The found set is monotone: the same snapshot never re-alerts.
    assert!(fresh_matches(&snap, &targets, &found).is_empty());
    assert_eq!(found, snapshot(&["BSc Computer Science"]));
}

#[test]
fn status_store_is_shared_across_threads() {
    let store = StatusStore::new();
    let writer = store.clone();

    let handle = std::thread::spawn(move || {
        writer.set_state(MonitorState::Checking);
        for _ in 0..5 {
            writer.record_check();
        }
    });
    handle.join().expect("writer thread");

    let snap = store.snapshot();
    assert_eq!(snap.state, MonitorState::Checking);
    assert_eq!(snap.checks_count, 5);
    assert!(snap.last_check.is_some());
}

/// Polling is a fixed cadence, not a backoff schedule: the configured interval
/// is what every quiet cycle sleeps.
#[test]
fn check_interval_defaults_to_thirty_seconds() {
    let file = FileConfig {
        username: Some("student".into()),
        password: Some("pw".into()),
        request_url: Some("https://portal.example/apply".into()),
        target_programs: Some(vec!["Computer Science".into()]),
        ..FileConfig::default()
    };
    let cfg = MonitorConfig::from_sources(file, |_| None).expect("valid config");
    assert_eq!(cfg.check_interval.as_secs(), 30);
}
