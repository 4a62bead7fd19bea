//! Target matching over listing snapshots.
//!
//! Pure set logic, kept free of browser types so the dedup invariant is
//! trivially testable: a program string that has already triggered an alert
//! never matches again for the lifetime of the run.

use std::collections::HashSet;

use crate::portal::listing::ListingSnapshot;

/// Operator-supplied target substrings, matched case-insensitively by
/// containment.
#[derive(Debug, Clone)]
pub struct TargetProgramSet {
    targets: Vec<String>,
}

impl TargetProgramSet {
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets
                .into_iter()
                .map(|t| t.into().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// `true` if any target substring occurs in `listing`, ignoring case.
    pub fn matches(&self, listing: &str) -> bool {
        let listing = listing.to_lowercase();
        self.targets.iter().any(|t| listing.contains(t))
    }
}

/// Listings in `snapshot` that match a target and have not been alerted yet.
///
/// The returned order is unspecified: the snapshot is an unordered set, so
/// when several targets appear in the same cycle, which is acted on first is
/// deliberately left open.
pub fn fresh_matches(
    snapshot: &ListingSnapshot,
    targets: &TargetProgramSet,
    found: &HashSet<String>,
) -> Vec<String> {
    snapshot
        .iter()
        .filter(|listing| targets.matches(listing) && !found.contains(*listing))
        .cloned()
        .collect()
}

/// Listings present now but absent last cycle, sorted for stable log lines.
/// Diagnostic only; matching never depends on the previous snapshot.
pub fn new_since<'a>(previous: &ListingSnapshot, current: &'a ListingSnapshot) -> Vec<&'a str> {
    let mut fresh: Vec<&str> = current
        .iter()
        .filter(|listing| !previous.contains(*listing))
        .map(String::as_str)
        .collect();
    fresh.sort_unstable();
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(items: &[&str]) -> ListingSnapshot {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matching_is_case_insensitive_substring_containment() {
        let targets = TargetProgramSet::new(["computer"]);
        assert!(targets.matches("BSc Computer Science"));
        assert!(!targets.matches("Art History"));
    }

    #[test]
    fn targets_are_trimmed_and_blank_entries_dropped() {
        let targets = TargetProgramSet::new(["  Computer Science  ", "   "]);
        assert_eq!(targets.len(), 1);
        assert!(targets.matches("bsc computer science"));
    }

    #[test]
    fn already_alerted_listings_never_match_again() {
        let targets = TargetProgramSet::new(["Computer"]);
        let snap = snapshot(&["BSc Computer Science"]);
        let mut found = HashSet::new();

        assert_eq!(fresh_matches(&snap, &targets, &found).len(), 1);
        found.insert("BSc Computer Science".to_string());
        assert!(fresh_matches(&snap, &targets, &found).is_empty());
    }

    #[test]
    fn new_since_reports_only_additions() {
        let prev = snapshot(&["Intro to Art"]);
        let curr = snapshot(&["Intro to Art", "BSc Computer Science", "Dentistry"]);
        assert_eq!(
            new_since(&prev, &curr),
            vec!["BSc Computer Science", "Dentistry"]
        );
        assert!(new_since(&curr, &curr).is_empty());
    }

    /// The two-cycle appearance scenario: nothing matches until the target
    /// program shows up, then it matches exactly once.
    #[test]
    fn target_appearing_in_second_cycle_alerts_exactly_once() {
        let targets = TargetProgramSet::new(["Computer Science"]);
        let mut found: HashSet<String> = HashSet::new();

        // Cycle 1: target absent.
        let cycle1 = snapshot(&["Intro to Art"]);
        assert!(fresh_matches(&cycle1, &targets, &found).is_empty());
        assert!(found.is_empty());

        // Cycle 2: target appears.
        let cycle2 = snapshot(&["Intro to Art", "BSc Computer Science"]);
        let matches = fresh_matches(&cycle2, &targets, &found);
        assert_eq!(matches, vec!["BSc Computer Science".to_string()]);
        for m in &matches {
            found.insert(m.clone());
        }
        assert_eq!(found.len(), 1);

        // Cycle 3: same snapshot, no repeat alert.
        assert!(fresh_matches(&cycle2, &targets, &found).is_empty());
    }
}
