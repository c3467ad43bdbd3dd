// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counts state-changing statements since the last sync.

use std::sync::atomic::{AtomicU64, Ordering};

const MUTATING_VERBS: [&str; 3] = ["INSERT", "UPDATE", "DELETE"];

/// Classify a statement by its leading verb, ignoring case and leading whitespace.
pub fn is_mutation(sql: &str) -> bool {
    let head = sql.trim_start();
    MUTATING_VERBS.iter().any(|verb| {
        head.get(..verb.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(verb))
    })
}

/// Mutation counter shared by a façade and whoever reports sync state.
#[derive(Debug, Default)]
pub struct MutationTracker {
    count: AtomicU64,
}

impl MutationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `sql` if it mutates. Returns whether it did.
    pub fn observe(&self, sql: &str) -> bool {
        let mutates = is_mutation(sql);
        if mutates {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
        mutates
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }

    /// Subtract `seen` mutations that have been synced, keeping any counted
    /// after the sync read its snapshot.
    pub fn acknowledge(&self, seen: u64) {
        let _ = self
            .count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_sub(seen))
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn classifies_by_leading_verb() {
        assert!(is_mutation("INSERT INTO notes (text) VALUES (?)"));
        assert!(is_mutation("  \n\tupdate counter SET value = 1"));
        assert!(is_mutation("Delete FROM notes"));
        assert!(!is_mutation("SELECT * FROM counter"));
        assert!(!is_mutation("WITH x AS (SELECT 1) UPDATE counter SET value = 1"));
        assert!(!is_mutation(""));
        assert!(!is_mutation("UPD"));
        assert!(!is_mutation("é"));
    }

    #[test]
    fn counts_and_resets() {
        let tracker = MutationTracker::new();
        assert!(tracker.observe("INSERT INTO notes (text) VALUES ('a')"));
        assert!(!tracker.observe("SELECT 1"));
        assert!(tracker.observe("UPDATE counter SET value = 2"));
        assert_eq!(tracker.count(), 2);
        tracker.reset();
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn acknowledge_keeps_later_mutations() {
        let tracker = MutationTracker::new();
        for _ in 0..5 {
            tracker.observe("DELETE FROM notes");
        }
        tracker.acknowledge(3);
        assert_eq!(tracker.count(), 2);
        tracker.acknowledge(10);
        assert_eq!(tracker.count(), 0);
    }

    proptest! {
        #[test]
        fn count_equals_number_of_mutations(
            statements in proptest::collection::vec(
                prop_oneof![
                    Just("INSERT INTO t VALUES (1)"),
                    Just("update t set a = 1"),
                    Just("  DELETE FROM t"),
                    Just("SELECT * FROM t"),
                    Just("PRAGMA user_version"),
                ],
                0..64,
            )
        ) {
            let tracker = MutationTracker::new();
            let mut expected = 0u64;
            for sql in &statements {
                tracker.observe(sql);
                if !sql.trim_start().to_ascii_uppercase().starts_with("SELECT")
                    && !sql.starts_with("PRAGMA")
                {
                    expected += 1;
                }
            }
            prop_assert_eq!(tracker.count(), expected);
        }
    }
}
