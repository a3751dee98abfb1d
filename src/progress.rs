//! Per-party progress tracking.
//!
//! Each party key owns a private, monotonically growing set of consumed
//! display indices. Records are created lazily on first sight; nothing is
//! ever removed, and parties never observe each other's state. Index bounds
//! are the guess validator's business, not the tracker's.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

/// Consumed display indices of a single party. Cheap snapshot, not a live
/// view; reread after mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartyProgress {
    used: HashSet<usize>,
}

impl PartyProgress {
    pub fn is_used(&self, index: usize) -> bool {
        self.used.contains(&index)
    }

    pub fn used_count(&self) -> usize {
        self.used.len()
    }
}

/// Shared map of party key to progress.
#[derive(Default)]
pub struct ProgressTracker {
    parties: RwLock<HashMap<String, PartyProgress>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a party's progress, creating an empty record on first
    /// sight.
    pub fn get_or_create(&self, party_key: &str) -> PartyProgress {
        self.parties.write().entry(party_key.to_string()).or_default().clone()
    }

    /// Marks display indices consumed for one party. Already-consumed
    /// indices are absorbed silently.
    pub fn mark_used(&self, party_key: &str, indices: &[usize]) {
        self.parties
            .write()
            .entry(party_key.to_string())
            .or_default()
            .used
            .extend(indices.iter().copied());
    }

    /// Tiles the party has not consumed yet, out of `total_tiles`.
    pub fn remaining_count(&self, party_key: &str, total_tiles: usize) -> usize {
        let used = self.parties.read().get(party_key).map_or(0, |p| p.used.len());
        total_tiles.saturating_sub(used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sight_creates_an_empty_record() {
        let tracker = ProgressTracker::new();
        let progress = tracker.get_or_create("party-a");
        assert_eq!(progress.used_count(), 0);
        assert!(!progress.is_used(0));
        assert_eq!(tracker.remaining_count("party-a", 16), 16);
    }

    #[test]
    fn consumed_indices_accumulate() {
        let tracker = ProgressTracker::new();
        tracker.mark_used("party-a", &[0, 1, 2, 3]);
        tracker.mark_used("party-a", &[4, 5, 6, 7]);

        let progress = tracker.get_or_create("party-a");
        assert_eq!(progress.used_count(), 8);
        assert!(progress.is_used(0));
        assert!(progress.is_used(7));
        assert!(!progress.is_used(8));
        assert_eq!(tracker.remaining_count("party-a", 16), 8);
    }

    #[test]
    fn remarking_an_index_changes_nothing() {
        let tracker = ProgressTracker::new();
        tracker.mark_used("party-a", &[0, 1]);
        tracker.mark_used("party-a", &[1, 2]);
        assert_eq!(tracker.get_or_create("party-a").used_count(), 3);
    }

    #[test]
    fn parties_progress_independently() {
        let tracker = ProgressTracker::new();
        tracker.mark_used("party-a", &[0, 1, 2, 3]);

        assert_eq!(tracker.remaining_count("party-a", 16), 12);
        assert_eq!(tracker.remaining_count("party-b", 16), 16);
        assert!(!tracker.get_or_create("party-b").is_used(0));
    }

    #[test]
    fn snapshots_do_not_track_later_mutation() {
        let tracker = ProgressTracker::new();
        let before = tracker.get_or_create("party-a");
        tracker.mark_used("party-a", &[9]);
        assert!(!before.is_used(9));
        assert!(tracker.get_or_create("party-a").is_used(9));
    }

    #[test]
    fn remaining_count_never_underflows() {
        let tracker = ProgressTracker::new();
        tracker.mark_used("party-a", &[0, 1, 2]);
        assert_eq!(tracker.remaining_count("party-a", 2), 0);
    }
}
