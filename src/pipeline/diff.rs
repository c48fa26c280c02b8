//! Diff calculation between two snapshots.
//!
//! Tours are matched by id. A tour present on both sides is modified when any
//! field differs, including an optional field appearing or disappearing.

use std::collections::{HashMap, HashSet};

use crate::models::{Changes, Delta, ModifiedTour, Snapshot, Tour};

/// Calculator for computing diffs between tour lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffCalculator;

impl DiffCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Classify tours as added, removed or modified.
    ///
    /// With no previous list every current tour is added. Added and modified
    /// follow `current` order, removed follows `previous` order. An id that
    /// occurs twice on one side is reported once.
    pub fn calculate(&self, previous: Option<&[Tour]>, current: &[Tour]) -> Changes {
        let Some(previous) = previous else {
            return Changes {
                added: unique_by_id(current),
                ..Changes::default()
            };
        };

        let prev_map: HashMap<&str, &Tour> = previous.iter().map(|t| (t.id.as_str(), t)).collect();
        let curr_ids: HashSet<&str> = current.iter().map(|t| t.id.as_str()).collect();

        let mut changes = Changes::default();
        let mut seen: HashSet<&str> = HashSet::new();

        for tour in current {
            if !seen.insert(tour.id.as_str()) {
                continue;
            }
            match prev_map.get(tour.id.as_str()) {
                None => changes.added.push(tour.clone()),
                Some(before) if *before != tour => {
                    changes
                        .modified
                        .push(ModifiedTour::new((*before).clone(), tour.clone()));
                }
                Some(_) => {}
            }
        }

        let mut seen_removed: HashSet<&str> = HashSet::new();
        for tour in previous {
            if !curr_ids.contains(tour.id.as_str()) && seen_removed.insert(tour.id.as_str()) {
                changes.removed.push(tour.clone());
            }
        }

        changes
    }

    /// Build the delta between two snapshots.
    ///
    /// The delta carries the current snapshot's timestamp, so identical inputs
    /// always produce an identical delta.
    pub fn calculate_delta(&self, previous: Option<&Snapshot>, current: &Snapshot) -> Delta {
        let changes = self.calculate(previous.map(|s| s.tours.as_slice()), &current.tours);
        Delta::new(current.timestamp, previous.map(|s| s.timestamp), changes)
    }
}

fn unique_by_id(tours: &[Tour]) -> Vec<Tour> {
    let mut seen = HashSet::new();
    tours
        .iter()
        .filter(|t| seen.insert(t.id.as_str()))
        .cloned()
        .collect()
}

/// Convenience function to calculate changes.
pub fn calculate_diff(previous: Option<&[Tour]>, current: &[Tour]) -> Changes {
    DiffCalculator::new().calculate(previous, current)
}

/// Convenience function to calculate a delta between snapshots.
pub fn calculate_delta(previous: Option<&Snapshot>, current: &Snapshot) -> Delta {
    DiffCalculator::new().calculate_delta(previous, current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn make_tour(id: &str, title: &str) -> Tour {
        Tour::new(
            id,
            "01.03.26",
            "01.03.26",
            title,
            format!("https://example.com/touren#{}", id),
        )
    }

    fn with_location(mut tour: Tour, location: &str) -> Tour {
        tour.location = Some(location.to_string());
        tour
    }

    fn ids(tours: &[Tour]) -> Vec<&str> {
        tours.iter().map(|t| t.id.as_str()).collect()
    }

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_no_changes() {
        let prev = vec![make_tour("t1", "Title 1"), make_tour("t2", "Title 2")];
        let curr = prev.clone();

        let changes = calculate_diff(Some(prev.as_slice()), &curr);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_first_run_adds_everything() {
        let curr = vec![make_tour("t1", "A"), make_tour("t2", "B")];

        let changes = calculate_diff(None, &curr);
        assert_eq!(changes.added, curr);
        assert!(changes.removed.is_empty());
        assert!(changes.modified.is_empty());
    }

    #[test]
    fn test_additions_keep_current_order() {
        let prev = vec![make_tour("t1", "Title 1")];
        let curr = vec![
            make_tour("t3", "Title 3"),
            make_tour("t1", "Title 1"),
            make_tour("t2", "Title 2"),
        ];

        let changes = calculate_diff(Some(prev.as_slice()), &curr);
        assert_eq!(ids(&changes.added), vec!["t3", "t2"]);
    }

    #[test]
    fn test_removals_keep_previous_order() {
        let prev = vec![
            make_tour("t9", "Title 9"),
            make_tour("t1", "Title 1"),
            make_tour("t4", "Title 4"),
        ];
        let curr = vec![make_tour("t1", "Title 1")];

        let changes = calculate_diff(Some(prev.as_slice()), &curr);
        assert_eq!(ids(&changes.removed), vec!["t9", "t4"]);
    }

    #[test]
    fn test_location_change_is_modification() {
        let prev = vec![
            make_tour("t1", "Eins"),
            with_location(make_tour("t2", "Zwei"), "Heidelberg"),
        ];
        let curr = vec![
            with_location(make_tour("t2", "Zwei"), "Mannheim"),
            make_tour("t3", "Drei"),
        ];

        let changes = calculate_diff(Some(prev.as_slice()), &curr);
        assert_eq!(ids(&changes.added), vec!["t3"]);
        assert_eq!(ids(&changes.removed), vec!["t1"]);
        assert_eq!(changes.modified.len(), 1);

        let modified = &changes.modified[0];
        assert_eq!(modified.before, prev[1]);
        assert_eq!(modified.after, curr[0]);
        assert_eq!(modified.changed_fields.keys().collect::<Vec<_>>(), vec!["location"]);
    }

    #[test]
    fn test_gaining_optional_field_is_modification() {
        let prev = vec![make_tour("t1", "Eins")];
        let curr = vec![with_location(make_tour("t1", "Eins"), "Pfalz")];

        let changes = calculate_diff(Some(prev.as_slice()), &curr);
        assert_eq!(changes.modified.len(), 1);

        let changes = calculate_diff(Some(curr.as_slice()), &prev);
        assert_eq!(changes.modified.len(), 1);
    }

    #[test]
    fn test_duplicate_ids_reported_once() {
        let prev = vec![make_tour("t1", "A"), make_tour("t1", "A")];
        let curr = vec![make_tour("t2", "B"), make_tour("t2", "B")];

        let changes = calculate_diff(Some(prev.as_slice()), &curr);
        assert_eq!(ids(&changes.added), vec!["t2"]);
        assert_eq!(ids(&changes.removed), vec!["t1"]);

        let first_run = calculate_diff(None, &curr);
        assert_eq!(ids(&first_run.added), vec!["t2"]);
    }

    #[test]
    fn test_full_to_empty() {
        let prev = vec![make_tour("t1", "Last Tour")];
        let changes = calculate_diff(Some(prev.as_slice()), &[]);
        assert!(changes.added.is_empty());
        assert_eq!(changes.removed.len(), 1);
    }

    #[test]
    fn test_delta_timestamps_and_summary() {
        let previous = Snapshot::at(
            ts("2026-02-01 08:00:00"),
            "https://example.com/touren",
            vec![make_tour("t1", "A")],
        );
        let current = Snapshot::at(
            ts("2026-02-02 08:00:00"),
            "https://example.com/touren",
            vec![make_tour("t1", "A*"), make_tour("t2", "B")],
        );

        let delta = calculate_delta(Some(&previous), &current);
        assert_eq!(delta.timestamp, current.timestamp);
        assert_eq!(delta.previous_timestamp, Some(previous.timestamp));
        assert_eq!(delta.summary.added, 1);
        assert_eq!(delta.summary.modified, 1);
        assert_eq!(delta.summary.removed, 0);
    }

    #[test]
    fn test_delta_is_deterministic() {
        let previous = Snapshot::at(ts("2026-02-01 08:00:00"), "u", vec![make_tour("t1", "A")]);
        let current = Snapshot::at(ts("2026-02-02 08:00:00"), "u", vec![make_tour("t2", "B")]);

        assert_eq!(
            calculate_delta(Some(&previous), &current),
            calculate_delta(Some(&previous), &current)
        );
    }

    #[test]
    fn test_first_run_delta() {
        let current = Snapshot::at(ts("2026-02-02 08:00:00"), "u", vec![make_tour("t2", "B")]);
        let delta = calculate_delta(None, &current);
        assert!(delta.is_first_run());
        assert_eq!(delta.changes.added, current.tours);
    }
}
