//! Delta between two snapshots.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::Tour;

/// Classified changes between the previous and the current snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Delta {
    /// Timestamp of the current snapshot
    pub timestamp: NaiveDateTime,
    /// Timestamp of the previous snapshot (`None` on the first run)
    pub previous_timestamp: Option<NaiveDateTime>,
    pub summary: DeltaSummary,
    pub changes: Changes,
}

impl Delta {
    /// Build a delta; the summary is derived from `changes`.
    pub fn new(
        timestamp: NaiveDateTime,
        previous_timestamp: Option<NaiveDateTime>,
        changes: Changes,
    ) -> Self {
        Self {
            timestamp,
            previous_timestamp,
            summary: DeltaSummary::of(&changes),
            changes,
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn is_first_run(&self) -> bool {
        self.previous_timestamp.is_none()
    }
}

/// Bucket sizes of a delta.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeltaSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
}

impl DeltaSummary {
    pub fn of(changes: &Changes) -> Self {
        Self {
            added: changes.added.len(),
            removed: changes.removed.len(),
            modified: changes.modified.len(),
        }
    }

    pub fn total(&self) -> usize {
        self.added + self.removed + self.modified
    }
}

/// Added, removed and modified tours.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Changes {
    /// Tours new in the current snapshot, in current order
    pub added: Vec<Tour>,
    /// Tours gone from the current snapshot, in previous order
    pub removed: Vec<Tour>,
    /// Tours present in both with differing fields, in current order
    pub modified: Vec<ModifiedTour>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// A tour whose fields changed between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModifiedTour {
    pub id: String,
    /// Changed fields keyed by field name
    pub changed_fields: BTreeMap<String, FieldChange>,
    pub before: Tour,
    pub after: Tour,
}

impl ModifiedTour {
    /// Pair two versions of a tour and record which fields differ.
    pub fn new(before: Tour, after: Tour) -> Self {
        let changed_fields = before
            .fields()
            .into_iter()
            .zip(after.fields())
            .filter(|((_, from), (_, to))| from != to)
            .map(|((name, from), (_, to))| {
                (
                    name.to_string(),
                    FieldChange {
                        from: from.map(str::to_string),
                        to: to.map(str::to_string),
                    },
                )
            })
            .collect();

        Self {
            id: after.id.clone(),
            changed_fields,
            before,
            after,
        }
    }
}

/// Old and new value of a single field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldChange {
    pub from: Option<String>,
    pub to: Option<String>,
}
