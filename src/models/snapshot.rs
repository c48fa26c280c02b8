//! Snapshot of one scrape run.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::Tour;

/// Full set of tours captured in one run.
///
/// Timestamps are local time without offset, matching the files written by
/// earlier versions of the tracker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    /// ISO 8601 timestamp of the run
    pub timestamp: NaiveDateTime,
    /// Listing page the tours were scraped from
    pub url: String,
    /// Number of tours (always `tours.len()` for snapshots built here)
    pub tour_count: usize,
    /// Tours in page order
    pub tours: Vec<Tour>,
}

impl Snapshot {
    /// Create a snapshot stamped with the current local time.
    pub fn new(url: impl Into<String>, tours: Vec<Tour>) -> Self {
        Self::at(Local::now().naive_local(), url, tours)
    }

    /// Create a snapshot with an explicit timestamp.
    pub fn at(timestamp: NaiveDateTime, url: impl Into<String>, tours: Vec<Tour>) -> Self {
        Self {
            timestamp,
            url: url.into(),
            tour_count: tours.len(),
            tours,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }
}
