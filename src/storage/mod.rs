//! Storage abstractions for snapshot persistence.
//!
//! ## Directory Structure
//!
//! ```text
//! data/
//! ├── tours.json              # Latest snapshot
//! ├── tours_delta.json        # Delta of the latest run
//! └── changes/
//!     └── CHANGES-2026-02-03.md
//! ```
//!
//! A run loads the previous snapshot and then overwrites it, so concurrent
//! runs against the same directory must be serialized by the caller.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Delta, Snapshot};

pub use local::LocalStorage;

/// Trait for snapshot storage backends.
#[async_trait]
pub trait TourStorage: Send + Sync {
    /// Load a snapshot; `None` when nothing was stored under `key` yet.
    async fn load_snapshot(&self, key: &str) -> Result<Option<Snapshot>>;

    /// Replace the snapshot stored under `key`.
    async fn save_snapshot(&self, key: &str, snapshot: &Snapshot) -> Result<()>;

    /// Replace the delta stored under `key`.
    async fn save_delta(&self, key: &str, delta: &Delta) -> Result<()>;

    /// Append text to the change log stored under `key`.
    async fn append_changelog(&self, key: &str, entry: &str) -> Result<()>;
}
