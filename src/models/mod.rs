// src/models/mod.rs

//! Domain models for the tour tracker.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod delta;
mod snapshot;
mod tour;

// Re-export all public types
pub use config::{
    Config, LabelMap, LabelRule, LoggingConfig, ParserConfig, SourceConfig, StorageConfig,
};
pub use delta::{Changes, Delta, DeltaSummary, FieldChange, ModifiedTour};
pub use snapshot::Snapshot;
pub use tour::{RegistrationStatus, Tour};
