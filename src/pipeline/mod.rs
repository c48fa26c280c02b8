//! Pipeline entry points for tracker operations.
//!
//! - `run_scrape`: fetch, parse, diff and persist one run
//! - `calculate_delta`: compare two snapshots
//! - `render_changelog`: markdown entry for a delta

pub mod changelog;
pub mod diff;
pub mod scrape;

pub use changelog::{changelog_key, render_changelog};
pub use diff::{DiffCalculator, calculate_delta, calculate_diff};
pub use scrape::{RunReport, run_scrape};
