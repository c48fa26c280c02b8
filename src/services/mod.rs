//! Service layer for the tour tracker.
//!
//! - Listing parsing (`TourParser`)
//! - Labeled field extraction (`FieldExtractor`)
//! - Page retrieval (`PageSource`, with `HttpSource` and `FileSource`)

mod fields;
mod parser;
mod source;

use scraper::Selector;

use crate::error::{AppError, Result};

pub use fields::{DetailField, FieldExtractor, description_html, description_text, labeled_value};
pub use parser::{ParseOutcome, TourParser};
pub use source::{FileSource, HttpSource, PageSource};

/// Compile a CSS selector, reporting failures as selector errors.
pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
