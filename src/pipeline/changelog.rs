//! Markdown change log.
//!
//! One file per day (`CHANGES-YYYY-MM-DD.md`); each run with a previous
//! snapshot appends one entry.

use crate::models::{Delta, FieldChange, Tour};

/// Field whose changes are summarized instead of printed.
const MARKUP_FIELD: &str = "description_html";

/// Storage key of the change log for the day of `delta`.
pub fn changelog_key(changes_dir: &str, delta: &Delta) -> String {
    let file = format!("CHANGES-{}.md", delta.timestamp.format("%Y-%m-%d"));
    if changes_dir.is_empty() {
        file
    } else {
        format!("{}/{}", changes_dir.trim_end_matches('/'), file)
    }
}

/// Render one change log entry.
pub fn render_changelog(delta: &Delta) -> String {
    let mut out = String::new();
    let summary = &delta.summary;
    let changes = &delta.changes;

    push_line(
        &mut out,
        &format!("\n## {}", delta.timestamp.format("%Y-%m-%dT%H:%M:%S")),
    );
    push_line(
        &mut out,
        &format!(
            "Added: {}, Removed: {}, Modified: {}\n",
            summary.added, summary.removed, summary.modified
        ),
    );

    if !changes.added.is_empty() {
        out.push_str("### Added\n");
        for tour in &changes.added {
            push_tour_line(&mut out, tour);
        }
    }

    if !changes.removed.is_empty() {
        out.push_str("\n### Removed\n");
        for tour in &changes.removed {
            push_tour_line(&mut out, tour);
        }
    }

    if !changes.modified.is_empty() {
        out.push_str("\n### Modified\n");
        for modified in &changes.modified {
            push_tour_line(&mut out, &modified.after);
            for (field, change) in &modified.changed_fields {
                push_line(&mut out, &format!("  - {}", field_line(field, change)));
            }
        }
    }

    out.push_str("\n---\n");
    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn push_tour_line(out: &mut String, tour: &Tour) {
    push_line(out, &format!("- {}", tour.headline()));
}

fn field_line(field: &str, change: &FieldChange) -> String {
    if field == MARKUP_FIELD {
        return format!("{field}: markup changed");
    }
    format!(
        "{}: '{}' → '{}'",
        field,
        change.from.as_deref().unwrap_or(""),
        change.to.as_deref().unwrap_or("")
    )
}
