// src/pipeline/scrape.rs

//! One tracker run: fetch, parse, diff against the previous snapshot, persist.

use crate::error::Result;
use crate::models::{Config, Delta, DeltaSummary, Snapshot};
use crate::pipeline::changelog::{changelog_key, render_changelog};
use crate::pipeline::diff::calculate_delta;
use crate::services::{PageSource, TourParser};
use crate::storage::TourStorage;

/// What a run produced.
#[derive(Debug)]
pub struct RunReport {
    pub snapshot: Snapshot,
    pub delta: Delta,
    /// Headers that could not form a tour
    pub skipped: usize,
    /// Headers that repeated an earlier tour id
    pub duplicates: usize,
    /// Change log key written to, if any
    pub changelog: Option<String>,
}

impl RunReport {
    pub fn summary(&self) -> DeltaSummary {
        self.delta.summary
    }
}

/// Run the tracker once.
///
/// Persistence errors abort the run; nothing is retried.
pub async fn run_scrape(
    config: &Config,
    source: &dyn PageSource,
    storage: &dyn TourStorage,
) -> Result<RunReport> {
    let parser = TourParser::from_config(config)?;
    let keys = &config.storage;

    let html = source.fetch().await?;
    log::info!("Parsing tours from {}", source.location());

    let outcome = parser.parse_outcome(&html);
    log::info!("Found {} tours", outcome.tours.len());
    if outcome.skipped > 0 {
        log::info!("Skipped {} unidentifiable tour headers", outcome.skipped);
    }
    if outcome.tours.is_empty() {
        log::warn!("No tours found on {}", source.location());
    }

    let previous = storage.load_snapshot(&keys.snapshot_key).await?;
    let snapshot = Snapshot::new(config.source.url.clone(), outcome.tours);
    let delta = calculate_delta(previous.as_ref(), &snapshot);

    storage.save_snapshot(&keys.snapshot_key, &snapshot).await?;
    storage.save_delta(&keys.delta_key, &delta).await?;

    let summary = delta.summary;
    if delta.is_first_run() {
        log::info!("First run, {} tours recorded", summary.added);
    } else if summary.total() == 0 {
        let since = delta.previous_timestamp.unwrap_or(delta.timestamp);
        log::info!("No changes since {}", since);
    } else {
        log::info!(
            "Delta: {} added, {} removed, {} modified",
            summary.added,
            summary.removed,
            summary.modified
        );
    }

    let changelog = if keys.write_changelog && !delta.is_first_run() {
        let key = changelog_key(&keys.changes_dir, &delta);
        storage.append_changelog(&key, &render_changelog(&delta)).await?;
        Some(key)
    } else {
        None
    };

    Ok(RunReport {
        snapshot,
        delta,
        skipped: outcome.skipped,
        duplicates: outcome.duplicates,
        changelog,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct StaticSource(String);

    #[async_trait]
    impl PageSource for StaticSource {
        async fn fetch(&self) -> Result<String> {
            Ok(self.0.clone())
        }

        fn location(&self) -> String {
            "memory".to_string()
        }
    }

    fn header(date: &str, title: &str, id: &str) -> String {
        format!(
            r#"<p style="background-color:silver;"><b>{date}</b><br />{title}<a name="{id}"></a><br />Kurs<br /></p>"#
        )
    }

    fn page(headers: &[String], location_t2: &str) -> String {
        format!(
            "<html><body>{}<div id=\"b2\"><p><b>Ort: </b>{}</p></div></body></html>",
            headers.concat(),
            location_t2
        )
    }

    fn config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.dir = dir.path().to_path_buf();
        config
    }

    #[tokio::test]
    async fn test_first_run_then_changes() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let storage = LocalStorage::new(tmp.path());

        let first = StaticSource(page(
            &[header("01.02.26", "Eins", "t1"), header("02.02.26", "Zwei", "t2")],
            "Heidelberg",
        ));
        let report = run_scrape(&config, &first, &storage).await.unwrap();
        assert!(report.delta.is_first_run());
        assert_eq!(report.summary().added, 2);
        assert_eq!(report.changelog, None);
        assert!(tmp.path().join("tours.json").exists());
        assert!(tmp.path().join("tours_delta.json").exists());
        assert!(!tmp.path().join("changes").exists());

        let second = StaticSource(page(
            &[header("02.02.26", "Zwei", "t2"), header("03.02.26", "Drei", "t3")],
            "Mannheim",
        ));
        let report = run_scrape(&config, &second, &storage).await.unwrap();
        let changes = &report.delta.changes;
        assert_eq!(changes.added[0].id, "t3");
        assert_eq!(changes.removed[0].id, "t1");
        assert_eq!(changes.modified.len(), 1);
        assert_eq!(changes.modified[0].before.location.as_deref(), Some("Heidelberg"));
        assert_eq!(changes.modified[0].after.location.as_deref(), Some("Mannheim"));

        let key = report.changelog.unwrap();
        let log = std::fs::read_to_string(tmp.path().join(&key)).unwrap();
        assert!(log.contains("location: 'Heidelberg' → 'Mannheim'"));

        let stored = storage.load_snapshot("tours.json").await.unwrap().unwrap();
        assert_eq!(stored, report.snapshot);
    }

    #[tokio::test]
    async fn test_unchanged_page_yields_empty_delta() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let storage = LocalStorage::new(tmp.path());
        let source = StaticSource(page(&[header("01.02.26", "Eins", "t1")], "Heidelberg"));

        run_scrape(&config, &source, &storage).await.unwrap();
        let report = run_scrape(&config, &source, &storage).await.unwrap();

        assert!(!report.delta.has_changes());
        assert!(!report.delta.is_first_run());
    }

    #[tokio::test]
    async fn test_changelog_can_be_disabled() {
        let tmp = TempDir::new().unwrap();
        let mut config = config(&tmp);
        config.storage.write_changelog = false;
        let storage = LocalStorage::new(tmp.path());
        let source = StaticSource(page(&[header("01.02.26", "Eins", "t1")], "x"));

        run_scrape(&config, &source, &storage).await.unwrap();
        let report = run_scrape(&config, &source, &storage).await.unwrap();
        assert_eq!(report.changelog, None);
    }

    #[tokio::test]
    async fn test_empty_page_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let storage = LocalStorage::new(tmp.path());

        let report = run_scrape(&config, &StaticSource(String::new()), &storage)
            .await
            .unwrap();
        assert!(report.snapshot.is_empty());
        assert_eq!(report.snapshot.tour_count, 0);
    }

    #[tokio::test]
    async fn test_umlaut_title_survives_save_and_reload() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let storage = LocalStorage::new(tmp.path());
        let source = StaticSource(page(
            &[header("10.03.26", "Geißler und K&uuml;che", "t9")],
            "x",
        ));

        let report = run_scrape(&config, &source, &storage).await.unwrap();
        assert_eq!(report.snapshot.tours[0].title, "Geißler und Küche");

        let raw = std::fs::read_to_string(tmp.path().join("tours.json")).unwrap();
        assert!(raw.contains("\"title\": \"Geißler und Küche\""));

        let stored = storage.load_snapshot("tours.json").await.unwrap().unwrap();
        assert_eq!(stored.tours[0].title.as_bytes(), "Geißler und Küche".as_bytes());
    }

    #[tokio::test]
    async fn test_corrupt_previous_snapshot_aborts_run() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let storage = LocalStorage::new(tmp.path());
        std::fs::write(tmp.path().join("tours.json"), "garbage").unwrap();

        let source = StaticSource(page(&[header("01.02.26", "Eins", "t1")], "x"));
        assert!(run_scrape(&config, &source, &storage).await.is_err());
    }
}
