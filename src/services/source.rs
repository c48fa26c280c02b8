// src/services/source.rs

//! Where the listing HTML comes from.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;
use crate::utils::http;

/// Supplies the listing page as decoded text.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Retrieve the full page.
    async fn fetch(&self) -> Result<String>;

    /// Location the page was read from, for logs and snapshots.
    fn location(&self) -> String;
}

/// Fetches the listing over HTTP with a single GET.
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config)?,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self) -> Result<String> {
        log::info!("Fetching {}", self.url);
        let html = http::fetch_text(&self.client, &self.url)
            .await
            .map_err(|e| AppError::fetch(&self.url, e))?;
        log::debug!("Received {} bytes", html.len());
        Ok(html)
    }

    fn location(&self) -> String {
        self.url.clone()
    }
}

/// Reads a saved copy of the listing from disk.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PageSource for FileSource {
    async fn fetch(&self) -> Result<String> {
        log::info!("Reading {}", self.path.display());
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| AppError::fetch(self.path.display().to_string(), e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_source_reads_utf8() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("page.html");
        std::fs::write(&path, "<p>Hüttenabend</p>").unwrap();

        let source = FileSource::new(&path);
        assert_eq!(source.fetch().await.unwrap(), "<p>Hüttenabend</p>");
        assert!(source.location().ends_with("page.html"));
    }

    #[tokio::test]
    async fn test_file_source_missing_file_is_fetch_error() {
        let tmp = TempDir::new().unwrap();
        let source = FileSource::new(tmp.path().join("missing.html"));
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
    }

    #[test]
    fn test_http_source_location() {
        let source = HttpSource::new(&SourceConfig::default()).unwrap();
        assert_eq!(source.location(), SourceConfig::default().url);
    }
}
