// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::SourceConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &SourceConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page as UTF-8 text, failing on non-success status codes.
///
/// The listing is always UTF-8; invalid sequences are replaced rather than
/// rejected so a single bad byte cannot drop the whole page.
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    match String::from_utf8(bytes.to_vec()) {
        Ok(text) => Ok(text),
        Err(e) => {
            log::warn!("Page {} is not valid UTF-8 ({}), decoding lossily", url, e);
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}
