//! HTTP access to the spam scoring report page

use crate::error::{AppError, Result};
use reqwest::Client;
use std::time::Duration;

/// Some scoring services refuse clients that do not look like a browser
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Fetches report pages with a browser-like identity
#[derive(Debug, Clone)]
pub struct ReportFetcher {
    client: Client,
}

impl ReportFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|e| AppError::http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// GET `url` and return the body. Non-2xx statuses are errors.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http(format!("Report page {} returned HTTP {}", url, status)));
        }

        Ok(response.text().await?)
    }
}
