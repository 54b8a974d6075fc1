//! Download of saved documents from the external editor.

use std::time::Duration;

use reqwest::Client;

use crate::config::EditorConfig;
use crate::{DocError, Result};

/// Upper bound for establishing a connection, in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// User agent sent to the editor.
const USER_AGENT: &str = concat!("docdesk/", env!("CARGO_PKG_VERSION"));

/// HTTP client for fetching edited document bytes.
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    client: Client,
    max_size: u64,
}

impl DocumentFetcher {
    /// Create a fetcher with a total timeout and a size cap in bytes.
    pub fn new(timeout: Duration, max_size: u64) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(CONNECT_TIMEOUT_SECS)))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DocError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, max_size })
    }

    /// Create a fetcher from the editor configuration.
    pub fn from_config(config: &EditorConfig) -> Result<Self> {
        Self::new(
            Duration::from_secs(config.download_timeout_secs),
            config.max_download_bytes(),
        )
    }

    /// Download the document at `url`.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DocError::Upstream(format!("failed to download document: {e}")))?;

        if !response.status().is_success() {
            return Err(DocError::Upstream(format!(
                "document download returned HTTP {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_size {
                return Err(DocError::Upstream(format!(
                    "document too large: {} bytes (max {} bytes)",
                    content_length, self.max_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DocError::Upstream(format!("failed to read document body: {e}")))?;

        if bytes.len() as u64 > self.max_size {
            return Err(DocError::Upstream(format!(
                "document too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_size
            )));
        }

        Ok(bytes.to_vec())
    }
}
