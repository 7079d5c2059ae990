//! Transport seam for the export feed.

use anyhow::Result;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::AcquisitionError;

/// Fetches one response body for a request path.
///
/// Implementations are shared by every fetch worker.
pub trait FeedClient: Send + Sync {
    fn get(&self, path: &str) -> Result<String, AcquisitionError>;
}

/// Blocking HTTP client against a fixed base URL.
pub struct HttpFeedClient {
    client: Client,
    base_url: String,
}

impl HttpFeedClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pitch-pipeline/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl FeedClient for HttpFeedClient {
    fn get(&self, path: &str) -> Result<String, AcquisitionError> {
        let url = self.url(path);
        debug!(url = %url, "Requesting feed");

        let network = |e: reqwest::Error| AcquisitionError::Network {
            url: url.clone(),
            message: e.to_string(),
        };

        let response = self.client.get(&url).send().map_err(network)?;
        if !response.status().is_success() {
            return Err(AcquisitionError::Status {
                url: url.clone(),
                status: response.status().as_u16(),
            });
        }

        response.text().map_err(network)
    }
}
