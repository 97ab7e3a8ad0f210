use anyhow::{Context, Result};
use reqwest::{redirect, Client};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use crate::config::EngineConfig;
use crate::error::ScanError;

/// Build the shared HTTP client used by every fetching scanner.
pub fn create_client(config: &EngineConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.fetch_timeout())
        .redirect(redirect::Policy::limited(config.max_redirects))
        .user_agent(config.user_agent.clone())
        .build()
        .context("Failed to build HTTP client")
}

/// Outcome of a single GET. Errors are captured, never raised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub url: String,
    pub found: bool,
    pub status_code: Option<u16>,
    pub content: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub error: Option<String>,
}

impl FetchResult {
    fn failed(url: &Url, error: ScanError) -> Self {
        Self {
            url: url.to_string(),
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    /// Error text for a miss: the transport error, or the HTTP status.
    pub fn error_text(&self) -> String {
        match (&self.error, self.status_code) {
            (Some(err), _) => err.clone(),
            (None, Some(code)) => format!("HTTP {}", code),
            (None, None) => "No response".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
            timeout: config.fetch_timeout(),
        })
    }

    /// GET `url`. `found` is true only for 2xx responses with a readable body.
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        tracing::trace!("[FETCH] GET {}", url);

        let response = match self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let message = if e.is_timeout() {
                    format!("Request timed out after {}ms", self.timeout.as_millis())
                } else {
                    e.to_string()
                };
                tracing::debug!("[FETCH] Failed: {} ({})", url, message);
                return FetchResult::failed(url, ScanError::network(message));
            }
        };

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        if !status.is_success() {
            tracing::debug!("[FETCH] Not found: {} (status {})", url, status);
            return FetchResult {
                url: url.to_string(),
                found: false,
                status_code: Some(status.as_u16()),
                content: None,
                headers,
                error: None,
            };
        }

        match response.text().await {
            Ok(body) => {
                tracing::debug!("[FETCH] Found: {} ({} bytes)", url, body.len());
                FetchResult {
                    url: url.to_string(),
                    found: true,
                    status_code: Some(status.as_u16()),
                    content: Some(body),
                    headers,
                    error: None,
                }
            }
            Err(e) => {
                tracing::debug!("[FETCH] Unreadable body: {} ({})", url, e);
                let error = ScanError::network(format!("Failed to read body: {}", e));
                FetchResult {
                    status_code: Some(status.as_u16()),
                    headers,
                    ..FetchResult::failed(url, error)
                }
            }
        }
    }
}
