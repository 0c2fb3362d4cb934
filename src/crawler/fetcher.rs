//! HTTP fetcher implementation
//!
//! This module is the single point of HTTP contact for the collector:
//! - Building the HTTP client with a proper user agent string and timeouts
//! - GET requests for HTML pages and for binary archives
//! - Bounded retries with exponential backoff for transient failures
//! - Error classification into `FetchFailed` and `Timeout`

use crate::config::{Config, UserAgentConfig};
use crate::CollectorError;
use reqwest::{redirect::Policy, Client, Response};
use scraper::Html;
use std::future::Future;
use std::time::Duration;

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Page body, decoded using the response charset
    pub body: String,
}

impl FetchedPage {
    /// Parses the body into a document tree for CSS selection
    ///
    /// `Html` is not `Send`; parse after the last await of a task.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `request_timeout` - Overall timeout of one request, body included
/// * `connect_timeout` - Timeout for establishing a connection
///
/// # Example
///
/// ```no_run
/// use aozora_collector::config::UserAgentConfig;
/// use aozora_collector::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "AozoraCollector".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    request_timeout: Duration,
    connect_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(request_timeout)
        .connect_timeout(connect_timeout)
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages and archives with retry logic
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Success |
/// | HTTP 429, 5xx | Retry up to `max_retries` times |
/// | Timeout | Retry up to `max_retries` times |
/// | Connection failure | Retry up to `max_retries` times |
/// | Any other status | Immediate `FetchFailed` |
///
/// The delay before retry `n` (0-based) is `retry_delay * 2^n`.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(client: Client, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            client,
            max_retries,
            retry_delay,
        }
    }

    /// Builds a fetcher from the collector configuration
    pub fn from_config(config: &Config) -> Result<Self, CollectorError> {
        let client = build_http_client(
            &config.user_agent,
            config.collector.request_timeout(),
            config.collector.connect_timeout(),
        )?;
        Ok(Self::new(
            client,
            config.collector.max_retries,
            config.collector.retry_delay(),
        ))
    }

    /// Fetches an HTML page
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - 2xx response with its decoded body
    /// * `Err(CollectorError::FetchFailed)` - Non-2xx status or transport failure
    /// * `Err(CollectorError::Timeout)` - The request exceeded its timeout
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage, CollectorError> {
        self.with_retries(url, move || async move {
            let response = self.get(url).await?;
            let final_url = response.url().to_string();
            let status_code = response.status().as_u16();
            let body = response.text().await.map_err(|e| classify_error(url, e))?;

            Ok(FetchedPage {
                final_url,
                status_code,
                body,
            })
        })
        .await
    }

    /// Downloads a response body as raw bytes
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, CollectorError> {
        self.with_retries(url, move || async move {
            let response = self.get(url).await?;
            let bytes = response.bytes().await.map_err(|e| classify_error(url, e))?;
            Ok(bytes.to_vec())
        })
        .await
    }

    /// Sends one GET and rejects non-2xx responses
    async fn get(&self, url: &str) -> Result<Response, CollectorError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::FetchFailed {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        Ok(response)
    }

    async fn with_retries<T, F, Fut>(&self, url: &str, mut op: F) -> Result<T, CollectorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CollectorError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.retry_delay * 2u32.saturating_pow(attempt);
                    tracing::debug!(
                        "Attempt {} for {} failed ({}), retrying in {:?}",
                        attempt + 1,
                        url,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Maps a transport error to the collector's taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> CollectorError {
    if error.is_timeout() {
        CollectorError::Timeout {
            url: url.to_string(),
        }
    } else {
        CollectorError::FetchFailed {
            url: url.to_string(),
            status: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }
}
