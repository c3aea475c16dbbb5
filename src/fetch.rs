//! Page fetching seam.
//!
//! The detection engine only ever consumes already-fetched HTML, so the
//! fetch layer sits behind the [`Fetcher`] trait. The shipped
//! implementation is a plain HTTP client; a headless-browser fetcher can
//! be substituted without the engine noticing.

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use async_trait::async_trait;
use std::time::Duration;

/// A fetched page: the URL that was requested and its raw HTML.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The requested URL, used as the base for resolving relative links.
    pub url: String,

    /// Raw HTML body.
    pub html: String,
}

/// Trait for page fetchers.
///
/// Implementations own transport concerns (timeouts, redirects, rate
/// limiting); callers own traversal concerns (which URL next, when to
/// stop).
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the HTML document at `url`.
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError>;
}

/// HTTP fetcher backed by a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
    delay_sec: f64,
}

impl HttpFetcher {
    /// Creates an HTTP fetcher with the configured user agent and a 30s
    /// request timeout.
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            delay_sec: config.delay_between_requests_sec,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError> {
        rate_limit(self.delay_sec).await;

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ScrapeError::BadStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let html = response.text().await?;

        Ok(FetchedPage {
            url: url.to_string(),
            html,
        })
    }
}

/// Applies rate limiting delay.
pub async fn rate_limit(delay_sec: f64) {
    if delay_sec > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(delay_sec)).await;
    }
}
