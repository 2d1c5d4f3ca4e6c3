//! HTTP page source
//!
//! This module opens pages by fetching them over HTTP:
//! - Building HTTP clients with a desktop browser identity
//! - Bounding the wait for a page with the configured ready timeout
//! - Mapping non-success answers and timeouts to navigation errors

use super::{PageHandle, PageSource, RenderMode, StaticPage};
use crate::config::BrowserConfig;
use crate::{Result, SwatchError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client that presents as a desktop browser
///
/// # Example
///
/// ```no_run
/// use swatchbook::config::BrowserConfig;
/// use swatchbook::page::build_http_client;
///
/// let client = build_http_client(&BrowserConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &BrowserConfig) -> std::result::Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.ready_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Opens pages by fetching their HTML
pub struct HttpPageSource {
    client: Client,
    ready_timeout: Duration,
}

impl HttpPageSource {
    /// Creates a source from browser settings
    pub fn new(config: &BrowserConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            ready_timeout: Duration::from_secs(config.ready_timeout_secs),
        })
    }

    fn timeout_error(&self, url: &str) -> SwatchError {
        SwatchError::NavigationTimeout {
            url: url.to_string(),
            waited_secs: self.ready_timeout.as_secs(),
        }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn open(&self, url: &str, mode: RenderMode) -> Result<Box<dyn PageHandle>> {
        tracing::debug!("Opening {} ({})", url, mode);

        let fetch = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        match tokio::time::timeout(self.ready_timeout, fetch).await {
            Err(_) => Err(self.timeout_error(url)),
            Ok(Err(e)) if e.is_timeout() => Err(self.timeout_error(url)),
            Ok(Err(e)) => Err(SwatchError::Http {
                url: url.to_string(),
                source: e,
            }),
            Ok(Ok((status, _))) if !status.is_success() => Err(SwatchError::NavigationStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }),
            Ok(Ok((_, body))) => Ok(Box::new(StaticPage::new(url, body))),
        }
    }

    fn close(&self, handle: &dyn PageHandle) {
        tracing::trace!("Released {}", handle.url());
    }
}
