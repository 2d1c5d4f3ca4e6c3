//! Rate-limited HTTP client for the code-host API
//!
//! Every call goes through [`RateLimitedClient::get`], which:
//! - retries connection failures and 5xx answers with linear backoff
//! - gives up after the retry budget and returns `None`
//! - waits out exhausted quotas until the advertised reset, without limit

use crate::config::RemoteConfig;
use crate::{ConfigError, Result, SwatchError};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Transient failure kinds, each with its own backoff step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The request never got an answer
    Connect,
    /// The server answered 5xx
    Server,
}

/// Retry schedule for transient failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub connect_step: Duration,
    pub server_step: Duration,
    pub max_retries: u32,
    /// Added to every rate-limit wait
    pub rate_limit_margin: Duration,
}

impl BackoffPolicy {
    pub fn from_config(config: &RemoteConfig) -> Self {
        Self {
            connect_step: Duration::from_secs(config.connect_backoff_secs),
            server_step: Duration::from_secs(config.server_backoff_secs),
            max_retries: config.max_retries,
            rate_limit_margin: Duration::from_secs(config.rate_limit_margin_secs),
        }
    }

    /// Wait before retry number `attempt` (1-based): `step * attempt`
    pub fn delay(&self, class: FailureClass, attempt: u32) -> Duration {
        let step = match class {
            FailureClass::Connect => self.connect_step,
            FailureClass::Server => self.server_step,
        };
        step * attempt
    }
}

/// Quota state read from one response's headers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitState {
    pub remaining: Option<u64>,
    /// Epoch seconds at which the quota replenishes
    pub reset_epoch: Option<i64>,
}

impl RateLimitState {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
        };

        Self {
            remaining: read(RATE_LIMIT_REMAINING).and_then(|v| v.parse().ok()),
            reset_epoch: read(RATE_LIMIT_RESET).and_then(|v| v.parse().ok()),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// How long to sleep from `now_epoch` until the reset, plus `margin`
    ///
    /// A reset in the past (or a missing reset) waits only the margin.
    pub fn wait_from(&self, now_epoch: i64, margin: Duration) -> Duration {
        let until_reset = self
            .reset_epoch
            .map(|reset| (reset - now_epoch).max(0) as u64)
            .unwrap_or(0);
        Duration::from_secs(until_reset) + margin
    }
}

/// HTTP client that retries, backs off, and honours rate limits
pub struct RateLimitedClient {
    client: Client,
    policy: BackoffPolicy,
}

impl RateLimitedClient {
    /// Builds a client authenticated with a bearer `token`
    pub fn new(config: &RemoteConfig, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            SwatchError::Config(ConfigError::Validation(format!(
                "value of {} is not a valid header value",
                config.token_env
            )))
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(concat!("swatchbook/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()?;

        Ok(Self::with_client(client, BackoffPolicy::from_config(config)))
    }

    pub fn with_client(client: Client, policy: BackoffPolicy) -> Self {
        Self { client, policy }
    }

    /// GETs `url` with query `params`
    ///
    /// Returns the first answer that is neither a transient failure nor a rate-limit
    /// refusal, whatever its status. Returns `None` once the retry budget for
    /// transient failures is spent.
    pub async fn get(&self, url: &str, params: &[(&str, String)]) -> Option<Response> {
        let mut retries = 0;

        loop {
            let response = match self.client.get(url).query(params).send().await {
                Ok(response) => response,
                Err(e) => {
                    retries += 1;
                    if retries > self.policy.max_retries {
                        tracing::warn!("Giving up on {} after connection failures: {}", url, e);
                        return None;
                    }
                    let wait = self.policy.delay(FailureClass::Connect, retries);
                    tracing::warn!(
                        "Connection failed for {}, retrying in {:?} ({}/{}): {}",
                        url,
                        wait,
                        retries,
                        self.policy.max_retries,
                        e
                    );
                    tokio::time::sleep(wait).await;
                    continue;
                }
            };

            let status = response.status();
            let limit = RateLimitState::from_headers(response.headers());

            if is_rate_limit_refusal(status) && limit.is_exhausted() {
                let wait = limit.wait_from(Utc::now().timestamp(), self.policy.rate_limit_margin);
                tracing::warn!("Rate limit hit on {}, waiting {:?}", url, wait);
                tokio::time::sleep(wait).await;
                continue;
            }

            if status.is_server_error() {
                retries += 1;
                if retries > self.policy.max_retries {
                    tracing::warn!("Giving up on {} after HTTP {}", url, status.as_u16());
                    return None;
                }
                let wait = self.policy.delay(FailureClass::Server, retries);
                tracing::warn!(
                    "HTTP {} from {}, retrying in {:?} ({}/{})",
                    status.as_u16(),
                    url,
                    wait,
                    retries,
                    self.policy.max_retries
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            return Some(response);
        }
    }
}

fn is_rate_limit_refusal(status: StatusCode) -> bool {
    status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS
}
