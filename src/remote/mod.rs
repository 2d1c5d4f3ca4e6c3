//! Code-host collector
//!
//! This module contains the code-host side of the harvester:
//! - A rate-limited client with linear backoff and quota-reset waits
//! - Read-only repository, branch, tree, raw-file and search calls
//! - The repository crawl that feeds the shared normalizer and sink

mod client;
mod codehost;
mod crawler;

pub use client::{BackoffPolicy, FailureClass, RateLimitState, RateLimitedClient};
pub use codehost::{CodeHostApi, RepoInfo, RepoRef, UNKNOWN_LICENSE};
pub use crawler::{CodeHostCrawler, FileFilter, FileRole};

use crate::config::RemoteConfig;
use crate::{ConfigError, Result};

/// Reads the API token from the environment variable named in `config`
///
/// A missing or empty token is a configuration error.
pub fn token_from_env(config: &RemoteConfig) -> Result<String> {
    match std::env::var(&config.token_env) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(ConfigError::Missing(format!("environment variable {}", config.token_env)).into()),
    }
}

/// Builds the code-host API for `config`, authenticated from the environment
pub fn connect(config: &RemoteConfig) -> Result<CodeHostApi> {
    let token = token_from_env(config)?;
    let client = RateLimitedClient::new(config, &token)?;
    Ok(CodeHostApi::new(client, &config.api_base, &config.raw_base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_is_a_config_error() {
        let config: RemoteConfig =
            toml::from_str(r#"token-env = "SWATCHBOOK_TEST_TOKEN_THAT_IS_NOT_SET""#).unwrap();

        let err = token_from_env(&config).unwrap_err();

        assert!(matches!(err, crate::SwatchError::Config(ConfigError::Missing(_))));
    }
}
