use crate::config::types::{
    CategoryConfig, Config, ListingConfig, OutputConfig, PipelineConfig, RemoteConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_listing_config(&config.listing)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_output_config(&config.output)?;
    if let Some(remote) = &config.remote {
        validate_remote_config(remote)?;
    }
    Ok(())
}

/// Validates listing configuration
fn validate_listing_config(config: &ListingConfig) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for target in config.targets() {
        validate_category(&target)?;
        if !names.insert(target.name.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "category '{}' is listed twice",
                target.name
            )));
        }
    }

    if config.library.trim().is_empty() {
        return Err(ConfigError::Validation("library cannot be empty".to_string()));
    }

    if config.start_page < 1 {
        return Err(ConfigError::Validation(format!(
            "start_page must be >= 1, got {}",
            config.start_page
        )));
    }

    if config.cta_phrase.trim().is_empty() {
        return Err(ConfigError::Validation(
            "cta_phrase cannot be empty".to_string(),
        ));
    }

    if let Err(e) = regex::Regex::new(&config.detail_pattern) {
        return Err(ConfigError::Validation(format!(
            "detail_pattern is not a valid regular expression: {}",
            e
        )));
    }

    Ok(())
}

/// Validates one category listing
fn validate_category(target: &CategoryConfig) -> Result<(), ConfigError> {
    if !target.listing_url.contains("{page}") {
        return Err(ConfigError::Validation(format!(
            "listing_url must contain a {{page}} placeholder, got '{}'",
            target.listing_url
        )));
    }

    let url = Url::parse(&target.listing_url.replace("{page}", "1"))
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid listing_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "listing_url must use HTTP(S), got '{}'",
            url.scheme()
        )));
    }

    if target.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "category cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates worker pool configuration
fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.empty_page_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "empty_page_threshold must be >= 1, got {}",
            config.empty_page_threshold
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates code-host configuration
fn validate_remote_config(config: &RemoteConfig) -> Result<(), ConfigError> {
    for (name, base) in [("api_base", &config.api_base), ("raw_base", &config.raw_base)] {
        Url::parse(base)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;
    }

    if config.token_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "token_env cannot be empty".to_string(),
        ));
    }

    if config.branch_candidates.iter().any(|b| b.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "branch_candidates cannot contain empty names".to_string(),
        ));
    }

    if config.file_extensions.is_empty() {
        return Err(ConfigError::Validation(
            "file_extensions must list at least one extension".to_string(),
        ));
    }

    for repo in &config.repos {
        validate_repo_slug(repo)?;
    }

    if config.repos.is_empty() && config.search_queries.is_empty() {
        return Err(ConfigError::Validation(
            "remote needs at least one entry in repos or search_queries".to_string(),
        ));
    }

    Ok(())
}

/// Validates an `owner/name` repository reference
fn validate_repo_slug(slug: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = slug.split('/').collect();
    if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::Validation(format!(
            "Repository '{}' must be written as owner/name",
            slug
        )));
    }

    if !parts
        .iter()
        .all(|p| p.chars().all(|c| c.is_alphanumeric() || "-_.".contains(c)))
    {
        return Err(ConfigError::Validation(format!(
            "Repository '{}' contains invalid characters",
            slug
        )));
    }

    Ok(())
}
