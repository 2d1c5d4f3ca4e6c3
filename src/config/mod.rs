//! Configuration module for Swatchbook
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use swatchbook::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("swatchbook.toml")).unwrap();
//! println!("Workers per page: {}", config.pipeline.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, CategoryConfig, Config, ExtractConfig, ListingConfig, OutputConfig,
    PipelineConfig, RemoteConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
