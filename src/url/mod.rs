//! URL handling module for Swatchbook
//!
//! This module derives natural keys and display names from source URLs, reads
//! authors out of detail paths, and recognises detail-page link shapes.

mod links;
mod slug;

// Re-export main functions
pub use links::{author_from_url, origin_of, rooted_path, SlugShape, DEFAULT_DETAIL_PATTERN};
pub use slug::{humanize_slug, natural_key, natural_key_from_parts};
