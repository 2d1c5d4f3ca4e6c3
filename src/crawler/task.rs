//! Per-link extraction task
//!
//! One task opens a detail page, extracts and normalizes it, and hands the result
//! back to the coordinator. Tasks never touch the sink or the dedup index.

use crate::extract::Extractor;
use crate::normalize::NormalizedDocument;
use crate::page::{PageSession, PageSource, RenderMode};
use std::sync::Arc;

/// Settings shared by every task of a run
#[derive(Debug, Clone)]
pub struct TaskPlan {
    pub mode: RenderMode,
    pub navigation_retries: u32,
    pub library: String,
    pub category: String,
}

/// What a task sends back to the coordinator
#[derive(Debug)]
pub enum TaskResult {
    /// A normalized document ready to commit
    Extracted(NormalizedDocument),
    /// The page had no code
    Empty { url: String },
    /// The page could not be opened
    Failed { url: String, error: String },
}

/// Extracts the component at `url`
///
/// Retryable navigation failures are retried `navigation_retries` times. The page is
/// closed before normalization starts.
pub async fn fetch_component(
    source: Arc<dyn PageSource>,
    extractor: Arc<Extractor>,
    plan: Arc<TaskPlan>,
    url: String,
) -> TaskResult {
    let mut attempt = 0;

    let raw = loop {
        match PageSession::open(source.clone(), &url, plan.mode).await {
            Ok(session) => break extractor.extract(session.page()).await,
            Err(e) if e.is_retryable() && attempt < plan.navigation_retries => {
                attempt += 1;
                tracing::warn!(
                    "Retrying {} after navigation failure ({}/{}): {}",
                    url,
                    attempt,
                    plan.navigation_retries,
                    e
                );
            }
            Err(e) => {
                return TaskResult::Failed {
                    url,
                    error: e.to_string(),
                }
            }
        }
    };

    if raw.is_empty() {
        return TaskResult::Empty { url };
    }

    TaskResult::Extracted(NormalizedDocument::from_extraction(
        &raw,
        &plan.library,
        &plan.category,
    ))
}
