//! Read-only code-host API calls
//!
//! Repository info, branch probing, recursive tree listing, raw file fetch and
//! repository search. Every call goes through the rate-limited client; an exhausted
//! or unsuccessful call reads as "nothing found".

use super::RateLimitedClient;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

/// License id used when a repository does not declare one
pub const UNKNOWN_LICENSE: &str = "Unknown";

#[derive(Debug, Clone, Deserialize)]
struct Owner {
    login: String,
}

#[derive(Debug, Clone, Deserialize)]
struct License {
    spdx_id: Option<String>,
}

/// Repository metadata as returned by the info and search endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    name: String,
    owner: Owner,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    license: Option<License>,
}

impl RepoInfo {
    pub fn default_branch(&self) -> Option<&str> {
        self.default_branch.as_deref().filter(|b| !b.is_empty())
    }

    /// Reduces the metadata to what the crawler needs
    pub fn to_ref(&self) -> RepoRef {
        RepoRef {
            owner: self.owner.login.clone(),
            name: self.name.clone(),
            url: self.html_url.clone(),
            license: self
                .license
                .as_ref()
                .and_then(|l| l.spdx_id.clone())
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| UNKNOWN_LICENSE.to_string()),
        }
    }
}

/// A repository to crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
    pub url: String,
    pub license: String,
}

impl RepoRef {
    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<RepoInfo>,
}

#[derive(Debug, Deserialize)]
struct Tree {
    #[serde(default)]
    tree: Vec<TreeEntry>,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    #[serde(default)]
    path: String,
}

/// Code-host API bound to one API base and one raw-content base
pub struct CodeHostApi {
    client: RateLimitedClient,
    api_base: String,
    raw_base: String,
}

impl CodeHostApi {
    pub fn new(client: RateLimitedClient, api_base: &str, raw_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            raw_base: raw_base.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Option<T> {
        let response = self.client.get(url, params).await?;
        if !response.status().is_success() {
            tracing::debug!("{} answered HTTP {}", url, response.status().as_u16());
            return None;
        }
        match response.json::<T>().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!("Unreadable JSON from {}: {}", url, e);
                None
            }
        }
    }

    /// Repository metadata
    pub async fn repo_info(&self, owner: &str, repo: &str) -> Option<RepoInfo> {
        let url = format!("{}/repos/{}/{}", self.api_base, owner, repo);
        self.get_json(&url, &[]).await
    }

    /// Returns true if `branch` resolves
    pub async fn branch_exists(&self, owner: &str, repo: &str, branch: &str) -> bool {
        let url = format!("{}/repos/{}/{}/branches/{}", self.api_base, owner, repo, branch);
        matches!(self.client.get(&url, &[]).await, Some(r) if r.status().is_success())
    }

    /// First branch that resolves: the reported default, then `candidates` in order
    pub async fn resolve_branch(
        &self,
        owner: &str,
        repo: &str,
        candidates: &[String],
    ) -> Option<String> {
        let info = self.repo_info(owner, repo).await;
        let default = info.as_ref().and_then(|i| i.default_branch());

        let mut seen = HashSet::new();
        for branch in default.into_iter().chain(candidates.iter().map(String::as_str)) {
            if branch.is_empty() || !seen.insert(branch) {
                continue;
            }
            if self.branch_exists(owner, repo, branch).await {
                return Some(branch.to_string());
            }
        }
        None
    }

    /// Every path in the branch tree ending with one of `extensions`
    pub async fn list_paths(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        extensions: &[String],
    ) -> Vec<String> {
        let url = format!("{}/repos/{}/{}/git/trees/{}", self.api_base, owner, repo, branch);
        let Some(tree) = self
            .get_json::<Tree>(&url, &[("recursive", "1".to_string())])
            .await
        else {
            return Vec::new();
        };

        tree.tree
            .into_iter()
            .map(|entry| entry.path)
            .filter(|path| extensions.iter().any(|ext| path.ends_with(ext.as_str())))
            .collect()
    }

    /// Raw text of one file
    pub async fn fetch_raw(&self, owner: &str, repo: &str, branch: &str, path: &str) -> Option<String> {
        let url = format!("{}/{}/{}/{}/{}", self.raw_base, owner, repo, branch, path);
        let response = self.client.get(&url, &[]).await?;
        if !response.status().is_success() {
            return None;
        }
        response.text().await.ok()
    }

    /// Searches repositories for every query, `pages` pages each, sorted by stars
    ///
    /// A query stops at its first failed or empty page. Results are unique by
    /// `owner/name`, in first-seen order.
    pub async fn search_repositories(
        &self,
        queries: &[String],
        pages: u32,
        pause: Duration,
    ) -> Vec<RepoRef> {
        let url = format!("{}/search/repositories", self.api_base);
        let mut seen = HashSet::new();
        let mut repos = Vec::new();

        for query in queries {
            for page in 1..=pages {
                let params = [
                    ("q", query.clone()),
                    ("sort", "stars".to_string()),
                    ("order", "desc".to_string()),
                    ("per_page", "100".to_string()),
                    ("page", page.to_string()),
                ];
                let Some(result) = self.get_json::<SearchPage>(&url, &params).await else {
                    break;
                };
                if result.items.is_empty() {
                    break;
                }

                for item in &result.items {
                    let repo = item.to_ref();
                    if seen.insert(repo.full_name()) {
                        repos.push(repo);
                    }
                }
                tracing::info!("Search '{}' page {}: {} repos so far", query, page, repos.len());
                tokio::time::sleep(pause).await;
            }
        }

        repos
    }
}
