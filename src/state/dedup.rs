use std::collections::HashSet;

/// In-memory index of processed keys
///
/// Hydrated once from the sink at run start and updated by the single persistence
/// consumer after each successful commit. Holds natural keys for the listing
/// crawler and owner identities for the code-host crawler.
#[derive(Debug, Clone, Default)]
pub struct DedupIndex {
    keys: HashSet<String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_processed(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Marks `key` processed; returns false if it already was
    pub fn mark_processed(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<String> for DedupIndex {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
