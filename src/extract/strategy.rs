use crate::page::{ElementId, PageHandle, Scope};

/// One extraction attempt for a field
///
/// A strategy returns `None` when its elements are missing; it never aborts the chain.
pub type Strategy<T> = Box<dyn Fn(&dyn PageHandle, Scope) -> Option<T> + Send + Sync>;

/// Values a chain can produce
pub trait Candidate {
    /// Returns true if the value should not end the chain
    fn is_blank(&self) -> bool;
}

impl Candidate for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Candidate for ElementId {
    fn is_blank(&self) -> bool {
        false
    }
}

/// The winning value and the strategy that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit<T> {
    pub value: T,
    pub strategy: &'static str,
}

/// Ordered strategies for one logical field, most specific first
pub struct FallbackChain<T> {
    field: &'static str,
    strategies: Vec<(&'static str, Strategy<T>)>,
}

impl<T: Candidate> FallbackChain<T> {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            strategies: Vec::new(),
        }
    }

    /// Appends a strategy at the lowest priority
    pub fn then<F>(mut self, name: &'static str, strategy: F) -> Self
    where
        F: Fn(&dyn PageHandle, Scope) -> Option<T> + Send + Sync + 'static,
    {
        self.strategies.push((name, Box::new(strategy)));
        self
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Strategy names in evaluation order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|(name, _)| *name).collect()
    }

    /// Runs strategies left to right and returns the first non-blank value
    ///
    /// Later strategies are not invoked once one produces a value.
    pub fn run(&self, page: &dyn PageHandle, scope: Scope) -> Option<Hit<T>> {
        for (name, strategy) in &self.strategies {
            match strategy(page, scope) {
                Some(value) if !value.is_blank() => {
                    tracing::debug!("{}: hit via {} on {}", self.field, name, page.url());
                    return Some(Hit {
                        value,
                        strategy: *name,
                    });
                }
                _ => tracing::trace!("{}: {} found nothing", self.field, name),
            }
        }

        tracing::debug!("{}: all strategies exhausted on {}", self.field, page.url());
        None
    }
}

/// Trims `text`, returning `None` when nothing is left
pub fn non_blank(text: impl AsRef<str>) -> Option<String> {
    let trimmed = text.as_ref().trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
