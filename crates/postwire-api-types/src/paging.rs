use serde::{Deserialize, Serialize};

/// Canonical paginated list shape handed to every list consumer.
///
/// Invariants: `current_page >= 1` and `total_pages >= 1`. A list that could
/// not be loaded is an empty envelope with `error` set, never an absent one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagingEnvelope<T> {
    pub results: Vec<T>,
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub current_page: u32,
    pub total_pages: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> PagingEnvelope<T> {
    pub fn empty(page: u32) -> Self {
        Self {
            results: Vec::new(),
            count: 0,
            next: None,
            previous: None,
            current_page: page.max(1),
            total_pages: 1,
            error: None,
        }
    }

    /// Empty envelope substituted for a list read that failed.
    pub fn fallback(page: u32, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(page)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.next.is_some() || self.current_page < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagingEnvelope<U> {
        PagingEnvelope {
            results: self.results.into_iter().map(f).collect(),
            count: self.count,
            next: self.next,
            previous: self.previous,
            current_page: self.current_page,
            total_pages: self.total_pages,
            error: self.error,
        }
    }
}
