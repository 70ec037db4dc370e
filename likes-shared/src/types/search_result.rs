use serde::{Deserialize, Serialize};

/// A page of search results.
///
/// `total_count` is the number of rows matching the filters regardless of the
/// requested window. For unbounded searches it equals `items.len()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

impl<T> SearchResult<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }

    /// Wraps a complete, unwindowed result set.
    pub fn unbounded(items: Vec<T>) -> Self {
        let total_count = items.len() as u64;
        Self { items, total_count }
    }
}
