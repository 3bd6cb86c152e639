//! Offset/limit windowing

use serde::{Deserialize, Serialize};

/// A contiguous sub-range selection. Offset always applies before limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl Window {
    pub fn new(offset: Option<i64>, limit: Option<i64>) -> Self {
        Self { offset, limit }
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        window(items, self.offset, self.limit)
    }
}

/// Drop the first `offset` items, then keep at most `limit`.
/// Non-positive values are ignored.
pub fn window<T>(mut items: Vec<T>, offset: Option<i64>, limit: Option<i64>) -> Vec<T> {
    if let Some(offset) = offset.filter(|o| *o > 0) {
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        if offset >= items.len() {
            items.clear();
        } else {
            items.drain(..offset);
        }
    }

    if let Some(limit) = limit.filter(|l| *l > 0) {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        items.truncate(limit);
    }

    items
}
