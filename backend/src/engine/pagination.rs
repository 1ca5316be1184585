//! Paginator.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// One page of a ranked sequence plus the metadata pagination controls need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served.
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    /// At least 1, even for an empty sequence.
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Number of pages needed for `len` items, never less than 1.
pub fn total_pages(len: usize, page_size: NonZeroUsize) -> usize {
    len.div_ceil(page_size.get()).max(1)
}

/// Slice `[(page-1)*size, page*size)` out of `items`, clamped to bounds.
///
/// Page 0 is served as page 1. A page past the end is empty.
pub fn paginate<T: Clone>(items: &[T], page_size: NonZeroUsize, page: usize) -> Page<T> {
    let page = page.max(1);
    let size = page_size.get();
    let start = (page - 1).saturating_mul(size).min(items.len());
    let end = start.saturating_add(size).min(items.len());
    Page {
        items: items[start..end].to_vec(),
        page,
        page_size: size,
        total_items: items.len(),
        total_pages: total_pages(items.len(), page_size),
    }
}
