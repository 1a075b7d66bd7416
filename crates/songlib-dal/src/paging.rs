use std::ops::Range;

use serde::{Deserialize, Serialize};

pub const DEFAULT_OFFSET: u64 = 0;
pub const DEFAULT_LIMIT: u64 = 20;

/// Offset/limit window requested by caller plus the summary of what was returned.
///
/// `items` and `total` are always computed by the producing operation,
/// values coming from a caller are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
    pub items: u64,
    pub total: u64,
}

impl Pagination {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit,
            items: 0,
            total: 0,
        }
    }

    /// `(0, 0)` is the sentinel for "use defaults"
    pub fn is_empty(&self) -> bool {
        self.offset == 0 && self.limit == 0
    }

    /// Positions selected from a collection of `total` elements.
    pub fn window(&self, total: u64) -> Range<u64> {
        let start = self.offset.min(total);
        let end = self.offset.saturating_add(self.limit).min(total);
        start..end
    }

    pub fn completed(self, items: u64, total: u64) -> Self {
        Self {
            items,
            total,
            ..self
        }
    }

    /// Selects a page from the whole collection.
    pub fn slice<T>(self, all: &[T]) -> (&[T], Pagination) {
        let total = all.len() as u64;
        let window = self.window(total);
        // window is bounded by the slice length
        let page = &all[window.start as usize..window.end as usize];
        (page, self.completed(page.len() as u64, total))
    }

    /// Offset and limit as SQL parameters
    pub(crate) fn sql_bounds(&self) -> (i64, i64) {
        (
            i64::try_from(self.offset).unwrap_or(i64::MAX),
            i64::try_from(self.limit).unwrap_or(i64::MAX),
        )
    }
}

/// Defaults substituted for an empty [`Pagination`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingDefaults {
    pub offset: u64,
    pub limit: u64,
}

impl Default for PagingDefaults {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PagingDefaults {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Effective pagination for a request, summary fields are reset.
    pub fn resolve(&self, requested: Pagination) -> Pagination {
        if requested.is_empty() {
            Pagination::new(self.offset, self.limit)
        } else {
            Pagination::new(requested.offset, requested.limit)
        }
    }
}

/// One page of records together with its pagination summary
#[derive(Debug, Clone, Serialize)]
pub struct Batch<T> {
    pub rows: Vec<T>,
    pub pagination: Pagination,
}
