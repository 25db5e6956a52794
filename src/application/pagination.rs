//! Offset pagination over an already-fetched, ordered item list.
//!
//! Cached snapshots hold the whole feed, so the page window is cut on every
//! read, including cache hits.

use std::num::NonZeroU32;

use thiserror::Error;

pub const DEFAULT_PAGE: NonZeroU32 = NonZeroU32::MIN;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("`page` must be a positive integer, got `{raw}`")]
    InvalidPage { raw: String },
    #[error("`limit` must be a positive integer, got `{raw}`")]
    InvalidLimit { raw: String },
    #[error("`limit` must not exceed {max}, got {limit}")]
    LimitTooLarge { limit: u32, max: u32 },
}

/// Bounds applied when validating a raw page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: NonZeroU32,
    pub max_limit: NonZeroU32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN),
            max_limit: NonZeroU32::new(100).unwrap_or(NonZeroU32::MIN),
        }
    }
}

/// Validated `page`/`limit` pair; `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageQuery {
    page: NonZeroU32,
    limit: NonZeroU32,
}

impl PageQuery {
    pub fn new(page: NonZeroU32, limit: NonZeroU32) -> Self {
        Self { page, limit }
    }

    /// Validate query-string values. Absent values fall back to defaults;
    /// present values that are empty, non-numeric, zero or above the limit
    /// ceiling are rejected.
    pub fn from_raw(
        page: Option<&str>,
        limit: Option<&str>,
        limits: &PageLimits,
    ) -> Result<Self, PaginationError> {
        let page = match page {
            Some(raw) => parse_positive(raw).ok_or_else(|| PaginationError::InvalidPage {
                raw: raw.to_string(),
            })?,
            None => DEFAULT_PAGE,
        };

        let limit = match limit {
            Some(raw) => parse_positive(raw).ok_or_else(|| PaginationError::InvalidLimit {
                raw: raw.to_string(),
            })?,
            None => limits.default_limit,
        };

        if limit > limits.max_limit {
            return Err(PaginationError::LimitTooLarge {
                limit: limit.get(),
                max: limits.max_limit.get(),
            });
        }

        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page.get()
    }

    pub fn limit(&self) -> u32 {
        self.limit.get()
    }
}

fn parse_positive(raw: &str) -> Option<NonZeroU32> {
    raw.parse::<u32>().ok().and_then(NonZeroU32::new)
}

/// One window of an ordered list plus the size of the whole list.
#[derive(Debug, PartialEq, Eq)]
pub struct PageSlice<'a, T> {
    pub items: &'a [T],
    pub page: u32,
    pub limit: u32,
    pub total_items: usize,
}

impl<T> PageSlice<'_, T> {
    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.limit as usize)
    }
}

/// Cut `items[(page - 1) * limit .. page * limit]`, clamped to the list.
///
/// A window starting past the end is empty, never an error.
pub fn paginate<T>(items: &[T], query: PageQuery) -> PageSlice<'_, T> {
    let limit = query.limit() as usize;
    let start = (query.page() as usize - 1)
        .saturating_mul(limit)
        .min(items.len());
    let end = start.saturating_add(limit).min(items.len());

    PageSlice {
        items: &items[start..end],
        page: query.page(),
        limit: query.limit(),
        total_items: items.len(),
    }
}
