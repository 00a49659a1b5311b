//! Pagination over in-memory record sequences.
//!
//! A pure, total function: out-of-range inputs are clamped, never rejected.

use serde::Serialize;

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

/// One page of an ordered sequence plus paging metadata.
///
/// Serializes in camelCase to match the JSON the web layer returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub has_next: bool,
    pub has_prev: bool,
    pub limit: usize,
    pub start_index: usize,
    /// End of the slice, clamped to the sequence length.
    pub end_index: usize,
}

/// Slice `items` into the requested page.
///
/// `page` is clamped to at least 1 and `limit` to `1..=`[`MAX_PAGE_LIMIT`].
/// A page past the end of the sequence yields empty data with the same
/// metadata arithmetic.
pub fn paginate<T: Clone>(items: &[T], page: usize, limit: usize) -> Page<T> {
    let page = page.max(1);
    let limit = limit.clamp(1, MAX_PAGE_LIMIT);

    let total_records = items.len();
    let total_pages = total_records.div_ceil(limit);
    let start_index = (page - 1) * limit;
    let end_index = page * limit;

    let data = if start_index < total_records {
        items[start_index..end_index.min(total_records)].to_vec()
    } else {
        Vec::new()
    };

    Page {
        data,
        current_page: page,
        total_pages,
        total_records,
        has_next: end_index < total_records,
        has_prev: page > 1,
        limit,
        start_index,
        end_index: end_index.min(total_records),
    }
}
