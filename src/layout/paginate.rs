//! # Pagination
//!
//! Splits the ordered image list into pages. Pages are filled strictly in
//! input order; there is no look-ahead or reordering to save pages.

/// Slice `items` into consecutive page-sized groups.
///
/// Every group holds `capacity` items except possibly the last. An empty
/// input, or a zero capacity, produces no pages.
pub fn partition_into_pages<T>(items: &[T], capacity: usize) -> Vec<&[T]> {
    if capacity == 0 {
        return vec![];
    }
    items.chunks(capacity).collect()
}

/// Number of pages [`partition_into_pages`] produces for `count` items.
pub fn page_count(count: usize, capacity: usize) -> usize {
    if capacity == 0 {
        0
    } else {
        count.div_ceil(capacity)
    }
}

/// Column and row of the `slot`-th cell on a page, filled row by row.
#[inline]
pub fn cell_position(slot: usize, columns: usize) -> (usize, usize) {
    (slot % columns, slot / columns)
}
