//! Column Allocator — splits the remaining text length across the columns of one page.
//!
//! The first column of every page only gets `first_column_ratio` of its capacity: the
//! composer draws the page/section header there, and first columns are where wrapping
//! is most often underestimated. Later columns greedy-fill up to their full effective
//! capacity. The function is pure; equal inputs always give equal allocations.

use crate::layout::capacity::CapacityEstimate;

/// Characters the first column of a page may receive.
pub fn first_column_limit(capacity: &CapacityEstimate, first_column_ratio: f64) -> usize {
    (capacity.effective_capacity as f64 * first_column_ratio).floor() as usize
}

/// Per-column character limits for one page, in column order.
pub fn column_limits(capacities: &[CapacityEstimate], first_column_ratio: f64) -> Vec<usize> {
    capacities
        .iter()
        .enumerate()
        .map(|(i, cap)| {
            if i == 0 {
                first_column_limit(cap, first_column_ratio)
            } else {
                cap.effective_capacity
            }
        })
        .collect()
}

/// Returns how many characters go into each column of the current page.
///
/// The result has one entry per capacity and sums to
/// `min(remaining_text_len, Σ column_limits)`.
pub fn allocate(
    remaining_text_len: usize,
    capacities: &[CapacityEstimate],
    first_column_ratio: f64,
) -> Vec<usize> {
    let mut left = remaining_text_len;
    column_limits(capacities, first_column_ratio)
        .into_iter()
        .map(|limit| {
            let take = left.min(limit);
            left -= take;
            take
        })
        .collect()
}
