//! Continuation Planner — partitions an explanation into page-sized column segments.
//!
//! # State machine
//! ```text
//!              ┌──────────── flagged or residual ────────────┐
//!              v                                              │
//!   PLACING ──(nothing left)──> DONE          CONTINUING <───┘
//!      ^                          ^               │
//!      │                          └─(nothing left)┤
//!      └──────────(depth ≤ max_depth)─────────────┤
//!                                                 v
//!                                   TRUNCATED (depth > max_depth) ──> DONE
//! ```
//!
//! The input is indexed once into a flat arena of char boundaries. Pages only ever
//! advance a single cursor through that arena, so a segment can never be emitted twice
//! and the segments of a result always tile the consumed prefix of the text.
//!
//! The continuation depth equals the page index: page 0 is the original page, page `n`
//! is the `n`-th continuation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::layout::allocator::allocate;
use crate::layout::capacity::CapacityEstimate;
use crate::layout::page_fill::{analyze_page_fill, PageFillAnalysis};
use crate::layout::tuning::LayoutTuning;

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// A slice of the explanation placed in one column of one page.
///
/// Offsets are UTF-8 byte offsets into the original text and always fall on char
/// boundaries, so `&text[start_offset..end_offset]` is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    pub page_index: usize,
    pub column_index: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub char_count: usize,
}

impl TextSegment {
    /// The text this segment covers. `text` must be the string that was paginated.
    pub fn slice<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start_offset..self.end_offset]
    }
}

/// Segments that belong to one physical page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBlock {
    /// 0 for the original page, > 0 for continuation pages.
    pub page_index: usize,
    pub is_continuation: bool,
    /// In column order; columns that received nothing have no segment.
    pub segments: Vec<TextSegment>,
    /// Overflow analysis of the planned allocation for this page.
    pub fill: PageFillAnalysis,
    /// The page had no estimated room and one character was placed anyway.
    pub forced_progress: bool,
    /// The depth bound was hit and all remaining text was pushed onto this page.
    pub overfull: bool,
}

impl PageBlock {
    pub fn char_count(&self) -> usize {
        self.segments.iter().map(|s| s.char_count).sum()
    }
}

/// Outcome of paginating one explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationResult {
    pub pages: Vec<PageBlock>,
    /// Set when the depth bound was exhausted. The result is still loss-free, but the
    /// last page is visibly overfull.
    pub truncated: bool,
    pub pages_used: usize,
    /// Number of chars in the paginated text.
    pub total_chars: usize,
}

impl PaginationResult {
    /// Result for empty or blank text: no pages at all.
    pub fn empty() -> Self {
        Self {
            pages: Vec::new(),
            truncated: false,
            pages_used: 0,
            total_chars: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// All segments in `(page_index, column_index, start_offset)` order.
    pub fn segments(&self) -> impl Iterator<Item = &TextSegment> {
        self.pages.iter().flat_map(|p| p.segments.iter())
    }

    /// Concatenates every segment of `text` in document order.
    pub fn reassemble(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for segment in self.segments() {
            out.push_str(segment.slice(text));
        }
        out
    }

    /// True when the segments tile `text` exactly: no gap, no overlap, nothing missing.
    pub fn covers(&self, text: &str) -> bool {
        let mut expected_start = 0usize;
        for segment in self.segments() {
            if segment.start_offset != expected_start || segment.end_offset < segment.start_offset
            {
                return false;
            }
            expected_start = segment.end_offset;
        }
        expected_start == text.len()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Planner
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlannerState {
    Placing,
    Continuing,
    Truncated,
    Done,
}

/// Partitions `text` into pages whose columns have the given capacities.
///
/// `capacities` holds one estimate per column of a page; every page (original and
/// continuation) uses the same column layout. Always terminates: at most
/// `tuning.max_depth + 1` pages are produced.
pub fn plan_pages(
    text: &str,
    capacities: &[CapacityEstimate],
    tuning: &LayoutTuning,
) -> PaginationResult {
    let fallback = [CapacityEstimate::with_effective(0)];
    let capacities = if capacities.is_empty() {
        &fallback[..]
    } else {
        capacities
    };

    let boundaries = char_boundaries(text);
    let total_chars = boundaries.len() - 1;

    let mut pages: Vec<PageBlock> = Vec::new();
    let mut cursor = 0usize;
    let mut page_index = 0usize;
    let mut truncated = false;
    let mut state = PlannerState::Placing;

    loop {
        state = match state {
            PlannerState::Placing => {
                if cursor == total_chars {
                    PlannerState::Done
                } else {
                    let page = place_page(&boundaries, cursor, page_index, capacities, tuning);
                    cursor += page.char_count();
                    let flagged = page.fill.needs_continuation;

                    debug!(
                        page = page_index,
                        chars = page.char_count(),
                        remaining = total_chars - cursor,
                        flagged,
                        forced = page.forced_progress,
                        "Placed pagination page"
                    );

                    pages.push(page);
                    if flagged || cursor < total_chars {
                        PlannerState::Continuing
                    } else {
                        PlannerState::Done
                    }
                }
            }

            PlannerState::Continuing => {
                if cursor == total_chars {
                    PlannerState::Done
                } else {
                    page_index += 1;
                    if page_index > tuning.max_depth {
                        PlannerState::Truncated
                    } else {
                        PlannerState::Placing
                    }
                }
            }

            PlannerState::Truncated => {
                let residual = total_chars - cursor;
                force_place_remaining(&mut pages, &boundaries, cursor, capacities.len());
                cursor = total_chars;
                truncated = true;

                warn!(
                    max_depth = tuning.max_depth,
                    residual_chars = residual,
                    pages = pages.len(),
                    "Pagination depth bound reached; remaining text forced onto the last page"
                );
                PlannerState::Done
            }

            PlannerState::Done => break,
        };
    }

    let result = PaginationResult {
        pages_used: pages.len(),
        pages,
        truncated,
        total_chars,
    };
    debug_assert!(result.covers(text), "pagination lost or duplicated text");
    result
}

/// Places one page starting at char index `cursor`.
fn place_page(
    boundaries: &[usize],
    cursor: usize,
    page_index: usize,
    capacities: &[CapacityEstimate],
    tuning: &LayoutTuning,
) -> PageBlock {
    let remaining = boundaries.len() - 1 - cursor;
    let mut allocation = allocate(remaining, capacities, tuning.first_column_ratio);

    // No estimated room anywhere: place one char so the planner always moves forward.
    let forced_progress = remaining > 0 && allocation.iter().all(|&n| n == 0);
    if forced_progress {
        allocation[0] = 1;
    }

    let fill = analyze_page_fill(&allocation, capacities, tuning.overflow_threshold);

    let mut segments = Vec::with_capacity(allocation.len());
    let mut start = cursor;
    for (column_index, &count) in allocation.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let end = start + count;
        segments.push(TextSegment {
            page_index,
            column_index,
            start_offset: boundaries[start],
            end_offset: boundaries[end],
            char_count: count,
        });
        start = end;
    }

    PageBlock {
        page_index,
        is_continuation: page_index > 0,
        segments,
        fill,
        forced_progress,
        overfull: false,
    }
}

/// Appends everything from `cursor` to the end onto the last column of the last page.
fn force_place_remaining(
    pages: &mut Vec<PageBlock>,
    boundaries: &[usize],
    cursor: usize,
    column_count: usize,
) {
    let last_char = boundaries.len() - 1;
    let residual = last_char - cursor;
    if residual == 0 {
        return;
    }
    let last_column = column_count.saturating_sub(1);

    let Some(page) = pages.last_mut() else {
        return;
    };
    page.overfull = true;

    match page.segments.last_mut() {
        Some(segment) if segment.column_index == last_column => {
            segment.end_offset = boundaries[last_char];
            segment.char_count += residual;
        }
        _ => page.segments.push(TextSegment {
            page_index: page.page_index,
            column_index: last_column,
            start_offset: boundaries[cursor],
            end_offset: boundaries[last_char],
            char_count: residual,
        }),
    }
}

/// Byte offset of every char in `text`, followed by `text.len()`.
fn char_boundaries(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(effective: &[usize]) -> Vec<CapacityEstimate> {
        effective
            .iter()
            .map(|&e| CapacityEstimate::with_effective(e))
            .collect()
    }

    fn assert_loss_free(result: &PaginationResult, text: &str) {
        assert!(result.covers(text), "segments must tile the text");
        assert_eq!(result.reassemble(text), text);
        let placed: usize = result.segments().map(|s| s.char_count).sum();
        assert_eq!(placed, text.chars().count(), "every char placed exactly once");
        assert_eq!(result.pages_used, result.pages.len());
    }

    #[test]
    fn test_char_boundaries_multibyte() {
        assert_eq!(char_boundaries(""), vec![0]);
        assert_eq!(char_boundaries("ab"), vec![0, 1, 2]);
        // "中" is 3 bytes, "é" is 2 bytes.
        assert_eq!(char_boundaries("中é"), vec![0, 3, 5]);
    }

    #[test]
    fn test_empty_text_has_no_pages() {
        let result = plan_pages("", &caps(&[100]), &LayoutTuning::default());
        assert!(result.is_empty());
        assert!(!result.truncated);
        assert_eq!(result.pages_used, 0);
    }

    #[test]
    fn test_short_text_single_segment() {
        let text = "a".repeat(50);
        let result = plan_pages(&text, &caps(&[1000, 1000]), &LayoutTuning::default());
        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.pages[0].segments.len(), 1);
        assert!(!result.pages[0].is_continuation);
        assert!(!result.truncated);
        assert_loss_free(&result, &text);
    }

    #[test]
    fn test_long_text_spills_to_continuation_pages() {
        // Per page: 75 + 100 = 175 chars.
        let text = "x".repeat(400);
        let result = plan_pages(&text, &caps(&[100, 100]), &LayoutTuning::default());
        assert_eq!(result.pages.len(), 3);
        let per_page: Vec<usize> = result.pages.iter().map(|p| p.char_count()).collect();
        assert_eq!(per_page, vec![175, 175, 50]);
        for (i, page) in result.pages.iter().enumerate() {
            assert_eq!(page.page_index, i);
            assert_eq!(page.is_continuation, i > 0);
            assert!(page.segments.iter().all(|s| s.page_index == i));
        }
        assert_loss_free(&result, &text);
    }

    #[test]
    fn test_multibyte_text_is_cut_on_char_boundaries() {
        let text = "这是非常长的文本内容。".repeat(40);
        let result = plan_pages(&text, &caps(&[37, 37, 37]), &LayoutTuning::default());
        assert!(result.pages.len() > 1);
        for segment in result.segments() {
            assert!(text.is_char_boundary(segment.start_offset));
            assert!(text.is_char_boundary(segment.end_offset));
            assert_eq!(segment.slice(&text).chars().count(), segment.char_count);
        }
        assert_loss_free(&result, &text);
    }

    #[test]
    fn test_no_segment_is_emitted_twice() {
        let text: String = (0..2_000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let result = plan_pages(&text, &caps(&[90, 120, 120]), &LayoutTuning::default());
        let mut seen = std::collections::HashSet::new();
        for segment in result.segments() {
            assert!(
                seen.insert((segment.start_offset, segment.end_offset)),
                "segment {segment:?} emitted twice"
            );
        }
        assert_loss_free(&result, &text);
    }

    #[test]
    fn test_flagged_page_with_nothing_left_adds_no_empty_page() {
        // 75 + 90 = 165: column 1 is at 90% (flagged) but nothing remains.
        let text = "y".repeat(165);
        let result = plan_pages(&text, &caps(&[100, 100]), &LayoutTuning::default());
        assert_eq!(result.pages.len(), 1);
        assert!(result.pages[0].fill.needs_continuation);
        assert!(!result.truncated);
        assert_loss_free(&result, &text);
    }

    #[test]
    fn test_zero_capacity_forces_one_char_per_page() {
        let text = "abcdefghij";
        let result = plan_pages(text, &caps(&[0]), &LayoutTuning::default());
        assert_eq!(result.pages.len(), 10);
        assert!(result.pages.iter().all(|p| p.forced_progress));
        assert!(result.pages.iter().all(|p| p.char_count() == 1));
        assert!(!result.truncated);
        assert_loss_free(&result, text);
    }

    #[test]
    fn test_exactly_max_pages_is_not_truncated() {
        let tuning = LayoutTuning::default();
        let text = "z".repeat(tuning.max_pages());
        let result = plan_pages(&text, &caps(&[0]), &tuning);
        assert_eq!(result.pages_used, tuning.max_pages());
        assert!(!result.truncated, "no residual remained at the last page");
        assert_loss_free(&result, &text);
    }

    #[test]
    fn test_depth_bound_truncates_without_loss() {
        let tuning = LayoutTuning::default();
        let text = "q".repeat(tuning.max_pages() + 9);
        let result = plan_pages(&text, &caps(&[0]), &tuning);

        assert!(result.truncated);
        assert_eq!(result.pages_used, tuning.max_depth + 1);
        let last = result.pages.last().expect("at least one page");
        assert!(last.overfull);
        assert_eq!(last.char_count(), 10, "1 forced char + 9 residual");
        assert!(result.pages[..result.pages.len() - 1].iter().all(|p| !p.overfull));
        assert_loss_free(&result, &text);
    }

    #[test]
    fn test_truncation_appends_to_last_column() {
        let tuning = LayoutTuning {
            max_depth: 2,
            ..LayoutTuning::default()
        };
        let text = "w".repeat(50);
        let result = plan_pages(&text, &caps(&[0, 0, 0]), &tuning);

        assert!(result.truncated);
        assert_eq!(result.pages_used, 3);
        let last = result.pages.last().unwrap();
        assert_eq!(last.segments.len(), 2);
        assert_eq!(last.segments[0].column_index, 0);
        assert_eq!(last.segments[1].column_index, 2);
        assert_eq!(last.segments[1].char_count, 47);
        assert_loss_free(&result, &text);
    }

    #[test]
    fn test_truncation_extends_existing_last_column_segment() {
        let tuning = LayoutTuning {
            max_depth: 0,
            ..LayoutTuning::default()
        };
        // Page 0 holds 75 + 100; the rest is pushed into column 1.
        let text = "v".repeat(500);
        let result = plan_pages(&text, &caps(&[100, 100]), &tuning);

        assert!(result.truncated);
        assert_eq!(result.pages_used, 1);
        let page = &result.pages[0];
        assert_eq!(page.segments.len(), 2);
        assert_eq!(page.segments[1].column_index, 1);
        assert_eq!(page.segments[1].char_count, 425);
        assert_loss_free(&result, &text);
    }

    #[test]
    fn test_pages_never_exceed_depth_bound() {
        let tuning = LayoutTuning::default();
        for len in [0usize, 1, 10, 100, 1_000, 10_000] {
            let text = "p".repeat(len);
            for effective in [0usize, 1, 3, 50] {
                let result = plan_pages(&text, &caps(&[effective, effective]), &tuning);
                assert!(result.pages_used <= tuning.max_pages());
                assert_loss_free(&result, &text);
            }
        }
    }

    #[test]
    fn test_truncated_iff_depth_exhausted_with_residual() {
        let tuning = LayoutTuning {
            max_depth: 4,
            ..LayoutTuning::default()
        };
        for len in 1..40usize {
            let text = "t".repeat(len);
            let result = plan_pages(&text, &caps(&[4]), &tuning);
            // limit per page: floor(4 × 0.75) = 3 chars
            let expected_truncated = len > 3 * tuning.max_pages();
            assert_eq!(result.truncated, expected_truncated, "len={len}");
            if result.truncated {
                assert_eq!(result.pages_used, tuning.max_pages());
            }
            assert_loss_free(&result, &text);
        }
    }

    #[test]
    fn test_planning_is_deterministic() {
        let text = "Determinism matters for regenerating the same PDF twice. ".repeat(30);
        let capacities = caps(&[120, 160]);
        let tuning = LayoutTuning::default();
        let first = plan_pages(&text, &capacities, &tuning);
        let second = plan_pages(&text, &capacities, &tuning);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_capacities_still_terminate() {
        let text = "abc";
        let result = plan_pages(text, &[], &LayoutTuning::default());
        assert_loss_free(&result, text);
    }
}
