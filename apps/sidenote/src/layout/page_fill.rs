//! Page Fill Analysis — proactive overflow detection for allocated columns.
//!
//! Capacity estimates are heuristic, so a column is treated as full before the estimate
//! says it is: anything above `overflow_threshold` (default 85%) of the effective
//! capacity counts as overflowing and sends the rest of the text to a continuation page.
//!
//! # Column verdicts
//! - fill ≤ threshold           → Comfortable
//! - fill > threshold           → NearCapacity (overflowing)
//! - effective capacity is zero → Starved (always overflowing)

use serde::{Deserialize, Serialize};

use crate::layout::capacity::CapacityEstimate;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Fill verdict for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnFillVerdict {
    /// At or below the proactive threshold.
    Comfortable,
    /// Above the proactive threshold; the page must not take more text.
    NearCapacity,
    /// The column has no estimated capacity at all.
    Starved,
}

impl ColumnFillVerdict {
    pub fn is_overflowing(self) -> bool {
        !matches!(self, ColumnFillVerdict::Comfortable)
    }
}

/// Fill analysis of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnFillAnalysis {
    pub column_index: usize,
    pub allocated_chars: usize,
    pub effective_capacity: usize,
    /// `allocated / effective`. A starved column reports 1.0 once it holds anything.
    pub fill_ratio: f64,
    pub verdict: ColumnFillVerdict,
}

/// Fill analysis of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFillAnalysis {
    pub columns: Vec<ColumnFillAnalysis>,
    pub total_allocated: usize,
    pub total_capacity: usize,
    /// True when any column is overflowing.
    pub needs_continuation: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Core functions
// ────────────────────────────────────────────────────────────────────────────

/// Returns true when `allocated_len` exceeds the proactive share of the capacity.
///
/// A column with zero effective capacity always overflows.
pub fn is_overflowing(allocated_len: usize, capacity: &CapacityEstimate, threshold: f64) -> bool {
    column_verdict(allocated_len, capacity, threshold).is_overflowing()
}

pub fn column_verdict(
    allocated_len: usize,
    capacity: &CapacityEstimate,
    threshold: f64,
) -> ColumnFillVerdict {
    if capacity.effective_capacity == 0 {
        return ColumnFillVerdict::Starved;
    }
    let limit = capacity.effective_capacity as f64 * threshold;
    if allocated_len as f64 > limit {
        ColumnFillVerdict::NearCapacity
    } else {
        ColumnFillVerdict::Comfortable
    }
}

/// Analyzes one page's allocation. `allocation` and `capacities` are in column order.
pub fn analyze_page_fill(
    allocation: &[usize],
    capacities: &[CapacityEstimate],
    threshold: f64,
) -> PageFillAnalysis {
    let columns: Vec<ColumnFillAnalysis> = allocation
        .iter()
        .zip(capacities)
        .enumerate()
        .map(|(column_index, (&allocated_chars, cap))| ColumnFillAnalysis {
            column_index,
            allocated_chars,
            effective_capacity: cap.effective_capacity,
            fill_ratio: fill_ratio(allocated_chars, cap.effective_capacity),
            verdict: column_verdict(allocated_chars, cap, threshold),
        })
        .collect();

    let needs_continuation = columns.iter().any(|c| c.verdict.is_overflowing());

    PageFillAnalysis {
        total_allocated: saturating_total(allocation.iter().copied()),
        total_capacity: saturating_total(capacities.iter().map(|c| c.effective_capacity)),
        needs_continuation,
        columns,
    }
}

/// Capacities of huge regions saturate at `usize::MAX`, so totals must not overflow.
fn saturating_total(values: impl Iterator<Item = usize>) -> usize {
    values.fold(0usize, |acc, v| acc.saturating_add(v))
}

fn fill_ratio(allocated: usize, capacity: usize) -> f64 {
    if capacity == 0 {
        if allocated == 0 {
            0.0
        } else {
            1.0
        }
    } else {
        allocated as f64 / capacity as f64
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 0.85;

    fn cap(effective: usize) -> CapacityEstimate {
        CapacityEstimate::with_effective(effective)
    }

    #[test]
    fn test_below_threshold_not_overflowing() {
        assert!(!is_overflowing(50, &cap(1000), THRESHOLD));
        assert!(!is_overflowing(850, &cap(1000), THRESHOLD));
    }

    #[test]
    fn test_above_threshold_overflowing_before_literal_overflow() {
        // 851 of 1000 is below 100% but above the proactive 85%.
        assert!(is_overflowing(851, &cap(1000), THRESHOLD));
        assert!(is_overflowing(1000, &cap(1000), THRESHOLD));
    }

    #[test]
    fn test_zero_capacity_always_overflowing() {
        assert!(is_overflowing(0, &cap(0), THRESHOLD));
        assert!(is_overflowing(1, &cap(0), THRESHOLD));
        assert_eq!(column_verdict(0, &cap(0), THRESHOLD), ColumnFillVerdict::Starved);
    }

    #[test]
    fn test_threshold_of_one_is_literal_overflow() {
        assert!(!is_overflowing(100, &cap(100), 1.0));
        assert!(is_overflowing(101, &cap(100), 1.0));
    }

    #[test]
    fn test_full_first_column_under_default_headroom_is_comfortable() {
        // The first column is capped at 75%, below the 85% threshold.
        assert_eq!(
            column_verdict(750, &cap(1000), THRESHOLD),
            ColumnFillVerdict::Comfortable
        );
    }

    #[test]
    fn test_page_analysis_flags_full_column() {
        let analysis = analyze_page_fill(&[249, 333, 118], &[cap(333), cap(333), cap(333)], THRESHOLD);
        assert_eq!(analysis.total_allocated, 700);
        assert_eq!(analysis.total_capacity, 999);
        assert!(analysis.needs_continuation);
        assert_eq!(analysis.columns[0].verdict, ColumnFillVerdict::Comfortable);
        assert_eq!(analysis.columns[1].verdict, ColumnFillVerdict::NearCapacity);
        assert_eq!(analysis.columns[2].verdict, ColumnFillVerdict::Comfortable);
        assert!((analysis.columns[1].fill_ratio - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_page_analysis_comfortable_page() {
        let analysis = analyze_page_fill(&[50, 0], &[cap(1000), cap(1000)], THRESHOLD);
        assert!(!analysis.needs_continuation);
        assert_eq!(analysis.columns.len(), 2);
        assert_eq!(analysis.columns[1].fill_ratio, 0.0);
    }

    #[test]
    fn test_page_analysis_saturates_huge_capacities() {
        let huge = cap(usize::MAX / 2 + 1);
        let analysis = analyze_page_fill(&[10, 0, 0], &[huge, huge, huge], THRESHOLD);
        assert_eq!(analysis.total_capacity, usize::MAX);
        assert_eq!(analysis.total_allocated, 10);
        assert!(!analysis.needs_continuation);
    }

    #[test]
    fn test_page_analysis_starved_page() {
        let analysis = analyze_page_fill(&[1], &[cap(0)], THRESHOLD);
        assert!(analysis.needs_continuation);
        assert_eq!(analysis.columns[0].verdict, ColumnFillVerdict::Starved);
        assert_eq!(analysis.columns[0].fill_ratio, 1.0);
    }
}
