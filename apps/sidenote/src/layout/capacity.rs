//! Capacity Model — estimates how many characters fit in one column without shaping text.
//!
//! ```text
//! chars_per_line     = floor(column_width  / (font_size × char_width_factor))
//! lines_per_column   = floor(column_height / (font_size × line_spacing × overhead))
//! raw_capacity       = chars_per_line × lines_per_column
//! effective_capacity = floor(raw_capacity × safety_factor)
//! ```
//!
//! The safety factor absorbs wrapping at word boundaries, wide punctuation, markup that
//! renders taller than a line, and every other way a real renderer disagrees with an
//! average glyph width.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::layout::font_metrics::{FontStyle, LayoutRegion};
use crate::layout::template_cache::{LayoutTemplate, LayoutTemplateCache};
use crate::layout::tuning::LayoutTuning;

/// Estimated character capacity of a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityEstimate {
    pub chars_per_line: usize,
    pub lines_per_column: usize,
    pub raw_capacity: usize,
    pub effective_capacity: usize,
}

impl CapacityEstimate {
    pub fn from_grid(chars_per_line: usize, lines_per_column: usize, safety_factor: f64) -> Self {
        let raw_capacity = chars_per_line.saturating_mul(lines_per_column);
        let effective_capacity = (raw_capacity as f64 * safety_factor).floor() as usize;
        Self {
            chars_per_line,
            lines_per_column,
            raw_capacity,
            effective_capacity,
        }
    }

    /// Builds an estimate with a given effective capacity. Used where only the derated
    /// number matters (allocation and overflow checks in tests and callers that already
    /// know their budget).
    pub fn with_effective(effective_capacity: usize) -> Self {
        Self {
            chars_per_line: 0,
            lines_per_column: 0,
            raw_capacity: effective_capacity,
            effective_capacity,
        }
    }
}

/// Validates the region and style and estimates one column's capacity.
pub fn estimate(
    region: &LayoutRegion,
    style: &FontStyle,
    tuning: &LayoutTuning,
) -> Result<CapacityEstimate, AppError> {
    validate_inputs(region, style)?;
    let template = LayoutTemplate::compute(style, region.column_count, tuning);
    Ok(estimate_from_template(region, &template, tuning))
}

/// Same as `estimate`, but takes the per-style constants from a shared cache.
pub fn estimate_cached(
    region: &LayoutRegion,
    style: &FontStyle,
    tuning: &LayoutTuning,
    cache: &LayoutTemplateCache,
) -> Result<CapacityEstimate, AppError> {
    validate_inputs(region, style)?;
    let template = cache.get_or_compute(style, region.column_count, tuning);
    Ok(estimate_from_template(region, &template, tuning))
}

pub fn validate_inputs(region: &LayoutRegion, style: &FontStyle) -> Result<(), AppError> {
    region.validate()?;
    style.validate()
}

/// Applies region geometry to a template. Inputs must already be validated.
pub(crate) fn estimate_from_template(
    region: &LayoutRegion,
    template: &LayoutTemplate,
    tuning: &LayoutTuning,
) -> CapacityEstimate {
    let chars_per_line = floor_ratio(region.column_width(), template.glyph_advance);
    let lines_per_column = floor_ratio(region.column_height(), template.line_height);
    CapacityEstimate::from_grid(chars_per_line, lines_per_column, tuning.safety_factor)
}

/// `floor(numerator / denominator)` clamped to the `usize` range; 0 for degenerate input.
fn floor_ratio(numerator: f64, denominator: f64) -> usize {
    if !(denominator > 0.0) || !(numerator > 0.0) {
        return 0;
    }
    (numerator / denominator).floor() as usize
}
