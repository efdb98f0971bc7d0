//! Heuristic tuning knobs for the pagination engine.
//!
//! Every factor here was tuned empirically against visible overflow on rendered pages.
//! None of them is claimed optimal, so they are carried as data rather than constants
//! and can be overridden through `Config::from_env`.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::layout::font_metrics::{ContentMode, ScriptProfile};

pub const DEFAULT_SAFETY_FACTOR: f64 = 0.5;
pub const DEFAULT_OVERFLOW_THRESHOLD: f64 = 0.85;
pub const DEFAULT_FIRST_COLUMN_RATIO: f64 = 0.75;
pub const DEFAULT_MARKUP_OVERHEAD: f64 = 1.15;
pub const DEFAULT_CJK_WIDTH_FACTOR: f64 = 0.55;
pub const DEFAULT_LATIN_WIDTH_FACTOR: f64 = 0.45;
/// Maximum number of continuation pages after the original page.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Tunable constants for capacity estimation, allocation and overflow detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutTuning {
    /// Derating applied to the raw `chars_per_line × lines_per_column` product. In (0, 1).
    pub safety_factor: f64,
    /// Proactive fill ratio above which a column counts as overflowing. In (0, 1].
    pub overflow_threshold: f64,
    /// Share of its effective capacity the first column of a page may receive. In (0, 1].
    pub first_column_ratio: f64,
    /// Line-height multiplier for rendered markup (headers, fences, list markers). ≥ 1.
    pub markup_overhead: f64,
    /// Average glyph advance in em for CJK-dominant text.
    pub cjk_width_factor: f64,
    /// Average glyph advance in em for Latin-dominant text.
    pub latin_width_factor: f64,
    /// Continuation depth bound; at most `max_depth + 1` pages are produced.
    pub max_depth: usize,
}

impl Default for LayoutTuning {
    fn default() -> Self {
        Self {
            safety_factor: DEFAULT_SAFETY_FACTOR,
            overflow_threshold: DEFAULT_OVERFLOW_THRESHOLD,
            first_column_ratio: DEFAULT_FIRST_COLUMN_RATIO,
            markup_overhead: DEFAULT_MARKUP_OVERHEAD,
            cjk_width_factor: DEFAULT_CJK_WIDTH_FACTOR,
            latin_width_factor: DEFAULT_LATIN_WIDTH_FACTOR,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl LayoutTuning {
    /// Rejects factor combinations that would break the engine's guarantees.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.safety_factor > 0.0 && self.safety_factor < 1.0) {
            return Err(AppError::config(format!(
                "safety_factor must be in (0, 1), got {}",
                self.safety_factor
            )));
        }
        if !(self.overflow_threshold > 0.0 && self.overflow_threshold <= 1.0) {
            return Err(AppError::config(format!(
                "overflow_threshold must be in (0, 1], got {}",
                self.overflow_threshold
            )));
        }
        if !(self.first_column_ratio > 0.0 && self.first_column_ratio <= 1.0) {
            return Err(AppError::config(format!(
                "first_column_ratio must be in (0, 1], got {}",
                self.first_column_ratio
            )));
        }
        if !(self.markup_overhead >= 1.0 && self.markup_overhead.is_finite()) {
            return Err(AppError::config(format!(
                "markup_overhead must be a finite value >= 1, got {}",
                self.markup_overhead
            )));
        }
        for (name, factor) in [
            ("cjk_width_factor", self.cjk_width_factor),
            ("latin_width_factor", self.latin_width_factor),
        ] {
            if !(factor > 0.0 && factor.is_finite()) {
                return Err(AppError::config(format!(
                    "{name} must be a finite value > 0, got {factor}"
                )));
            }
        }
        Ok(())
    }

    /// Average glyph advance in em for the given script mix.
    pub fn char_width_factor(&self, script: ScriptProfile) -> f64 {
        match script {
            ScriptProfile::CjkDominant => self.cjk_width_factor,
            ScriptProfile::LatinDominant => self.latin_width_factor,
        }
    }

    /// Line-height multiplier for the given content mode.
    pub fn vertical_overhead(&self, mode: ContentMode) -> f64 {
        match mode {
            ContentMode::RenderedMarkup => self.markup_overhead,
            ContentMode::PlainText => 1.0,
        }
    }

    /// Largest number of pages a single `paginate` call may produce.
    pub fn max_pages(&self) -> usize {
        self.max_depth + 1
    }
}
