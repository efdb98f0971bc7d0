//! Font style, script profile and layout region types for the side panel.
//!
//! No glyph tables are consulted here. Character widths are approximated by a single
//! average advance per script family (see `LayoutTuning::char_width_factor`), which is
//! enough to plan pagination; the renderer does the real shaping later.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Most columns a side panel may be split into.
pub const MAX_COLUMNS: u8 = 3;

/// Share of non-whitespace characters that must be CJK for text to count as CJK-dominant.
pub const CJK_DOMINANCE_RATIO: f64 = 0.3;

// ────────────────────────────────────────────────────────────────────────────
// Script and content classification
// ────────────────────────────────────────────────────────────────────────────

/// Dominant script family of an explanation. Drives the average glyph advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptProfile {
    /// Han, kana, Hangul. Glyphs are close to a full em wide.
    CjkDominant,
    /// Latin, Cyrillic, Greek and similar proportional scripts.
    LatinDominant,
}

impl ScriptProfile {
    /// Classifies `text` by the share of CJK characters among its non-whitespace chars.
    ///
    /// Empty or whitespace-only text is Latin-dominant.
    pub fn detect(text: &str) -> Self {
        let mut visible = 0usize;
        let mut cjk = 0usize;
        for c in text.chars().filter(|c| !c.is_whitespace()) {
            visible += 1;
            if is_cjk(c) {
                cjk += 1;
            }
        }
        if visible == 0 {
            return ScriptProfile::LatinDominant;
        }
        if cjk as f64 / visible as f64 >= CJK_DOMINANCE_RATIO {
            ScriptProfile::CjkDominant
        } else {
            ScriptProfile::LatinDominant
        }
    }
}

/// How the renderer will draw the explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    PlainText,
    /// Markdown rendered to HTML or LaTeX. Headers, code fences and list markers eat
    /// vertical space, so capacity is derated.
    RenderedMarkup,
}

/// Returns true for characters rendered with CJK-width glyphs.
fn is_cjk(c: char) -> bool {
    matches!(
        c as u32,
        0x3000..=0x303F     // CJK symbols and punctuation
        | 0x3040..=0x309F   // Hiragana
        | 0x30A0..=0x30FF   // Katakana
        | 0x3400..=0x4DBF   // CJK extension A
        | 0x4E00..=0x9FFF   // CJK unified ideographs
        | 0xAC00..=0xD7AF   // Hangul syllables
        | 0xF900..=0xFAFF   // CJK compatibility ideographs
        | 0xFF00..=0xFFEF   // Half-width and full-width forms
        | 0x20000..=0x2A6DF // CJK extension B
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Font style
// ────────────────────────────────────────────────────────────────────────────

/// Typographic parameters of the explanation text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontStyle {
    /// Nominal font size in points.
    pub font_size: f64,
    /// Line spacing multiplier (1.0 = single spaced).
    pub line_spacing: f64,
    pub script_profile: ScriptProfile,
    pub content_mode: ContentMode,
}

impl FontStyle {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.font_size > 0.0 && self.font_size.is_finite()) {
            return Err(AppError::config(format!(
                "font_size must be a finite value > 0, got {}",
                self.font_size
            )));
        }
        if !(self.line_spacing > 0.0 && self.line_spacing.is_finite()) {
            return Err(AppError::config(format!(
                "line_spacing must be a finite value > 0, got {}",
                self.line_spacing
            )));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layout region
// ────────────────────────────────────────────────────────────────────────────

/// Rectangle the explanation flows into, split into equal-width columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutRegion {
    pub width: f64,
    pub height: f64,
    pub column_count: u8,
    /// Inner padding on the left and on the right of every column.
    pub column_padding: f64,
}

impl LayoutRegion {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.width > 0.0 && self.width.is_finite()) {
            return Err(AppError::config(format!(
                "region width must be a finite value > 0, got {}",
                self.width
            )));
        }
        if !(self.height > 0.0 && self.height.is_finite()) {
            return Err(AppError::config(format!(
                "region height must be a finite value > 0, got {}",
                self.height
            )));
        }
        if self.column_count == 0 || self.column_count > MAX_COLUMNS {
            return Err(AppError::config(format!(
                "column_count must be between 1 and {MAX_COLUMNS}, got {}",
                self.column_count
            )));
        }
        if !(self.column_padding >= 0.0 && self.column_padding.is_finite()) {
            return Err(AppError::config(format!(
                "column_padding must be a finite value >= 0, got {}",
                self.column_padding
            )));
        }
        Ok(())
    }

    /// Usable text width of one column. Zero when padding eats the whole column.
    pub fn column_width(&self) -> f64 {
        let raw = self.width / self.column_count.max(1) as f64 - 2.0 * self.column_padding;
        raw.max(0.0)
    }

    /// Usable text height of one column.
    pub fn column_height(&self) -> f64 {
        self.height
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
