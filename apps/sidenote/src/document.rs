//! Document planning — paginates the explanations of every source page of a document.
//!
//! Each source page of size `(w, h)` gets a side panel on its right. The panel region is
//! derived from `PanelSettings`:
//!
//! ```text
//! width  = w × right_ratio − 2 × margin
//! height = h − 2 × margin
//! ```
//!
//! Pages whose explanation is missing or blank are not paginated; they are reported in
//! `DocumentPlan::blank_pages` so the caller can regenerate them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::layout::font_metrics::MAX_COLUMNS;
use crate::layout::{ContentMode, FontStyle, LayoutRegion, PaginationResult, ScriptProfile};
use crate::pool::{PaginationJob, PaginationPool};

/// Explanations with fewer trimmed chars than this are treated as missing.
pub const DEFAULT_BLANK_MIN_CHARS: usize = 10;

// ────────────────────────────────────────────────────────────────────────────
// Blank explanations
// ────────────────────────────────────────────────────────────────────────────

/// True when the explanation is missing or has fewer than `min_chars` chars once trimmed.
pub fn is_blank_explanation(text: Option<&str>, min_chars: usize) -> bool {
    match text {
        None => true,
        Some(t) => t.trim().chars().count() < min_chars,
    }
}

/// Sorted indices in `0..total_pages` whose explanation is missing or blank.
pub fn pages_with_blank_explanations<S: AsRef<str>>(
    explanations: &HashMap<usize, S>,
    total_pages: usize,
    min_chars: usize,
) -> Vec<usize> {
    (0..total_pages)
        .filter(|index| {
            is_blank_explanation(explanations.get(index).map(|s| s.as_ref()), min_chars)
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Panel settings
// ────────────────────────────────────────────────────────────────────────────

/// User-facing settings for the explanation panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    pub font_size: f64,
    pub line_spacing: f64,
    pub column_count: u8,
    pub column_padding: f64,
    /// Share of the page width given to the panel, in (0, 1).
    pub right_ratio: f64,
    /// Margin on every side of the panel, in points.
    pub margin: f64,
    pub content_mode: ContentMode,
    /// Fixed script profile. Detected from each page's text when `None`.
    pub script: Option<ScriptProfile>,
    pub blank_min_chars: usize,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            font_size: 20.0,
            line_spacing: 1.2,
            column_count: 3,
            column_padding: 10.0,
            right_ratio: 0.48,
            margin: 18.0,
            content_mode: ContentMode::RenderedMarkup,
            script: None,
            blank_min_chars: DEFAULT_BLANK_MIN_CHARS,
        }
    }
}

/// Size of a source page in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PanelSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.right_ratio > 0.0 && self.right_ratio < 1.0) {
            return Err(AppError::config(format!(
                "right_ratio must be in (0, 1), got {}",
                self.right_ratio
            )));
        }
        if !(self.margin >= 0.0 && self.margin.is_finite()) {
            return Err(AppError::config(format!(
                "margin must be a finite value >= 0, got {}",
                self.margin
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
        self.style_for("").validate()
    }

    /// Panel region on a page of the given size. Not validated; the engine does that.
    pub fn region_for(&self, page: PageSize) -> LayoutRegion {
        LayoutRegion {
            width: page.width * self.right_ratio - 2.0 * self.margin,
            height: page.height - 2.0 * self.margin,
            column_count: self.column_count,
            column_padding: self.column_padding,
        }
    }

    pub fn style_for(&self, text: &str) -> FontStyle {
        FontStyle {
            font_size: self.font_size,
            line_spacing: self.line_spacing,
            script_profile: self.script.unwrap_or_else(|| ScriptProfile::detect(text)),
            content_mode: self.content_mode,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Document plan
// ────────────────────────────────────────────────────────────────────────────

/// One source page with its explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcePage {
    pub size: PageSize,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PagePlan {
    pub source_index: usize,
    /// `None` for blank pages, which are not paginated.
    pub job_id: Option<Uuid>,
    pub result: PaginationResult,
}

impl PagePlan {
    fn blank(source_index: usize) -> Self {
        Self {
            source_index,
            job_id: None,
            result: PaginationResult::empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentPlan {
    /// One entry per source page, in source order.
    pub pages: Vec<PagePlan>,
    pub blank_pages: Vec<usize>,
    pub truncated_pages: Vec<usize>,
    /// Physical pages in the output: every source page contributes `max(1, pages_used)`.
    pub output_page_count: usize,
}

/// Paginates every non-blank page concurrently through `pool`.
pub async fn plan_document(
    pool: &PaginationPool,
    settings: &PanelSettings,
    pages: &[SourcePage],
) -> Result<DocumentPlan, AppError> {
    settings.validate()?;

    let explanations: HashMap<usize, &str> = pages
        .iter()
        .enumerate()
        .filter_map(|(index, page)| page.explanation.as_deref().map(|text| (index, text)))
        .collect();
    let blank_pages =
        pages_with_blank_explanations(&explanations, pages.len(), settings.blank_min_chars);

    let mut jobs = Vec::new();
    let mut job_pages = Vec::new();
    for (index, page) in pages.iter().enumerate() {
        if blank_pages.binary_search(&index).is_ok() {
            continue;
        }
        if let Some(text) = explanations.get(&index) {
            jobs.push(PaginationJob::new(
                *text,
                settings.region_for(page.size),
                settings.style_for(text),
            ));
            job_pages.push(index);
        }
    }

    info!(
        source_pages = pages.len(),
        jobs = jobs.len(),
        blank = blank_pages.len(),
        "Planning document"
    );

    let outcomes = pool.paginate_all(jobs).await?;

    let mut plans: Vec<PagePlan> = (0..pages.len()).map(PagePlan::blank).collect();
    for (index, outcome) in job_pages.into_iter().zip(outcomes) {
        plans[index] = PagePlan {
            source_index: index,
            job_id: Some(outcome.job_id),
            result: outcome.result,
        };
    }

    let truncated_pages: Vec<usize> = plans
        .iter()
        .filter(|p| p.result.truncated)
        .map(|p| p.source_index)
        .collect();
    if !truncated_pages.is_empty() {
        warn!(
            pages = ?truncated_pages,
            "Some explanations exceeded the continuation depth and were truncated"
        );
    }

    let output_page_count = plans.iter().map(|p| p.result.pages_used.max(1)).sum();

    Ok(DocumentPlan {
        pages: plans,
        blank_pages,
        truncated_pages,
        output_page_count,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
