//! Pagination Engine — the public facade over capacity estimation and continuation planning.
//!
//! `paginate` is synchronous and pure apart from the shared template cache, so callers
//! that need parallelism run it on the blocking pool (see `crate::pool`).

use std::sync::Arc;

use crate::errors::AppError;
use crate::layout::capacity::{estimate_cached, CapacityEstimate};
use crate::layout::continuation::{plan_pages, PaginationResult};
use crate::layout::font_metrics::{FontStyle, LayoutRegion};
use crate::layout::template_cache::LayoutTemplateCache;
use crate::layout::tuning::LayoutTuning;

/// Paginates explanations into multi-column side panels.
///
/// Cheap to clone: clones share the template cache.
#[derive(Debug, Clone)]
pub struct PaginationEngine {
    tuning: LayoutTuning,
    cache: Arc<LayoutTemplateCache>,
}

impl Default for PaginationEngine {
    fn default() -> Self {
        Self {
            tuning: LayoutTuning::default(),
            cache: Arc::new(LayoutTemplateCache::new()),
        }
    }
}

impl PaginationEngine {
    pub fn new(tuning: LayoutTuning) -> Result<Self, AppError> {
        Self::with_cache(tuning, Arc::new(LayoutTemplateCache::new()))
    }

    /// Builds an engine that shares an existing template cache.
    pub fn with_cache(
        tuning: LayoutTuning,
        cache: Arc<LayoutTemplateCache>,
    ) -> Result<Self, AppError> {
        tuning.validate()?;
        Ok(Self { tuning, cache })
    }

    pub fn tuning(&self) -> &LayoutTuning {
        &self.tuning
    }

    pub fn cache(&self) -> &Arc<LayoutTemplateCache> {
        &self.cache
    }

    /// Capacity of one column of `region` for text in `style`.
    pub fn estimate(
        &self,
        region: &LayoutRegion,
        style: &FontStyle,
    ) -> Result<CapacityEstimate, AppError> {
        estimate_cached(region, style, &self.tuning, &self.cache)
    }

    /// Splits `text` into pages of `region.column_count` columns.
    ///
    /// Configuration is validated even for empty text. Empty or whitespace-only text
    /// yields a result with no pages. For valid configuration this never fails.
    pub fn paginate(
        &self,
        text: &str,
        region: &LayoutRegion,
        style: &FontStyle,
    ) -> Result<PaginationResult, AppError> {
        let capacity = self.estimate(region, style)?;
        if text.trim().is_empty() {
            return Ok(PaginationResult::empty());
        }

        let capacities = vec![capacity; region.column_count as usize];
        Ok(plan_pages(text, &capacities, &self.tuning))
    }
}

/// One-shot pagination with default tuning and a private cache.
pub fn paginate(
    text: &str,
    region: &LayoutRegion,
    style: &FontStyle,
) -> Result<PaginationResult, AppError> {
    PaginationEngine::default().paginate(text, region, style)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
