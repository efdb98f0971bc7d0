//! Layout template cache — memoized per-style constants shared across `paginate` calls.
//!
//! Keyed by font style and column count (plus the resolved tuning factors, so two engines
//! with different tuning can share one cache without reading each other's entries).
//! Each key owns a `OnceLock`: the first caller computes the template, concurrent
//! callers for the same key block on that single initialization, and every later read
//! is lock-free on the cell. The outer map is behind a `parking_lot::RwLock` that is
//! write-locked only to insert a new empty cell.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serde::Serialize;

use crate::layout::font_metrics::{ContentMode, FontStyle, ScriptProfile};
use crate::layout::tuning::LayoutTuning;

/// Bumped whenever the meaning of `LayoutTemplate` fields changes.
pub const TEMPLATE_VERSION: u32 = 1;

/// Derived per-style constants reused by every capacity estimate with the same key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutTemplate {
    pub column_count: u8,
    /// Average horizontal advance of one character, in points.
    pub glyph_advance: f64,
    /// Vertical advance of one line including markup overhead, in points.
    pub line_height: f64,
}

impl LayoutTemplate {
    pub fn compute(style: &FontStyle, column_count: u8, tuning: &LayoutTuning) -> Self {
        Self {
            column_count,
            glyph_advance: style.font_size * tuning.char_width_factor(style.script_profile),
            line_height: style.font_size
                * style.line_spacing
                * tuning.vertical_overhead(style.content_mode),
        }
    }
}

/// Cache key. Floats are stored by bit pattern so the key is `Eq + Hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    version: u32,
    font_size_bits: u64,
    line_spacing_bits: u64,
    script_profile: ScriptProfile,
    content_mode: ContentMode,
    column_count: u8,
    width_factor_bits: u64,
    overhead_bits: u64,
}

impl TemplateKey {
    pub fn new(style: &FontStyle, column_count: u8, tuning: &LayoutTuning) -> Self {
        Self {
            version: TEMPLATE_VERSION,
            font_size_bits: style.font_size.to_bits(),
            line_spacing_bits: style.line_spacing.to_bits(),
            script_profile: style.script_profile,
            content_mode: style.content_mode,
            column_count,
            width_factor_bits: tuning.char_width_factor(style.script_profile).to_bits(),
            overhead_bits: tuning.vertical_overhead(style.content_mode).to_bits(),
        }
    }
}

/// Hit/miss counters, for logging only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub struct LayoutTemplateCache {
    entries: RwLock<HashMap<TemplateKey, Arc<OnceLock<LayoutTemplate>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LayoutTemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the template for `(style, column_count)`, computing it at most once.
    pub fn get_or_compute(
        &self,
        style: &FontStyle,
        column_count: u8,
        tuning: &LayoutTuning,
    ) -> LayoutTemplate {
        let key = TemplateKey::new(style, column_count, tuning);

        let existing = self.entries.read().get(&key).cloned();
        if let Some(template) = existing.as_ref().and_then(|cell| cell.get()) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return *template;
        }

        let cell = match existing {
            Some(cell) => cell,
            None => self
                .entries
                .write()
                .entry(key)
                .or_insert_with(|| Arc::new(OnceLock::new()))
                .clone(),
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        *cell.get_or_init(|| LayoutTemplate::compute(style, column_count, tuning))
    }

    /// Number of keys with a cell (initialized or being initialized).
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_style(font_size: f64) -> FontStyle {
        FontStyle {
            font_size,
            line_spacing: 1.2,
            script_profile: ScriptProfile::CjkDominant,
            content_mode: ContentMode::RenderedMarkup,
        }
    }

    #[test]
    fn test_compute_template_values() {
        let tuning = LayoutTuning::default();
        let template = LayoutTemplate::compute(&make_style(10.0), 2, &tuning);
        assert_eq!(template.column_count, 2);
        // 10 * 0.55
        assert!((template.glyph_advance - 5.5).abs() < 1e-4);
        // 10 * 1.2 * 1.15
        assert!((template.line_height - 13.8).abs() < 1e-4);
    }

    #[test]
    fn test_second_lookup_is_a_hit() {
        let cache = LayoutTemplateCache::new();
        let tuning = LayoutTuning::default();
        let style = make_style(10.0);

        let first = cache.get_or_compute(&style, 2, &tuning);
        let second = cache.get_or_compute(&style, 2, &tuning);

        assert_eq!(first, second);
        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_distinct_keys_get_distinct_entries() {
        let cache = LayoutTemplateCache::new();
        let tuning = LayoutTuning::default();

        cache.get_or_compute(&make_style(10.0), 1, &tuning);
        cache.get_or_compute(&make_style(10.0), 2, &tuning);
        cache.get_or_compute(&make_style(12.0), 2, &tuning);

        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_different_tuning_does_not_share_entry() {
        let cache = LayoutTemplateCache::new();
        let style = make_style(10.0);
        let default_tuning = LayoutTuning::default();
        let wide_tuning = LayoutTuning {
            cjk_width_factor: 0.65,
            ..LayoutTuning::default()
        };

        let a = cache.get_or_compute(&style, 1, &default_tuning);
        let b = cache.get_or_compute(&style, 1, &wide_tuning);

        assert!(b.glyph_advance > a.glyph_advance);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_initialization_is_consistent() {
        let cache = Arc::new(LayoutTemplateCache::new());
        let tuning = LayoutTuning::default();
        let style = make_style(11.0);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get_or_compute(&style, 3, &tuning))
            })
            .collect();

        let results: Vec<LayoutTemplate> = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect();

        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(cache.len(), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 8);
    }

    #[test]
    fn test_new_cache_is_empty() {
        let cache = LayoutTemplateCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
