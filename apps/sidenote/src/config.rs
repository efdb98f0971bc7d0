use anyhow::{Context, Result};
use std::str::FromStr;

use crate::document::DEFAULT_BLANK_MIN_CHARS;
use crate::layout::tuning::{
    LayoutTuning, DEFAULT_CJK_WIDTH_FACTOR, DEFAULT_FIRST_COLUMN_RATIO, DEFAULT_LATIN_WIDTH_FACTOR,
    DEFAULT_MARKUP_OVERHEAD, DEFAULT_MAX_DEPTH, DEFAULT_OVERFLOW_THRESHOLD, DEFAULT_SAFETY_FACTOR,
};

pub const DEFAULT_WORKER_CONCURRENCY: usize = 16;

/// Application configuration loaded from environment variables.
/// Every variable is optional; unparsable or out-of-range values fail at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub tuning: LayoutTuning,
    pub worker_concurrency: usize,
    pub blank_min_chars: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let tuning = LayoutTuning {
            safety_factor: parse_or(&lookup, "SIDENOTE_SAFETY_FACTOR", DEFAULT_SAFETY_FACTOR)?,
            overflow_threshold: parse_or(
                &lookup,
                "SIDENOTE_OVERFLOW_THRESHOLD",
                DEFAULT_OVERFLOW_THRESHOLD,
            )?,
            first_column_ratio: parse_or(
                &lookup,
                "SIDENOTE_FIRST_COLUMN_RATIO",
                DEFAULT_FIRST_COLUMN_RATIO,
            )?,
            markup_overhead: parse_or(&lookup, "SIDENOTE_MARKUP_OVERHEAD", DEFAULT_MARKUP_OVERHEAD)?,
            cjk_width_factor: parse_or(
                &lookup,
                "SIDENOTE_CJK_WIDTH_FACTOR",
                DEFAULT_CJK_WIDTH_FACTOR,
            )?,
            latin_width_factor: parse_or(
                &lookup,
                "SIDENOTE_LATIN_WIDTH_FACTOR",
                DEFAULT_LATIN_WIDTH_FACTOR,
            )?,
            max_depth: parse_or(&lookup, "SIDENOTE_MAX_DEPTH", DEFAULT_MAX_DEPTH)?,
        };
        tuning
            .validate()
            .context("Layout tuning from environment is invalid")?;

        let worker_concurrency = parse_or(
            &lookup,
            "SIDENOTE_WORKER_CONCURRENCY",
            DEFAULT_WORKER_CONCURRENCY,
        )?;
        if worker_concurrency == 0 {
            anyhow::bail!("SIDENOTE_WORKER_CONCURRENCY must be at least 1");
        }

        Ok(Config {
            tuning,
            worker_concurrency,
            blank_min_chars: parse_or(&lookup, "SIDENOTE_BLANK_MIN_CHARS", DEFAULT_BLANK_MIN_CHARS)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
    }
}
