use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppError;
use crate::layout::PaginationEngine;
use crate::pool::{ConcurrencyLimiter, PaginationPool};

/// Shared application state built once at startup.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
    /// Engine plus the injected limiter. Cloning shares the template cache and the slots.
    pub pool: PaginationPool,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let engine = PaginationEngine::new(config.tuning)?;
        let limiter = Arc::new(ConcurrencyLimiter::new(config.worker_concurrency)?);
        Ok(Self {
            pool: PaginationPool::new(engine, limiter),
            config,
        })
    }
}
