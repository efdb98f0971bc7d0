//! Worker pool — runs many `paginate` calls in parallel on the blocking thread pool.
//!
//! # Architecture
//! - `ConcurrencyLimiter` is an explicitly constructed counting semaphore. It is injected
//!   into the pool (and can be shared between pools through its `Arc`); there is no
//!   process-wide instance.
//! - `PaginationPool::paginate` acquires a slot, then runs the synchronous engine inside
//!   `tokio::task::spawn_blocking`. The slot is held until the blocking task finishes.
//! - `PaginationPool::paginate_all` spawns one task per job on a `JoinSet` and returns
//!   the outcomes in input order, whatever order they complete in.

use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::layout::{FontStyle, LayoutRegion, PaginationEngine, PaginationResult};

/// Every n-th blocked acquisition is logged.
const BLOCKED_LOG_INTERVAL: u64 = 10;

// ────────────────────────────────────────────────────────────────────────────
// Concurrency limiter
// ────────────────────────────────────────────────────────────────────────────

/// Snapshot of limiter usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimiterStats {
    pub max_concurrency: usize,
    pub current_requests: u64,
    pub peak_requests: u64,
    pub total_requests: u64,
    /// Acquisitions that found no free slot and had to wait.
    pub blocked_requests: u64,
    pub last_reset: DateTime<Utc>,
}

#[derive(Debug)]
struct Counters {
    current: u64,
    peak: u64,
    total: u64,
    blocked: u64,
    last_reset: DateTime<Utc>,
}

impl Counters {
    fn new() -> Self {
        Self {
            current: 0,
            peak: 0,
            total: 0,
            blocked: 0,
            last_reset: Utc::now(),
        }
    }
}

#[derive(Debug)]
pub struct ConcurrencyLimiter {
    max_concurrency: usize,
    semaphore: Semaphore,
    counters: Mutex<Counters>,
}

/// A held slot. Released when dropped.
#[derive(Debug)]
pub struct LimiterPermit<'a> {
    limiter: &'a ConcurrencyLimiter,
    _permit: SemaphorePermit<'a>,
}

impl Drop for LimiterPermit<'_> {
    fn drop(&mut self) {
        let mut counters = self.limiter.counters.lock();
        counters.current = counters.current.saturating_sub(1);
    }
}

impl ConcurrencyLimiter {
    pub fn new(max_concurrency: usize) -> Result<Self, AppError> {
        if max_concurrency == 0 {
            return Err(AppError::config("worker concurrency must be at least 1"));
        }
        Ok(Self {
            max_concurrency,
            semaphore: Semaphore::new(max_concurrency),
            counters: Mutex::new(Counters::new()),
        })
    }

    /// Waits for a free slot.
    ///
    /// Fails only after `close`, with an internal error.
    pub async fn acquire(&self) -> Result<LimiterPermit<'_>, AppError> {
        if self.semaphore.available_permits() == 0 {
            let mut counters = self.counters.lock();
            counters.blocked += 1;
            if counters.blocked % BLOCKED_LOG_INTERVAL == 0 {
                warn!(
                    max_concurrency = self.max_concurrency,
                    blocked = counters.blocked,
                    "Pagination concurrency limit reached"
                );
            }
        }

        let permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| AppError::Internal(anyhow!("concurrency limiter closed: {e}")))?;

        {
            let mut counters = self.counters.lock();
            counters.current += 1;
            counters.total += 1;
            counters.peak = counters.peak.max(counters.current);
        }

        Ok(LimiterPermit {
            limiter: self,
            _permit: permit,
        })
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn stats(&self) -> LimiterStats {
        let counters = self.counters.lock();
        LimiterStats {
            max_concurrency: self.max_concurrency,
            current_requests: counters.current,
            peak_requests: counters.peak,
            total_requests: counters.total,
            blocked_requests: counters.blocked,
            last_reset: counters.last_reset,
        }
    }

    /// Clears the cumulative counters. Slots currently held stay counted.
    pub fn reset_stats(&self) {
        let mut counters = self.counters.lock();
        let current = counters.current;
        *counters = Counters::new();
        counters.current = current;
        counters.peak = current;
    }

    /// Rejects all pending and future acquisitions.
    pub fn close(&self) {
        self.semaphore.close();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Jobs
// ────────────────────────────────────────────────────────────────────────────

/// One explanation to paginate, with the panel it flows into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationJob {
    pub id: Uuid,
    pub text: String,
    pub region: LayoutRegion,
    pub style: FontStyle,
}

impl PaginationJob {
    pub fn new(text: impl Into<String>, region: LayoutRegion, style: FontStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            region,
            style,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub job_id: Uuid,
    pub result: PaginationResult,
}

// ────────────────────────────────────────────────────────────────────────────
// Pool
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PaginationPool {
    engine: PaginationEngine,
    limiter: Arc<ConcurrencyLimiter>,
}

impl PaginationPool {
    pub fn new(engine: PaginationEngine, limiter: Arc<ConcurrencyLimiter>) -> Self {
        Self { engine, limiter }
    }

    pub fn engine(&self) -> &PaginationEngine {
        &self.engine
    }

    pub fn limiter(&self) -> &Arc<ConcurrencyLimiter> {
        &self.limiter
    }

    /// Paginates one job on the blocking pool, holding a limiter slot while it runs.
    pub async fn paginate(&self, job: PaginationJob) -> Result<JobOutcome, AppError> {
        let _permit = self.limiter.acquire().await?;

        let job_id = job.id;
        let engine = self.engine.clone();
        let result = tokio::task::spawn_blocking(move || {
            engine.paginate(&job.text, &job.region, &job.style)
        })
        .await
        .map_err(|e| {
            AppError::Internal(anyhow!("spawn_blocking failed for pagination job {job_id}: {e}"))
        })??;

        debug!(
            job_id = %job_id,
            pages = result.pages_used,
            truncated = result.truncated,
            "Pagination job finished"
        );

        Ok(JobOutcome { job_id, result })
    }

    /// Paginates every job concurrently. Outcomes come back in input order.
    ///
    /// The first failing job fails the batch; remaining tasks are aborted.
    pub async fn paginate_all(&self, jobs: Vec<PaginationJob>) -> Result<Vec<JobOutcome>, AppError> {
        let mut slots: Vec<Option<JobOutcome>> = (0..jobs.len()).map(|_| None).collect();

        let mut tasks = JoinSet::new();
        for (index, job) in jobs.into_iter().enumerate() {
            let pool = self.clone();
            tasks.spawn(async move { (index, pool.paginate(job).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined
                .map_err(|e| AppError::Internal(anyhow!("pagination task failed: {e}")))?;
            slots[index] = Some(outcome?);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    AppError::Internal(anyhow!("pagination job {index} produced no outcome"))
                })
            })
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
