//! Worker pool draining the shared task queue.
//!
//! The pool spawns a fixed number of workers, each an independent async
//! task that claims indices from the shared [`TaskQueue`] and dispatches
//! them until the queue is exhausted. [`WorkerPool::run`] blocks until every
//! worker has exited and returns a summary of all attempted jobs.
//!
//! # Failure semantics
//!
//! A failing invocation never stops the worker or the pool. The pool's job
//! is to attempt every index exactly once; per-job outcomes are collected
//! and surfaced in the [`BatchSummary`] rather than aborting the batch.

use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::dispatch::Dispatch;

use super::job::{Job, JobOutcome, PathScheme};
use super::queue::TaskQueue;

/// Errors that can occur when running the worker pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool was configured with zero workers.
    #[error("worker pool requires at least one worker")]
    NoWorkers,
}

/// Configuration for the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Number of worker tasks to spawn.
    pub num_workers: usize,
    /// First job index, inclusive.
    pub start_index: u32,
    /// Last job index, inclusive.
    pub end_index: u32,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: 4,
            start_index: 1,
            end_index: 19,
        }
    }
}

impl WorkerPoolConfig {
    /// Creates a configuration with the specified number of workers.
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers,
            ..Default::default()
        }
    }

    /// Sets the inclusive job index range.
    pub fn with_range(mut self, start: u32, end: u32) -> Self {
        self.start_index = start;
        self.end_index = end;
        self
    }

    /// The configured job range.
    pub fn range(&self) -> RangeInclusive<u32> {
        self.start_index..=self.end_index
    }
}

/// Aggregate result of one batch run, produced when all workers have joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// When the pool started.
    pub started_at: DateTime<Utc>,
    /// Number of jobs in the initial queue.
    pub total_jobs: usize,
    /// Jobs whose invocation exited with status zero.
    pub succeeded: usize,
    /// Jobs that exited non-zero, were signal-killed, or failed to launch.
    pub failed: usize,
    /// Wall-clock duration of the whole batch in milliseconds.
    pub duration_ms: u64,
    /// Per-job outcomes, sorted by index.
    pub outcomes: Vec<JobOutcome>,
}

impl BatchSummary {
    /// Whether every attempted job succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Success rate as a percentage of attempted jobs.
    pub fn success_rate(&self) -> f64 {
        if self.total_jobs == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / self.total_jobs as f64) * 100.0
    }

    /// Average invocation duration across all attempted jobs.
    pub fn average_job_duration_ms(&self) -> u64 {
        if self.outcomes.is_empty() {
            return 0;
        }
        let total: u64 = self.outcomes.iter().map(|o| o.duration_ms).sum();
        total / self.outcomes.len() as u64
    }
}

/// Pool of workers bound to one shared queue for a single batch run.
///
/// The pool is not reusable: [`WorkerPool::run`] consumes it and returns
/// only once every worker has observed queue exhaustion.
pub struct WorkerPool {
    config: WorkerPoolConfig,
    scheme: PathScheme,
    dispatcher: Arc<dyn Dispatch>,
}

impl WorkerPool {
    /// Creates a pool from a configuration, path scheme and dispatcher.
    pub fn new(config: WorkerPoolConfig, scheme: PathScheme, dispatcher: Arc<dyn Dispatch>) -> Self {
        Self {
            config,
            scheme,
            dispatcher,
        }
    }

    /// Runs the batch to completion.
    ///
    /// Populates the queue with the full index range, spawns all workers,
    /// and waits for every one of them to exit. When this returns, each
    /// index in the range has been dispatched exactly once, success or not.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NoWorkers`] if the pool was configured with
    /// zero workers.
    pub async fn run(self) -> Result<BatchSummary, PoolError> {
        if self.config.num_workers == 0 {
            return Err(PoolError::NoWorkers);
        }

        let queue = Arc::new(TaskQueue::new(self.config.range()));
        let total_jobs = queue.len();
        let outcomes = Arc::new(Mutex::new(Vec::with_capacity(total_jobs)));
        let started_at = Utc::now();
        let started = Instant::now();

        info!(
            num_workers = self.config.num_workers,
            total_jobs, "worker pool started"
        );

        let mut handles = Vec::with_capacity(self.config.num_workers);
        for i in 0..self.config.num_workers {
            let worker = Worker {
                id: format!("worker-{}", i),
                queue: Arc::clone(&queue),
                scheme: self.scheme.clone(),
                dispatcher: Arc::clone(&self.dispatcher),
                outcomes: Arc::clone(&outcomes),
            };
            handles.push(tokio::spawn(worker.run()));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "worker task panicked");
            }
        }

        let mut outcomes = outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect::<Vec<_>>();
        outcomes.sort_unstable_by_key(|o| o.index);

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let summary = BatchSummary {
            started_at,
            total_jobs,
            succeeded,
            failed: outcomes.len() - succeeded,
            duration_ms: started.elapsed().as_millis() as u64,
            outcomes,
        };

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            duration_ms = summary.duration_ms,
            "worker pool finished"
        );

        Ok(summary)
    }
}

/// A single worker loop.
///
/// Owns no data beyond its loop-local state; it only transiently holds a
/// claimed index for the duration of one invocation.
struct Worker {
    id: String,
    queue: Arc<TaskQueue>,
    scheme: PathScheme,
    dispatcher: Arc<dyn Dispatch>,
    outcomes: Arc<Mutex<Vec<JobOutcome>>>,
}

impl Worker {
    /// Claims and dispatches jobs until the queue is exhausted.
    async fn run(self) {
        debug!(worker_id = %self.id, "worker started");

        loop {
            let Some(index) = self.queue.take_next() else {
                debug!(worker_id = %self.id, "queue exhausted, worker stopping");
                break;
            };

            let job = Job::new(index, &self.scheme);
            info!(
                worker_id = %self.id,
                job = index,
                remaining = self.queue.len(),
                "processing job"
            );

            let start = Instant::now();
            let result = self.dispatcher.dispatch(&job).await;
            let duration = start.elapsed();

            let outcome = match result {
                Ok(output) if output.is_success() => {
                    debug!(
                        worker_id = %self.id,
                        job = index,
                        duration_ms = duration.as_millis() as u64,
                        "job completed"
                    );
                    JobOutcome::completed(index, duration)
                }
                Ok(output) => {
                    warn!(
                        worker_id = %self.id,
                        job = index,
                        exit_code = ?output.exit_code,
                        "job exited with failure"
                    );
                    JobOutcome::failed(index, output.exit_code, duration)
                }
                Err(e) => {
                    warn!(worker_id = %self.id, job = index, error = %e, "job failed to launch");
                    JobOutcome::launch_failed(index, e.to_string(), duration)
                }
            };

            self.outcomes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(outcome);
        }
    }
}
