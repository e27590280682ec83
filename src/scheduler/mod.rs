//! Fixed-size worker pool over a shared in-memory task queue.
//!
//! This module is the core of the batch driver:
//!
//! - **TaskQueue**: mutex-guarded pool of pending job indices with atomic
//!   take-one semantics
//! - **WorkerPool**: N workers draining the queue concurrently, joined once
//!   every worker has observed exhaustion
//! - **Job**: an index plus its four deterministically derived file paths
//!
//! # Architecture
//!
//! ```text
//!                  ┌─────────────┐
//!                  │  TaskQueue  │  indices 1..=K, filled once
//!                  └──────┬──────┘
//!                         │ take_next() (mutually exclusive)
//!         ┌───────────────┼───────────────┐
//!         ▼               ▼               ▼
//!    ┌─────────┐     ┌─────────┐     ┌─────────┐
//!    │ Worker 1│     │ Worker 2│     │ Worker N│
//!    └────┬────┘     └────┬────┘     └────┬────┘
//!         │ dispatch(job) │               │
//!         ▼               ▼               ▼
//!      external        external        external
//!      program         program         program
//! ```
//!
//! Each worker blocks on its own external invocation without stalling the
//! others; the queue is the only shared mutable state.

pub mod job;
pub mod queue;
pub mod worker_pool;

pub use job::{Job, JobOutcome, JobStatus, PathScheme, SlotTemplate};
pub use queue::TaskQueue;
pub use worker_pool::{BatchSummary, PoolError, WorkerPool, WorkerPoolConfig};
