//! fusion-batch: fixed-size worker pool for batch HDR fusion renders.
//!
//! This library runs a fixed, enumerable batch of independent external-
//! process jobs through N concurrent workers. Each job is an integer index
//! that resolves deterministically to four file paths; each worker claims
//! indices from a shared queue and invokes the external tone-mapping
//! program until the queue is exhausted.

pub mod cli;
pub mod dispatch;
pub mod scheduler;

// Re-export commonly used types
pub use dispatch::{Dispatch, DispatchError, DispatchOutput, ProcessDispatcher};
pub use scheduler::{
    BatchSummary, Job, JobOutcome, JobStatus, PathScheme, PoolError, TaskQueue, WorkerPool,
    WorkerPoolConfig,
};
