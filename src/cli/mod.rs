//! Command-line interface for fusion-batch.
//!
//! Provides the `run` command that drives one batch through the worker pool.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands, RunArgs};
