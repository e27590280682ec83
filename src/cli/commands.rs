//! CLI command definitions for fusion-batch.
//!
//! A single `run` command drives one batch: populate the queue, spawn the
//! pool, print the summary once all workers have joined.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use crate::dispatch::ProcessDispatcher;
use crate::scheduler::{BatchSummary, PathScheme, WorkerPool, WorkerPoolConfig};

/// Default external program, matching the original batch layout where the
/// tone mapper sits next to the image directories.
const DEFAULT_PROGRAM: &str = "./main";

/// Batch driver for HDR fusion renders.
#[derive(Parser)]
#[command(name = "fusion-batch")]
#[command(about = "Drive a batch of HDR fusion renders through a fixed worker pool")]
#[command(version)]
#[command(
    long_about = "fusion-batch runs an external tone-mapping program once per job index,\n\
                  with a fixed number of concurrent workers draining a shared queue.\n\n\
                  Each job index i resolves to four file paths passed positionally:\n\
                  ori/render_result_nm_ori_<i>.exr map/map_<i>.png simple/simple_<i>.png fusion/fusion_<i>.png\n\n\
                  Example usage:\n  fusion-batch run --workers 4 --start 1 --end 19 --program ./main"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the batch: drain the job range through the worker pool.
    Run(RunArgs),
}

/// Arguments for `fusion-batch run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Number of concurrent workers.
    #[arg(short, long, default_value = "4")]
    pub workers: usize,

    /// First job index (inclusive).
    #[arg(long, default_value = "1")]
    pub start: u32,

    /// Last job index (inclusive).
    #[arg(long, default_value = "19")]
    pub end: u32,

    /// External program invoked once per job with four positional paths.
    #[arg(short, long, default_value = DEFAULT_PROGRAM)]
    pub program: PathBuf,

    /// Root directory holding the ori/, map/, simple/ and fusion/ subdirectories.
    /// Defaults to the working directory.
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Print the batch summary as JSON instead of plain text.
    #[arg(short, long)]
    pub json: bool,
}

/// Parses CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses arguments and runs the selected command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Runs the selected command with pre-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_batch(args).await,
    }
}

async fn run_batch(args: RunArgs) -> anyhow::Result<()> {
    let mut scheme = PathScheme::default();
    if let Some(root) = args.root {
        scheme = scheme.with_root(root);
    }

    info!(
        workers = args.workers,
        start = args.start,
        end = args.end,
        program = %args.program.display(),
        "starting batch"
    );

    let config = WorkerPoolConfig::new(args.workers).with_range(args.start, args.end);
    let dispatcher = Arc::new(ProcessDispatcher::new(args.program));
    let pool = WorkerPool::new(config, scheme, dispatcher);

    let summary = pool.run().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    // Individual job failures are reported above but do not fail the batch:
    // the contract is that every index was attempted once.
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!(
        "{} jobs attempted: {} succeeded, {} failed in {:.1}s",
        summary.total_jobs,
        summary.succeeded,
        summary.failed,
        summary.duration_ms as f64 / 1000.0
    );

    for outcome in summary.outcomes.iter().filter(|o| !o.is_success()) {
        match &outcome.error {
            Some(error) => println!("  job {} {}: {}", outcome.index, outcome.status, error),
            None => println!(
                "  job {} {}: exit code {:?}",
                outcome.index, outcome.status, outcome.exit_code
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults_match_original_batch() {
        let cli = Cli::try_parse_from(["fusion-batch", "run"]).expect("parse should work");
        let Commands::Run(args) = cli.command;

        assert_eq!(args.workers, 4);
        assert_eq!(args.start, 1);
        assert_eq!(args.end, 19);
        assert_eq!(args.program, PathBuf::from("./main"));
        assert!(args.root.is_none());
        assert!(!args.json);
    }

    #[test]
    fn test_run_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "fusion-batch",
            "run",
            "--workers",
            "8",
            "--start",
            "5",
            "--end",
            "12",
            "--program",
            "./tonemap",
            "--root",
            "/data/renders",
            "--json",
        ])
        .expect("parse should work");
        let Commands::Run(args) = cli.command;

        assert_eq!(args.workers, 8);
        assert_eq!(args.start, 5);
        assert_eq!(args.end, 12);
        assert_eq!(args.program, PathBuf::from("./tonemap"));
        assert_eq!(args.root, Some(PathBuf::from("/data/renders")));
        assert!(args.json);
    }
}
