//! External program invocation.
//!
//! The pool never looks inside the tone-mapping program; all it honors is
//! the CLI contract: four positional file paths, then wait for exit. The
//! [`Dispatch`] trait is the seam that lets tests substitute a recording
//! fake for the real process spawn.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::scheduler::Job;

/// Errors from attempting to start the external program.
///
/// A non-zero exit is not an error at this layer; it comes back as a
/// [`DispatchOutput`] the worker records.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The process could not be spawned.
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// Program that failed to start.
        program: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

/// Exit information from one invocation.
///
/// Only what the process reported on exit; stdout and stderr are inherited,
/// never captured or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutput {
    /// Exit code, or `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl DispatchOutput {
    /// Whether the process exited with status zero.
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// One synchronous invocation of the external program for a claimed job.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Invokes the program with the job's four paths and waits for exit.
    async fn dispatch(&self, job: &Job) -> Result<DispatchOutput, DispatchError>;
}

/// Dispatcher that spawns the configured program as a child process.
pub struct ProcessDispatcher {
    program: PathBuf,
}

impl ProcessDispatcher {
    /// Creates a dispatcher for the given program path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Path of the program this dispatcher invokes.
    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

#[async_trait]
impl Dispatch for ProcessDispatcher {
    async fn dispatch(&self, job: &Job) -> Result<DispatchOutput, DispatchError> {
        debug!(
            program = %self.program.display(),
            job = job.index,
            hdr = %job.hdr_input.display(),
            "spawning external program"
        );

        let status = Command::new(&self.program)
            .args(job.args())
            .status()
            .await
            .map_err(|source| DispatchError::Launch {
                program: self.program.clone(),
                source,
            })?;

        Ok(DispatchOutput {
            exit_code: status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::scheduler::PathScheme;

    #[test]
    fn test_dispatch_output_success() {
        assert!(DispatchOutput { exit_code: Some(0) }.is_success());
        assert!(!DispatchOutput { exit_code: Some(1) }.is_success());
        assert!(!DispatchOutput { exit_code: None }.is_success());
    }

    #[test]
    fn test_launch_error_display() {
        let err = DispatchError::Launch {
            program: PathBuf::from("./main"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("./main"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_dispatcher_reports_exit_codes() {
        let job = Job::new(1, &PathScheme::default());

        let ok = ProcessDispatcher::new("/bin/true")
            .dispatch(&job)
            .await
            .expect("true should launch");
        assert!(ok.is_success());

        let failed = ProcessDispatcher::new("/bin/false")
            .dispatch(&job)
            .await
            .expect("false should launch");
        assert_eq!(failed.exit_code, Some(1));
        assert!(!failed.is_success());
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let job = Job::new(1, &PathScheme::default());
        let result = ProcessDispatcher::new("./definitely-not-a-real-program")
            .dispatch(&job)
            .await;

        assert!(matches!(result, Err(DispatchError::Launch { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_paths_are_passed_positionally() {
        let root = TempDir::new().expect("tempdir");
        for dir in ["ori", "map", "simple", "fusion"] {
            fs::create_dir(root.path().join(dir)).expect("create slot dir");
        }

        // `touch` creates one file per argument, so the four derived paths
        // show up on disk exactly where the scheme says they should.
        let scheme = PathScheme::default().with_root(root.path());
        let job = Job::new(7, &scheme);
        let output = ProcessDispatcher::new("touch")
            .dispatch(&job)
            .await
            .expect("touch should launch");

        assert!(output.is_success());
        assert!(root.path().join("ori/render_result_nm_ori_7.exr").exists());
        assert!(root.path().join("map/map_7.png").exists());
        assert!(root.path().join("simple/simple_7.png").exists());
        assert!(root.path().join("fusion/fusion_7.png").exists());
    }
}
