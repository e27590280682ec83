//! Job definitions and file-path derivation.
//!
//! A job is nothing more than an integer index; the four file paths the
//! external program needs are pure functions of that index and a
//! [`PathScheme`]. Jobs carry no other state and are consumed, never
//! mutated.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Naming template for one of the four path slots.
///
/// Expands to `<dir>/<prefix>_<index>.<ext>` under the scheme root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotTemplate {
    /// Directory holding this slot's files.
    pub dir: String,
    /// File-name prefix before the index.
    pub prefix: String,
    /// File extension, without the dot.
    pub ext: String,
}

impl SlotTemplate {
    /// Creates a template from its three parts.
    pub fn new(dir: impl Into<String>, prefix: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            ext: ext.into(),
        }
    }

    fn path_for(&self, root: &Path, index: u32) -> PathBuf {
        root.join(&self.dir)
            .join(format!("{}_{}.{}", self.prefix, index, self.ext))
    }
}

/// Deterministic mapping from a job index to the four file paths passed to
/// the external program.
///
/// The defaults reproduce the fixed layout of the original batch: four
/// sibling directories (`ori/`, `map/`, `simple/`, `fusion/`), one file per
/// index in each. The scheme only builds paths; it never checks that the
/// directories or inputs exist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathScheme {
    /// Directory prefixed to all four slots. Empty by default, which
    /// resolves paths relative to the working directory.
    pub root: PathBuf,
    /// HDR input image (first positional argument).
    pub hdr: SlotTemplate,
    /// Secondary input image (second positional argument).
    pub map: SlotTemplate,
    /// First output image (third positional argument).
    pub simple: SlotTemplate,
    /// Second output image (fourth positional argument).
    pub fusion: SlotTemplate,
}

impl Default for PathScheme {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            hdr: SlotTemplate::new("ori", "render_result_nm_ori", "exr"),
            map: SlotTemplate::new("map", "map", "png"),
            simple: SlotTemplate::new("simple", "simple", "png"),
            fusion: SlotTemplate::new("fusion", "fusion", "png"),
        }
    }
}

impl PathScheme {
    /// Sets the root directory prefixed to all four slots.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}

/// One unit of work: an index and its four derived paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Job index within the batch range.
    pub index: u32,
    /// HDR input image path.
    pub hdr_input: PathBuf,
    /// Secondary input image path.
    pub map_input: PathBuf,
    /// First output image path.
    pub simple_output: PathBuf,
    /// Second output image path.
    pub fusion_output: PathBuf,
}

impl Job {
    /// Derives the job for `index` under the given scheme.
    ///
    /// Derivation is deterministic: the same index and scheme always yield
    /// the same four paths.
    pub fn new(index: u32, scheme: &PathScheme) -> Self {
        Self {
            index,
            hdr_input: scheme.hdr.path_for(&scheme.root, index),
            map_input: scheme.map.path_for(&scheme.root, index),
            simple_output: scheme.simple.path_for(&scheme.root, index),
            fusion_output: scheme.fusion.path_for(&scheme.root, index),
        }
    }

    /// The four paths in the positional order the external program expects.
    pub fn args(&self) -> [&Path; 4] {
        [
            &self.hdr_input,
            &self.map_input,
            &self.simple_output,
            &self.fusion_output,
        ]
    }
}

/// Final status of one attempted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// External program exited with status zero.
    Completed,
    /// External program exited non-zero or was killed by a signal.
    Failed,
    /// External program could not be spawned at all.
    LaunchFailed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::LaunchFailed => write!(f, "launch_failed"),
        }
    }
}

/// Record of one dispatch attempt.
///
/// Every claimed index produces exactly one outcome, success or not; the
/// pool aggregates these into the batch summary at join time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome {
    /// Index of the attempted job.
    pub index: u32,
    /// How the attempt ended.
    pub status: JobStatus,
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
    /// Error text for launch failures.
    pub error: Option<String>,
    /// Wall-clock duration of the invocation in milliseconds.
    pub duration_ms: u64,
}

impl JobOutcome {
    /// Records a successful invocation.
    pub fn completed(index: u32, duration: Duration) -> Self {
        Self {
            index,
            status: JobStatus::Completed,
            exit_code: Some(0),
            error: None,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Records a non-zero or signal-terminated exit.
    pub fn failed(index: u32, exit_code: Option<i32>, duration: Duration) -> Self {
        Self {
            index,
            status: JobStatus::Failed,
            exit_code,
            error: None,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Records a spawn failure.
    pub fn launch_failed(index: u32, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            index,
            status: JobStatus::LaunchFailed,
            exit_code: None,
            error: Some(error.into()),
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Whether the job completed successfully.
    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Completed
    }
}
