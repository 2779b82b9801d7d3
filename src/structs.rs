//! Consolidated public types for roi-corr
//!
//! Plain data types shared across the crate. Behavior lives next to the
//! code that uses it (`tools`, `stats`, `pipeline`).

use ndarray::Array1;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub use crate::error::{CorrError, Result};

// ============================================================================
// Process Types
// ============================================================================

/// An external program invocation: program name followed by its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
}

/// What the pipeline does when an external tool exits non-zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the run with `CorrError::ToolFailed`
    #[default]
    Halt,
    /// Log a warning and keep going with whatever the tool left behind
    Continue,
}

/// Options for a single tool invocation
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Record the command without running it
    pub dry_run: bool,
    /// Trace commands and captured output at debug level
    pub debug: bool,
    /// Pass `--verbose` to tools that support it
    pub verbose: bool,
    /// Run through `sh -c`; output is not captured in this mode
    pub shell: bool,
    /// Write captured stdout here and stderr to the sibling `.err` file
    pub capture: Option<PathBuf>,
    /// Variables merged over the inherited environment
    pub env: BTreeMap<String, String>,
    pub on_failure: FailurePolicy,
}

/// Outcome of one tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    pub exit_code: i32,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub stdout_path: Option<PathBuf>,
    pub stderr_path: Option<PathBuf>,
}

// ============================================================================
// Statistics Types
// ============================================================================

/// Per-timepoint mean values of one region
#[derive(Debug, Clone, PartialEq)]
pub struct Timeseries {
    pub values: Array1<f64>,
}

// ============================================================================
// Pipeline Types
// ============================================================================

/// Everything one connectivity run needs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// CIFTI dense timeseries
    pub input: PathBuf,
    pub seed_mask: PathBuf,
    /// Statistics map, thresholded before use
    pub stat_mask: PathBuf,
    pub output_prefix: PathBuf,
    pub threshold: f64,
    pub run: RunOptions,
    /// Leave the working directory on disk after the run
    pub keep_tmp: bool,
}

/// The persisted correlation coefficient
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationResult {
    pub value: f64,
    pub path: PathBuf,
}
