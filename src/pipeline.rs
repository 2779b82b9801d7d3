//! Seed/stat connectivity pipeline
//!
//! Converts the input timeseries and both masks, extracts the mean
//! timeseries of each region, correlates them and writes the coefficient
//! to `<output_prefix>.pear_corr.txt`. All intermediates live in a private
//! working directory under the output directory; the process current
//! directory is never touched.

use crate::stats::correlation::pearson_files;
use crate::structs::{CorrError, CorrelationResult, PipelineConfig, Result};
use crate::tools::meants::region_timeseries;
use crate::tools::ToolRunner;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};
use uuid::Uuid;

/// Suffix appended to the output prefix for the result file
pub const RESULT_SUFFIX: &str = ".pear_corr.txt";

const SEED_PREFIX: &str = "mask.seed";
const STAT_PREFIX: &str = "mask.stat";

/// Scratch directory for one run, removed on drop unless kept
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    keep: bool,
}

impl WorkDir {
    const ATTEMPTS: usize = 8;

    /// Create `tmp_dir_<id>` under `parent`, never reusing an existing path
    ///
    /// # Errors
    /// Returns error if the directory cannot be created
    pub fn create(parent: &Path, keep: bool) -> Result<Self> {
        fs::create_dir_all(parent)?;

        for _ in 0..Self::ATTEMPTS {
            let path = parent.join(format!("tmp_dir_{}", Uuid::new_v4().simple()));
            match fs::create_dir(&path) {
                Ok(()) => {
                    info!("Creating temporary directory {}", path.display());
                    return Ok(Self { path, keep });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }
        }

        Err(CorrError::WorkDir(parent.to_path_buf()))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.keep {
            info!("Keeping temporary directory {}", self.path.display());
            return;
        }

        info!("Temporary directory and file clean-up");
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!("Could not remove {}: {e}", self.path.display());
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

/// Directory the output prefix points into, or the current directory
///
/// # Errors
/// Returns error if the current directory cannot be determined
pub fn output_dir(prefix: &Path) -> Result<PathBuf> {
    match prefix.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => absolute(parent),
        _ => Ok(env::current_dir()?),
    }
}

/// `<prefix>.pear_corr.txt`
#[must_use]
pub fn result_path(prefix: &Path) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(RESULT_SUFFIX);
    PathBuf::from(name)
}

/// Text form of a coefficient: shortest round-trip digits, `nan` for NaN
#[must_use]
pub fn format_scalar(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value == f64::INFINITY {
        "inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{value:?}")
    }
}

/// Write the coefficient followed by a newline
///
/// # Errors
/// Returns error if the file cannot be written
pub fn write_result(path: &Path, value: f64) -> Result<PathBuf> {
    fs::write(path, format!("{}\n", format_scalar(value)))?;
    Ok(path.to_path_buf())
}

fn checkpoint(interrupt: &AtomicBool) -> Result<()> {
    if interrupt.load(Ordering::SeqCst) {
        return Err(CorrError::Interrupted);
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Correlate the seed and stat region timeseries of `config.input`
///
/// Returns `None` for a dry run, where tools are only logged.
///
/// # Errors
/// Returns error if a tool fails under `FailurePolicy::Halt`, an
/// intermediate is missing or malformed, the result cannot be written,
/// or `interrupt` is raised between steps
pub fn compute_connectivity(
    runner: &dyn ToolRunner,
    config: &PipelineConfig,
    interrupt: &AtomicBool,
) -> Result<Option<CorrelationResult>> {
    let input = absolute(&config.input)?;
    let seed_mask = absolute(&config.seed_mask)?;
    let stat_mask = absolute(&config.stat_mask)?;
    let out_dir = output_dir(&config.output_prefix)?;

    info!(
        "Processing: {} | Seed mask: {} | Stat mask: {}",
        file_name(&input),
        file_name(&seed_mask),
        file_name(&stat_mask)
    );

    let value = {
        let work = WorkDir::create(&out_dir, config.keep_tmp)?;

        checkpoint(interrupt)?;
        let seed_ts = region_timeseries(
            runner,
            work.path(),
            &input,
            &seed_mask,
            SEED_PREFIX,
            0.0,
            &config.run,
        )?;

        checkpoint(interrupt)?;
        let stat_ts = region_timeseries(
            runner,
            work.path(),
            &input,
            &stat_mask,
            STAT_PREFIX,
            config.threshold,
            &config.run,
        )?;

        checkpoint(interrupt)?;
        if config.run.dry_run {
            info!("Dry run: skipping correlation");
            return Ok(None);
        }

        pearson_files(&seed_ts, &stat_ts)?
    };

    let path = write_result(&result_path(&config.output_prefix), value)?;
    info!("Pearson correlation {} written to {}", format_scalar(value), path.display());

    Ok(Some(CorrelationResult { value, path }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{FailurePolicy, RunOptions};
    use crate::tools::runner::fake::FakeRunner;
    use approx::assert_abs_diff_eq;
    use tempfile::TempDir;

    const SEED: [f64; 10] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
    const STAT: [f64; 10] = [10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];

    fn fixture(dir: &Path, run: RunOptions) -> PipelineConfig {
        let input = dir.join("sub.dtseries.nii");
        let seed_mask = dir.join("seed.dscalar.nii");
        let stat_mask = dir.join("stat.dscalar.nii");
        fs::write(&input, "1 2 3 4 5 6 7 8 9 10").expect("write");
        fs::write(&seed_mask, "1 1 0 0 0").expect("write");
        fs::write(&stat_mask, "0.5 2.0 3.1 1.2 1.77").expect("write");

        PipelineConfig {
            input,
            seed_mask,
            stat_mask,
            output_prefix: dir.join("out").join("sub01"),
            threshold: 1.77,
            run,
            keep_tmp: false,
        }
    }

    fn runner() -> FakeRunner {
        FakeRunner::default()
            .with_series("seed", &SEED)
            .with_series("stat", &STAT)
    }

    fn work_dirs(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(std::result::Result::ok)
                    .map(|e| e.path())
                    .filter(|p| file_name(p).starts_with("tmp_dir_"))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_end_to_end_anticorrelated() {
        let dir = TempDir::new().expect("create temp dir");
        let config = fixture(dir.path(), RunOptions::default());
        let cwd = env::current_dir().expect("cwd");

        let result = compute_connectivity(&runner(), &config, &AtomicBool::new(false))
            .expect("pipeline")
            .expect("not a dry run");

        assert_abs_diff_eq!(result.value, -1.0, epsilon = 1e-12);
        assert_eq!(result.path, dir.path().join("out").join("sub01.pear_corr.txt"));

        let text = fs::read_to_string(&result.path).expect("read");
        assert!(text.ends_with('\n'));
        let stored: f64 = text.trim().parse().expect("float");
        assert_eq!(stored.to_bits(), result.value.to_bits());

        assert!(work_dirs(&dir.path().join("out")).is_empty());
        assert_eq!(env::current_dir().expect("cwd"), cwd);
    }

    #[test]
    fn test_threshold_only_on_stat_branch() {
        let dir = TempDir::new().expect("create temp dir");
        let config = fixture(dir.path(), RunOptions::default());
        let runner = runner();

        compute_connectivity(&runner, &config, &AtomicBool::new(false)).expect("pipeline");

        assert_eq!(
            runner.programs(),
            vec![
                "wb_command",
                "wb_command",
                "fslmeants",
                "wb_command",
                "wb_command",
                "cluster",
                "fslmeants"
            ]
        );
    }

    #[test]
    fn test_keep_tmp_retains_intermediates() {
        let dir = TempDir::new().expect("create temp dir");
        let mut config = fixture(dir.path(), RunOptions::default());
        config.keep_tmp = true;

        compute_connectivity(&runner(), &config, &AtomicBool::new(false)).expect("pipeline");

        let kept = work_dirs(&dir.path().join("out"));
        assert_eq!(kept.len(), 1);
        assert!(kept[0].join("mask.seed.mat.txt").exists());
        assert!(kept[0].join("mask.stat.mat.txt").exists());
        assert!(kept[0].join("mask.stat.mask.cluster.txt").exists());
    }

    #[test]
    fn test_tool_failure_halts_and_cleans_up() {
        let dir = TempDir::new().expect("create temp dir");
        let config = fixture(dir.path(), RunOptions::default());
        let runner = runner().failing("fslmeants");

        let err = compute_connectivity(&runner, &config, &AtomicBool::new(false))
            .expect_err("should halt");

        assert!(matches!(err, CorrError::ToolFailed { code: 1, .. }));
        assert!(work_dirs(&dir.path().join("out")).is_empty());
        assert!(!result_path(&config.output_prefix).exists());
    }

    #[test]
    fn test_continue_policy_keeps_going() {
        let dir = TempDir::new().expect("create temp dir");
        let run = RunOptions {
            on_failure: FailurePolicy::Continue,
            ..RunOptions::default()
        };
        let config = fixture(dir.path(), run);
        let runner = runner().failing("cluster");

        let result = compute_connectivity(&runner, &config, &AtomicBool::new(false))
            .expect("pipeline")
            .expect("not a dry run");

        assert_abs_diff_eq!(result.value, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().expect("create temp dir");
        let run = RunOptions {
            dry_run: true,
            ..RunOptions::default()
        };
        let config = fixture(dir.path(), run);
        let runner = runner();

        let result =
            compute_connectivity(&runner, &config, &AtomicBool::new(false)).expect("pipeline");

        assert!(result.is_none());
        assert_eq!(runner.programs().len(), 7);
        assert!(!result_path(&config.output_prefix).exists());
        assert!(work_dirs(&dir.path().join("out")).is_empty());
    }

    #[test]
    fn test_interrupt_aborts_and_cleans_up() {
        let dir = TempDir::new().expect("create temp dir");
        let config = fixture(dir.path(), RunOptions::default());
        let runner = runner();

        let err = compute_connectivity(&runner, &config, &AtomicBool::new(true))
            .expect_err("should abort");

        assert!(matches!(err, CorrError::Interrupted));
        assert!(runner.programs().is_empty());
        assert!(work_dirs(&dir.path().join("out")).is_empty());
    }

    #[test]
    fn test_zero_variance_writes_nan() {
        let dir = TempDir::new().expect("create temp dir");
        let config = fixture(dir.path(), RunOptions::default());
        let runner = FakeRunner::default()
            .with_series("seed", &[3.0; 10])
            .with_series("stat", &STAT);

        let result = compute_connectivity(&runner, &config, &AtomicBool::new(false))
            .expect("pipeline")
            .expect("not a dry run");

        assert!(result.value.is_nan());
        assert_eq!(fs::read_to_string(&result.path).expect("read"), "nan\n");
    }

    #[test]
    fn test_work_dirs_are_unique() {
        let dir = TempDir::new().expect("create temp dir");
        let a = WorkDir::create(dir.path(), false).expect("create");
        let b = WorkDir::create(dir.path(), false).expect("create");

        assert_ne!(a.path(), b.path());
        let a_path = a.path().to_path_buf();
        drop(a);
        assert!(!a_path.exists());
        assert!(b.path().exists());
    }

    #[test]
    fn test_output_dir_and_result_path() {
        let cwd = env::current_dir().expect("cwd");
        assert_eq!(output_dir(Path::new("sub01")).expect("dir"), cwd);
        assert_eq!(output_dir(Path::new("res/sub01")).expect("dir"), cwd.join("res"));
        assert_eq!(
            result_path(Path::new("res/sub01")),
            PathBuf::from("res/sub01.pear_corr.txt")
        );
    }

    #[test]
    fn test_format_scalar() {
        assert_eq!(format_scalar(-1.0), "-1.0");
        assert_eq!(format_scalar(0.25), "0.25");
        assert_eq!(format_scalar(f64::NAN), "nan");
        assert_eq!(format_scalar(f64::NEG_INFINITY), "-inf");
    }
}
