//! CIFTI to NIFTI conversion with optional cluster thresholding

use super::runner::{check, ToolRunner};
use crate::structs::{Result, RunOptions, ToolCommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Derive the unthresholded intermediate and cluster report names for `out`
#[must_use]
pub fn intermediate_names(out: &Path) -> (PathBuf, PathBuf) {
    let name = out.display().to_string();

    let (tmp, report) = if let Some(stem) = name.strip_suffix(".nii.gz") {
        (format!("{stem}.tmp.nii.gz"), format!("{stem}.cluster.txt"))
    } else if let Some(stem) = name.strip_suffix(".nii") {
        (format!("{stem}.tmp.nii"), format!("{stem}.cluster.txt"))
    } else {
        (format!("{name}.tmp"), format!("{name}.cluster.txt"))
    };

    (PathBuf::from(tmp), PathBuf::from(report))
}

/// Zero every value below `thresh` in `nii`, writing the result to `out`
///
/// # Errors
/// Returns error if `cluster` cannot be run or fails under `FailurePolicy::Halt`
pub fn threshold_image(
    runner: &dyn ToolRunner,
    nii: &Path,
    out: &Path,
    thresh: f64,
    opts: &RunOptions,
) -> Result<PathBuf> {
    let mut cluster = ToolCommand::new("cluster")
        .arg(format!("--in={}", nii.display()))
        .arg(format!("--thresh={thresh}"))
        .arg(format!("--oindex={}", out.display()))
        .arg("--no_table");

    if opts.verbose {
        cluster = cluster.arg("--verbose");
    }

    let result = runner.run(&cluster, opts)?;
    check(&result, &cluster, opts.on_failure)?;

    Ok(out.to_path_buf())
}

/// Convert a CIFTI file to NIFTI at `out`, thresholding when `thresh` is non-zero
///
/// # Errors
/// Returns error if a tool cannot be run, fails under `FailurePolicy::Halt`,
/// or the intermediate image cannot be moved into place
pub fn convert(
    runner: &dyn ToolRunner,
    input: &Path,
    out: &Path,
    thresh: f64,
    opts: &RunOptions,
) -> Result<PathBuf> {
    let (tmp, report) = intermediate_names(out);

    let cii_to_nii = ToolCommand::new("wb_command")
        .arg("-cifti-convert")
        .arg("-to-nifti")
        .path_arg(input)
        .path_arg(&tmp);

    let result = runner.run(&cii_to_nii, opts)?;
    check(&result, &cii_to_nii, opts.on_failure)?;

    if thresh == 0.0 {
        if !opts.dry_run {
            fs::rename(&tmp, out)?;
        }
        return Ok(out.to_path_buf());
    }

    let cluster_opts = RunOptions {
        capture: Some(report),
        ..opts.clone()
    };
    threshold_image(runner, &tmp, out, thresh, &cluster_opts)?;

    if !opts.dry_run {
        if let Err(e) = fs::remove_file(&tmp) {
            warn!("Could not remove {}: {e}", tmp.display());
        }
    }

    Ok(out.to_path_buf())
}
