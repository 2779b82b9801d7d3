//! Mean timeseries extraction within a region mask

use super::convert::convert;
use super::runner::{check, ToolRunner};
use crate::structs::{Result, RunOptions, ToolCommand};
use std::path::{Path, PathBuf};

/// Run `fslmeants` to write the per-volume mean of `image` inside `mask` to `out`
///
/// `image` and `mask` must share geometry; a mismatch is reported by the tool.
///
/// # Errors
/// Returns error if `fslmeants` cannot be run or fails under `FailurePolicy::Halt`
pub fn extract_mean_timeseries(
    runner: &dyn ToolRunner,
    image: &Path,
    mask: &Path,
    out: &Path,
    opts: &RunOptions,
) -> Result<PathBuf> {
    let mut mean_ts = ToolCommand::new("fslmeants")
        .arg("-i")
        .path_arg(image)
        .arg("-o")
        .path_arg(out)
        .arg("-m")
        .path_arg(mask);

    if opts.verbose {
        mean_ts = mean_ts.arg("--verbose");
    }

    let result = runner.run(&mean_ts, opts)?;
    check(&result, &mean_ts, opts.on_failure)?;

    Ok(out.to_path_buf())
}

/// Mean timeseries of a CIFTI file within a CIFTI mask.
///
/// Writes `<prefix>.nii.gz`, `<prefix>.mask.nii.gz` and `<prefix>.mat.txt`
/// under `dir`. Only the mask conversion is thresholded.
///
/// # Errors
/// Returns error if any conversion or the extraction fails
pub fn region_timeseries(
    runner: &dyn ToolRunner,
    dir: &Path,
    timeseries: &Path,
    mask: &Path,
    prefix: &str,
    thresh: f64,
    opts: &RunOptions,
) -> Result<PathBuf> {
    let image = convert(
        runner,
        timeseries,
        &dir.join(format!("{prefix}.nii.gz")),
        0.0,
        opts,
    )?;
    let mask_image = convert(
        runner,
        mask,
        &dir.join(format!("{prefix}.mask.nii.gz")),
        thresh,
        opts,
    )?;

    extract_mean_timeseries(
        runner,
        &image,
        &mask_image,
        &dir.join(format!("{prefix}.mat.txt")),
        opts,
    )
}
