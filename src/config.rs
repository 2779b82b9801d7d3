//! Command line arguments and their translation into a pipeline run

use crate::structs::{CorrError, FailurePolicy, PipelineConfig, Result, RunOptions};
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_THRESHOLD: f64 = 1.77;

/// Computes the Pearson correlation coefficient between two masks (a seed
/// mask and a statistics mask). The coefficient is written to an output
/// file ending with '.pear_corr.txt'.
#[derive(Parser, Debug)]
#[command(name = "roi-corr")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CIFTI-2 dense timeseries file (e.g. subject's fMRI timeseries mapped to some surface)
    #[arg(short = 'i', long = "input", visible_alias = "in", value_name = "CIFTI.dtseries.nii")]
    pub input: PathBuf,

    /// CIFTI-2 dense scalar file (used as a seed/mask in a previous analysis)
    #[arg(short = 's', long = "seed-mask", visible_alias = "seed", value_name = "CIFTI.dscalar.nii")]
    pub seed_mask: PathBuf,

    /// CIFTI-2 dense scalar file (statistics file from a previous analysis, to be thresholded)
    #[arg(short = 'a', long = "stat-mask", visible_alias = "stat", value_name = "CIFTI.dscalar.nii")]
    pub stat_mask: PathBuf,

    /// Output prefix for the '.pear_corr.txt' result file
    #[arg(short = 'o', long = "output-prefix", visible_alias = "out", value_name = "PREFIX")]
    pub output_prefix: PathBuf,

    /// Cluster threshold applied to the stat mask
    #[arg(short = 't', long = "thresh", default_value_t = DEFAULT_THRESHOLD, value_name = "FLOAT")]
    pub thresh: f64,

    /// Log file name (appended to)
    #[arg(short = 'l', long = "log-file", visible_alias = "log", default_value = "log_file.log", value_name = "LOG")]
    pub log_file: PathBuf,

    /// Enable diagnostic messages
    #[arg(long)]
    pub debug: bool,

    /// Log the commands without running them; no files are created
    #[arg(long)]
    pub dry_run: bool,

    /// Pass --verbose to the FSL tools
    #[arg(short, long)]
    pub verbose: bool,

    /// Keep the temporary working directory
    #[arg(long)]
    pub keep_tmp: bool,

    /// Continue when an external tool exits non-zero
    #[arg(long)]
    pub keep_going: bool,
}

impl Args {
    /// Validate arguments and build the pipeline configuration
    ///
    /// # Errors
    /// Returns error if the threshold is negative or not finite, or the
    /// output prefix is empty
    pub fn into_config(self) -> Result<PipelineConfig> {
        if !self.thresh.is_finite() || self.thresh < 0.0 {
            return Err(CorrError::Config(format!(
                "Threshold must be a non-negative number, got {}",
                self.thresh
            )));
        }
        if self.output_prefix.as_os_str().is_empty() {
            return Err(CorrError::Config("Output prefix is empty".into()));
        }

        let on_failure = if self.keep_going {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Halt
        };

        Ok(PipelineConfig {
            input: self.input,
            seed_mask: self.seed_mask,
            stat_mask: self.stat_mask,
            output_prefix: self.output_prefix,
            threshold: self.thresh,
            run: RunOptions {
                dry_run: self.dry_run,
                debug: self.debug,
                verbose: self.verbose,
                on_failure,
                ..RunOptions::default()
            },
            keep_tmp: self.keep_tmp,
        })
    }
}
