//! Synchronous execution of external neuroimaging binaries

use crate::structs::{CorrError, FailurePolicy, Result, RunOptions, RunResult, ToolCommand};
use std::fmt;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, error, info, warn};

impl ToolCommand {
    /// Start a command for `program`, which must be on `PATH`
    #[must_use]
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    /// Append one argument token
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Append a path argument
    #[must_use]
    pub fn path_arg(self, path: &Path) -> Self {
        let token = path.display().to_string();
        self.arg(token)
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

impl RunResult {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external tools. The pipeline only talks to tools through this trait.
pub trait ToolRunner {
    /// Run `command` to completion.
    ///
    /// A non-zero exit status is reported in the returned `RunResult`, not
    /// as an error. Callers decide what it means with [`check`].
    ///
    /// # Errors
    /// Returns error if the process cannot be spawned or capture files
    /// cannot be written
    fn run(&self, command: &ToolCommand, opts: &RunOptions) -> Result<RunResult>;
}

/// Runs tools as child processes of this one
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, command: &ToolCommand, opts: &RunOptions) -> Result<RunResult> {
        let line = command.to_string();

        if opts.debug {
            debug!("Running: {line}");
        } else {
            info!("Running: {line}");
        }

        if opts.dry_run {
            info!("Performing command as dryrun");
            return Ok(RunResult::default());
        }

        let (exit_code, out, err) = if opts.shell {
            let status = Command::new("sh")
                .arg("-c")
                .arg(&line)
                .envs(&opts.env)
                .status()
                .map_err(|source| CorrError::Spawn {
                    program: "sh".to_string(),
                    source,
                })?;
            (status.code().unwrap_or(-1), String::new(), String::new())
        } else {
            let output = Command::new(&command.program)
                .args(&command.args)
                .envs(&opts.env)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .map_err(|source| CorrError::Spawn {
                    program: command.program.clone(),
                    source,
                })?;
            (
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stdout).into_owned(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            )
        };

        let (stdout_path, stderr_path) = match &opts.capture {
            Some(path) => {
                let err_path = path.with_extension("err");
                fs::write(path, &out)?;
                fs::write(&err_path, &err)?;
                (Some(path.clone()), Some(err_path))
            }
            None => (None, None),
        };

        if exit_code != 0 {
            error!("command: {line} failed with returncode {exit_code}");
        }

        if !out.is_empty() {
            if opts.debug {
                debug!("{out}");
            } else {
                info!("{out}");
            }
        }

        if !err.is_empty() {
            if opts.debug {
                info!("{err}");
            } else {
                warn!("{err}");
            }
        }

        Ok(RunResult {
            exit_code,
            stdout: Some(out),
            stderr: Some(err),
            stdout_path,
            stderr_path,
        })
    }
}

/// Decide what a tool's exit status means for the run
///
/// # Errors
/// Returns `ToolFailed` for a non-zero exit under `FailurePolicy::Halt`
pub fn check(result: &RunResult, command: &ToolCommand, policy: FailurePolicy) -> Result<()> {
    if result.success() {
        return Ok(());
    }

    match policy {
        FailurePolicy::Halt => Err(CorrError::ToolFailed {
            command: command.to_string(),
            code: result.exit_code,
        }),
        FailurePolicy::Continue => {
            warn!(
                "Continuing after {} exited with returncode {}",
                command.program, result.exit_code
            );
            Ok(())
        }
    }
}
