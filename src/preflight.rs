//! Platform and external toolkit checks, run before any work

use crate::structs::{CorrError, Result};
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Binaries the pipeline needs on `PATH`, with the toolkit that ships them
pub const REQUIRED_TOOLS: [(&str, &str); 2] =
    [("fslmeants", "FSL"), ("wb_command", "Connectome Workbench")];

/// # Errors
/// Returns error on Windows, where FSL cannot be installed
pub fn check_platform() -> Result<()> {
    if cfg!(windows) {
        return Err(CorrError::Dependency(
            "The required software (FSL) is not installable on Windows platforms. Exiting.".into(),
        ));
    }
    Ok(())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Find `program` in a `PATH`-style list of directories
#[must_use]
pub fn find_in(search_path: &OsStr, program: &str) -> Option<PathBuf> {
    env::split_paths(search_path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

/// Find `program` on the inherited `PATH`
#[must_use]
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    env::var_os("PATH").and_then(|path| find_in(&path, program))
}

/// # Errors
/// Returns error naming the toolkit of the first missing binary
pub fn check_dependencies() -> Result<()> {
    for (program, toolkit) in REQUIRED_TOOLS {
        if find_on_path(program).is_none() {
            return Err(CorrError::Dependency(format!(
                "The required software ({toolkit}) is not installed or on the system path. Exiting."
            )));
        }
    }
    Ok(())
}
