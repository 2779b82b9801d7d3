use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorrError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command: {command} failed with returncode {code}")]
    ToolFailed { command: String, code: i32 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Statistics error: {0}")]
    Stats(String),

    #[error("{0}")]
    Dependency(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not create a unique working directory under {}", .0.display())]
    WorkDir(PathBuf),

    #[error("Interrupted")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, CorrError>;
