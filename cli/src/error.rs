use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid pipeline file {path}: {reason}")]
    PipelineFile { path: PathBuf, reason: String },

    #[error("directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),
}
