//! Error type for everything outside the reassembly engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by session persistence and the CLI
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid session file {}: {message}", .path.display())]
    Session { path: PathBuf, message: String },
    #[error("Config directory not found")]
    ConfigDirNotFound,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
