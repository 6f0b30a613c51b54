//! Driver error type.
//!
//! `NoInputs`, `BenchNotFound` and the configuration variants abort the batch
//! before it starts. `Spawn` and `Timeout` only skip the instance they occur on.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no ground-truth .csv files found in {}", .dir.display())]
    NoInputs { dir: PathBuf },

    #[error("benchmark binary not found at {}", .path.display())]
    BenchNotFound { path: PathBuf },

    #[error("failed to list {}: {source}", .dir.display())]
    Discover {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to run benchmark: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("benchmark timed out after {secs}s")]
    Timeout { secs: u64 },
}
