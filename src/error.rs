use std::path::PathBuf;
use thiserror::Error;

/// Hard failures of a discovery run. Per-file problems never show up here;
/// they are carried as data on the scan results instead.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no compose files found under {0}")]
    NoCandidates(PathBuf),

    #[error("scan of {root} timed out after {seconds}s")]
    Timeout { root: PathBuf, seconds: u64 },

    #[error("scan task failed: {0}")]
    Join(String),
}

/// Failure to persist or reload the project configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}
