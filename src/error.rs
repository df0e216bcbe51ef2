use std::path::PathBuf;

use thiserror::Error;

/// Failures reading or writing the JSON database file.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

/// Failures loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid config {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("failed to write config {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

/// Failures resolving a task reference typed on the command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no task matches '{0}'")]
    NoMatch(String),
    #[error("'{input}' is ambiguous, candidates:\n{candidates}\nPlease use a longer id prefix.")]
    Ambiguous { input: String, candidates: String },
}
