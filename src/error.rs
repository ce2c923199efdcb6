//! Error types for loading networks and running community detection

use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain a network for one (mode, score) configuration
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("network file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read network file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse edge list {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Failure of a single community detection branch
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("flow solver failed: {0}")]
    Solver(String),

    #[error("flow solver assigned node {node} which is not in the network")]
    UnknownNode { node: u32 },

    #[error("flow solver left node {node} without a module")]
    MissingAssignment { node: u32 },

    #[error("divisive clustering exceeded its time budget after {iterations} iterations")]
    Timeout { iterations: usize },
}

/// Umbrella error for library entry points
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
