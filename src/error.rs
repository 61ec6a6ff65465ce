//! Error taxonomy shared by every stage of the pipeline.
//!
//! Solver budgets running out is deliberately absent: a stopped solver
//! yields an unproven solution, not an error.

use std::path::PathBuf;

use crate::graph::VertexId;

/// Errors raised by graph loading, simulation, optimization and validation
#[derive(Debug, thiserror::Error)]
pub enum HoneypotError {
    #[error("Malformed input in {source_name} at line {line}: {reason}")]
    Format {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Cannot simulate: {0}")]
    Input(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Vertex not found: {0}")]
    NotFound(VertexId),

    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize {path}: {reason}")]
    Serialization { path: PathBuf, reason: String },

    #[error("Solver failure: {0}")]
    Solver(String),
}

impl HoneypotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HoneypotError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, HoneypotError>;
