//! Engine error types
//!
//! Evaluation itself is total and reports data problems through the result
//! record, so these errors only surface at the loading boundary (product
//! books, historical price files) and in the binaries.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading products or market data
#[derive(Debug, Error)]
pub enum EngineError {
    /// A file could not be opened or read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A product book or request payload was not valid JSON
    #[error("invalid product document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

impl EngineError {
    /// Wrap an IO error with the offending path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }
}
