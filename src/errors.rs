use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::AttrName;

/// Error type for pipe configuration, schema, lookup, and IO failures.
///
/// Only `Configuration` and `SchemaViolation` ever surface from pipe
/// stages; `ResourceUnavailable` and `LookupMiss` are normally recovered
/// locally (record dropped or zero vector substituted) and logged.
#[derive(Debug, Error)]
pub enum PipeError {
    /// Invalid pipe parameters; fatal when the pipe is built.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A file could not be read or decoded.
    #[error("resource '{}' is unavailable: {reason}", path.display())]
    ResourceUnavailable {
        /// Offending path.
        path: PathBuf,
        /// Underlying cause.
        reason: String,
    },
    /// A key the vector model does not know.
    #[error("key '{key}' is absent from the vector model")]
    LookupMiss {
        /// Missing model key.
        key: String,
    },
    /// A value that breaks a fail-fast pipe's contract.
    #[error("attribute '{attr}' violates the pipe contract: {details}")]
    SchemaViolation {
        /// Attribute at fault.
        attr: AttrName,
        /// What was wrong with it.
        details: String,
    },
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// JSON parse or write failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Malformed delimited input.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Invalid regular expression.
    #[error(transparent)]
    Regex(#[from] regex::Error),
    /// PCA fitting failure.
    #[error(transparent)]
    Reduction(#[from] linfa_reduction::ReductionError),
}

impl PipeError {
    pub(crate) fn schema(attr: impl Into<AttrName>, details: impl Into<String>) -> Self {
        Self::SchemaViolation {
            attr: attr.into(),
            details: details.into(),
        }
    }

    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ResourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, PipeError>;
