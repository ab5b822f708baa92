//! Error types for NovelStore
//!
//! Provides a unified error type for storage operations. Per-item failures
//! inside the actions controller use [`crate::action::ActionError`] instead
//! and never surface through this type unless a caller lifts them.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using NovelError
pub type Result<T> = std::result::Result<T, NovelError>;

/// Unified error type for NovelStore operations
#[derive(Debug, Error)]
pub enum NovelError {
    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Directory error at {}: {reason}", path.display())]
    Directory { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema mismatch in table '{table}': field '{field}' expected {expected}")]
    SchemaMismatch {
        table: String,
        field: String,
        expected: &'static str,
    },

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Record not found: {0}")]
    NotFound(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store corruption detected in {}: {reason}", path.display())]
    Corruption { path: PathBuf, reason: String },

    #[error("Store is closed: {}", .0.display())]
    StoreClosed(PathBuf),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Action Errors
    // -------------------------------------------------------------------------
    #[error("Action failed: {0}")]
    Action(String),
}

impl From<bincode::Error> for NovelError {
    fn from(err: bincode::Error) -> Self {
        NovelError::Serialization(err.to_string())
    }
}

impl NovelError {
    /// Whether this error belongs to the configuration family (fatal, reported)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            NovelError::Directory { .. } | NovelError::Config(_) | NovelError::SchemaMismatch { .. }
        )
    }
}
