//! Error types for the cleaning core.
//!
//! Only structural problems are errors. Unparsable cells, ambiguous shapes
//! and unresolved roles degrade softly and are reported as diagnostics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanError {
    /// The configuration is structurally unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown transform model '{0}' (expected linear, log2, log10 or ln)")]
    UnknownModel(String),

    #[error("configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("column '{column}' has {found} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("row {row} has {found} cells but the header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("no column named '{0}'")]
    UnknownColumn(String),

    #[error("cannot rename '{from}' to '{to}': a column with that name already exists")]
    RenameCollision { from: String, to: String },
}

pub type Result<T> = std::result::Result<T, CleanError>;
