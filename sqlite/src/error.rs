//! Error types for table browser storage operations.
//!
//! Provides a unified error type covering database access, input
//! validation and lookup failures.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or editing tables.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// The database file or its directory could not be prepared.
    #[error("failed to prepare database path '{path}': {source}")]
    PathError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Table name contains characters outside the identifier allow-list.
    #[error("invalid table name '{0}': must contain only ASCII letters, digits and underscores")]
    InvalidTableName(String),

    /// Requested table does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// The table has no declared key and declares columns named `rowid`,
    /// `_rowid_` and `oid`, so its implicit rowid cannot be selected.
    #[error("table '{0}' shadows every rowid alias and has no primary key")]
    RowIdShadowed(String),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("database connection lock poisoned during {0}")]
    ConnectionPoisoned(&'static str),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
