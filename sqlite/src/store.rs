//! Shared database handle.
//!
//! [`Database`] owns a single SQLite connection behind a mutex so it can be
//! shared across request handlers. File-backed databases are opened in WAL
//! mode with a busy timeout; every operation takes the lock, runs to
//! completion and releases it, so readers never observe a half-applied
//! batch.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rusqlite::Connection;
use table_browser_core::{Page, PageWindow, RowEdit, TableInfo};
use tracing::{debug, info, warn};

use crate::error::{Result, SqliteError};
use crate::query::TableQuery;

/// Default time a statement waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Options applied when opening a file-backed database.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// A mutex-guarded SQLite connection.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Opens (creating if needed) the database file at `path`.
    ///
    /// Missing parent directories are created. The connection is switched
    /// to WAL journaling and given the configured busy timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::PathError`] if the parent directory cannot be
    /// created, or [`SqliteError::DatabaseError`] if SQLite rejects the file.
    pub fn open(path: impl AsRef<Path>, options: &StoreOptions) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SqliteError::PathError {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            warn!(path = %path.display(), mode, "database did not switch to WAL journaling");
        }
        conn.busy_timeout(options.busy_timeout)?;

        info!(
            path = %path.display(),
            busy_timeout_ms = options.busy_timeout.as_millis() as u64,
            "opened database"
        );
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        debug!("opened in-memory database");
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Path of the backing file, or `None` for an in-memory database.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Runs `f` with exclusive access to the connection.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock("with_connection")?;
        f(&conn)
    }

    /// Returns the names of all user tables.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.lock("list_tables")?;
        TableQuery::new(&conn).list_tables()
    }

    /// Describes one table.
    pub fn describe_table(&self, table: &str) -> Result<TableInfo> {
        let conn = self.lock("describe_table")?;
        TableQuery::new(&conn).describe_table(table)
    }

    /// Reads one page of `table`.
    pub fn read_page(&self, table: &str, window: PageWindow) -> Result<Page> {
        let conn = self.lock("read_page")?;
        TableQuery::new(&conn).read_page(table, window)
    }

    /// Applies a batch of edits atomically and returns the changed-row count.
    pub fn apply_edits(&self, table: &str, edits: &[RowEdit]) -> Result<usize> {
        let conn = self.lock("apply_edits")?;
        TableQuery::new(&conn).apply_edits(table, edits)
    }

    /// Checkpoints the WAL and closes the connection.
    ///
    /// A poisoned lock does not prevent closing; the connection itself is
    /// still valid.
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        if self.path.is_some() {
            conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        }
        conn.close().map_err(|(_, err)| SqliteError::from(err))?;
        debug!("closed database");
        Ok(())
    }

    fn lock(&self, operation: &'static str) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SqliteError::ConnectionPoisoned(operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_parent_and_uses_wal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/app.db");
        let db = Database::open(&path, &StoreOptions::default()).unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), Some(path.as_path()));

        let mode: String = db
            .with_connection(|conn| Ok(conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        db.close().unwrap();
    }

    #[test]
    fn test_busy_timeout_applied() {
        let dir = TempDir::new().unwrap();
        let options = StoreOptions {
            busy_timeout: Duration::from_millis(1234),
        };
        let db = Database::open(dir.path().join("t.db"), &options).unwrap();
        let timeout: i64 = db
            .with_connection(|conn| Ok(conn.query_row("PRAGMA busy_timeout", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(timeout, 1234);
    }

    #[test]
    fn test_in_memory_round_trip() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.path().is_none());
        db.with_connection(|conn| {
            conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT);")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(db.list_tables().unwrap(), vec!["t"]);
        db.close().unwrap();
    }

    #[test]
    fn test_open_fails_when_parent_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let err = Database::open(blocker.join("app.db"), &StoreOptions::default()).unwrap_err();
        assert!(matches!(err, SqliteError::PathError { .. }));
    }
}
