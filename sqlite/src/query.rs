//! Table access over a borrowed connection.
//!
//! Provides [`TableQuery`], the single entry point for introspection,
//! paginated reads and batch edits. It holds no state besides the
//! connection, so it is cheap to build per call.
//!
//! # Example
//!
//! ```no_run
//! use table_browser_sqlite::TableQuery;
//! use table_browser_core::PageWindow;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("app.db").unwrap();
//! let query = TableQuery::new(&conn);
//!
//! for table in query.list_tables().unwrap() {
//!     let page = query.read_page(&table, PageWindow::default()).unwrap();
//!     println!("{table}: {} of {} rows", page.rows.len(), page.meta.row_count);
//! }
//! ```

use rusqlite::Connection;
use table_browser_core::{Page, PageWindow, RowEdit, TableInfo};

use crate::error::Result;
use crate::{mutation, reader, schema};

/// Query interface for browsing and editing the tables of one database.
pub struct TableQuery<'a> {
    conn: &'a Connection,
}

impl<'a> TableQuery<'a> {
    /// Creates a query interface for the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Returns the names of all user tables, ordered by name.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        schema::list_tables(self.conn)
    }

    /// Describes a table's columns, identity and row count.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidTableName`](crate::SqliteError::InvalidTableName)
    /// or [`SqliteError::TableNotFound`](crate::SqliteError::TableNotFound)
    /// for names that cannot be served.
    pub fn describe_table(&self, table: &str) -> Result<TableInfo> {
        schema::describe_table(self.conn, table)
    }

    /// Reads the rows of `table` inside `window`, in identity order.
    pub fn read_page(&self, table: &str, window: PageWindow) -> Result<Page> {
        reader::read_page(self.conn, table, window)
    }

    /// Applies `edits` in one transaction and returns the changed-row count.
    ///
    /// Either every edit is applied or none is.
    pub fn apply_edits(&self, table: &str, edits: &[RowEdit]) -> Result<usize> {
        mutation::apply_edits(self.conn, table, edits)
    }

    /// Returns the underlying connection.
    pub fn connection(&self) -> &Connection {
        self.conn
    }
}
