//! Shared request state.

use std::sync::Arc;

use table_browser_sqlite::Database;

/// State handed to every handler: the one shared database handle.
#[derive(Debug, Clone)]
pub struct AppState {
    db: Arc<Database>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Returns a new reference to the database, for moving into blocking tasks.
    pub fn db(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }
}
