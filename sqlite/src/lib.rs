//! SQLite backend for the table browser.
//!
//! This crate discovers the tables of an arbitrary SQLite database at
//! runtime and serves them as typed, paginated pages. It also applies
//! batches of cell edits atomically. No schema is assumed ahead of time.
//!
//! # Architecture
//!
//! - **`schema`**: table listing, column introspection and identifier safety
//! - **`reader`**: ordered, windowed row reads
//! - **`mutation`**: type-aware batch `UPDATE`s in one transaction
//! - **`convert`**: SQLite value conversions
//! - **`query`**: [`TableQuery`], the facade over a borrowed connection
//! - **`store`**: [`Database`], a shareable, mutex-guarded connection
//!
//! # Quick start
//!
//! ```no_run
//! use std::collections::BTreeMap;
//!
//! use table_browser_core::{CellValue, PageWindow, RowEdit};
//! use table_browser_sqlite::{Database, StoreOptions};
//!
//! let db = Database::open("app.db", &StoreOptions::default()).unwrap();
//!
//! let page = db.read_page("brands", PageWindow::clamped(Some(20), None)).unwrap();
//! println!("{} rows, keyed by {}", page.meta.row_count, page.meta.primary_key);
//!
//! let mut data = BTreeMap::new();
//! data.insert("name".to_string(), CellValue::from("Acme"));
//! let updated = db
//!     .apply_edits("brands", &[RowEdit { key: "b1".into(), data }])
//!     .unwrap();
//! println!("updated {updated} rows");
//! ```
//!
//! # Table names
//!
//! Table names must match `[A-Za-z0-9_]+` and refer to an existing user
//! table; anything else is rejected before a statement is prepared.

mod convert;
mod error;
mod mutation;
mod query;
mod reader;
mod schema;
mod store;

pub use error::{Result, SqliteError};
pub use query::TableQuery;
pub use store::{DEFAULT_BUSY_TIMEOUT, Database, StoreOptions};
