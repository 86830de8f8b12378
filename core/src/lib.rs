//! Core types for browsing and editing arbitrary SQLite tables.
//!
//! This crate holds everything that does not touch storage:
//!
//! - [`CellValue`] and [`RowId`]: the closed value model shared by the
//!   HTTP surface, the grid and the SQLite backend.
//! - [`normalize`]: affinity-aware conversion of edited text into typed
//!   values.
//! - [`ColumnDescriptor`], [`TableInfo`], [`TableMeta`], [`Row`], [`Page`]:
//!   table metadata and page payloads, serialized as the JSON contract.
//! - [`BatchRequest`] / [`BatchResponse`]: the batched update payloads.
//! - [`EditableGrid`]: the client-side state machine that tracks pending
//!   edits against a loaded page.
//!
//! # Example
//!
//! ```
//! use table_browser_core::*;
//!
//! let batch: BatchRequest =
//!     serde_json::from_str(r#"{"updates": [{"key": 1, "data": {"price": " 9.5 "}}]}"#).unwrap();
//! let edit = &batch.updates[0];
//! assert_eq!(normalize(edit.data["price"].clone(), "REAL"), CellValue::Real(9.5));
//! ```

mod grid;
mod normalize;
mod types;
mod value;

pub use grid::{EditableGrid, GridError, GridState, PageRequest, PendingEdit, SaveRequest};
pub use normalize::normalize;
pub use types::*;
pub use value::{CellValue, RowId};
