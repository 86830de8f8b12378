//! Client-side state machine for an editable grid.
//!
//! [`EditableGrid`] tracks which table and page are shown, the edits the
//! user made against that page, and whether a load or save is in flight.
//! It performs no I/O: transitions that need the backend return the request
//! to issue ([`PageRequest`], [`SaveRequest`]) and the caller reports the
//! outcome back through [`EditableGrid::page_loaded`],
//! [`EditableGrid::load_failed`], [`EditableGrid::save_succeeded`] or
//! [`EditableGrid::save_failed`].
//!
//! ```text
//! Idle ──select──▶ Loading ──loaded──▶ Ready ──save──▶ Saving
//!   ▲                │  ▲                │               │
//!   └──failed (none)─┘  └─select/page/───┘◀──failed──────┘
//!                          reload/saved
//! ```
//!
//! Pending edits belong to the page they were made on: every successful
//! load discards them. A failed save keeps them so the user can retry.
//!
//! # Example
//!
//! ```
//! use table_browser_core::*;
//!
//! let mut grid = EditableGrid::new();
//! let request = grid.select_table("brands").unwrap();
//! assert_eq!(grid.state(), GridState::Loading);
//!
//! let meta = TableMeta {
//!     columns: vec![
//!         ColumnDescriptor { cid: 0, name: "id".into(), decl_type: "INTEGER".into(),
//!             not_null: false, default_value: None, pk: 1 },
//!         ColumnDescriptor { cid: 1, name: "name".into(), decl_type: "TEXT".into(),
//!             not_null: true, default_value: None, pk: 0 },
//!     ],
//!     primary_key: "id".into(),
//!     uses_row_id: false,
//!     row_count: 1,
//!     limit: request.window.limit,
//!     offset: request.window.offset,
//! };
//! let row = Row {
//!     cells: vec![("id".into(), CellValue::Integer(1)), ("name".into(), "Acme".into())],
//!     rowid: None,
//! };
//! grid.page_loaded(Page { meta, rows: vec![row] }).unwrap();
//!
//! grid.edit_cell(&RowId::Integer(1), "name", "Acme Corp").unwrap();
//! let save = grid.save().unwrap().unwrap();
//! assert_eq!(save.batch.updates.len(), 1);
//! assert_eq!(grid.state(), GridState::Saving);
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

use crate::types::{BatchRequest, Page, PageWindow, ROWID_FIELD, RowEdit, TableMeta};
use crate::value::{CellValue, RowId};

/// Lifecycle state of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridState {
    /// No table selected yet.
    Idle,
    /// A page request is in flight.
    Loading,
    /// A page is loaded and can be edited.
    Ready,
    /// A batch of edits is being committed.
    Saving,
}

/// Errors raised by grid transitions.
///
/// None of them are fatal: the grid stays in a usable state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// A load or save is already in flight.
    #[error("grid is busy ({0:?})")]
    Busy(GridState),
    /// Pagination was requested before any table was selected.
    #[error("no table selected")]
    NoTableSelected,
    /// The operation needs a loaded page.
    #[error("no page loaded")]
    NotReady,
    /// An outcome was reported that does not match the current state.
    #[error("unexpected {event} while {state:?}")]
    UnexpectedEvent {
        event: &'static str,
        state: GridState,
    },
    /// The column is not part of the loaded table.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    /// The column identifies rows and is read-only.
    #[error("column '{0}' identifies rows and cannot be edited")]
    IdentityColumn(String),
    /// No row with this identifier is on the loaded page.
    #[error("row {0} is not on the loaded page")]
    UnknownRow(RowId),
}

/// Convenience alias for results with [`GridError`].
pub type Result<T> = std::result::Result<T, GridError>;

/// A page fetch the caller must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub table: String,
    pub window: PageWindow,
}

/// A batch commit the caller must perform.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub table: String,
    pub batch: BatchRequest,
}

/// Uncommitted changes to one row.
///
/// `snapshot` holds every non-identity column of the row as loaded, with
/// the user's changes applied on top.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit {
    pub row_id: RowId,
    pub snapshot: BTreeMap<String, CellValue>,
}

#[derive(Debug, Clone)]
struct LoadedPage {
    table: String,
    page: Page,
}

/// Editable grid state machine. See the [module docs](self).
#[derive(Debug, Clone)]
pub struct EditableGrid {
    state: GridState,
    table: Option<String>,
    window: PageWindow,
    loaded: Option<LoadedPage>,
    pending: BTreeMap<RowId, PendingEdit>,
    last_error: Option<String>,
}

impl Default for EditableGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl EditableGrid {
    /// Creates an idle grid with the default page window.
    pub fn new() -> Self {
        Self {
            state: GridState::Idle,
            table: None,
            window: PageWindow::default(),
            loaded: None,
            pending: BTreeMap::new(),
            last_error: None,
        }
    }

    pub fn state(&self) -> GridState {
        self.state
    }

    /// Currently selected table (may differ from the loaded one while loading).
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn window(&self) -> PageWindow {
        self.window
    }

    /// The last successfully loaded page.
    pub fn page(&self) -> Option<&Page> {
        self.loaded.as_ref().map(|l| &l.page)
    }

    /// Metadata of the last successfully loaded page.
    pub fn meta(&self) -> Option<&TableMeta> {
        self.page().map(|p| &p.meta)
    }

    /// Message of the most recent failed load or save.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_edit(&self, row_id: &RowId) -> Option<&PendingEdit> {
        self.pending.get(row_id)
    }

    pub fn pending_edits(&self) -> impl Iterator<Item = &PendingEdit> {
        self.pending.values()
    }

    /// Value shown for a cell: the pending override if any, else the loaded value.
    pub fn cell(&self, row_id: &RowId, column: &str) -> Option<&CellValue> {
        if let Some(value) = self.pending.get(row_id).and_then(|e| e.snapshot.get(column)) {
            return Some(value);
        }
        let page = self.page()?;
        page.rows
            .iter()
            .find(|row| row.row_id(&page.meta).as_ref() == Some(row_id))
            .and_then(|row| row.get(column))
    }

    /// Selects a table and starts loading its first page.
    pub fn select_table(&mut self, table: impl Into<String>) -> Result<PageRequest> {
        self.ensure_can_load()?;
        self.table = Some(table.into());
        self.window = PageWindow::clamped(Some(i64::from(self.window.limit)), Some(0));
        self.begin_load()
    }

    /// Changes the page size and reloads from the first page.
    pub fn set_page_size(&mut self, limit: i64) -> Result<PageRequest> {
        self.ensure_can_load()?;
        self.require_table()?;
        self.window = PageWindow::clamped(Some(limit), Some(0));
        self.begin_load()
    }

    /// Loads the page starting at `offset` (clamped to `>= 0`).
    pub fn go_to_offset(&mut self, offset: i64) -> Result<PageRequest> {
        self.ensure_can_load()?;
        self.require_table()?;
        self.window = PageWindow::clamped(Some(i64::from(self.window.limit)), Some(offset));
        self.begin_load()
    }

    pub fn next_page(&mut self) -> Result<PageRequest> {
        let next = self.window.next();
        self.go_to_offset(i64::try_from(next.offset).unwrap_or(i64::MAX))
    }

    pub fn previous_page(&mut self) -> Result<PageRequest> {
        let offset = self.window.offset.saturating_sub(u64::from(self.window.limit));
        self.go_to_offset(i64::try_from(offset).unwrap_or(i64::MAX))
    }

    /// Reloads the current page, discarding unsent edits once it arrives.
    pub fn reload(&mut self) -> Result<PageRequest> {
        self.ensure_can_load()?;
        self.require_table()?;
        self.begin_load()
    }

    /// Reports a successfully loaded page.
    pub fn page_loaded(&mut self, page: Page) -> Result<()> {
        self.expect_state(GridState::Loading, "page load")?;
        let table = self.table.clone().ok_or(GridError::NoTableSelected)?;
        self.window = PageWindow {
            limit: page.meta.limit,
            offset: page.meta.offset,
        };
        self.loaded = Some(LoadedPage { table, page });
        self.pending.clear();
        self.last_error = None;
        self.state = GridState::Ready;
        Ok(())
    }

    /// Reports a failed load.
    ///
    /// The previously loaded page, if any, stays visible together with its
    /// table and window.
    pub fn load_failed(&mut self, error: impl Into<String>) -> Result<()> {
        self.expect_state(GridState::Loading, "load failure")?;
        self.last_error = Some(error.into());
        match &self.loaded {
            Some(loaded) => {
                self.table = Some(loaded.table.clone());
                self.window = PageWindow {
                    limit: loaded.page.meta.limit,
                    offset: loaded.page.meta.offset,
                };
                self.state = GridState::Ready;
            }
            None => self.state = GridState::Idle,
        }
        Ok(())
    }

    /// Records a new value for one cell of a loaded row.
    ///
    /// A second edit to the same row overwrites the earlier value for that
    /// column; other columns keep their pending values.
    pub fn edit_cell(
        &mut self,
        row_id: &RowId,
        column: &str,
        value: impl Into<CellValue>,
    ) -> Result<()> {
        self.expect_state(GridState::Ready, "cell edit")?;
        let page = self.page().ok_or(GridError::NotReady)?;
        let meta = &page.meta;

        let identity = meta.identity_column().unwrap_or(ROWID_FIELD);
        if column == identity {
            return Err(GridError::IdentityColumn(column.to_string()));
        }
        if meta.column(column).is_none() {
            return Err(GridError::UnknownColumn(column.to_string()));
        }

        if !self.pending.contains_key(row_id) {
            let row = page
                .rows
                .iter()
                .find(|row| row.row_id(meta).as_ref() == Some(row_id))
                .ok_or_else(|| GridError::UnknownRow(row_id.clone()))?;
            let snapshot = row
                .cells
                .iter()
                .filter(|(name, _)| name != identity)
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
            self.pending.insert(
                row_id.clone(),
                PendingEdit {
                    row_id: row_id.clone(),
                    snapshot,
                },
            );
        }

        if let Some(edit) = self.pending.get_mut(row_id) {
            edit.snapshot.insert(column.to_string(), value.into());
        }
        Ok(())
    }

    /// Drops the pending edit for one row.
    pub fn revert_row(&mut self, row_id: &RowId) -> bool {
        self.pending.remove(row_id).is_some()
    }

    /// Drops all pending edits.
    pub fn discard_edits(&mut self) {
        self.pending.clear();
    }

    /// Starts committing pending edits.
    ///
    /// Returns `Ok(None)` and stays `Ready` when there is nothing to save.
    pub fn save(&mut self) -> Result<Option<SaveRequest>> {
        self.expect_state(GridState::Ready, "save")?;
        if self.pending.is_empty() {
            return Ok(None);
        }
        let table = self
            .loaded
            .as_ref()
            .map(|l| l.table.clone())
            .ok_or(GridError::NotReady)?;
        let updates = self
            .pending
            .values()
            .map(|edit| RowEdit {
                key: edit.row_id.clone().into(),
                data: edit.snapshot.clone(),
            })
            .collect();
        self.state = GridState::Saving;
        Ok(Some(SaveRequest {
            table,
            batch: BatchRequest { updates },
        }))
    }

    /// Reports a committed batch and starts reloading the page.
    pub fn save_succeeded(&mut self, _updated: usize) -> Result<PageRequest> {
        self.expect_state(GridState::Saving, "save success")?;
        self.pending.clear();
        self.last_error = None;
        self.begin_load()
    }

    /// Reports a rejected batch; pending edits are kept for retry.
    pub fn save_failed(&mut self, error: impl Into<String>) -> Result<()> {
        self.expect_state(GridState::Saving, "save failure")?;
        self.last_error = Some(error.into());
        self.state = GridState::Ready;
        Ok(())
    }

    fn ensure_can_load(&self) -> Result<()> {
        match self.state {
            GridState::Idle | GridState::Ready => Ok(()),
            busy => Err(GridError::Busy(busy)),
        }
    }

    fn require_table(&self) -> Result<&str> {
        self.table.as_deref().ok_or(GridError::NoTableSelected)
    }

    fn expect_state(&self, expected: GridState, event: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(GridError::UnexpectedEvent {
                event,
                state: self.state,
            })
        }
    }

    fn begin_load(&mut self) -> Result<PageRequest> {
        let table = self.require_table()?.to_string();
        self.state = GridState::Loading;
        Ok(PageRequest {
            table,
            window: self.window,
        })
    }
}
