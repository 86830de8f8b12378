//! Table metadata, rows and wire payloads.
//!
//! These types are shared by the SQLite backend, the HTTP surface and the
//! grid state machine. Their serde representation is the JSON contract
//! served to clients.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::value::{CellValue, RowId};

/// Reserved name for SQLite's implicit row identifier.
///
/// Used both as the `primaryKey` sentinel in [`TableMeta`] and as the field
/// carrying the rowid on each [`Row`] of a table without a declared key.
pub const ROWID_FIELD: &str = "__rowid__";

/// Page size used when the caller does not supply one.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Largest page a single read may return.
pub const MAX_PAGE_LIMIT: u32 = 500;

/// One column of a table, as reported by `pragma_table_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Zero-based ordinal position.
    pub cid: i64,
    /// Column name.
    pub name: String,
    /// Declared type affinity; empty when none was declared.
    #[serde(rename = "type")]
    pub decl_type: String,
    /// Whether the column is declared `NOT NULL`.
    #[serde(rename = "notnull")]
    pub not_null: bool,
    /// Default value expression as declared, if any.
    #[serde(rename = "dflt_value")]
    pub default_value: Option<String>,
    /// Position within the primary key (0 when not part of it).
    pub pk: i64,
}

/// How rows of a table are addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// The first primary-key column.
    Column(String),
    /// SQLite's implicit rowid.
    RowId,
}

impl Identity {
    /// Picks the identity for a column set: the column with primary-key
    /// rank 1, or the implicit rowid when there is none.
    pub fn resolve(columns: &[ColumnDescriptor]) -> Self {
        columns
            .iter()
            .find(|c| c.pk == 1)
            .map_or(Identity::RowId, |c| Identity::Column(c.name.clone()))
    }

    /// Name reported as `primaryKey` ([`ROWID_FIELD`] for the rowid).
    pub fn key_name(&self) -> &str {
        match self {
            Identity::Column(name) => name,
            Identity::RowId => ROWID_FIELD,
        }
    }

    /// Returns `true` when the implicit rowid is in use.
    pub fn uses_row_id(&self) -> bool {
        matches!(self, Identity::RowId)
    }
}

/// Result of describing a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    /// Table name as supplied by the caller.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDescriptor>,
    /// Resolved row identity.
    pub identity: Identity,
    /// Row count at describe time.
    pub row_count: u64,
}

impl TableInfo {
    /// Looks up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns `true` if `name` is the identity column.
    pub fn is_identity(&self, name: &str) -> bool {
        matches!(&self.identity, Identity::Column(id) if id == name)
    }

    /// Affinity used to normalize row keys.
    ///
    /// The implicit rowid is always an integer.
    pub fn identity_affinity(&self) -> &str {
        match &self.identity {
            Identity::Column(name) => self.column(name).map_or("", |c| c.decl_type.as_str()),
            Identity::RowId => "INTEGER",
        }
    }

    /// Primary-key columns ordered by key position.
    pub fn key_columns(&self) -> Vec<&ColumnDescriptor> {
        let mut keys: Vec<_> = self.columns.iter().filter(|c| c.pk > 0).collect();
        keys.sort_by_key(|c| c.pk);
        keys
    }

    /// Combines this description with a page window into [`TableMeta`].
    pub fn into_meta(self, window: PageWindow) -> TableMeta {
        TableMeta {
            primary_key: self.identity.key_name().to_string(),
            uses_row_id: self.identity.uses_row_id(),
            columns: self.columns,
            row_count: self.row_count,
            limit: window.limit,
            offset: window.offset,
        }
    }
}

/// Metadata returned alongside a page of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMeta {
    pub columns: Vec<ColumnDescriptor>,
    /// Identity column name, or [`ROWID_FIELD`].
    pub primary_key: String,
    pub uses_row_id: bool,
    pub row_count: u64,
    pub limit: u32,
    pub offset: u64,
}

impl TableMeta {
    /// Name of the identity column, or `None` when rows are addressed by
    /// the implicit rowid.
    pub fn identity_column(&self) -> Option<&str> {
        (!self.uses_row_id).then_some(self.primary_key.as_str())
    }

    /// Looks up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A clamped pagination window.
///
/// # Examples
///
/// ```
/// use table_browser_core::PageWindow;
///
/// let w = PageWindow::clamped(Some(10_000), Some(-4));
/// assert_eq!((w.limit, w.offset), (500, 0));
///
/// let w = PageWindow::clamped(None, None);
/// assert_eq!((w.limit, w.offset), (50, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u64,
}

impl PageWindow {
    /// Clamps caller-supplied values: limit into `[1, 500]`, offset to `>= 0`.
    pub fn clamped(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = limit
            .unwrap_or(i64::from(DEFAULT_PAGE_LIMIT))
            .clamp(1, i64::from(MAX_PAGE_LIMIT));
        let offset = offset.unwrap_or(0).max(0);
        Self {
            limit: limit as u32,
            offset: offset as u64,
        }
    }

    /// Window immediately after this one.
    pub fn next(self) -> Self {
        Self {
            offset: self.offset + u64::from(self.limit),
            ..self
        }
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::clamped(None, None)
    }
}

/// One row of a page.
///
/// Serializes as a JSON object with cells in column order, followed by
/// [`ROWID_FIELD`] when the table is addressed by rowid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub cells: Vec<(String, CellValue)>,
    pub rowid: Option<i64>,
}

impl Row {
    /// Returns the value of `column`, if present.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(name, _)| name == column).map(|(_, v)| v)
    }

    /// Identifier of this row under the given metadata.
    pub fn row_id(&self, meta: &TableMeta) -> Option<RowId> {
        match meta.identity_column() {
            Some(column) => self.get(column).and_then(RowId::from_cell),
            None => self.rowid.map(RowId::Integer),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.cells.len() + usize::from(self.rowid.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        if let Some(rowid) = self.rowid {
            map.serialize_entry(ROWID_FIELD, &rowid)?;
        }
        map.end()
    }
}

/// A page of rows with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub meta: TableMeta,
    pub rows: Vec<Row>,
}

/// Response body of the schema listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableList {
    pub tables: Vec<String>,
}

/// A single row edit: the row key plus the columns to overwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowEdit {
    pub key: CellValue,
    #[serde(default)]
    pub data: BTreeMap<String, CellValue>,
}

/// Request body of a batched update.
///
/// # Examples
///
/// ```
/// use table_browser_core::{BatchRequest, CellValue};
///
/// let body = r#"{"updates": [{"key": 3, "data": {"name": "Acme", "active": true}}]}"#;
/// let batch: BatchRequest = serde_json::from_str(body).unwrap();
/// assert_eq!(batch.updates[0].key, CellValue::Integer(3));
/// assert_eq!(batch.updates[0].data["active"], CellValue::Integer(1));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchRequest {
    pub updates: Vec<RowEdit>,
}

/// Response body of a batched update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub updated: usize,
}
