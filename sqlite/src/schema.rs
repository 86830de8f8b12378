//! Runtime schema introspection.
//!
//! Lists user tables and describes a single table's columns, identity and
//! row count. Nothing is cached: every call re-reads `sqlite_master` and
//! `pragma_table_info` so the answer reflects the database at that moment.
//!
//! # Identifier safety
//!
//! SQLite cannot bind identifiers as parameters, so table names end up
//! interpolated into statements. Every caller-supplied table name must
//! pass [`validate_table_name`] before any statement is prepared, and all
//! interpolated identifiers are additionally quoted with [`quote_ident`].

use rusqlite::{Connection, params};
use table_browser_core::{ColumnDescriptor, Identity, TableInfo};
use tracing::{debug, warn};

use crate::error::{Result, SqliteError};

/// Validates that a table name contains only ASCII letters, digits and
/// underscores.
pub(crate) fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SqliteError::InvalidTableName(name.to_string()));
    }
    Ok(())
}

/// Quotes an identifier for interpolation into SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Picks a name for the implicit rowid that no declared column shadows.
///
/// SQLite accepts `rowid`, `_rowid_` and `oid` as aliases; a table may
/// declare ordinary columns with any of these names. When all three are
/// taken the rowid is unreachable.
pub(crate) fn rowid_alias(info: &TableInfo) -> Result<&'static str> {
    ["rowid", "_rowid_", "oid"]
        .into_iter()
        .find(|alias| !info.columns.iter().any(|c| c.name.eq_ignore_ascii_case(alias)))
        .ok_or_else(|| SqliteError::RowIdShadowed(info.name.clone()))
}

/// SQL expression that addresses a row: the quoted identity column or an
/// unshadowed rowid alias.
pub(crate) fn identity_target(info: &TableInfo) -> Result<String> {
    match &info.identity {
        Identity::Column(name) => Ok(quote_ident(name)),
        Identity::RowId => rowid_alias(info).map(str::to_string),
    }
}

/// Returns the names of all user tables, ordered by name.
///
/// Internal tables (`sqlite_` prefix) are excluded.
pub(crate) fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Describes a table: columns, identity and current row count.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidTableName`] before touching the database
/// if `name` fails the allow-list, and [`SqliteError::TableNotFound`] if no
/// user table of that name exists.
pub(crate) fn describe_table(conn: &Connection, name: &str) -> Result<TableInfo> {
    validate_table_name(name)?;

    if !table_exists(conn, name)? {
        return Err(SqliteError::TableNotFound(name.to_string()));
    }

    let mut stmt = conn.prepare(
        "SELECT cid, name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid",
    )?;
    let columns = stmt
        .query_map(params![name], |row| {
            Ok(ColumnDescriptor {
                cid: row.get(0)?,
                name: row.get(1)?,
                decl_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                not_null: row.get::<_, i64>(3)? != 0,
                default_value: row.get(4)?,
                pk: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let identity = Identity::resolve(&columns);
    let key_count = columns.iter().filter(|c| c.pk > 0).count();
    if key_count > 1 {
        warn!(
            table = name,
            identity = identity.key_name(),
            key_columns = key_count,
            "composite primary key: rows are addressed by the first key column only"
        );
    }

    let row_count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(name)),
        [],
        |row| row.get(0),
    )?;

    debug!(table = name, columns = columns.len(), row_count, "described table");

    let info = TableInfo {
        name: name.to_string(),
        columns,
        identity,
        row_count: row_count.max(0) as u64,
    };
    identity_target(&info)?;
    Ok(info)
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master \
         WHERE type = 'table' AND name = ?1 COLLATE NOCASE \
         AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
