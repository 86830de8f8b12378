//! Atomic, type-aware batch edits.
//!
//! A batch is a list of [`RowEdit`]s against one table. Each edit becomes at
//! most one parameterized `UPDATE`; all of them run inside a single
//! `BEGIN IMMEDIATE` transaction, so a storage error on any edit leaves the
//! table exactly as it was.
//!
//! Per edit:
//!
//! - columns that do not exist, and the identity column itself, are dropped;
//! - an edit with nothing left is skipped;
//! - values and the row key are [normalized](table_browser_core::normalize)
//!   against their column's declared affinity (the rowid counts as
//!   `INTEGER`);
//! - the number of rows SQLite reports as changed is added to the total.
//!
//! An edit whose key matches no row changes nothing and is not an error.
//!
//! BLOB cells are read as hex text, which cannot be written back as the
//! original bytes. Every assignment therefore leaves a cell that currently
//! holds a BLOB untouched, so a full-row snapshot sent back by a client
//! never clobbers binary data.

use rusqlite::{Connection, Transaction, TransactionBehavior, params_from_iter};
use table_browser_core::{RowEdit, TableInfo, normalize};
use tracing::{debug, info};

use crate::convert::cell_to_sql;
use crate::error::Result;
use crate::schema::{describe_table, identity_target, quote_ident};

/// Applies `edits` to `table` atomically and returns the changed-row count.
pub(crate) fn apply_edits(conn: &Connection, table: &str, edits: &[RowEdit]) -> Result<usize> {
    let info = describe_table(conn, table)?;
    if edits.is_empty() {
        return Ok(0);
    }

    let target = identity_target(&info)?;
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let mut updated = 0usize;
    let mut skipped = 0usize;

    for edit in edits {
        let Some(statement) = UpdateStatement::build(&info, &target, edit) else {
            skipped += 1;
            continue;
        };
        let changed = tx.execute(&statement.sql, params_from_iter(statement.params.iter()))?;
        debug!(table, changed, sql = %statement.sql, "applied row edit");
        updated += changed;
    }

    tx.commit()?;
    info!(table, edits = edits.len(), skipped, updated, "committed batch");
    Ok(updated)
}

/// A prepared-for-execution `UPDATE` for one row.
struct UpdateStatement {
    sql: String,
    params: Vec<rusqlite::types::Value>,
}

impl UpdateStatement {
    /// Builds the statement for `edit`, or `None` if no editable column remains.
    ///
    /// `target` is the expression rows are addressed by.
    fn build(info: &TableInfo, target: &str, edit: &RowEdit) -> Option<Self> {
        let mut assignments = Vec::new();
        let mut params = Vec::new();

        for (name, value) in &edit.data {
            if info.is_identity(name) {
                continue;
            }
            let Some(column) = info.column(name) else {
                continue;
            };
            params.push(cell_to_sql(&normalize(value.clone(), &column.decl_type)));
            let name = quote_ident(&column.name);
            assignments.push(format!(
                "{name} = CASE WHEN typeof({name}) = 'blob' THEN {name} ELSE ?{} END",
                params.len()
            ));
        }

        if assignments.is_empty() {
            return None;
        }

        let key = normalize(edit.key.clone(), info.identity_affinity());
        params.push(cell_to_sql(&key));

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_ident(&info.name),
            assignments.join(", "),
            target,
            params.len()
        );
        Some(Self { sql, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use table_browser_core::CellValue;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE products (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                stock INTEGER,
                price REAL,
                discontinued BOOLEAN NOT NULL DEFAULT 0,
                notes
            );
            CREATE TABLE tags (label TEXT UNIQUE, weight INTEGER);
            INSERT INTO products (id, name, stock, price) VALUES
                ('p1', 'Cream', 5, 9.99),
                ('p2', 'Serum', 0, 19.5),
                ('p3', 'Toner', 12, 7.25);
            INSERT INTO tags VALUES ('a', 1), ('b', 2);
            "#,
        )
        .unwrap();
        conn
    }

    fn edit(key: impl Into<CellValue>, data: &[(&str, CellValue)]) -> RowEdit {
        RowEdit {
            key: key.into(),
            data: data
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn cell(conn: &Connection, sql: &str) -> CellValue {
        conn.query_row(sql, [], |row| Ok(crate::convert::cell_from_ref(row.get_ref(0)?)))
            .unwrap()
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let conn = setup();
        assert_eq!(apply_edits(&conn, "products", &[]).unwrap(), 0);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn test_normalizes_by_affinity() {
        let conn = setup();
        let edits = [edit(
            "p1",
            &[
                ("stock", CellValue::from(" 42 ")),
                ("price", CellValue::from("12.5")),
                ("discontinued", CellValue::from("yes")),
                ("notes", CellValue::from("")),
            ],
        )];
        assert_eq!(apply_edits(&conn, "products", &edits).unwrap(), 1);

        assert_eq!(cell(&conn, "SELECT stock FROM products WHERE id='p1'"), CellValue::Integer(42));
        assert_eq!(cell(&conn, "SELECT price FROM products WHERE id='p1'"), CellValue::Real(12.5));
        assert_eq!(
            cell(&conn, "SELECT discontinued FROM products WHERE id='p1'"),
            CellValue::Integer(1)
        );
        assert_eq!(cell(&conn, "SELECT notes FROM products WHERE id='p1'"), CellValue::from(""));
    }

    #[test]
    fn test_identity_and_unknown_columns_dropped() {
        let conn = setup();
        let edits = [
            edit("p1", &[("id", CellValue::from("x")), ("bogus", CellValue::from("1"))]),
            edit("p2", &[("id", CellValue::from("y")), ("name", CellValue::from("New"))]),
        ];
        assert_eq!(apply_edits(&conn, "products", &edits).unwrap(), 1);
        assert_eq!(cell(&conn, "SELECT COUNT(*) FROM products WHERE id IN ('x', 'y')"), CellValue::Integer(0));
        assert_eq!(cell(&conn, "SELECT name FROM products WHERE id='p2'"), CellValue::from("New"));
    }

    #[test]
    fn test_missing_key_is_not_an_error() {
        let conn = setup();
        let edits = [
            edit("p1", &[("stock", CellValue::from("1"))]),
            edit("nope", &[("stock", CellValue::from("2"))]),
            edit("p3", &[("stock", CellValue::from("3"))]),
        ];
        assert_eq!(apply_edits(&conn, "products", &edits).unwrap(), 2);
        assert_eq!(cell(&conn, "SELECT stock FROM products WHERE id='p3'"), CellValue::Integer(3));
    }

    #[test]
    fn test_constraint_violation_rolls_back_batch() {
        let conn = setup();
        let edits = [
            edit("p1", &[("stock", CellValue::from("100"))]),
            edit("p2", &[("name", CellValue::from("NULL"))]),
            edit("p3", &[("stock", CellValue::from("300"))]),
        ];
        assert!(apply_edits(&conn, "products", &edits).is_err());
        assert!(conn.is_autocommit());
        assert_eq!(cell(&conn, "SELECT stock FROM products WHERE id='p1'"), CellValue::Integer(5));
        assert_eq!(cell(&conn, "SELECT stock FROM products WHERE id='p3'"), CellValue::Integer(12));
    }

    #[test]
    fn test_rowid_table_keyed_by_rowid() {
        let conn = setup();
        let edits = [edit(CellValue::from(" 2 "), &[("weight", CellValue::from("20"))])];
        assert_eq!(apply_edits(&conn, "tags", &edits).unwrap(), 1);
        assert_eq!(cell(&conn, "SELECT weight FROM tags WHERE rowid = 2"), CellValue::Integer(20));
    }

    #[test]
    fn test_rowid_field_is_not_editable() {
        let conn = setup();
        let edits = [edit(1, &[("__rowid__", CellValue::Integer(50))])];
        assert_eq!(apply_edits(&conn, "tags", &edits).unwrap(), 0);
        assert_eq!(cell(&conn, "SELECT MAX(rowid) FROM tags"), CellValue::Integer(2));
    }

    #[test]
    fn test_unique_violation_on_rowid_table_rolls_back() {
        let conn = setup();
        let edits = [
            edit(1, &[("weight", CellValue::Integer(10))]),
            edit(2, &[("label", CellValue::from("a"))]),
        ];
        assert!(apply_edits(&conn, "tags", &edits).is_err());
        assert_eq!(cell(&conn, "SELECT weight FROM tags WHERE rowid = 1"), CellValue::Integer(1));
    }

    #[test]
    fn test_build_skips_edit_without_columns() {
        let conn = setup();
        let info = describe_table(&conn, "products").unwrap();
        let target = identity_target(&info).unwrap();
        assert!(UpdateStatement::build(&info, &target, &edit("p1", &[])).is_none());

        let stmt =
            UpdateStatement::build(&info, &target, &edit("p1", &[("name", CellValue::from("x"))]))
                .unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE \"products\" SET \"name\" = CASE WHEN typeof(\"name\") = 'blob' \
             THEN \"name\" ELSE ?1 END WHERE \"id\" = ?2"
        );
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn test_blob_cells_survive_snapshot_write_back() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE files (id INTEGER PRIMARY KEY, name TEXT, data BLOB);
             INSERT INTO files VALUES (1, 'a.bin', x'cafe'), (2, 'empty', NULL);",
        )
        .unwrap();

        let edits = [
            edit(1, &[("name", CellValue::from("b.bin")), ("data", CellValue::from("cafe"))]),
            edit(2, &[("data", CellValue::from("beef"))]),
        ];
        assert_eq!(apply_edits(&conn, "files", &edits).unwrap(), 2);

        let (kind, bytes): (String, Vec<u8>) = conn
            .query_row("SELECT typeof(data), data FROM files WHERE id = 1", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(kind, "blob");
        assert_eq!(bytes, vec![0xca, 0xfe]);
        assert_eq!(cell(&conn, "SELECT name FROM files WHERE id = 1"), CellValue::from("b.bin"));
        // Non-blob cells in a BLOB column stay editable.
        assert_eq!(cell(&conn, "SELECT data FROM files WHERE id = 2"), CellValue::from("beef"));
    }
}
