//! Paginated, ordered row reads.
//!
//! Pages are ordered by the primary key (identity column first, remaining
//! key columns as tie breakers) or by the implicit rowid, so consecutive
//! windows over an unchanged table never overlap or skip rows.

use rusqlite::{Connection, params};
use table_browser_core::{Identity, Page, PageWindow, Row, TableInfo};
use tracing::debug;

use crate::convert::cell_from_ref;
use crate::error::Result;
use crate::schema::{describe_table, identity_target, quote_ident};

/// Reads one page of `table`.
///
/// The window is expected to be clamped already; it is echoed back in the
/// page metadata.
pub(crate) fn read_page(conn: &Connection, table: &str, window: PageWindow) -> Result<Page> {
    let info = describe_table(conn, table)?;
    let sql = select_sql(&info)?;
    debug!(table, limit = window.limit, offset = window.offset, "reading page");

    let column_count = info.columns.len();
    let uses_row_id = info.identity.uses_row_id();
    let offset = i64::try_from(window.offset).unwrap_or(i64::MAX);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![window.limit, offset], |row| {
            let mut cells = Vec::with_capacity(column_count);
            for (idx, column) in info.columns.iter().enumerate() {
                cells.push((column.name.clone(), cell_from_ref(row.get_ref(idx)?)));
            }
            let rowid = if uses_row_id {
                Some(row.get::<_, i64>(column_count)?)
            } else {
                None
            };
            Ok(Row { cells, rowid })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Page {
        meta: info.into_meta(window),
        rows,
    })
}

fn select_sql(info: &TableInfo) -> Result<String> {
    let table = quote_ident(&info.name);
    let columns = info
        .columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = match &info.identity {
        Identity::RowId => {
            let rowid = identity_target(info)?;
            format!(
                "SELECT {columns}, {rowid} FROM {table} ORDER BY {rowid} ASC LIMIT ?1 OFFSET ?2"
            )
        }
        Identity::Column(_) => {
            let order = info
                .key_columns()
                .iter()
                .map(|c| format!("{} ASC", quote_ident(&c.name)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("SELECT {columns} FROM {table} ORDER BY {order} LIMIT ?1 OFFSET ?2")
        }
    };
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use table_browser_core::CellValue;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, price REAL);
            CREATE TABLE log (message, level TEXT);
            CREATE TABLE pairs (a INTEGER, b TEXT, PRIMARY KEY (b, a));
            INSERT INTO items VALUES (3, 'c', 3.5), (1, 'a', 1.0), (2, 'b', NULL);
            INSERT INTO log VALUES ('boot', 'info'), ('disk full', 'warn'), (x'cafe', NULL);
            INSERT INTO pairs VALUES (2, 'x'), (1, 'x'), (1, 'a');
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_rows_ordered_by_identity() {
        let conn = setup();
        let page = read_page(&conn, "items", PageWindow::clamped(None, None)).unwrap();
        let ids: Vec<_> = page.rows.iter().map(|r| r.get("id").cloned().unwrap()).collect();
        assert_eq!(
            ids,
            vec![CellValue::Integer(1), CellValue::Integer(2), CellValue::Integer(3)]
        );
        assert!(page.rows.iter().all(|r| r.rowid.is_none()));
        assert_eq!(page.rows[1].get("price"), Some(&CellValue::Null));
    }

    #[test]
    fn test_window_is_applied_and_echoed() {
        let conn = setup();
        let page = read_page(&conn, "items", PageWindow::clamped(Some(2), Some(1))).unwrap();
        assert_eq!(page.meta.limit, 2);
        assert_eq!(page.meta.offset, 1);
        assert_eq!(page.meta.row_count, 3);
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[0].get("name"), Some(&CellValue::from("b")));
    }

    #[test]
    fn test_offset_past_end_is_empty() {
        let conn = setup();
        let page = read_page(&conn, "items", PageWindow::clamped(Some(10), Some(50))).unwrap();
        assert!(page.rows.is_empty());
        assert_eq!(page.meta.row_count, 3);
    }

    #[test]
    fn test_rowid_table_carries_rowid() {
        let conn = setup();
        let page = read_page(&conn, "log", PageWindow::clamped(None, None)).unwrap();
        assert!(page.meta.uses_row_id);
        let rowids: Vec<_> = page.rows.iter().map(|r| r.rowid).collect();
        assert_eq!(rowids, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(page.rows[2].get("message"), Some(&CellValue::from("cafe")));
        assert_eq!(page.rows[2].cells.len(), 2);
    }

    #[test]
    fn test_composite_key_order_is_total() {
        let conn = setup();
        let page = read_page(&conn, "pairs", PageWindow::clamped(None, None)).unwrap();
        let keys: Vec<_> = page
            .rows
            .iter()
            .map(|r| (r.get("b").cloned().unwrap(), r.get("a").cloned().unwrap()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (CellValue::from("a"), CellValue::Integer(1)),
                (CellValue::from("x"), CellValue::Integer(1)),
                (CellValue::from("x"), CellValue::Integer(2)),
            ]
        );
    }
}
