//! Conversion between [`CellValue`] and SQLite values.
//!
//! Reads map SQLite storage classes one-to-one onto [`CellValue`]. BLOBs
//! have no counterpart in the value model and are projected as lowercase
//! hex text, which makes them visible in the grid but not round-trippable.

use std::fmt::Write;

use rusqlite::types::{Value, ValueRef};
use table_browser_core::CellValue;

/// Converts a borrowed SQLite value into a [`CellValue`].
pub(crate) fn cell_from_ref(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(v) => CellValue::Integer(v),
        ValueRef::Real(v) => CellValue::Real(v),
        ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Text(to_hex(bytes)),
    }
}

/// Converts a [`CellValue`] into an owned SQLite parameter.
pub(crate) fn cell_to_sql(value: &CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Integer(v) => Value::Integer(*v),
        CellValue::Real(v) => Value::Real(*v),
        CellValue::Text(v) => Value::Text(v.clone()),
    }
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}
