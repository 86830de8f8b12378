//! Cell values and row identifiers.
//!
//! [`CellValue`] is the closed set of scalar kinds that flow between the
//! HTTP surface, the grid and SQLite. Anything arriving as JSON is mapped
//! onto it at the boundary, so downstream code matches exhaustively over
//! four variants instead of inspecting untyped JSON.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// A single scalar cell value.
///
/// Serializes to the natural JSON scalar (`null`, number or string).
/// Deserialization accepts any JSON scalar: booleans become
/// `Integer(1)` / `Integer(0)` the way SQLite stores them, and integers
/// that do not fit in an `i64` become `Real`. Arrays and objects are
/// rejected.
///
/// # Examples
///
/// ```
/// use table_browser_core::CellValue;
///
/// let v: CellValue = serde_json::from_str("true").unwrap();
/// assert_eq!(v, CellValue::Integer(1));
///
/// let v: CellValue = serde_json::from_str("\"hello\"").unwrap();
/// assert_eq!(v, CellValue::Text("hello".into()));
///
/// assert!(serde_json::from_str::<CellValue>("[1, 2]").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// SQL `NULL`.
    #[default]
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
}

impl CellValue {
    /// Returns `true` for [`CellValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Returns the text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short lowercase name of the value kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Integer(_) => "integer",
            CellValue::Real(_) => "real",
            CellValue::Text(_) => "text",
        }
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Real(v)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Integer(i64::from(v))
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Null, Into::into)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("NULL"),
            CellValue::Integer(v) => write!(f, "{v}"),
            CellValue::Real(v) => write!(f, "{v}"),
            CellValue::Text(v) => f.write_str(v),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Integer(v) => serializer.serialize_i64(*v),
            CellValue::Real(v) => serializer.serialize_f64(*v),
            CellValue::Text(v) => serializer.serialize_str(v),
        }
    }
}

struct CellValueVisitor;

impl<'de> Visitor<'de> for CellValueVisitor {
    type Value = CellValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar cell value (null, boolean, number or string)")
    }

    fn visit_unit<E: de::Error>(self) -> Result<CellValue, E> {
        Ok(CellValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<CellValue, E> {
        Ok(CellValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<CellValue, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<CellValue, E> {
        Ok(CellValue::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<CellValue, E> {
        Ok(CellValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<CellValue, E> {
        Ok(i64::try_from(v).map_or(CellValue::Real(v as f64), CellValue::Integer))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<CellValue, E> {
        Ok(CellValue::Real(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<CellValue, E> {
        Ok(CellValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<CellValue, E> {
        Ok(CellValue::Text(v))
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CellValueVisitor)
    }
}

/// Identifier of a row as seen by the client.
///
/// Either the value of the identity column or SQLite's implicit `rowid`.
/// Used as the key for pending edits so integer and text identifiers never
/// compare against each other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RowId {
    /// Integer identifier (integer key column or implicit rowid).
    Integer(i64),
    /// Text identifier.
    Text(String),
}

impl RowId {
    /// Derives a row identifier from an identity cell.
    ///
    /// Real-valued keys are carried as their decimal text; the server
    /// normalizes them back against the column affinity. `NULL` cannot
    /// address a row and yields `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use table_browser_core::{CellValue, RowId};
    ///
    /// assert_eq!(RowId::from_cell(&CellValue::Integer(7)), Some(RowId::Integer(7)));
    /// assert_eq!(RowId::from_cell(&CellValue::Null), None);
    /// ```
    pub fn from_cell(value: &CellValue) -> Option<Self> {
        match value {
            CellValue::Null => None,
            CellValue::Integer(v) => Some(RowId::Integer(*v)),
            CellValue::Real(v) => Some(RowId::Text(v.to_string())),
            CellValue::Text(v) => Some(RowId::Text(v.clone())),
        }
    }
}

impl From<RowId> for CellValue {
    fn from(id: RowId) -> Self {
        match id {
            RowId::Integer(v) => CellValue::Integer(v),
            RowId::Text(v) => CellValue::Text(v),
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Integer(v) => write!(f, "{v}"),
            RowId::Text(v) => f.write_str(v),
        }
    }
}
