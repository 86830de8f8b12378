//! HTTP endpoint handlers.
//!
//! This module provides the request handlers for:
//! - `/health` - liveness check, no storage access
//! - `/schema` - list user tables
//! - `/tables/{table}` - read a page (GET) or apply a batch of edits (POST)
//!
//! Storage calls block, so each one runs on tokio's blocking pool.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use table_browser_core::{BatchRequest, BatchResponse, Page, PageWindow, TableList};
use tokio::task::spawn_blocking;

use crate::error::AppError;
use crate::state::AppState;

/// Query string for `GET /tables/{table}`.
///
/// Both values are optional and clamped, never rejected for range. An empty
/// value counts as absent and an integer too large for `i64` saturates.
/// Only text that is not an integer at all is a bad request.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PageParams {
    /// Resolves the requested window.
    pub fn window(&self) -> Result<PageWindow, AppError> {
        let limit = parse_window_value("limit", self.limit.as_deref())?;
        let offset = parse_window_value("offset", self.offset.as_deref())?;
        Ok(PageWindow::clamped(limit, offset))
    }
}

fn parse_window_value(name: &str, raw: Option<&str>) -> Result<Option<i64>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(Some(value));
    }

    let (negative, digits) = match raw.as_bytes()[0] {
        b'-' => (true, &raw[1..]),
        b'+' => (false, &raw[1..]),
        _ => (false, raw),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest(format!(
            "invalid {name}: expected an integer, got '{raw}'"
        )));
    }
    Ok(Some(if negative { i64::MIN } else { i64::MAX }))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
///
/// # Response
///
/// ```json
/// {"status": "ok"}
/// ```
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Lists the user tables.
///
/// # Response
///
/// ```json
/// {"tables": ["brands", "products"]}
/// ```
pub async fn get_schema(State(state): State<AppState>) -> Result<Json<TableList>, AppError> {
    let db = state.db();
    let tables = spawn_blocking(move || db.list_tables()).await??;
    Ok(Json(TableList { tables }))
}

/// Reads one page of a table.
///
/// `limit` is clamped to `[1, 500]` (default 50) and `offset` to `>= 0`.
/// The effective window is echoed in `meta`.
///
/// # Response
///
/// ```json
/// {
///   "meta": {"columns": [...], "primaryKey": "id", "usesRowId": false,
///            "rowCount": 120, "limit": 50, "offset": 0},
///   "rows": [{"id": "b1", "name": "Acme"}]
/// }
/// ```
pub async fn get_table(
    State(state): State<AppState>,
    Path(table): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Page>, AppError> {
    let Query(params) = params?;
    let window = params.window()?;
    let db = state.db();
    let page = spawn_blocking(move || db.read_page(&table, window)).await??;
    Ok(Json(page))
}

/// Applies a batch of row edits in one transaction.
///
/// # Request Body
///
/// ```json
/// {"updates": [{"key": "b1", "data": {"name": "Acme Corp"}}]}
/// ```
///
/// # Response
///
/// ```json
/// {"updated": 1}
/// ```
pub async fn update_table(
    State(state): State<AppState>,
    Path(table): Path<String>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, AppError> {
    let Json(request) = body?;
    let db = state.db();
    let updated = spawn_blocking(move || db.apply_edits(&table, &request.updates)).await??;
    Ok(Json(BatchResponse { updated }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<&str>, offset: Option<&str>) -> PageParams {
        PageParams {
            limit: limit.map(String::from),
            offset: offset.map(String::from),
        }
    }

    #[test]
    fn test_window_defaults_when_blank() {
        let window = params(Some(""), Some("  ")).window().unwrap();
        assert_eq!(window, PageWindow::clamped(None, None));
        assert_eq!(window.limit, 50);
        assert_eq!(window.offset, 0);
    }

    #[test]
    fn test_window_saturates_oversized_integers() {
        let window = params(Some("99999999999999999999"), Some("+99999999999999999999"))
            .window()
            .unwrap();
        assert_eq!(window.limit, 500);
        assert_eq!(window.offset, i64::MAX as u64);

        let window = params(Some("-99999999999999999999"), Some("-99999999999999999999"))
            .window()
            .unwrap();
        assert_eq!(window.limit, 1);
        assert_eq!(window.offset, 0);
    }

    #[test]
    fn test_window_rejects_non_integers() {
        for bad in ["lots", "1.5", "-", "12abc", "0x10"] {
            let err = params(Some(bad), None).window().unwrap_err();
            assert!(matches!(err, AppError::BadRequest(ref msg) if msg.contains("limit")), "{bad}");
        }
        assert!(params(None, Some("ten")).window().is_err());
    }
}
