//! Route table.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the application router.
///
/// | Method | Path               | Handler                       |
/// |--------|--------------------|-------------------------------|
/// | GET    | `/health`          | [`handlers::health`]          |
/// | GET    | `/schema`          | [`handlers::get_schema`]      |
/// | GET    | `/tables/{table}`  | [`handlers::get_table`]       |
/// | POST   | `/tables/{table}`  | [`handlers::update_table`]    |
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/schema", get(handlers::get_schema))
        .route(
            "/tables/{table}",
            get(handlers::get_table).post(handlers::update_table),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
