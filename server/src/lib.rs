//! JSON over HTTP surface for the table browser.
//!
//! This crate provides an axum router exposing the SQLite backend:
//!
//! - `GET /schema` lists user tables
//! - `GET /tables/{table}?limit=&offset=` reads one ordered page
//! - `POST /tables/{table}` applies a batch of cell edits atomically
//! - `GET /health` answers without touching storage
//!
//! Errors are returned as `{"error": "<message>"}` with status 400 for
//! unusable input, 404 for unknown tables and 500 for storage failures.
//!
//! # Example
//!
//! ```no_run
//! use table_browser_server::{ServerConfig, run};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let config = ServerConfig::load("browser.yml").unwrap();
//!     run(config).await.unwrap();
//! }
//! ```

mod config;
mod error;
pub mod handlers;
mod routes;
mod state;

use std::future::Future;
use std::sync::Arc;

use table_browser_sqlite::Database;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use config::ServerConfig;
pub use error::{AppError, ErrorResponse, Result, ServerError};
pub use routes::router;
pub use state::AppState;

/// Serves `state` on `listener` until `shutdown` resolves.
///
/// In-flight requests are allowed to finish after the signal.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "HTTP server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

/// Opens the configured database, serves it until Ctrl-C, then closes it.
pub async fn run(config: ServerConfig) -> Result<()> {
    config.validate()?;
    let db = Arc::new(Database::open(&config.database, &config.store_options())?);
    let listener = TcpListener::bind(config.bind_addr()?).await?;

    serve(listener, AppState::new(Arc::clone(&db)), shutdown_signal()).await?;

    match Arc::try_unwrap(db) {
        Ok(db) => db.close()?,
        Err(_) => warn!("database still referenced at shutdown, skipping checkpoint"),
    }
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
