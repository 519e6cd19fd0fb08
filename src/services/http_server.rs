//! HTTP server for the review assigner.
//!
//! Wraps the API routes in an axum router with request tracing and a JSON
//! 404 fallback, and runs it until a cancellation token fires.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::services::http_api::{api_routes, ApiErr};
use axum::http::Uri;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Shared state for the axum routes.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
}

/// Build the full router over a database pool.
pub fn build_router(db: DbPool) -> Router {
    api_routes()
        .with_state(AppState { db })
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
}

/// Bind a TCP listener on `addr` (`host:port`).
pub async fn bind(addr: &str) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("[server] Listening on http://{}", listener.local_addr()?);
    Ok(listener)
}

/// Serve the API on `listener` until `cancel_token` is cancelled.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve(
    listener: TcpListener,
    db: DbPool,
    cancel_token: CancellationToken,
) -> std::io::Result<()> {
    let app = build_router(db);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            log::info!("[server] Shutdown requested");
        })
        .await?;

    log::info!("[server] Server stopped");
    Ok(())
}

/// Unmatched paths get a JSON 404 rather than an empty body.
async fn not_found(uri: Uri) -> ApiErr {
    ApiErr(AppError::not_found_with_id("Route", uri.path()))
}
