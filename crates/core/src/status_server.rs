//! Status HTTP server for batchform
//!
//! Exposes the batch snapshot via HTTP for progress watchers and scripts.

use axum::{extract::State, routing::get, Json, Router};
use std::net::SocketAddr;
use thiserror::Error;
use tracing::info;

use crate::progress::{BatchSnapshot, SharedBatchView};

/// Errors that can occur when running the status server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
}

/// Handler for GET /status endpoint
/// Returns the current BatchSnapshot as JSON
async fn get_status(State(view): State<SharedBatchView>) -> Json<BatchSnapshot> {
    let snapshot = view.read().await.clone();
    Json(snapshot)
}

/// Creates the axum Router with the status endpoint
pub fn create_status_router(view: SharedBatchView) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .with_state(view)
}

/// Runs the status HTTP server on 127.0.0.1 at the given port
///
/// # Arguments
/// * `view` - Shared batch view to serve
/// * `port` - TCP port to listen on
///
/// # Returns
/// * `Ok(())` if server shuts down gracefully
/// * `Err(ServerError)` if server fails to start
pub async fn run_status_server(view: SharedBatchView, port: u16) -> Result<(), ServerError> {
    let app = create_status_router(view);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "status server listening");
    axum::serve(listener, app)
        .await
        .map_err(ServerError::BindError)?;

    Ok(())
}
