//! HTTP frontend for the pollen client
//!
//! Provides REST API endpoints for:
//! - Health checks
//! - The full pollen table and the name list
//! - Per-pollen totals and history graphs
//!
//! Each route maps to one client operation; an unknown pollen name becomes a
//! 404 and an upstream fetch failure becomes a 502.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::data::{PollenClient, PollenError, PollenRow};

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Response for the per-pollen total endpoint
#[derive(Debug, Serialize)]
struct TotalResponse {
    name: String,
    total: u32,
}

/// Response for the history graph URL endpoint
#[derive(Debug, Serialize)]
struct HistoryUrlResponse {
    name: String,
    url: String,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Wrapper translating client errors into HTTP responses
pub struct ApiError(PollenError);

impl From<PollenError> for ApiError {
    fn from(err: PollenError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            PollenError::NotFound(name) => {
                (StatusCode::NOT_FOUND, format!("Pollen '{name}' not found"))
            }
            err => (StatusCode::BAD_GATEWAY, format!("Upstream fetch failed: {err}")),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Build the HTTP router
pub fn build_router(client: Arc<PollenClient>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/pollen", get(table_handler))
        .route("/pollen/names", get(names_handler))
        .route("/pollen/{name}/total", get(total_handler))
        .route("/pollen/{name}/history/url", get(history_url_handler))
        .route("/pollen/{name}/history/image", get(history_image_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(client)
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns an error if the listener fails to bind or the server fails.
pub async fn run_server(client: Arc<PollenClient>, addr: SocketAddr) -> Result<()> {
    let app = build_router(client);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("pollenwacht listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn table_handler(
    State(client): State<Arc<PollenClient>>,
) -> Result<Json<Vec<PollenRow>>, ApiError> {
    Ok(Json(client.get_table().await?))
}

async fn names_handler(
    State(client): State<Arc<PollenClient>>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(client.list_names().await?))
}

async fn total_handler(
    State(client): State<Arc<PollenClient>>,
    Path(name): Path<String>,
) -> Result<Json<TotalResponse>, ApiError> {
    let total = client.get_total(&name).await?;
    Ok(Json(TotalResponse { name, total }))
}

async fn history_url_handler(
    State(client): State<Arc<PollenClient>>,
    Path(name): Path<String>,
) -> Result<Json<HistoryUrlResponse>, ApiError> {
    let url = client.get_history_graph_url(&name).await?;
    Ok(Json(HistoryUrlResponse { name, url }))
}

async fn history_image_handler(
    State(client): State<Arc<PollenClient>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let png = client.get_history_graph_png(&name).await?;

    let headers = [
        (header::CONTENT_TYPE, "image/png".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{name}.png\""),
        ),
    ];
    Ok((headers, png).into_response())
}
