pub mod monitor;
pub mod simulator;

use axum::{
    extract::{MatchedPath, Request},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{metrics, Result, ToolkitError};

/// Counts and times every request, labelled by route template.
pub async fn track_http(request: Request, next: Next) -> Response {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let timer = metrics::RequestTimer::new(request.method().as_str(), &path);

    let response = next.run(request).await;
    timer.finish(response.status().as_u16());
    response
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn internal_metrics() -> Result<impl IntoResponse> {
    let body = metrics::render()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

/// Serves `app` on `addr` until `shutdown` fires, then drains in-flight
/// requests.
pub async fn serve(addr: SocketAddr, app: Router, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ToolkitError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| ToolkitError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
