use axum::{
    extract::State,
    middleware,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    api::{health, internal_metrics, serve, track_http},
    config::ServiceConfig,
    models::{Alert, Metric},
    monitor::{AlertEngine, AlertStore, MetricCollector, MetricStore},
    Result,
};

#[derive(Clone)]
pub struct MonitorState {
    pub metrics: Arc<MetricStore>,
    pub alerts: Arc<AlertStore>,
}

pub fn monitor_router(state: MonitorState) -> Router {
    Router::new()
        .route("/metrics", get(list_metrics))
        .route("/alerts", get(list_alerts))
        .route("/health", get(health))
        .route("/internal/metrics", get(internal_metrics))
        .layer(middleware::from_fn(track_http))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn list_metrics(State(state): State<MonitorState>) -> Json<Vec<Metric>> {
    Json(state.metrics.snapshot())
}

async fn list_alerts(State(state): State<MonitorState>) -> Json<Vec<Alert>> {
    Json(state.alerts.snapshot())
}

pub async fn start_monitor(config: &ServiceConfig, shutdown: CancellationToken) -> Result<()> {
    let metrics = Arc::new(MetricStore::new(config.monitor.metric_capacity));
    let alerts = Arc::new(AlertStore::new(config.monitor.alert_capacity));

    let engine = AlertEngine::new(alerts.clone());
    let collector = MetricCollector::new(metrics.clone(), engine, &config.monitor);
    let collector_handle = tokio::spawn(collector.run(shutdown.clone()));

    let state = MonitorState { metrics, alerts };
    info!("Starting SRE monitor on {}", config.addr);
    let served = serve(config.addr, monitor_router(state), shutdown.clone()).await;

    // Stop collecting even if the server failed to start.
    shutdown.cancel();
    if let Err(e) = collector_handle.await {
        warn!("Metric collector task ended abnormally: {}", e);
    }

    served
}
