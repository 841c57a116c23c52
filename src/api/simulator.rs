use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    api::{health, internal_metrics, serve, track_http},
    config::ServiceConfig,
    models::{SimulationConfig, SimulationResult},
    simulator::{HttpTarget, LoadGenerator, LoadSettings},
    Result,
};

/// Hands out cancellation tokens to running simulations. Cancelling
/// affects every run started before the call; later runs get a fresh token.
#[derive(Debug)]
pub struct RunRegistry {
    parent: CancellationToken,
    current: Mutex<CancellationToken>,
}

impl RunRegistry {
    pub fn new(parent: CancellationToken) -> Self {
        let current = parent.child_token();
        Self {
            parent,
            current: Mutex::new(current),
        }
    }

    pub fn begin(&self) -> CancellationToken {
        self.current.lock().child_token()
    }

    pub fn cancel_all(&self) {
        let mut current = self.current.lock();
        current.cancel();
        *current = self.parent.child_token();
    }
}

#[derive(Clone)]
pub struct SimulatorState {
    pub generator: Arc<LoadGenerator>,
    pub runs: Arc<RunRegistry>,
}

pub fn simulator_router(state: SimulatorState) -> Router {
    Router::new()
        .route("/simulate", post(simulate))
        .route("/simulate/cancel", post(cancel_simulations))
        .route("/health", get(health))
        .route("/internal/metrics", get(internal_metrics))
        .layer(middleware::from_fn(track_http))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs a full simulation inside the request. The body is decoded by hand
/// so every malformed payload is a 400 carrying the decoder's message.
async fn simulate(
    State(state): State<SimulatorState>,
    body: Bytes,
) -> Result<Json<SimulationResult>> {
    let config: SimulationConfig = serde_json::from_slice(&body)?;
    config.validate()?;

    info!(
        duration_min = config.duration,
        users_per_sec = config.users_per_sec,
        "Simulation requested"
    );
    let result = state.generator.run(&config, state.runs.begin()).await;
    Ok(Json(result))
}

async fn cancel_simulations(State(state): State<SimulatorState>) -> StatusCode {
    info!("Cancelling running simulations");
    state.runs.cancel_all();
    StatusCode::ACCEPTED
}

pub async fn start_simulator(config: &ServiceConfig, shutdown: CancellationToken) -> Result<()> {
    let target = HttpTarget::new(
        config.simulator.target_url.clone(),
        config.simulator.request_timeout,
    )?;
    let generator = LoadGenerator::new(Arc::new(target), LoadSettings::from(&config.simulator));

    let state = SimulatorState {
        generator: Arc::new(generator),
        runs: Arc::new(RunRegistry::new(shutdown.clone())),
    };

    info!(
        "Capacity planning simulator targeting {} on {}",
        config.simulator.target_url, config.addr
    );
    serve(config.addr, simulator_router(state), shutdown).await
}
