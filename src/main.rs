use sre_toolkit::{
    api::{monitor, simulator},
    config::{Role, ServiceConfig},
    logging,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init_logger(config.role.as_str(), config.log_format) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    // Start the service based on role
    let outcome = match config.role {
        Role::Monitor => monitor::start_monitor(&config, shutdown).await,
        Role::Simulator => simulator::start_simulator(&config, shutdown).await,
    };

    if let Err(e) = outcome {
        error!("{} exited with error: {}", config.role.as_str(), e);
        std::process::exit(1);
    }
}

async fn shutdown_on_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}
