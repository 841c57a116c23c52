use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;
use crate::{Result, ToolkitError};

/// Sets up the logging subscriber for the application.
///
/// # Arguments
/// * `service` - Role of this process (monitor/simulator), recorded on startup
/// * `format` - Compact terminal output or one JSON object per line
pub fn init_logger(service: &str, format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), Level::INFO)));

    let registry = tracing_subscriber::registry().with(env_filter);

    let initialized = match format {
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_names(true)
                    .with_level(true)
                    .with_ansi(true)
                    .compact(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init(),
    };

    initialized.map_err(|e| ToolkitError::Internal(format!("Failed to initialize logger: {}", e)))?;

    tracing::info!(
        service,
        version = env!("CARGO_PKG_VERSION"),
        "logger initialized"
    );
    Ok(())
}
