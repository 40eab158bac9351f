pub mod utils;

use std::time::Duration;

use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::http_server;
use crate::{AppConfig, ServiceState};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Initialize logging, panic handler, and build info reporting.
/// The returned guard must be kept alive for the duration of the program.
fn init_logging(config: &AppConfig) -> tracing_appender::non_blocking::WorkerGuard {
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    let env_filter = EnvFilter::builder()
        .with_default_directive(config.tracing_level().into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stdout_layer).init();

    utils::register_panic_logger();
    utils::report_build_info();

    stdout_guard
}

/// Runs the console API until SIGINT/SIGTERM.
pub async fn spawn_service(config: &AppConfig) -> Result<(), ServiceError> {
    let _guard = init_logging(config);

    let state = ServiceState::from_config(config).map_err(|e| {
        tracing::error!("error creating server state: {}", e);
        ServiceError::State(e)
    })?;

    let (graceful_waiter, _shutdown_tx, shutdown_rx) = utils::graceful_shutdown_blocker()?;

    let api_config = http_server::Config::new(config.listen_addr, config.tracing_level());
    let api_handle = tokio::spawn(async move {
        if let Err(e) = http_server::run_api(api_config, state, shutdown_rx).await {
            tracing::error!("API server error: {}", e);
        }
    });

    tracing::info!("Running: console API on {}", config.listen_addr);

    let _ = graceful_waiter.await;
    if timeout(FINAL_SHUTDOWN_TIMEOUT, api_handle).await.is_err() {
        tracing::error!(
            "Failed to shut down within {} seconds",
            FINAL_SHUTDOWN_TIMEOUT.as_secs()
        );
        return Err(ServiceError::ShutdownTimeout);
    }

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    State(#[from] crate::service_state::StateSetupError),
    #[error("failed to install signal handlers: {0}")]
    Signals(#[from] std::io::Error),
    #[error("failed to shut down within {} seconds", FINAL_SHUTDOWN_TIMEOUT.as_secs())]
    ShutdownTimeout,
}
