use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gomate_server::config::AppConfig;
use gomate_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gomate_server=info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if !config.transport.has_credentials() {
        warn!("TRANSPORTAPI_APP_ID/TRANSPORTAPI_APP_KEY not set; serving mock transport data");
    }

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to build application state");
            return ExitCode::FAILURE;
        }
    };

    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(
        addr = %config.bind,
        data_dir = %config.data_dir.display(),
        mock_fallback = config.transport.mock_fallback,
        "GoMate server listening"
    );

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
