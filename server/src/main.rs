//! lexpipe HTTP server.
//!
//! Usage: `lexpipe-server [config.json]`. Without an argument the config is
//! taken from `LEXPIPE_CONFIG` or the per-user config directory, falling back
//! to defaults when no file exists.

mod api;

use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use lexpipe::storage::ensure_directory;
use lexpipe::{
    load_or_default, resolve_config_path, Config, HeuristicAnalyzer, LexpipeError,
    LocalExtractor, ProcessingService,
};

use api::{api_router, AppState};

#[tokio::main]
async fn main() {
    let explicit = std::env::args().nth(1);
    let config_path = resolve_config_path(explicit.as_deref());

    let config = match load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    lexpipe::telemetry::init_tracing(config.log_format);
    info!("Starting lexpipe server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), ServerError> {
    for dir in [
        &config.upload_directory,
        &config.temp_directory,
        &config.output_directory,
    ] {
        ensure_directory(Path::new(dir))
            .await
            .map_err(LexpipeError::from)?;
    }

    let service = Arc::new(ProcessingService::new(
        &config,
        Arc::new(LocalExtractor::new()),
        Arc::new(HeuristicAnalyzer::new()),
    )?);
    let app = api_router(AppState::new(Arc::clone(&service), &config));

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .map_err(|source| ServerError::Bind {
            address: config.bind_address.clone(),
            source,
        })?;
    info!(
        address = %config.bind_address,
        workers = config.worker_count,
        "Listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("Stopping workers");
    service.shutdown().await.map_err(LexpipeError::from)?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[derive(Debug, thiserror::Error)]
enum ServerError {
    #[error(transparent)]
    Lexpipe(#[from] LexpipeError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server failed: {0}")]
    Serve(std::io::Error),
}
