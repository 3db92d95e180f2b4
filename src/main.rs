//! Task Tracker API server.
//!
//! Reads configuration from the environment (and an optional `.env` file),
//! selects a storage backend, and serves the HTTP API until SIGINT/SIGTERM.

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use task_tracker_api::api::{AppState, router};
use task_tracker_api::config::ServerConfig;
use task_tracker_api::infrastructure::{RepositoryConfig, RepositoryFactory};

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "task_tracker_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Configuration error: {}", error);
            std::process::exit(1);
        }
    };

    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    match config.worker_threads {
        Some(threads) => {
            builder.worker_threads(threads);
            tracing::info!("Tokio worker_threads set to: {}", threads);
        }
        None => tracing::info!("Tokio worker_threads: using default (logical CPU count)"),
    }

    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(error) => {
            tracing::error!(%error, "Failed to create tokio runtime");
            std::process::exit(1);
        }
    };
    runtime.block_on(serve(config));
}

async fn serve(config: ServerConfig) {
    tracing::info!("Starting Task Tracker API");

    let repository_config = match RepositoryConfig::from_env() {
        Ok(repository_config) => repository_config,
        Err(error) => {
            tracing::error!("Configuration error: {}", error);
            std::process::exit(1);
        }
    };

    tracing::info!(
        storage_mode = ?repository_config.storage_mode,
        max_connections = repository_config.max_connections,
        "Repository configuration loaded"
    );

    let task_repository = match RepositoryFactory::new(repository_config).create().await {
        Ok(repository) => {
            tracing::info!("Task repository initialized successfully");
            repository
        }
        Err(error) => {
            tracing::error!("Failed to initialize task repository: {}", error);
            std::process::exit(1);
        }
    };

    let application = router(AppState::from_repository(task_repository));

    let listener = match TcpListener::bind(config.address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "Failed to bind to address {}", config.address);
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(address) => tracing::info!("Listening on {}", address),
        Err(error) => tracing::warn!(%error, "Could not determine local address"),
    }

    if let Err(error) = axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

/// Completes when SIGINT (Ctrl+C) or, on Unix, SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
