//! Pulse Server
//!
//! Thin HTTP surface over the issue & inbox engine: read views and action
//! endpoints, plus the background sweep worker on its own store
//! connection.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::ServerConfig;
use handlers::{create_router, AppState};
use pulse_detect::default_detectors;
use pulse_engine::SweepWorker;
use pulse_store::SqliteStore;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tracing::info;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Storage error
    #[error("Storage error: {0}")]
    Store(String),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Start the HTTP server and the background sweep worker
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Pulse server");
    info!("Bind address: {}", config.bind_addr());
    info!("Database: {}", config.database_path);
    info!("Governance mode: {}", config.engine.mode.as_str());

    let store = SqliteStore::new(&config.database_path)
        .map_err(|e| ServerError::Store(e.to_string()))?;

    let state = AppState {
        store: Arc::new(Mutex::new(store)),
        config: config.engine.clone(),
    };

    // The sweep worker runs on its own connection; WAL mode serializes
    // the writers
    let worker_store = SqliteStore::new(&config.database_path)
        .map_err(|e| ServerError::Store(e.to_string()))?;
    let engine_config = config.engine.clone();
    tokio::spawn(async move {
        let detectors = default_detectors(engine_config.unanswered_threshold_days);
        let mut worker = SweepWorker::new(engine_config);
        if let Err(e) = worker.run(worker_store, detectors).await {
            tracing::error!("Sweep worker exited: {}", e);
        }
    });

    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Pulse server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
