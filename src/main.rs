//! Itemcast Server - Entry Point
//!
//! Starts the API server and the WebSocket heartbeat with graceful shutdown support.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use itemcast::api::{ApiServer, AppState};
use itemcast::config::{LogConfig, StoreBackend};
use itemcast::realtime::{ConnectionPool, HeartbeatConfig, HeartbeatHandle, HeartbeatService};
use itemcast::repository::{ItemRepository, ItemStore, MemoryItemStore};
use itemcast::{Config, Database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;

    init_tracing(&config.log);
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Panic: {}", panic_info);
    }));

    info!("Starting Itemcast Server");
    info!(backend = config.store.backend.as_str(), "Configuration loaded");

    // Connect the item store
    let (store, db): (Arc<dyn ItemStore>, Option<Database>) = match config.store.backend {
        StoreBackend::Postgres => {
            let db = Database::connect(&config)
                .await
                .context("Failed to connect to database")?;
            let latency = db.health_check().await.context("Database health check failed")?;
            info!(latency_ms = latency.as_millis() as u64, "Connected to database");

            db.migrate()
                .await
                .context("Failed to run database migrations")?;

            let store: Arc<dyn ItemStore> = Arc::new(ItemRepository::new(db.clone()));
            (store, Some(db))
        }
        StoreBackend::Memory => {
            info!("Using in-memory item store, items are lost on restart");
            let store: Arc<dyn ItemStore> = Arc::new(MemoryItemStore::new());
            (store, None)
        }
    };

    let pool = Arc::new(ConnectionPool::new());

    // Create shutdown channel
    let (shutdown_tx, _) = watch::channel(false);

    // Start heartbeat
    let (heartbeat_handle, heartbeat_shutdown) = HeartbeatHandle::new();
    let heartbeat = HeartbeatService::new(
        pool.clone(),
        HeartbeatConfig {
            interval: config.realtime.heartbeat_interval(),
        },
    );
    let heartbeat_task = tokio::spawn(async move {
        heartbeat.run(heartbeat_shutdown).await;
    });

    // Create API server
    let state = AppState::new(store, pool.clone(), &config.realtime);
    let api_server = ApiServer::new(config.api.clone(), state);

    let api_shutdown = shutdown_tx.subscribe();
    let api_task = tokio::spawn(async move {
        if let Err(e) = api_server.run(api_shutdown).await {
            error!("API server error: {}", e);
        }
    });

    info!("Server running on {}", config.api_addr());

    // Wait for shutdown signal
    shutdown_signal().await;
    info!("Shutdown signal received");

    // Upgraded connections outlive graceful shutdown unless told to close
    let _ = shutdown_tx.send(true);
    pool.close_all();
    heartbeat_handle.shutdown();

    let _ = tokio::join!(api_task, heartbeat_task);

    if let Some(db) = db {
        db.close().await;
    }

    info!("Itemcast Server stopped");
    Ok(())
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins over `LOG_LEVEL` when set.
fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("itemcast={},tower_http=debug", log.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if log.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
