//! API server using Axum

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::config::{ApiServerConfig, RealtimeConfig};
use crate::error::{AppError, Result};
use crate::realtime::{Broadcaster, ConnectionPool};
use crate::repository::ItemStore;

use super::middleware::{cors_layer, handle_panic};
use super::routes;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Item persistence
    pub store: Arc<dyn ItemStore>,
    /// Post-commit notification target for mutations
    pub broadcaster: Arc<dyn Broadcaster>,
    /// Live WebSocket connections
    pub pool: Arc<ConnectionPool>,
    /// Outbound frames buffered per WebSocket connection
    pub ws_buffer_size: usize,
    pub started_at: Instant,
}

impl AppState {
    /// State whose mutations are broadcast to the pool's own connections
    pub fn new(
        store: Arc<dyn ItemStore>,
        pool: Arc<ConnectionPool>,
        realtime: &RealtimeConfig,
    ) -> Self {
        Self {
            store,
            broadcaster: pool.clone(),
            pool,
            ws_buffer_size: realtime.buffer_size,
            started_at: Instant::now(),
        }
    }
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Build the router
    pub fn build_router(&self) -> Router {
        let cors = cors_layer(&self.config.cors_origins);

        routes::create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(handle_panic))
    }

    /// Bind the configured address and serve until shutdown
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                AppError::InvalidConfig(format!(
                    "Invalid API server address {}:{}",
                    self.config.host, self.config.port
                ))
            })?;

        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until shutdown
    #[instrument(skip_all)]
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let addr = listener.local_addr()?;
        let router = self.build_router();

        info!("API server listening on {}", addr);
        info!("WebSocket server is listening on the same port");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await?;

        info!("API server shut down");
        Ok(())
    }
}
