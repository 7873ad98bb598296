//! HTTP server for the gateway

pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::providers::worker_health::{log_worker_health, HttpWorkerProbe};
use state::AppState;

/// Gateway HTTP server
pub struct GatewayServer {
    config: GatewayConfig,
    state: AppState,
}

impl GatewayServer {
    /// Create a new server, connecting to the configured backends
    pub async fn new(config: GatewayConfig) -> Result<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Create around an existing state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Start the server, running until SIGINT/SIGTERM
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        self.probe_worker().await;

        let router = self.router();

        tracing::info!("Starting gateway on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        let drain = drain_on(
            self.state.clone(),
            shutdown_signal(),
            self.config.server.shutdown_grace(),
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(drain)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        self.state.shutdown().await;
        tracing::info!("Gateway stopped");

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }

    /// One-shot worker reachability check; never fatal
    async fn probe_worker(&self) {
        match HttpWorkerProbe::from_config(&self.config.worker) {
            Ok(Some(probe)) => {
                tracing::info!("Checking worker at {}...", probe.url());
                log_worker_health(&probe).await;
            }
            Ok(None) => tracing::info!("Worker health probe disabled"),
            Err(e) => tracing::warn!("Could not build worker health probe: {}", e),
        }
    }
}

/// Router over a given state (also used by tests)
pub fn build_router(state: AppState) -> Router {
    let config = state.config().server.clone();

    let mut router = Router::new()
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .merge(routes::job_routes(config.max_upload_size))
        .nest("/api", routes::api_routes())
        .with_state(state)
        // Middleware layers (order matters - applied bottom to top)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(state: axum::extract::State<AppState>) -> axum::http::StatusCode {
    if state.is_ready() {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Waits for `signal`, marks the gateway not ready, then keeps the listener
/// open for `grace` so load balancers observe the 503 before connections stop
pub async fn drain_on<F>(state: AppState, signal: F, grace: Duration)
where
    F: Future<Output = ()>,
{
    signal.await;
    state.set_ready(false);
    tracing::info!("Readiness cleared, draining for {:?}", grace);
    tokio::time::sleep(grace).await;
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, initiating graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
