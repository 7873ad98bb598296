//! Application state for the gateway server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::{GatewayConfig, QueueBackend, StatusBackend};
use crate::error::{Error, Result};
use crate::processing::{StatusQueryService, SubmissionCoordinator, SubmissionPolicy};
use crate::providers::{
    JobQueueProvider, LocalUploadStore, MemoryJobQueue, MemoryStatusStore, StatusKeyspace,
    StatusStoreProvider, UploadStoreProvider,
};

/// Collaborator handles, opened once at startup
#[derive(Clone)]
pub struct Providers {
    pub status_store: Arc<dyn StatusStoreProvider>,
    pub job_queue: Arc<dyn JobQueueProvider>,
    pub upload_store: Arc<dyn UploadStoreProvider>,
}

impl Providers {
    /// Build the backends selected in config
    pub async fn from_config(config: &GatewayConfig) -> Result<Self> {
        let status_store: Arc<dyn StatusStoreProvider> = match config.status_store.backend {
            StatusBackend::Memory => {
                tracing::warn!("Using in-memory status store (state is lost on restart)");
                Arc::new(MemoryStatusStore::new())
            }
            StatusBackend::Redis => {
                #[cfg(feature = "redis")]
                {
                    Arc::new(
                        crate::providers::RedisStatusStore::connect(&config.status_store.redis_url)
                            .await?,
                    )
                }
                #[cfg(not(feature = "redis"))]
                {
                    return Err(Error::Config(
                        "Redis status store selected but redis feature is not enabled. \
                         Rebuild with --features redis"
                            .to_string(),
                    ));
                }
            }
        };

        let job_queue: Arc<dyn JobQueueProvider> = match config.job_queue.backend {
            QueueBackend::Memory => {
                tracing::warn!("Using in-memory job queue (no external worker can consume it)");
                Arc::new(MemoryJobQueue::from_config(&config.job_queue))
            }
            QueueBackend::Kafka => {
                #[cfg(feature = "kafka")]
                {
                    Arc::new(crate::providers::KafkaJobQueue::from_config(&config.job_queue)?)
                }
                #[cfg(not(feature = "kafka"))]
                {
                    return Err(Error::Config(
                        "Kafka job queue selected but kafka feature is not enabled. \
                         Rebuild with --features kafka"
                            .to_string(),
                    ));
                }
            }
        };

        let upload_store = Arc::new(LocalUploadStore::new(config.storage.upload_dir.clone())?);

        tracing::info!(
            "Providers initialized (status: {}, queue: {}, uploads: {})",
            status_store.name(),
            job_queue.name(),
            upload_store.name()
        );

        Ok(Self {
            status_store,
            job_queue,
            upload_store,
        })
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: GatewayConfig,
    /// Write path
    coordinator: SubmissionCoordinator,
    /// Read path
    status_query: StatusQueryService,
    /// Kept for health checks and shutdown
    providers: Providers,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create application state, connecting to the configured backends
    ///
    /// Fails if the status store is unreachable: without it no submission can
    /// be accepted safely.
    pub async fn new(config: GatewayConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!("Initializing gateway state...");

        let providers = Providers::from_config(&config).await?;

        match providers.status_store.health_check().await {
            Ok(true) => tracing::info!("Status store reachable ({})", providers.status_store.name()),
            Ok(false) => {
                return Err(Error::status_store(format!(
                    "{} did not answer its health check",
                    providers.status_store.name()
                )))
            }
            Err(e) => {
                tracing::error!("Failed to connect to status store: {}", e);
                return Err(e);
            }
        }

        Ok(Self::with_providers(config, providers))
    }

    /// Create application state around already-open providers
    pub fn with_providers(config: GatewayConfig, providers: Providers) -> Self {
        let keyspace = StatusKeyspace::new(config.status_store.key_prefix.clone());

        let coordinator = SubmissionCoordinator::new(
            Arc::clone(&providers.status_store),
            Arc::clone(&providers.job_queue),
            Arc::clone(&providers.upload_store),
            keyspace.clone(),
            SubmissionPolicy::from_config(&config),
        );

        let status_query = StatusQueryService::new(
            Arc::clone(&providers.status_store),
            keyspace,
            config.status_store.timeout(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                coordinator,
                status_query,
                providers,
                ready: RwLock::new(true),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Get submission coordinator
    pub fn coordinator(&self) -> &SubmissionCoordinator {
        &self.inner.coordinator
    }

    /// Get status query service
    pub fn status_query(&self) -> &StatusQueryService {
        &self.inner.status_query
    }

    /// Get providers
    pub fn providers(&self) -> &Providers {
        &self.inner.providers
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }

    /// Flush the queue once the server has drained
    ///
    /// Readiness is normally already cleared by the shutdown signal; it is
    /// cleared again here for callers that stop without one.
    pub async fn shutdown(&self) {
        self.set_ready(false);
        match self.inner.providers.job_queue.flush().await {
            Ok(()) => tracing::info!("Job queue flushed"),
            Err(e) => tracing::error!("Failed to flush job queue: {}", e),
        }
    }
}
