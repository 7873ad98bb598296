//! Configuration for the gateway

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Status store (job scoreboard) configuration
    pub status_store: StatusStoreConfig,
    /// Job queue configuration
    pub job_queue: JobQueueConfig,
    /// Upload storage configuration
    pub storage: StorageConfig,
    /// Worker health probe configuration
    pub worker: WorkerConfig,
}

impl GatewayConfig {
    /// Load from a TOML file; missing sections fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("GATEWAY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("GATEWAY_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("GATEWAY_PORT is not a port: {}", port)))?;
        }
        if let Some(url) = lookup("REDIS_URL") {
            self.status_store.redis_url = url;
        }
        if let Some(brokers) = lookup("KAFKA_BROKERS") {
            self.job_queue.brokers = brokers;
        }
        if let Some(topic) = lookup("KAFKA_TOPIC") {
            self.job_queue.topic = topic;
        }
        if let Some(url) = lookup("WORKER_HEALTH_URL") {
            self.worker.health_url = if url.is_empty() { None } else { Some(url) };
        }
        if let Some(dir) = lookup("UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Reject values that would make the service misbehave silently
    pub fn validate(&self) -> Result<()> {
        if self.status_store.ttl_secs == 0 {
            return Err(Error::Config("status_store.ttl_secs must be > 0".to_string()));
        }
        if self.status_store.key_prefix.is_empty() {
            return Err(Error::Config("status_store.key_prefix must not be empty".to_string()));
        }
        if self.job_queue.partitions == 0 {
            return Err(Error::Config("job_queue.partitions must be > 0".to_string()));
        }
        if self.job_queue.topic.is_empty() {
            return Err(Error::Config("job_queue.topic must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
    /// How long `/ready` reports 503 before the listener closes on shutdown
    pub shutdown_grace_ms: u64,
}

impl ServerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
            shutdown_grace_ms: 1_000,
        }
    }
}

/// Status store backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusBackend {
    /// In-process map (single node, lost on restart)
    #[default]
    Memory,
    /// Redis (requires the `redis` feature)
    Redis,
}

/// Status store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusStoreConfig {
    pub backend: StatusBackend,
    /// Redis connection URL
    pub redis_url: String,
    /// Namespace prefix for status keys
    pub key_prefix: String,
    /// Lifetime of a status entry (default: 24 hours)
    pub ttl_secs: u64,
    /// Bound on a single read or write
    pub timeout_ms: u64,
}

impl StatusStoreConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StatusStoreConfig {
    fn default() -> Self {
        Self {
            backend: StatusBackend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "job:".to_string(),
            ttl_secs: 24 * 60 * 60,
            timeout_ms: 2_000,
        }
    }
}

/// Job queue backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    /// In-process partitioned log
    #[default]
    Memory,
    /// Kafka (requires the `kafka` feature)
    Kafka,
}

/// Job queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobQueueConfig {
    pub backend: QueueBackend,
    /// Comma-separated Kafka bootstrap servers
    pub brokers: String,
    /// Topic that workers consume
    pub topic: String,
    /// Bound on a single append, including broker acknowledgement
    pub enqueue_timeout_ms: u64,
    /// Partition count for the memory backend
    pub partitions: usize,
    /// Per-partition capacity for the memory backend
    pub partition_capacity: usize,
}

impl JobQueueConfig {
    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_millis(self.enqueue_timeout_ms)
    }
}

impl Default for JobQueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::Memory,
            brokers: "localhost:9092".to_string(),
            topic: "pdf-processing".to_string(),
            enqueue_timeout_ms: 10_000,
            partitions: 8,
            partition_capacity: 10_000,
        }
    }
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory uploaded files are written to (must be readable by workers)
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: std::env::temp_dir(),
        }
    }
}

/// Worker health probe configuration
///
/// The probe speaks plain HTTP. Point it at an HTTP health endpoint exposed
/// by the worker pool (or its sidecar), not at the workers' gRPC port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// HTTP health endpoint of the worker pool; `None` (default) skips the probe
    pub health_url: Option<String>,
    /// Probe timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            health_url: None,
            timeout_ms: 2_000,
        }
    }
}
