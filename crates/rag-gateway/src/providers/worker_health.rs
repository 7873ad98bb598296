//! Worker pool reachability probe
//!
//! Purely informational: a failed probe is logged and never gates startup,
//! submission or status queries.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::WorkerConfig;
use crate::error::Result;

/// Outcome of a probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerHealth {
    pub reachable: bool,
    pub detail: String,
}

/// Trait for checking the worker pool out-of-band
#[async_trait]
pub trait WorkerHealthProvider: Send + Sync {
    /// Probe the worker pool
    async fn check(&self) -> Result<WorkerHealth>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// HTTP GET against the worker's health endpoint
pub struct HttpWorkerProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpWorkerProbe {
    /// Create a probe for `url`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Create from config; `None` when no health URL is configured
    pub fn from_config(config: &WorkerConfig) -> Result<Option<Self>> {
        config
            .health_url
            .as_ref()
            .map(|url| Self::new(url.clone(), Duration::from_millis(config.timeout_ms)))
            .transpose()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WorkerHealthProvider for HttpWorkerProbe {
    async fn check(&self) -> Result<WorkerHealth> {
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        Ok(WorkerHealth {
            reachable: status.is_success(),
            detail: format!("HTTP {}", status),
        })
    }

    fn name(&self) -> &str {
        "http-worker-probe"
    }
}

/// Run a probe and log the outcome
///
/// Returns whether the worker looked reachable.
pub async fn log_worker_health(probe: &dyn WorkerHealthProvider) -> bool {
    match probe.check().await {
        Ok(health) if health.reachable => {
            tracing::info!(probe = probe.name(), detail = %health.detail, "Worker connection verified");
            true
        }
        Ok(health) => {
            tracing::warn!(
                probe = probe.name(),
                detail = %health.detail,
                "Worker health check failed (expected if not running yet)"
            );
            false
        }
        Err(e) => {
            tracing::warn!(
                probe = probe.name(),
                error = %e,
                "Worker health check failed (expected if not running yet)"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct StaticProbe(Option<bool>);

    #[async_trait]
    impl WorkerHealthProvider for StaticProbe {
        async fn check(&self) -> Result<WorkerHealth> {
            match self.0 {
                Some(reachable) => Ok(WorkerHealth {
                    reachable,
                    detail: "static".to_string(),
                }),
                None => Err(Error::internal("connection refused")),
            }
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    #[tokio::test]
    async fn test_probe_outcomes() {
        assert!(log_worker_health(&StaticProbe(Some(true))).await);
        assert!(!log_worker_health(&StaticProbe(Some(false))).await);
        assert!(!log_worker_health(&StaticProbe(None)).await);
    }

    #[test]
    fn test_probe_disabled_without_url() {
        let config = WorkerConfig {
            health_url: None,
            timeout_ms: 100,
        };
        assert!(HttpWorkerProbe::from_config(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_worker_is_an_error_not_a_panic() {
        // Reserve a free port, then release it so nothing is listening there
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe =
            HttpWorkerProbe::new(format!("http://{}/health", addr), Duration::from_millis(500))
                .unwrap();
        assert!(!log_worker_health(&probe).await);
    }
}
