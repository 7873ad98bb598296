//! Status store provider trait: the client-facing job scoreboard

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;
use crate::types::JobId;

/// Key-value store with per-key expiry
///
/// Implementations:
/// - `MemoryStatusStore`: in-process map on the tokio clock
/// - `RedisStatusStore`: Redis `SET PX` / `GET`
///
/// There is no transactional coupling to the job queue; ordering between the
/// two is the caller's job.
#[async_trait]
pub trait StatusStoreProvider: Send + Sync {
    /// Write `value` under `key`, replacing any previous value and expiry
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Read `key`; `None` when never written or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Check if the store is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Maps job ids to status store keys
#[derive(Debug, Clone)]
pub struct StatusKeyspace {
    prefix: String,
}

impl StatusKeyspace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, job_id: &JobId) -> String {
        self.key_for(job_id.as_str())
    }

    /// Key for an identifier that came from a client
    pub fn key_for(&self, raw_id: &str) -> String {
        format!("{}{}", self.prefix, raw_id)
    }
}

impl Default for StatusKeyspace {
    fn default() -> Self {
        Self::new("job:")
    }
}
