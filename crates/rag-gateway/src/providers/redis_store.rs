//! Redis-backed status store

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;

use crate::error::{Error, Result};

use super::status_store::StatusStoreProvider;

/// Status store on Redis strings with `PX` expiry
///
/// The connection manager multiplexes one connection and reconnects on
/// failure; it is cheap to clone per call.
pub struct RedisStatusStore {
    conn: ConnectionManager,
    url: String,
}

impl RedisStatusStore {
    /// Connect to `url` (e.g. `redis://localhost:6379`)
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::Config(format!("Invalid Redis URL {}: {}", url, e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::status_store(format!("Failed to connect to Redis: {}", e)))?;

        tracing::info!("Connected to Redis at {}", url);
        Ok(Self {
            conn,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// `SET key value PX ttl_ms`; sub-millisecond TTLs round up to 1 ms
fn set_with_expiry(key: &str, value: &str, ttl: Duration) -> redis::Cmd {
    let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value).arg("PX").arg(ttl_ms);
    cmd
}

#[async_trait]
impl StatusStoreProvider for RedisStatusStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = set_with_expiry(key, value, ttl)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::status_store(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::status_store(e.to_string()))
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::status_store(e.to_string()))?;
        Ok(pong == "PONG")
    }

    fn name(&self) -> &str {
        "redis"
    }
}
