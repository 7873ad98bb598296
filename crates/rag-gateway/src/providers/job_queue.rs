//! Job queue provider trait: ordered, partitioned append-only log

use async_trait::async_trait;

use crate::error::Result;

/// Partitioned log drained by the worker pool
///
/// Implementations:
/// - `MemoryJobQueue`: in-process partitions with bounded capacity
/// - `KafkaJobQueue`: Kafka topic, message key = partition key
///
/// Appends with the same partition key land on the same partition in call
/// order. `Ok` means the message is acknowledged and will not be dropped.
#[async_trait]
pub trait JobQueueProvider: Send + Sync {
    /// Append `payload` under `partition_key`
    async fn append(&self, partition_key: &str, payload: &[u8]) -> Result<()>;

    /// Wait for in-flight appends to be acknowledged (called on shutdown)
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Check if the queue is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
