//! In-process provider implementations
//!
//! Single-node stand-ins for Redis and Kafka with the same contracts: expiring
//! keys for the status store, keyed partitions with ordered offsets for the
//! queue. Used by default and by the test suite.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::JobQueueConfig;
use crate::error::{Error, Result};

use super::job_queue::JobQueueProvider;
use super::status_store::StatusStoreProvider;

#[derive(Debug, Clone)]
struct StatusSlot {
    value: String,
    expires_at: Instant,
}

/// Expiring key-value map
///
/// Deadlines use the tokio clock so paused-time tests can advance past a TTL.
#[derive(Default)]
pub struct MemoryStatusStore {
    entries: DashMap<String, StatusSlot>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| slot.expires_at > now);
        before - self.entries.len()
    }

    fn read(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let live = self
            .entries
            .get(key)
            .map(|slot| (slot.expires_at > now).then(|| slot.value.clone()));

        match live {
            Some(Some(value)) => Some(value),
            Some(None) => {
                self.entries.remove_if(key, |_, slot| slot.expires_at <= now);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl StatusStoreProvider for MemoryStatusStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            StatusSlot {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read(key))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory-status"
    }
}

/// A message as stored on a partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub partition: usize,
    pub offset: u64,
    pub key: String,
    pub payload: Vec<u8>,
}

#[derive(Default)]
struct PartitionLog {
    next_offset: u64,
    messages: VecDeque<QueuedMessage>,
}

/// Partitioned in-process log
///
/// Each key hashes to one partition; within a partition offsets are assigned
/// under the partition lock, so same-key appends keep call order.
pub struct MemoryJobQueue {
    partitions: Vec<Mutex<PartitionLog>>,
    capacity: usize,
    closed: AtomicBool,
    appended: AtomicU64,
}

impl MemoryJobQueue {
    /// Create a queue with `partitions` partitions of `capacity` messages each
    pub fn new(partitions: usize, capacity: usize) -> Self {
        let partitions = partitions.max(1);
        Self {
            partitions: (0..partitions).map(|_| Mutex::new(PartitionLog::default())).collect(),
            capacity,
            closed: AtomicBool::new(false),
            appended: AtomicU64::new(0),
        }
    }

    /// Create from config
    pub fn from_config(config: &JobQueueConfig) -> Self {
        Self::new(config.partitions, config.partition_capacity)
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Partition a key routes to
    pub fn partition_for(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.partitions.len() as u64) as usize
    }

    /// Remove and return up to `max` messages from the head of a partition
    pub fn poll(&self, partition: usize, max: usize) -> Vec<QueuedMessage> {
        let Some(log) = self.partitions.get(partition) else {
            return Vec::new();
        };
        let mut log = log.lock();
        let n = max.min(log.messages.len());
        log.messages.drain(..n).collect()
    }

    /// Undelivered messages for a key, in partition order
    pub fn messages_for_key(&self, key: &str) -> Vec<QueuedMessage> {
        let log = self.partitions[self.partition_for(key)].lock();
        log.messages.iter().filter(|m| m.key == key).cloned().collect()
    }

    /// Undelivered messages across all partitions
    pub fn len(&self) -> usize {
        self.partitions.iter().map(|p| p.lock().messages.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Messages ever accepted
    pub fn total_appended(&self) -> u64 {
        self.appended.load(Ordering::SeqCst)
    }

    /// Reject all further appends
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl JobQueueProvider for MemoryJobQueue {
    async fn append(&self, partition_key: &str, payload: &[u8]) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::job_queue("queue is closed"));
        }

        let partition = self.partition_for(partition_key);
        let mut log = self.partitions[partition].lock();
        if log.messages.len() >= self.capacity {
            return Err(Error::job_queue(format!(
                "partition {} is full ({} messages)",
                partition, self.capacity
            )));
        }

        let offset = log.next_offset;
        log.next_offset += 1;
        log.messages.push_back(QueuedMessage {
            partition,
            offset,
            key: partition_key.to_string(),
            payload: payload.to_vec(),
        });
        self.appended.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(partition, offset, key = partition_key, "Appended to memory queue");
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.closed.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        "memory-queue"
    }
}
