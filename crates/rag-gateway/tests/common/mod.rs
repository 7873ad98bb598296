//! Provider doubles for exercising failure paths

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rag_gateway::processing::{StatusQueryService, SubmissionCoordinator, SubmissionPolicy};
use rag_gateway::providers::{
    JobQueueProvider, MemoryStatusStore, StatusKeyspace, StatusStoreProvider, UploadStoreProvider,
};
use rag_gateway::types::JobId;
use rag_gateway::{Error, Result};

/// Status store that rejects every call
#[derive(Default)]
pub struct FailingStatusStore {
    pub calls: AtomicUsize,
}

#[async_trait]
impl StatusStoreProvider for FailingStatusStore {
    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::status_store("connection refused"))
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::status_store("connection refused"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing-status"
    }
}

/// Memory store whose writes start failing after `allowed_writes`
pub struct FlakyStatusStore {
    pub inner: MemoryStatusStore,
    allowed_writes: AtomicUsize,
}

impl FlakyStatusStore {
    pub fn new(allowed_writes: usize) -> Self {
        Self {
            inner: MemoryStatusStore::new(),
            allowed_writes: AtomicUsize::new(allowed_writes),
        }
    }
}

#[async_trait]
impl StatusStoreProvider for FlakyStatusStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let remaining = self
            .allowed_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if remaining.is_err() {
            return Err(Error::status_store("READONLY replica"));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "flaky-status"
    }
}

/// Queue that rejects every append
#[derive(Default)]
pub struct FailingQueue {
    pub appends: AtomicUsize,
}

#[async_trait]
impl JobQueueProvider for FailingQueue {
    async fn append(&self, _partition_key: &str, _payload: &[u8]) -> Result<()> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        Err(Error::job_queue("broker unavailable"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing-queue"
    }
}

/// Queue whose appends never complete
#[derive(Default)]
pub struct HangingQueue {
    pub entered: AtomicUsize,
}

#[async_trait]
impl JobQueueProvider for HangingQueue {
    async fn append(&self, _partition_key: &str, _payload: &[u8]) -> Result<()> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hanging-queue"
    }
}

/// Queue that records what the status store held for each key at append time
pub struct WitnessQueue {
    status: Arc<MemoryStatusStore>,
    keyspace: StatusKeyspace,
    pub observed: Mutex<Vec<(String, Option<String>)>>,
}

impl WitnessQueue {
    pub fn new(status: Arc<MemoryStatusStore>) -> Self {
        Self {
            status,
            keyspace: StatusKeyspace::default(),
            observed: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl JobQueueProvider for WitnessQueue {
    async fn append(&self, partition_key: &str, _payload: &[u8]) -> Result<()> {
        let seen = self.status.get(&self.keyspace.key_for(partition_key)).await?;
        self.observed.lock().push((partition_key.to_string(), seen));
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "witness-queue"
    }
}

/// Upload store that keeps files in memory
#[derive(Default)]
pub struct MemoryUploadStore {
    pub files: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl UploadStoreProvider for MemoryUploadStore {
    async fn store_upload(&self, job_id: &JobId, filename: &str, data: &[u8]) -> Result<String> {
        let path = format!("mem://{}_{}", job_id, filename);
        self.files.lock().push((path.clone(), data.to_vec()));
        Ok(path)
    }

    async fn remove_upload(&self, storage_path: &str) -> Result<()> {
        self.files.lock().retain(|(path, _)| path != storage_path);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory-uploads"
    }
}

/// Upload store with a full disk
pub struct FailingUploadStore;

#[async_trait]
impl UploadStoreProvider for FailingUploadStore {
    async fn store_upload(&self, _job_id: &JobId, _filename: &str, _data: &[u8]) -> Result<String> {
        Err(Error::storage("No space left on device"))
    }

    async fn remove_upload(&self, _storage_path: &str) -> Result<()> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing-uploads"
    }
}

pub fn policy(ttl: Duration) -> SubmissionPolicy {
    SubmissionPolicy {
        status_ttl: ttl,
        status_timeout: Duration::from_secs(2),
        enqueue_timeout: Duration::from_secs(5),
    }
}

pub fn coordinator(
    status: Arc<dyn StatusStoreProvider>,
    queue: Arc<dyn JobQueueProvider>,
    policy: SubmissionPolicy,
) -> SubmissionCoordinator {
    SubmissionCoordinator::new(
        status,
        queue,
        Arc::new(MemoryUploadStore::default()),
        StatusKeyspace::default(),
        policy,
    )
}

pub fn coordinator_with_uploads(
    status: Arc<dyn StatusStoreProvider>,
    queue: Arc<dyn JobQueueProvider>,
    uploads: Arc<MemoryUploadStore>,
    policy: SubmissionPolicy,
) -> SubmissionCoordinator {
    SubmissionCoordinator::new(status, queue, uploads, StatusKeyspace::default(), policy)
}

pub fn query_service(status: Arc<dyn StatusStoreProvider>) -> StatusQueryService {
    StatusQueryService::new(status, StatusKeyspace::default(), Duration::from_secs(2))
}
