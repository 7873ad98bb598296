//! Submission coordinator: write-ahead status, keyed enqueue, compensation
//!
//! A submission touches two independent systems with no shared transaction.
//! The status entry is always written first, so a queued job always has a
//! visible status; if the enqueue then fails the entry is overwritten to
//! `Failed` rather than deleted. The three steps run strictly in sequence and
//! nothing is retried here.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::providers::{
    JobQueueProvider, StatusKeyspace, StatusStoreProvider, UploadStoreProvider,
};
use crate::types::{JobId, JobRecord, JobStatus};

/// TTL and timeouts applied to each submission
#[derive(Debug, Clone)]
pub struct SubmissionPolicy {
    /// Lifetime of every status write (initial and compensating)
    pub status_ttl: Duration,
    /// Bound on one status write
    pub status_timeout: Duration,
    /// Bound on one enqueue, including acknowledgement
    pub enqueue_timeout: Duration,
}

impl SubmissionPolicy {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            status_ttl: config.status_store.ttl(),
            status_timeout: config.status_store.timeout(),
            enqueue_timeout: config.job_queue.enqueue_timeout(),
        }
    }
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}

/// Accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub job_id: JobId,
    /// Status exactly as last written
    pub status: JobStatus,
}

/// Turns uploads into queued jobs with an observable status
pub struct SubmissionCoordinator {
    status_store: Arc<dyn StatusStoreProvider>,
    job_queue: Arc<dyn JobQueueProvider>,
    upload_store: Arc<dyn UploadStoreProvider>,
    keyspace: StatusKeyspace,
    policy: SubmissionPolicy,
}

impl SubmissionCoordinator {
    pub fn new(
        status_store: Arc<dyn StatusStoreProvider>,
        job_queue: Arc<dyn JobQueueProvider>,
        upload_store: Arc<dyn UploadStoreProvider>,
        keyspace: StatusKeyspace,
        policy: SubmissionPolicy,
    ) -> Self {
        Self {
            status_store,
            job_queue,
            upload_store,
            keyspace,
            policy,
        }
    }

    pub fn policy(&self) -> &SubmissionPolicy {
        &self.policy
    }

    /// Persist an upload under a fresh job id and queue it
    pub async fn submit(&self, filename: &str, content: &[u8]) -> Result<Submission> {
        let job_id = JobId::generate();

        let storage_path = self
            .upload_store
            .store_upload(&job_id, filename, content)
            .await?;

        tracing::info!(
            job_id = %job_id,
            filename,
            bytes = content.len(),
            path = %storage_path,
            "Upload stored"
        );

        let record = JobRecord::new(job_id, filename, storage_path);
        match self.submit_record(&record).await {
            // A job that reached the queue step keeps its upload
            Err(e) if !matches!(e, Error::EnqueueFailed { .. }) => {
                self.discard_upload(&record).await;
                Err(e)
            }
            outcome => outcome,
        }
    }

    /// Best effort removal of an upload that has no status and no queued job
    async fn discard_upload(&self, record: &JobRecord) {
        if let Err(e) = self.upload_store.remove_upload(&record.storage_path).await {
            tracing::warn!(
                job_id = %record.id,
                path = %record.storage_path,
                error = %e,
                "Failed to remove orphaned upload"
            );
        }
    }

    /// Write-ahead status, enqueue keyed by job id, compensate on failure
    ///
    /// Also used to resubmit an existing job: the same id routes to the same
    /// partition, so messages for one job reach consumers in call order.
    pub async fn submit_record(&self, record: &JobRecord) -> Result<Submission> {
        let job_id = &record.id;
        let key = self.keyspace.key(job_id);

        // Serialize before any side effect
        let payload = record.to_payload()?;

        if let Err(e) = self.write_status(&key, JobStatus::Pending).await {
            tracing::error!(job_id = %job_id, error = %e, "Status write failed, job not queued");
            return Err(e);
        }

        if let Err(e) = self.enqueue(job_id, &payload).await {
            tracing::error!(job_id = %job_id, error = %e, "Failed to enqueue job");
            let compensated = self.compensate(job_id, &key).await;
            return Err(Error::EnqueueFailed {
                job_id: job_id.clone(),
                compensated,
                message: e.to_string(),
            });
        }

        tracing::info!(job_id = %job_id, queue = self.job_queue.name(), "Job queued");

        Ok(Submission {
            job_id: job_id.clone(),
            status: JobStatus::Pending,
        })
    }

    async fn write_status(&self, key: &str, status: JobStatus) -> Result<()> {
        let write = self
            .status_store
            .set(key, status.as_str(), self.policy.status_ttl);

        match timeout(self.policy.status_timeout, write).await {
            Ok(result) => result,
            Err(_) => Err(Error::status_store(format!(
                "write of {} timed out after {:?}",
                key, self.policy.status_timeout
            ))),
        }
    }

    async fn enqueue(&self, job_id: &JobId, payload: &[u8]) -> Result<()> {
        let append = self.job_queue.append(job_id.as_str(), payload);

        match timeout(self.policy.enqueue_timeout, append).await {
            Ok(result) => result,
            Err(_) => Err(Error::job_queue(format!(
                "append timed out after {:?}",
                self.policy.enqueue_timeout
            ))),
        }
    }

    /// Best effort, single attempt: a failure leaves the job `Pending` until its TTL
    async fn compensate(&self, job_id: &JobId, key: &str) -> bool {
        match self.write_status(key, JobStatus::Failed).await {
            Ok(()) => {
                tracing::warn!(job_id = %job_id, "Job marked Failed after enqueue failure");
                true
            }
            Err(e) => {
                tracing::error!(
                    job_id = %job_id,
                    error = %e,
                    "Compensation failed, job stays Pending until its status expires"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{LocalUploadStore, MemoryJobQueue, MemoryStatusStore};

    #[test]
    fn test_policy_from_config() {
        let mut config = GatewayConfig::default();
        config.status_store.ttl_secs = 60;
        config.job_queue.enqueue_timeout_ms = 250;

        let policy = SubmissionPolicy::from_config(&config);
        assert_eq!(policy.status_ttl, Duration::from_secs(60));
        assert_eq!(policy.enqueue_timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_submit_writes_status_and_queues_record() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(MemoryStatusStore::new());
        let queue = Arc::new(MemoryJobQueue::new(4, 100));
        let coordinator = SubmissionCoordinator::new(
            status.clone(),
            queue.clone(),
            Arc::new(LocalUploadStore::new(dir.path().to_path_buf()).unwrap()),
            StatusKeyspace::default(),
            SubmissionPolicy::default(),
        );

        let submission = coordinator.submit("report.pdf", b"%PDF").await.unwrap();
        assert_eq!(submission.status, JobStatus::Pending);

        let key = format!("job:{}", submission.job_id);
        assert_eq!(status.get(&key).await.unwrap().as_deref(), Some("Pending"));

        let msgs = queue.messages_for_key(submission.job_id.as_str());
        assert_eq!(msgs.len(), 1);
        let record: JobRecord = serde_json::from_slice(&msgs[0].payload).unwrap();
        assert_eq!(record.id, submission.job_id);
        assert_eq!(record.filename, "report.pdf");
        assert!(record.storage_path.ends_with("_report.pdf"));
    }
}
