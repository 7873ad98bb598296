//! Read path for job status

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::providers::{StatusKeyspace, StatusStoreProvider};
use crate::types::JobStatusView;

/// Exact-key lookup against the status store
///
/// Absent keys are `JobNotFound` whether the job was never submitted or its
/// entry expired; the two are indistinguishable here.
pub struct StatusQueryService {
    status_store: Arc<dyn StatusStoreProvider>,
    keyspace: StatusKeyspace,
    read_timeout: Duration,
}

impl StatusQueryService {
    pub fn new(
        status_store: Arc<dyn StatusStoreProvider>,
        keyspace: StatusKeyspace,
        read_timeout: Duration,
    ) -> Self {
        Self {
            status_store,
            keyspace,
            read_timeout,
        }
    }

    /// Current status of `job_id`, verbatim from the store
    pub async fn query(&self, job_id: &str) -> Result<JobStatusView> {
        // No submission can produce a blank id; reject before touching the store
        if job_id.trim().is_empty() {
            return Err(Error::invalid_input("job_id is required"));
        }

        let key = self.keyspace.key_for(job_id);
        let value = match timeout(self.read_timeout, self.status_store.get(&key)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::status_store(format!(
                    "read of {} timed out after {:?}",
                    key, self.read_timeout
                )))
            }
        };

        match value {
            Some(status) => Ok(JobStatusView {
                job_id: job_id.to_string(),
                status,
            }),
            None => Err(Error::JobNotFound(job_id.to_string())),
        }
    }
}
