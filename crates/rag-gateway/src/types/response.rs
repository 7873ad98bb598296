//! Response bodies for the HTTP surface

use serde::{Deserialize, Serialize};

use super::job::{JobId, JobStatus};

/// Body returned with `202 Accepted` after a successful submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub message: String,
    pub job_id: JobId,
    pub status: JobStatus,
}

impl SubmitResponse {
    pub fn accepted(job_id: JobId, status: JobStatus) -> Self {
        Self {
            message: "File accepted for processing".to_string(),
            job_id,
            status,
        }
    }
}

/// Current status of one job, as read from the status store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub job_id: String,
    /// Stored value, verbatim (the worker may write states this crate does not know)
    pub status: String,
}

impl JobStatusView {
    /// Parsed lifecycle state, if the stored value is one we recognise
    pub fn lifecycle(&self) -> Option<JobStatus> {
        self.status.parse().ok()
    }
}
