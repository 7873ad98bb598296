//! Job record, identifier and lifecycle types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque job identifier
///
/// Generated ids are random (v4) UUIDs, so concurrent submissions never need to
/// coordinate. Ids read back from clients are taken as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Job lifecycle state
///
/// `Pending -> Processing -> Complete`, with `Failed` reachable from
/// `Pending` or `Processing`. The gateway itself only writes `Pending` and `Failed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

impl JobStatus {
    /// Value written to the status store
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Processing => "Processing",
            JobStatus::Complete => "Complete",
            JobStatus::Failed => "Failed",
        }
    }

    /// No further transitions out of this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Processing, JobStatus::Complete)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(JobStatus::Pending),
            "Processing" => Ok(JobStatus::Processing),
            "Complete" => Ok(JobStatus::Complete),
            "Failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// Unit of work placed on the job queue
///
/// A point-in-time value: once enqueued it is never mutated; later lifecycle
/// changes only happen in the status store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRecord {
    pub id: JobId,
    /// Client-supplied name, untrusted, display only
    pub filename: String,
    /// Where the upload was persisted for the worker
    #[serde(rename = "filepath")]
    pub storage_path: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl JobRecord {
    /// New record in the `Pending` state
    pub fn new(id: JobId, filename: impl Into<String>, storage_path: impl Into<String>) -> Self {
        Self {
            id,
            filename: filename.into(),
            storage_path: storage_path.into(),
            status: JobStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Queue payload
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<JobId> = (0..10_000).map(|_| JobId::generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_status_round_trips_through_store_strings() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Complete,
            JobStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("pending".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_lifecycle_has_no_cycles() {
        use JobStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Complete));
        assert!(!Complete.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Pending));
        assert!(!Processing.can_transition_to(Pending));
        assert!(Complete.is_terminal() && Failed.is_terminal());
        assert!(!Pending.is_terminal());
    }

    #[test]
    fn test_record_wire_format() {
        let record = JobRecord::new(JobId::from("job-1"), "report.pdf", "/tmp/job-1_report.pdf");
        let value: serde_json::Value = serde_json::from_slice(&record.to_payload().unwrap()).unwrap();

        assert_eq!(value["id"], "job-1");
        assert_eq!(value["filename"], "report.pdf");
        assert_eq!(value["filepath"], "/tmp/job-1_report.pdf");
        assert_eq!(value["status"], "Pending");
        assert!(value["created_at"].is_string());
    }
}
