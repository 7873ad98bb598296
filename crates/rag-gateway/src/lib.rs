//! rag-gateway: document job submission with write-ahead status tracking
//!
//! Uploads are persisted, given a `Pending` entry in a key-value status store,
//! then queued for the worker pool on a partitioned log keyed by job id. If the
//! enqueue fails the status is compensated to `Failed`, so a client polling
//! `/status/:job_id` never loses sight of a job it was told about.

pub mod config;
pub mod error;
pub mod processing;
pub mod providers;
pub mod server;
pub mod types;

pub use config::GatewayConfig;
pub use error::{Error, ErrorCategory, Result};
pub use processing::{StatusQueryService, Submission, SubmissionCoordinator, SubmissionPolicy};
pub use types::{JobId, JobRecord, JobStatus, JobStatusView, SubmitResponse};
