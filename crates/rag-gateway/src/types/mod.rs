//! Core types for the gateway

pub mod job;
pub mod response;

pub use job::{JobId, JobRecord, JobStatus};
pub use response::{JobStatusView, SubmitResponse};
