//! Job submission and status tracking

mod coordinator;
mod status_query;

pub use coordinator::{Submission, SubmissionCoordinator, SubmissionPolicy};
pub use status_query::StatusQueryService;
