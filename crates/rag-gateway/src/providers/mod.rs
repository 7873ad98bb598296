//! Provider abstractions for the gateway's collaborators
//!
//! Each collaborator sits behind a trait so the coordinator and query service
//! take their handles by injection; backends switch between in-process
//! (memory, local filesystem) and networked (Redis, Kafka) implementations.

pub mod job_queue;
pub mod local;
pub mod memory;
pub mod status_store;
pub mod upload_store;
pub mod worker_health;

#[cfg(feature = "kafka")]
pub mod kafka_queue;
#[cfg(feature = "redis")]
pub mod redis_store;

pub use job_queue::JobQueueProvider;
pub use local::LocalUploadStore;
pub use memory::{MemoryJobQueue, MemoryStatusStore, QueuedMessage};
pub use status_store::{StatusKeyspace, StatusStoreProvider};
pub use upload_store::UploadStoreProvider;
pub use worker_health::{HttpWorkerProbe, WorkerHealth, WorkerHealthProvider};

#[cfg(feature = "kafka")]
pub use kafka_queue::KafkaJobQueue;
#[cfg(feature = "redis")]
pub use redis_store::RedisStatusStore;
