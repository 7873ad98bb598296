//! Kafka-backed job queue

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::time::Duration;

use crate::config::JobQueueConfig;
use crate::error::{Error, Result};

use super::job_queue::JobQueueProvider;

const FLUSH_WAIT: Duration = Duration::from_secs(10);
const METADATA_WAIT: Duration = Duration::from_secs(5);

/// Job queue on a Kafka topic
///
/// The partition key becomes the message key, so the default partitioner
/// routes every message of a job to the same partition. The producer is
/// idempotent, which keeps per-partition order intact across retries.
pub struct KafkaJobQueue {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
}

impl KafkaJobQueue {
    /// Create a producer for the configured brokers and topic
    pub fn from_config(config: &JobQueueConfig) -> Result<Self> {
        let producer: FutureProducer = producer_config(config)
            .create()
            .map_err(|e| Error::Config(format!("Failed to create Kafka producer: {}", e)))?;

        tracing::info!(
            "Created Kafka producer connected to {} with topic {}",
            config.brokers,
            config.topic
        );

        Ok(Self {
            producer,
            topic: config.topic.clone(),
            send_timeout: config.enqueue_timeout(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Idempotent, fully acknowledged producer settings
fn producer_config(config: &JobQueueConfig) -> ClientConfig {
    let mut client = ClientConfig::new();
    client
        .set("bootstrap.servers", &config.brokers)
        .set("message.timeout.ms", config.enqueue_timeout_ms.to_string())
        .set("enable.idempotence", "true")
        .set("acks", "all");
    client
}

#[async_trait]
impl JobQueueProvider for KafkaJobQueue {
    async fn append(&self, partition_key: &str, payload: &[u8]) -> Result<()> {
        let record = FutureRecord::to(&self.topic)
            .key(partition_key)
            .payload(payload);

        match self
            .producer
            .send(record, Timeout::After(self.send_timeout))
            .await
        {
            Ok((partition, offset)) => {
                tracing::debug!(
                    topic = %self.topic,
                    partition,
                    offset,
                    key = partition_key,
                    "Message delivered"
                );
                Ok(())
            }
            Err((err, _)) => {
                tracing::error!(topic = %self.topic, error = %err, "Failed to send message");
                Err(Error::job_queue(err.to_string()))
            }
        }
    }

    async fn flush(&self) -> Result<()> {
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(Timeout::After(FLUSH_WAIT)))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
            .map_err(|e| Error::job_queue(format!("Flush failed: {}", e)))
    }

    async fn health_check(&self) -> Result<bool> {
        let producer = self.producer.clone();
        let topic = self.topic.clone();
        tokio::task::spawn_blocking(move || {
            producer
                .client()
                .fetch_metadata(Some(&topic), Timeout::After(METADATA_WAIT))
                .map(|_| true)
                .map_err(|e| Error::job_queue(e.to_string()))
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    fn name(&self) -> &str {
        "kafka"
    }
}
