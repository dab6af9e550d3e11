use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use courier_config::KafkaConfig;
use courier_error::PublishError;
use rdkafka::config::ClientConfig;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use tracing::{error, info};

use super::config::create_client_config;
use crate::metrics;
use crate::service::MessagePublisher;

const LINGER_MS: u64 = 5;

/// Kafka producer for newly created messages
///
/// Configured for at-least-once delivery: all in-sync replicas acknowledge
/// and idempotent writes avoid duplicates caused by internal retries.
pub struct MessageProducer {
    producer: Arc<FutureProducer>,
    topic: String,
    send_timeout: Duration,
}

/// Producer settings on top of the shared client config.
///
/// `message.timeout.ms` is the send timeout, so librdkafka gives up on a
/// record at the same moment `publish` reports the failure. A record that
/// was reported as failed is never delivered later.
pub fn producer_client_config(config: &KafkaConfig) -> Result<ClientConfig> {
    if config.send_timeout_ms <= LINGER_MS {
        anyhow::bail!(
            "KAFKA_PRODUCER_SEND_TIMEOUT_MS must be greater than {} (got {})",
            LINGER_MS,
            config.send_timeout_ms
        );
    }

    let request_timeout_ms = u64::from(config.producer_request_timeout_ms).min(config.send_timeout_ms);

    let mut client_config = create_client_config(config)?;
    client_config
        .set("acks", &config.producer_acks)
        .set(
            "enable.idempotence",
            config.producer_enable_idempotence.to_string(),
        )
        .set("compression.type", &config.producer_compression)
        .set("linger.ms", LINGER_MS.to_string())
        .set("request.timeout.ms", request_timeout_ms.to_string())
        .set("message.timeout.ms", config.send_timeout_ms.to_string());

    Ok(client_config)
}

impl MessageProducer {
    /// Create a new Kafka producer from the application configuration.
    ///
    /// No broker connection is made here; librdkafka connects lazily on the
    /// first send.
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        info!("Initializing Kafka producer...");

        let producer: FutureProducer = producer_client_config(config)?
            .create()
            .context("Failed to create Kafka producer")?;

        info!(
            topic = %config.topic,
            acks = %config.producer_acks,
            send_timeout_ms = config.send_timeout_ms,
            "Kafka producer initialized"
        );

        Ok(Self {
            producer: Arc::new(producer),
            topic: config.topic.clone(),
            send_timeout: Duration::from_millis(config.send_timeout_ms),
        })
    }

    /// Get topic name
    pub fn topic(&self) -> &str {
        &self.topic
    }

    fn classify(&self, err: KafkaError) -> PublishError {
        match err {
            KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut) => {
                PublishError::Timeout(self.send_timeout)
            }
            other => PublishError::Rejected(other.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl MessagePublisher for MessageProducer {
    async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), PublishError> {
        let record = FutureRecord::to(&self.topic).key(key).payload(payload);
        let start = Instant::now();

        // The delivery future resolves once librdkafka drops the record, at
        // the latest after message.timeout.ms. The queue timeout covers a full
        // local queue only.
        let result = self
            .producer
            .send(record, Timeout::After(self.send_timeout))
            .await
            .map_err(|(kafka_err, _)| self.classify(kafka_err));

        let latency = start.elapsed();
        match result {
            Ok((partition, offset)) => {
                metrics::PUBLISH_TOTAL.with_label_values(&["acked"]).inc();
                metrics::PUBLISH_LATENCY_SECONDS.observe(latency.as_secs_f64());

                info!(
                    partition = partition,
                    offset = offset,
                    key = %key,
                    latency_ms = latency.as_millis(),
                    "Message published to Kafka"
                );
                Ok(())
            }
            Err(e) => {
                metrics::PUBLISH_TOTAL.with_label_values(&[e.label()]).inc();

                error!(
                    error = %e,
                    key = %key,
                    topic = %self.topic,
                    latency_ms = latency.as_millis(),
                    "Failed to publish message to Kafka"
                );
                Err(e)
            }
        }
    }

    /// Waits for all in-flight records to be acknowledged.
    async fn flush(&self, timeout: Duration) -> Result<()> {
        info!("Flushing Kafka producer (timeout: {:?})", timeout);

        self.producer
            .flush(Timeout::After(timeout))
            .context("Failed to flush Kafka producer")?;

        info!("Kafka producer flushed successfully");
        Ok(())
    }
}

// Implement Clone manually to avoid cloning the producer (Arc handles it)
impl Clone for MessageProducer {
    fn clone(&self) -> Self {
        Self {
            producer: Arc::clone(&self.producer),
            topic: self.topic.clone(),
            send_timeout: self.send_timeout,
        }
    }
}
