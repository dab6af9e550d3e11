use std::time::Duration;

use anyhow::{Context, Result};
use courier_config::KafkaConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::{Message, Offset, TopicPartitionList};
use tracing::{debug, info};

use super::config::create_client_config;
use crate::metrics;
use crate::service::{InboundRecord, RecordSource};

/// Kafka consumer feeding the processing subscriber
///
/// This consumer is configured for:
/// - Manual offset commits (after a record has been handled)
/// - Consumer group coordination (several service instances share the topic)
/// - Reading from the earliest offset when the group has no committed position
pub struct MessageConsumer {
    consumer: StreamConsumer,
    topic: String,
    poll_timeout: Duration,
}

impl MessageConsumer {
    /// Create a consumer and subscribe it to the configured topic
    ///
    /// # Configuration
    /// - `enable.auto.commit=false`: offsets move only through [`RecordSource::commit`]
    /// - `auto.offset.reset=earliest`: records published before the first start are processed
    /// - `session.timeout.ms=30000`: 30s session timeout
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        info!(
            brokers = %config.brokers,
            topic = %config.topic,
            group = %config.consumer_group,
            "Initializing Kafka consumer"
        );

        let consumer: StreamConsumer = create_client_config(config)?
            .set("group.id", &config.consumer_group)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("fetch.wait.max.ms", "500")
            .set("session.timeout.ms", "30000")
            .set("heartbeat.interval.ms", "3000")
            .set("max.poll.interval.ms", "300000")
            .create()
            .context("Failed to create Kafka consumer")?;

        consumer
            .subscribe(&[&config.topic])
            .context("Failed to subscribe to Kafka topic")?;

        info!("Kafka consumer initialized successfully");

        Ok(Self {
            consumer,
            topic: config.topic.clone(),
            poll_timeout: Duration::from_millis(config.poll_timeout_ms),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Committed offsets name the next record to read, hence `offset + 1`
fn commit_offsets(topic: &str, record: &InboundRecord) -> Result<TopicPartitionList> {
    let mut offsets = TopicPartitionList::new();
    offsets
        .add_partition_offset(topic, record.partition, Offset::Offset(record.offset + 1))
        .context("Failed to build commit offsets")?;
    Ok(offsets)
}

#[async_trait::async_trait]
impl RecordSource for MessageConsumer {
    async fn next_record(&mut self) -> Result<Option<InboundRecord>> {
        match tokio::time::timeout(self.poll_timeout, self.consumer.recv()).await {
            Err(_) => Ok(None),
            Ok(Ok(message)) => {
                metrics::STREAM_EVENTS_TOTAL.with_label_values(&["received"]).inc();
                debug!(
                    partition = message.partition(),
                    offset = message.offset(),
                    "Received record"
                );
                Ok(Some(InboundRecord {
                    payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
                    partition: message.partition(),
                    offset: message.offset(),
                }))
            }
            Ok(Err(e)) => {
                metrics::STREAM_EVENTS_TOTAL.with_label_values(&["read_error"]).inc();
                Err(anyhow::anyhow!("Kafka consumer error: {}", e))
            }
        }
    }

    /// Commit the position right after `record` on its partition.
    ///
    /// Only this partition moves, and only to this record. If the process
    /// dies before this call the record is redelivered.
    async fn commit(&mut self, record: &InboundRecord) -> Result<()> {
        let offsets = commit_offsets(&self.topic, record)?;

        self.consumer
            .commit(&offsets, CommitMode::Sync)
            .map_err(|e| {
                metrics::STREAM_EVENTS_TOTAL
                    .with_label_values(&["commit_error"])
                    .inc();
                e
            })
            .context("Failed to commit offset")
    }

    async fn close(&mut self) {
        info!(topic = %self.topic, "Closing Kafka consumer");
        self.consumer.unsubscribe();
    }
}
