// ============================================================================
// Kafka Configuration
// ============================================================================

use std::str::FromStr;

use crate::constants::*;
use crate::env_or;

/// How message content is laid out on the topic
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadFormat {
    /// The record value is the raw message content. Inbound records are
    /// correlated back to stored rows by content equality.
    Raw,
    /// The record value is a JSON envelope carrying the store-assigned id.
    /// Inbound records are correlated by id, falling back to content when a
    /// record does not parse as an envelope.
    Envelope,
}

impl FromStr for PayloadFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(PayloadFormat::Raw),
            "envelope" => Ok(PayloadFormat::Envelope),
            other => Err(anyhow::anyhow!(
                "Invalid KAFKA_PAYLOAD_FORMAT '{}': expected 'raw' or 'envelope'",
                other
            )),
        }
    }
}

/// Kafka configuration shared by the publisher and the subscriber
#[derive(Clone, Debug)]
pub struct KafkaConfig {
    /// Comma-separated list of Kafka brokers (e.g., "kafka1:9092,kafka2:9092")
    pub brokers: String,
    /// Topic messages are published to and consumed from
    pub topic: String,
    /// Consumer group ID for the processing subscriber
    pub consumer_group: String,
    /// SSL/TLS enabled
    pub ssl_enabled: bool,
    /// SASL mechanism (e.g., "SCRAM-SHA-256", "PLAIN")
    pub sasl_mechanism: Option<String>,
    /// SASL username
    pub sasl_username: Option<String>,
    /// SASL password
    pub sasl_password: Option<String>,
    /// Path to CA certificate file (for self-signed certificates)
    pub ssl_ca_location: Option<String>,
    // producer-specific settings
    pub producer_acks: String, // "all" | "1" | "-1" | "0"
    pub producer_compression: String,
    pub producer_enable_idempotence: bool,
    pub producer_request_timeout_ms: u32,
    /// Upper bound on a record's life inside the producer. Also used as
    /// librdkafka's `message.timeout.ms`, so a record is never delivered
    /// after its publish call has reported a timeout.
    pub send_timeout_ms: u64,
    /// How long the subscriber waits for a record before re-polling
    pub poll_timeout_ms: u64,
    pub payload_format: PayloadFormat,
}

impl KafkaConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        let payload_format = match std::env::var("KAFKA_PAYLOAD_FORMAT") {
            Ok(value) => value.parse()?,
            Err(_) => PayloadFormat::Raw,
        };

        Ok(Self {
            brokers: std::env::var("KAFKA_BROKERS")
                .unwrap_or_else(|_| DEFAULT_KAFKA_BROKERS.to_string()),
            topic: std::env::var("KAFKA_TOPIC")
                .unwrap_or_else(|_| DEFAULT_KAFKA_TOPIC.to_string()),
            consumer_group: std::env::var("KAFKA_CONSUMER_GROUP")
                .unwrap_or_else(|_| DEFAULT_KAFKA_CONSUMER_GROUP.to_string()),
            ssl_enabled: env_or("KAFKA_SSL_ENABLED", false),
            sasl_mechanism: std::env::var("KAFKA_SASL_MECHANISM").ok(),
            sasl_username: std::env::var("KAFKA_SASL_USERNAME").ok(),
            sasl_password: std::env::var("KAFKA_SASL_PASSWORD").ok(),
            ssl_ca_location: std::env::var("KAFKA_SSL_CA_LOCATION").ok(),
            producer_acks: std::env::var("KAFKA_PRODUCER_ACKS")
                .unwrap_or_else(|_| "all".to_string()),
            producer_compression: std::env::var("KAFKA_PRODUCER_COMPRESSION")
                .unwrap_or_else(|_| "none".to_string()),
            producer_enable_idempotence: env_or("KAFKA_PRODUCER_ENABLE_IDEMPOTENCE", true),
            producer_request_timeout_ms: env_or("KAFKA_PRODUCER_REQUEST_TIMEOUT_MS", 30000),
            send_timeout_ms: env_or("KAFKA_PRODUCER_SEND_TIMEOUT_MS", DEFAULT_KAFKA_SEND_TIMEOUT_MS),
            poll_timeout_ms: env_or("KAFKA_CONSUMER_POLL_TIMEOUT_MS", DEFAULT_KAFKA_POLL_TIMEOUT_MS),
            payload_format,
        })
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: DEFAULT_KAFKA_BROKERS.to_string(),
            topic: DEFAULT_KAFKA_TOPIC.to_string(),
            consumer_group: DEFAULT_KAFKA_CONSUMER_GROUP.to_string(),
            ssl_enabled: false,
            sasl_mechanism: None,
            sasl_username: None,
            sasl_password: None,
            ssl_ca_location: None,
            producer_acks: "all".to_string(),
            producer_compression: "none".to_string(),
            producer_enable_idempotence: true,
            producer_request_timeout_ms: 30000,
            send_timeout_ms: DEFAULT_KAFKA_SEND_TIMEOUT_MS,
            poll_timeout_ms: DEFAULT_KAFKA_POLL_TIMEOUT_MS,
            payload_format: PayloadFormat::Raw,
        }
    }
}
