// ============================================================================
// Configuration Constants
// ============================================================================

pub(crate) const DEFAULT_PORT: u16 = 8080;
pub(crate) const DEFAULT_APP_NAME: &str = "courier";

// Bounded drain for in-flight HTTP requests once a shutdown signal arrives
pub(crate) const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

// Database pool
pub(crate) const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub(crate) const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_DB_IDLE_TIMEOUT_SECS: u64 = 600;
pub(crate) const DEFAULT_DB_CONNECT_ATTEMPTS: u32 = 20;
pub(crate) const DEFAULT_DB_CONNECT_RETRY_DELAY_MS: u64 = 1000;

// Kafka
pub(crate) const DEFAULT_KAFKA_BROKERS: &str = "localhost:9092";
pub(crate) const DEFAULT_KAFKA_TOPIC: &str = "messages";
pub(crate) const DEFAULT_KAFKA_CONSUMER_GROUP: &str = "courier-processors";
pub(crate) const DEFAULT_KAFKA_SEND_TIMEOUT_MS: u64 = 5000;
pub(crate) const DEFAULT_KAFKA_POLL_TIMEOUT_MS: u64 = 1000;

// Message size limit (in bytes). Content is plain text, 64 KB is plenty.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;
