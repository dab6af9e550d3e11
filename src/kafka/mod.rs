// Kafka plumbing for the message lifecycle
//
// The producer publishes every created message to the configured topic, the
// consumer reads the same topic back so the service can mark messages as
// processed. Payload layout is selected by `PayloadFormat`.

pub mod config;
pub mod consumer;
pub mod producer;
pub mod types;

pub use consumer::MessageConsumer;
pub use producer::MessageProducer;
pub use types::{InboundPayload, MessageEnvelope};
