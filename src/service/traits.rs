use std::time::Duration;

use anyhow::Result;
use courier_error::PublishError;

/// Outbound side of the stream
///
/// `publish` resolves only once the broker has acknowledged the record or
/// the attempt has failed.
#[async_trait::async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, key: &str, payload: &[u8]) -> Result<(), PublishError>;

    /// Wait for in-flight records before shutdown
    async fn flush(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }
}

/// One record read from the inbound stream
#[derive(Debug, Clone, Default)]
pub struct InboundRecord {
    /// Record value; empty when the broker delivered no payload
    pub payload: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
}

/// Inbound side of the stream, driven by the subscriber loop
#[async_trait::async_trait]
pub trait RecordSource: Send {
    /// Wait for the next record.
    ///
    /// `Ok(None)` means the read timed out and the caller should poll again.
    async fn next_record(&mut self) -> Result<Option<InboundRecord>>;

    /// Move the committed position of `record`'s partition past it
    async fn commit(&mut self, record: &InboundRecord) -> Result<()>;

    /// Release broker resources
    async fn close(&mut self) {}
}
