// ============================================================================
// Message Service
// ============================================================================
//
// Ties the store, the publisher and the subscriber into one lifecycle:
//
//   create  -> stored (processed=false) -> published
//   inbound -> looked up (by id or content) -> marked processed
//
// Store and broker share no transaction. A row whose publish failed stays
// unprocessed and the caller gets CannotProduceMessage with its id.
//
// ============================================================================

mod subscriber;
mod traits;

pub use subscriber::{spawn_subscriber, SubscriberHandle};
pub use traits::{InboundRecord, MessagePublisher, RecordSource};

use std::sync::Arc;
use std::time::Duration;

use courier_config::PayloadFormat;
use courier_db::Message;
use courier_error::{ServiceError, StoreError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::kafka::types::{decode_payload, encode_payload, InboundPayload};
use crate::metrics;
use crate::store::MessageStore;

/// Tunables for [`MessageService::start`]
#[derive(Clone, Debug)]
pub struct ServiceOptions {
    pub payload_format: PayloadFormat,
    /// Pause after a failed read before the subscriber polls again
    pub error_backoff: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            payload_format: PayloadFormat::Raw,
            error_backoff: Duration::from_secs(1),
        }
    }
}

/// What happened to one inbound record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// The matching message was moved to processed
    Processed(Uuid),
    /// The matching message was already processed (redelivery)
    AlreadyProcessed(Uuid),
    /// No stored message matches the record
    Unmatched,
    /// Empty or undecodable payload
    Skipped,
    /// The store failed during lookup or update. The record is dropped
    /// like any other; only a broker redelivery brings it back.
    Failed,
}

impl InboundOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            InboundOutcome::Processed(_) => "processed",
            InboundOutcome::AlreadyProcessed(_) => "duplicate",
            InboundOutcome::Unmatched => "unmatched",
            InboundOutcome::Skipped => "skipped",
            InboundOutcome::Failed => "failed",
        }
    }
}

/// Stateless coordinator over a store and a publisher
pub struct MessageService {
    store: Arc<dyn MessageStore>,
    publisher: Arc<dyn MessagePublisher>,
    payload_format: PayloadFormat,
}

impl MessageService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        publisher: Arc<dyn MessagePublisher>,
        payload_format: PayloadFormat,
    ) -> Self {
        Self {
            store,
            publisher,
            payload_format,
        }
    }

    /// Build the service and launch its subscriber loop.
    ///
    /// The loop runs until [`SubscriberHandle::shutdown`] is awaited.
    pub fn start<S>(
        store: Arc<dyn MessageStore>,
        publisher: Arc<dyn MessagePublisher>,
        source: S,
        options: ServiceOptions,
    ) -> (Arc<Self>, SubscriberHandle)
    where
        S: RecordSource + 'static,
    {
        let service = Arc::new(Self::new(store, publisher, options.payload_format));
        let token = CancellationToken::new();
        let task = spawn_subscriber(
            service.clone(),
            source,
            options.error_backoff,
            token.clone(),
        );

        (service, SubscriberHandle::new(token, task))
    }

    pub fn payload_format(&self) -> PayloadFormat {
        self.payload_format
    }

    /// Store `content`, then publish it.
    ///
    /// Nothing is published when the store write fails. When publishing
    /// fails the stored row is kept and its id travels in the error.
    pub async fn create_message(&self, content: &str) -> Result<Uuid, ServiceError> {
        let message = self.store.create(content).await.map_err(|e| {
            error!(error = %e, "Failed to store message");
            ServiceError::CannotCreateMessage(e)
        })?;
        metrics::MESSAGES_CREATED_TOTAL.inc();

        let id = message.id;
        let payload = encode_payload(self.payload_format, &message)
            .map_err(|source| ServiceError::CannotProduceMessage { id, source })?;

        if let Err(source) = self.publisher.publish(&id.to_string(), &payload).await {
            warn!(
                message_id = %id,
                error = %source,
                "Message stored but not published, it will stay unprocessed"
            );
            return Err(ServiceError::CannotProduceMessage { id, source });
        }

        info!(message_id = %id, "Message created and published");
        Ok(id)
    }

    pub async fn get_message_by_id(&self, id: Uuid) -> Result<Message, ServiceError> {
        self.store.get_by_id(id).await.map_err(|e| match e {
            StoreError::NotFound => ServiceError::MessageNotFound(id),
            other => ServiceError::CannotGetMessage(other),
        })
    }

    pub async fn list_messages(&self) -> Result<Vec<Message>, ServiceError> {
        self.store
            .list_all()
            .await
            .map_err(ServiceError::CannotGetMessage)
    }

    /// Mark one message processed. Returns whether this call changed it.
    pub async fn mark_message_as_processed(&self, id: Uuid) -> Result<bool, ServiceError> {
        match self.store.mark_processed(id).await {
            Ok(changed) => {
                if changed {
                    metrics::MESSAGES_PROCESSED_TOTAL.inc();
                    info!(message_id = %id, "Message marked as processed");
                }
                Ok(changed)
            }
            Err(StoreError::NotFound) => Err(ServiceError::MessageNotFound(id)),
            Err(e) => Err(ServiceError::CannotUpdateMessage(e)),
        }
    }

    pub async fn get_processed_stats(&self) -> Result<i64, ServiceError> {
        self.store
            .count_processed()
            .await
            .map_err(ServiceError::CannotGetMessage)
    }

    /// Correlate one inbound record with its stored message and mark it.
    ///
    /// Never fails: every problem is logged and reported as an outcome.
    pub async fn handle_inbound(&self, payload: &[u8]) -> InboundOutcome {
        let outcome = self.correlate_and_mark(payload).await;
        metrics::INBOUND_RECORDS_TOTAL
            .with_label_values(&[outcome.label()])
            .inc();
        outcome
    }

    async fn correlate_and_mark(&self, payload: &[u8]) -> InboundOutcome {
        if payload.is_empty() {
            warn!("Skipping inbound record with empty payload");
            return InboundOutcome::Skipped;
        }

        let Some(decoded) = decode_payload(self.payload_format, payload) else {
            warn!(len = payload.len(), "Skipping undecodable inbound record");
            return InboundOutcome::Skipped;
        };

        let lookup = match &decoded {
            InboundPayload::Envelope(envelope) => self.store.get_by_id(envelope.message_id).await,
            InboundPayload::Content(content) => self.store.get_by_content(content).await,
        };

        let message = match lookup {
            Ok(message) => message,
            Err(StoreError::NotFound) => {
                match &decoded {
                    InboundPayload::Envelope(envelope) => warn!(
                        message_id = %envelope.message_id,
                        "Inbound record matches no stored message"
                    ),
                    InboundPayload::Content(content) => warn!(
                        len = content.len(),
                        "Inbound record matches no stored message"
                    ),
                }
                return InboundOutcome::Unmatched;
            }
            Err(e) => {
                error!(error = %e, "Failed to look up message for inbound record");
                return InboundOutcome::Failed;
            }
        };

        match self.mark_message_as_processed(message.id).await {
            Ok(true) => InboundOutcome::Processed(message.id),
            Ok(false) => {
                debug!(message_id = %message.id, "Message already processed, ignoring redelivery");
                InboundOutcome::AlreadyProcessed(message.id)
            }
            // Deleted between lookup and update
            Err(ServiceError::MessageNotFound(_)) => InboundOutcome::Unmatched,
            Err(e) => {
                error!(message_id = %message.id, error = ?e, "Failed to mark message as processed");
                InboundOutcome::Failed
            }
        }
    }

    /// Readiness probe: the store answers
    pub async fn check_store(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    /// Flush the publisher before exit
    pub async fn flush(&self, timeout: Duration) -> anyhow::Result<()> {
        self.publisher.flush(timeout).await
    }
}
