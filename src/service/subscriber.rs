use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::traits::RecordSource;
use super::MessageService;

/// Owner's handle on a running subscriber loop
pub struct SubscriberHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SubscriberHandle {
    pub(crate) fn new(token: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { token, task }
    }

    /// Token observed by the loop; cancelling it starts the shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop reading, let the in-flight record finish, release the source.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.token.cancel();
        self.task.await.context("Subscriber task panicked")
    }
}

/// Spawn the read-and-handle loop.
///
/// Records are handled one at a time in delivery order and each one is
/// committed right after it was handled, whatever the outcome. A crash
/// between the two leads to redelivery, which the idempotent mark absorbs.
/// Nothing is retried in process.
pub fn spawn_subscriber<S>(
    service: Arc<MessageService>,
    mut source: S,
    error_backoff: Duration,
    token: CancellationToken,
) -> JoinHandle<()>
where
    S: RecordSource + 'static,
{
    tokio::spawn(async move {
        info!(payload_format = ?service.payload_format(), "Subscriber started");

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                next = source.next_record() => next,
            };

            match next {
                Ok(Some(record)) => {
                    // Not raced against cancellation: an in-flight record always completes
                    let outcome = service.handle_inbound(&record.payload).await;
                    debug!(
                        partition = record.partition,
                        offset = record.offset,
                        outcome = outcome.label(),
                        "Inbound record handled"
                    );

                    if let Err(e) = source.commit(&record).await {
                        error!(
                            error = %e,
                            partition = record.partition,
                            offset = record.offset,
                            "Failed to commit offset"
                        );
                    }
                }
                Ok(None) => {
                    debug!("No inbound record within poll timeout");
                }
                Err(e) => {
                    error!(error = %e, "Failed to read inbound record, retrying");
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(error_backoff) => {}
                    }
                }
            }
        }

        source.close().await;
        info!("Subscriber stopped");
    })
}
