//! Errors raised below the HTTP boundary.
//!
//! The store and the publisher each have their own error type; the message
//! service re-maps both into [`ServiceError`] so callers never depend on
//! storage or broker specific shapes.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

/// Failure of a message store operation
#[derive(Error, Debug)]
pub enum StoreError {
    /// Lookup matched no row
    #[error("record not found")]
    NotFound,

    /// Driver or transport failure (connection lost, constraint violation, pool timeout)
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

/// Failure to hand a record to the broker
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("broker rejected the record: {0}")]
    Rejected(String),

    #[error("no broker acknowledgement within {0:?}")]
    Timeout(Duration),

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PublishError {
    /// Metric label for this failure
    pub fn label(&self) -> &'static str {
        match self {
            PublishError::Rejected(_) => "rejected",
            PublishError::Timeout(_) => "timeout",
            PublishError::Encode(_) => "encode",
        }
    }
}

/// Errors surfaced by the message service to its callers
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The store write failed; nothing was published
    #[error("cannot create message")]
    CannotCreateMessage(#[source] StoreError),

    /// The row was stored but publishing it failed. The row stays
    /// unprocessed and is not rolled back.
    #[error("cannot produce message {id}")]
    CannotProduceMessage {
        id: Uuid,
        #[source]
        source: PublishError,
    },

    #[error("message {0} not found")]
    MessageNotFound(Uuid),

    #[error("cannot get message")]
    CannotGetMessage(#[source] StoreError),

    #[error("cannot update message")]
    CannotUpdateMessage(#[source] StoreError),
}
