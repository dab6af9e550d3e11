//! Durable record of messages and their processed state.
//!
//! Every backend distinguishes a missing row ([`StoreError::NotFound`]) from
//! a backend failure ([`StoreError::Storage`]) so callers never conflate the
//! two.

mod memory;
mod postgres;

pub use memory::InMemoryMessageStore;
pub use postgres::PostgresMessageStore;

use courier_db::Message;
use courier_error::StoreError;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait::async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new unprocessed message. The row is either fully visible
    /// or absent.
    async fn create(&self, content: &str) -> StoreResult<Message>;

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Message>;

    /// Find a message by exact content.
    ///
    /// When several rows share the content, the oldest unprocessed one wins;
    /// if all of them are processed, the oldest processed one is returned.
    ///
    /// Content carries no identity, so a redelivered record for a row that
    /// is already processed resolves to any other unprocessed row with the
    /// same content. That includes a row whose publish failed, which then
    /// stops being unprocessed. Use `PayloadFormat::Envelope` when every
    /// record must map to exactly its own row.
    async fn get_by_content(&self, content: &str) -> StoreResult<Message>;

    /// All messages, oldest first
    async fn list_all(&self) -> StoreResult<Vec<Message>>;

    /// Set `processed` and `processed_at` if the row is still unprocessed.
    ///
    /// Returns `true` when this call performed the transition and `false`
    /// when the row was already processed. A missing id is `NotFound`.
    async fn mark_processed(&self, id: Uuid) -> StoreResult<bool>;

    async fn count_processed(&self) -> StoreResult<i64>;

    /// Cheap reachability probe for readiness checks
    async fn ping(&self) -> StoreResult<()>;
}
