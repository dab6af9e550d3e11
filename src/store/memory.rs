use chrono::Utc;
use courier_db::Message;
use courier_error::StoreError;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MessageStore, StoreResult};

/// Process-local store with the same semantics as the Postgres one.
///
/// Rows are kept in insertion order, which doubles as creation order.
#[derive(Default)]
pub struct InMemoryMessageStore {
    rows: RwLock<Vec<Message>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn create(&self, content: &str) -> StoreResult<Message> {
        let message = Message::new(content);
        self.rows.write().await.push(message.clone());
        Ok(message)
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Message> {
        self.rows
            .read()
            .await
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_content(&self, content: &str) -> StoreResult<Message> {
        let rows = self.rows.read().await;
        rows.iter()
            .find(|m| m.content == content && !m.processed)
            .or_else(|| rows.iter().find(|m| m.content == content))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_all(&self) -> StoreResult<Vec<Message>> {
        Ok(self.rows.read().await.clone())
    }

    async fn mark_processed(&self, id: Uuid) -> StoreResult<bool> {
        let mut rows = self.rows.write().await;
        let message = rows
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::NotFound)?;

        if message.processed {
            return Ok(false);
        }
        message.processed = true;
        message.processed_at = Some(Utc::now());
        Ok(true)
    }

    async fn count_processed(&self) -> StoreResult<i64> {
        let count = self.rows.read().await.iter().filter(|m| m.processed).count();
        Ok(count as i64)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
