use courier_db::{DbPool, Message};
use courier_error::StoreError;
use uuid::Uuid;

use super::{MessageStore, StoreResult};

/// PostgreSQL implementation of MessageStore
pub struct PostgresMessageStore {
    pool: DbPool,
}

impl PostgresMessageStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MessageStore for PostgresMessageStore {
    async fn create(&self, content: &str) -> StoreResult<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (message)
            VALUES ($1)
            RETURNING id, message, created_at, processed, processed_at
            "#,
        )
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Message> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, message, created_at, processed, processed_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn get_by_content(&self, content: &str) -> StoreResult<Message> {
        // md5() lets the lookup use idx_messages_content_lookup for long texts
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, message, created_at, processed, processed_at
            FROM messages
            WHERE md5(message) = md5($1) AND message = $1
            ORDER BY processed ASC, created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(content)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn list_all(&self) -> StoreResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, message, created_at, processed, processed_at
            FROM messages
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn mark_processed(&self, id: Uuid) -> StoreResult<bool> {
        // Conditional write: concurrent or repeated marks cannot move processed_at
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE messages
            SET processed = TRUE, processed_at = NOW()
            WHERE id = $1 AND processed = FALSE
            RETURNING id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_some() {
            return Ok(true);
        }

        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM messages WHERE id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            Ok(false)
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn count_processed(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM messages WHERE processed = TRUE
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
