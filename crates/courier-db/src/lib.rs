//! # Courier Database
//!
//! Connection pooling, schema migrations and the `messages` row type.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use courier_config::DbConfig;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Database connection pool type
pub type DbPool = Pool<Postgres>;

/// A stored message and its processing state
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    /// Content exactly as submitted
    #[sqlx(rename = "message")]
    #[serde(rename = "message")]
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub processed: bool,
    /// Set once, when `processed` first becomes true
    pub processed_at: Option<DateTime<Utc>>,
}

impl Message {
    /// A fresh, unprocessed message
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            created_at: Utc::now(),
            processed: false,
            processed_at: None,
        }
    }
}

/// Create a PostgreSQL connection pool
///
/// The first connection is retried `connect_attempts` times so the service
/// survives starting before the database is reachable.
pub async fn create_pool(db_config: &DbConfig) -> Result<DbPool> {
    let options = PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .acquire_timeout(Duration::from_secs(db_config.acquire_timeout_secs))
        .idle_timeout(Some(Duration::from_secs(db_config.idle_timeout_secs)))
        .test_before_acquire(true);

    let attempts = db_config.connect_attempts.max(1);
    let delay = Duration::from_millis(db_config.connect_retry_delay_ms);

    let mut attempt = 1;
    loop {
        match options.clone().connect(&db_config.url).await {
            Ok(pool) => {
                tracing::info!(attempt, "Connected to database");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    attempts_left = attempts - attempt,
                    "Database not reachable, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to connect to database after {} attempts", attempts)
                });
            }
        }
    }
}

/// Apply pending schema migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}
