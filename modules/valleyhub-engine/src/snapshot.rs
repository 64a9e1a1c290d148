//! Durable key-value snapshot backend.
//!
//! The store owns its state in memory and writes whole-map snapshots after
//! each mutation. The backend is a trait so tests run against an in-memory
//! fixture: no network, no database (see `testing`).

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read a snapshot by key. None when nothing has been written yet.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write or replace a snapshot.
    async fn put(&self, key: &str, value: Value) -> Result<()>;
}

/// Postgres-backed snapshot store: one JSONB row per snapshot key.
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS hub_snapshots (
                key TEXT PRIMARY KEY,
                value JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query_scalar::<_, Value>("SELECT value FROM hub_snapshots WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO hub_snapshots (key, value, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
