use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use tracing::{instrument, warn};

use super::{KeyValueStore, Namespace};

/// Rows of `kv_entries(namespace, key, value jsonb)`.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            warn!(error = %e, "kv_entries migration failed; continuing");
        }

        Ok(Self { db })
    }
}

#[async_trait]
impl KeyValueStore for PgStore {
    #[instrument(skip(self))]
    async fn get(&self, ns: Namespace, key: &str) -> anyhow::Result<Option<Value>> {
        let row = sqlx::query_scalar::<_, Json<Value>>(
            r#"
            SELECT value
              FROM kv_entries
             WHERE namespace = $1 AND key = $2
            "#,
        )
        .bind(ns.as_str())
        .bind(key)
        .fetch_optional(&self.db)
        .await
        .context("select kv entry")?;
        Ok(row.map(|Json(v)| v))
    }

    #[instrument(skip(self, value))]
    async fn set(&self, ns: Namespace, key: &str, value: Value) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (namespace, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (namespace, key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(ns.as_str())
        .bind(key)
        .bind(Json(value))
        .execute(&self.db)
        .await
        .context("upsert kv entry")?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn has(&self, ns: Namespace, key: &str) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM kv_entries WHERE namespace = $1 AND key = $2
            )
            "#,
        )
        .bind(ns.as_str())
        .bind(key)
        .fetch_one(&self.db)
        .await
        .context("check kv entry")?;
        Ok(exists)
    }
}
