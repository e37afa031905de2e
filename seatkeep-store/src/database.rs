use async_trait::async_trait;
use seatkeep_core::{Collection, Document, DocumentStore, DocumentUpdate, StoreError};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Pool, Postgres};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Documents kept as JSONB rows keyed by `(collection, id)`.
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn query(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        // A body without an `id` is addressed by its key, same as MemoryStore.
        let rows: Vec<(String, Json<Value>)> = sqlx::query_as(
            r#"
            SELECT id, body
            FROM documents
            WHERE collection = $1
              AND (
                body -> $2 = $3
                OR ($2 = 'id' AND NOT (body ? 'id') AND to_jsonb(id) = $3)
              )
            ORDER BY id
            "#,
        )
        .bind(collection.as_str())
        .bind(field)
        .bind(Json(value))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        debug!(%collection, field, matches = rows.len(), "Document query");

        Ok(rows
            .into_iter()
            .map(|(id, Json(body))| Document::new(id, body))
            .collect())
    }

    async fn atomic_batch(&self, updates: Vec<DocumentUpdate>) -> Result<(), StoreError> {
        if updates.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(backend)?;

        for update in updates {
            let result = sqlx::query(
                r#"
                UPDATE documents
                SET body = body || $3, updated_at = now()
                WHERE collection = $1 AND id = $2
                "#,
            )
            .bind(update.collection.as_str())
            .bind(&update.id)
            .bind(Json(Value::Object(update.changes)))
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

            if result.rows_affected() == 0 {
                tx.rollback().await.map_err(backend)?;
                return Err(StoreError::MissingDocument {
                    collection: update.collection,
                    id: update.id,
                });
            }
        }

        tx.commit().await.map_err(backend)?;
        Ok(())
    }
}
