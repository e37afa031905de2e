pub mod app_config;
pub mod database;

use std::sync::Arc;

use seatkeep_core::{DocumentStore, MemoryStore};
use tracing::info;

pub use database::{DbClient, PostgresDocumentStore};

use app_config::{StoreBackend, StoreConfig};

#[derive(Debug, thiserror::Error)]
pub enum StoreSetupError {
    #[error("store.database_url is required for the postgres backend")]
    MissingDatabaseUrl,
    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Builds the document store selected in configuration.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreSetupError> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory document store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(StoreSetupError::MissingDatabaseUrl)?;
            let db = DbClient::new(url, config.max_connections).await?;
            db.migrate().await?;
            Ok(Arc::new(PostgresDocumentStore::new(db.pool)))
        }
    }
}
