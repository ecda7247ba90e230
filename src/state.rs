use std::sync::Arc;

use tracing::info;

use crate::config::{AppConfig, StoreConfig};
use crate::session::Session;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, PgStore, S3Store};

/// Builds the backend selected in `config`.
pub async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let store = match &config.store {
        StoreConfig::Memory => {
            info!("using in-memory store; nothing will survive restart");
            Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>
        }
        StoreConfig::File { data_dir } => {
            info!(data_dir = %data_dir.display(), "using file store");
            Arc::new(FileStore::open(data_dir).await?) as Arc<dyn KeyValueStore>
        }
        StoreConfig::S3(s3) => {
            info!(endpoint = %s3.endpoint, bucket = %s3.bucket, "using s3 store");
            Arc::new(
                S3Store::new(
                    &s3.endpoint,
                    &s3.bucket,
                    &s3.access_key,
                    &s3.secret_key,
                    &s3.region,
                    &s3.prefix,
                )
                .await?,
            ) as Arc<dyn KeyValueStore>
        }
        StoreConfig::Postgres { database_url } => {
            info!("using postgres store");
            Arc::new(PgStore::connect(database_url).await?) as Arc<dyn KeyValueStore>
        }
    };
    Ok(store)
}

/// Reads configuration from the environment, opens the store and loads a ready session.
pub async fn init() -> anyhow::Result<Session> {
    let config = AppConfig::from_env()?;
    let store = open_store(&config).await?;
    Ok(Session::open(store).await)
}
