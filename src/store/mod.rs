use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, StoreBackend};
use crate::error::StoreError;
use crate::protocol::{ModDocument, ModDraft, Page, UpsertOutcome};

pub mod memory;
pub mod postgres;

pub use memory::MemoryModStore;
pub use postgres::PgModStore;

/// Filter-by-name access to the mod collection.
///
/// `upsert` and `delete_by_name` must each be a single atomic operation on the
/// backing store; handlers never combine calls to emulate them.
#[async_trait]
pub trait ModStore: Send + Sync {
    /// Round trip to the backing store.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Documents ordered by `created_at`, then `name`. `None` returns everything.
    async fn list(&self, page: Option<Page>) -> Result<Vec<ModDocument>, StoreError>;

    async fn find_by_name(&self, name: &str) -> Result<ModDocument, StoreError>;

    /// Inserts the draft when no document has its name, otherwise overwrites
    /// description, image and updated_at of the existing one.
    async fn upsert(&self, draft: ModDraft) -> Result<UpsertOutcome, StoreError>;

    /// Removes and returns the document with this name.
    async fn delete_by_name(&self, name: &str) -> Result<ModDocument, StoreError>;

    /// Releases connections. Called once during shutdown.
    async fn close(&self) {}

    fn backend(&self) -> &'static str;
}

/// Opens the configured store and verifies it is reachable and has its collection.
pub async fn open(config: &Config) -> Result<Arc<dyn ModStore>, StoreError> {
    match config.store_backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryModStore::new())),
        StoreBackend::Postgres => {
            let timeout = Duration::from_millis(config.db_connect_timeout_ms);
            let store = tokio::time::timeout(
                timeout,
                PgModStore::connect(&config.database_url, config.db_max_connections, timeout),
            )
            .await
            .map_err(|_| StoreError::transient(format!("timed out after {}ms connecting to store", config.db_connect_timeout_ms)))??;
            store.ping().await?;
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
    }
}
