//! Store factory.
//!
//! Builds the [`BoxEmailStore`] selected by `store.backend`, the way the
//! binary picks its backend at start-up.

use mailrag_core::box_store::BoxEmailStore;
use mailrag_types::config::{StoreBackend, StoreConfig};
use mailrag_types::error::StoreError;

use crate::postgres::{self, PgEmailStore};
use crate::vector::InMemoryEmailStore;

/// Open the configured store for vectors of `dimension` components.
///
/// For PostgreSQL this connects the pool; it does not create the schema.
pub async fn open_store(config: &StoreConfig, dimension: usize) -> Result<BoxEmailStore, StoreError> {
    match config.backend {
        StoreBackend::Postgres => {
            let pool = postgres::connect(config).await?;
            Ok(BoxEmailStore::new(PgEmailStore::new(pool, config.metric, dimension)))
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on exit");
            Ok(BoxEmailStore::new(InMemoryEmailStore::new(config.metric, dimension)))
        }
    }
}
