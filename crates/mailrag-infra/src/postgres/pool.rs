//! Connection pool construction.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use mailrag_types::config::StoreConfig;
use mailrag_types::error::StoreError;

/// How long a caller waits for a free pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a connection pool to `config.database_url`.
///
/// Connects eagerly so that an unreachable database fails at start-up.
pub async fn connect(config: &StoreConfig) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

    tracing::debug!(max_connections = config.max_connections, "database pool ready");
    Ok(pool)
}
