//! PostgreSQL + pgvector storage.
//!
//! Every operation checks out one pooled connection and returns it when the
//! guard drops, on success and on every error path.

pub mod email;
pub mod pool;

use mailrag_types::error::StoreError;

pub use self::email::PgEmailStore;
pub use self::pool::connect;

/// Classify a sqlx error into the store error taxonomy.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Configuration(_) => StoreError::Connection(err.to_string()),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Decode(err.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}
