//! Email vector store trait.
//!
//! Defines the interface for nearest-neighbour retrieval over historical
//! emails. Implementations (PostgreSQL + pgvector, in-memory) live in
//! mailrag-infra.

use std::future::Future;

use mailrag_types::email::{EmailRecord, RankedEmail, UpsertOutcome};
use mailrag_types::error::StoreError;

/// Trait for vector-indexed email storage with similarity search.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Each call holds its own store connection for exactly its own duration.
pub trait EmailStore: Send + Sync {
    /// Find the `k` emails nearest to `query_embedding`, nearest first.
    ///
    /// `k == 0` and an empty store both yield an empty vector.
    fn find_similar(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> impl Future<Output = Result<Vec<RankedEmail>, StoreError>> + Send;

    /// Insert a record unless a record with the same id already exists.
    ///
    /// An existing row, embedding included, is never modified.
    fn upsert(
        &self,
        record: &EmailRecord,
    ) -> impl Future<Output = Result<UpsertOutcome, StoreError>> + Send;

    /// Count stored emails.
    fn count(&self) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Idempotently create whatever schema the store needs.
    fn ensure_schema(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// The embedding dimension this store accepts.
    fn dimension(&self) -> usize;
}
