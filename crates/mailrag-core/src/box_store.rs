//! BoxEmailStore -- object-safe dynamic dispatch wrapper for EmailStore.
//!
//! Same blanket-impl pattern as [`crate::box_embedder::BoxEmbedder`].

use std::future::Future;
use std::pin::Pin;

use mailrag_types::email::{EmailRecord, RankedEmail, UpsertOutcome};
use mailrag_types::error::StoreError;

use super::store::EmailStore;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Object-safe version of [`EmailStore`] with boxed futures.
pub trait EmailStoreDyn: Send + Sync {
    fn find_similar_boxed<'a>(
        &'a self,
        query_embedding: &'a [f32],
        k: usize,
    ) -> BoxFuture<'a, Vec<RankedEmail>>;

    fn upsert_boxed<'a>(&'a self, record: &'a EmailRecord) -> BoxFuture<'a, UpsertOutcome>;

    fn count_boxed(&self) -> BoxFuture<'_, u64>;

    fn ensure_schema_boxed(&self) -> BoxFuture<'_, ()>;

    fn dimension_dyn(&self) -> usize;
}

impl<T: EmailStore> EmailStoreDyn for T {
    fn find_similar_boxed<'a>(
        &'a self,
        query_embedding: &'a [f32],
        k: usize,
    ) -> BoxFuture<'a, Vec<RankedEmail>> {
        Box::pin(self.find_similar(query_embedding, k))
    }

    fn upsert_boxed<'a>(&'a self, record: &'a EmailRecord) -> BoxFuture<'a, UpsertOutcome> {
        Box::pin(self.upsert(record))
    }

    fn count_boxed(&self) -> BoxFuture<'_, u64> {
        Box::pin(self.count())
    }

    fn ensure_schema_boxed(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.ensure_schema())
    }

    fn dimension_dyn(&self) -> usize {
        self.dimension()
    }
}

/// Type-erased email store, so the backend can be chosen from configuration.
pub struct BoxEmailStore {
    inner: Box<dyn EmailStoreDyn + Send + Sync>,
}

impl BoxEmailStore {
    /// Wrap a concrete `EmailStore` in a type-erased box.
    pub fn new<T: EmailStore + 'static>(store: T) -> Self {
        Self {
            inner: Box::new(store),
        }
    }
}

impl EmailStore for BoxEmailStore {
    fn find_similar(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> impl Future<Output = Result<Vec<RankedEmail>, StoreError>> + Send {
        async move { self.inner.find_similar_boxed(query_embedding, k).await }
    }

    fn upsert(
        &self,
        record: &EmailRecord,
    ) -> impl Future<Output = Result<UpsertOutcome, StoreError>> + Send {
        async move { self.inner.upsert_boxed(record).await }
    }

    fn count(&self) -> impl Future<Output = Result<u64, StoreError>> + Send {
        self.inner.count_boxed()
    }

    fn ensure_schema(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.inner.ensure_schema_boxed()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension_dyn()
    }
}
