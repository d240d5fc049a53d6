//! In-memory email store with brute-force similarity search.
//!
//! Same ordering semantics as the pgvector store under each
//! [`DistanceMetric`], with ties broken by ascending id. Used for local
//! development (`store.backend = "memory"`) and in tests.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use mailrag_core::store::EmailStore;
use mailrag_types::config::DistanceMetric;
use mailrag_types::email::{EmailRecord, RankedEmail, UpsertOutcome};
use mailrag_types::error::StoreError;

pub struct InMemoryEmailStore {
    rows: RwLock<BTreeMap<i64, EmailRecord>>,
    metric: DistanceMetric,
    dimension: usize,
}

impl InMemoryEmailStore {
    pub fn new(metric: DistanceMetric, dimension: usize) -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            metric,
            dimension,
        }
    }

    fn check_dimension(&self, actual: usize) -> Result<(), StoreError> {
        if actual == self.dimension {
            Ok(())
        } else {
            Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual,
            })
        }
    }
}

impl EmailStore for InMemoryEmailStore {
    async fn find_similar(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RankedEmail>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        self.check_dimension(query_embedding.len())?;

        let rows = self.rows.read().await;
        // BTreeMap iterates in id order, so a stable sort keeps ties by id.
        let mut ranked: Vec<RankedEmail> = rows
            .values()
            .map(|email| RankedEmail {
                distance: self.metric.distance(query_embedding, &email.embedding),
                email: email.clone(),
            })
            .collect();
        ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        ranked.truncate(k);
        Ok(ranked)
    }

    async fn upsert(&self, record: &EmailRecord) -> Result<UpsertOutcome, StoreError> {
        self.check_dimension(record.embedding.len())?;

        let mut rows = self.rows.write().await;
        if rows.contains_key(&record.id) {
            return Ok(UpsertOutcome::AlreadyPresent);
        }
        rows.insert(record.id, record.clone());
        Ok(UpsertOutcome::Inserted)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.rows.read().await.len() as u64)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
