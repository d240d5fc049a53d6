//! PostgreSQL + pgvector email store.
//!
//! Implements `EmailStore` from `mailrag-core`. Rows live in the `emails`
//! table; similarity search orders by the pgvector operator matching the
//! configured [`DistanceMetric`] and is served by an HNSW index.

use chrono::NaiveDateTime;
use pgvector::Vector;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};

use mailrag_core::store::EmailStore;
use mailrag_types::config::DistanceMetric;
use mailrag_types::email::{EmailRecord, RankedEmail, UpsertOutcome};
use mailrag_types::error::StoreError;

use super::map_sqlx_error;

/// PostgreSQL-backed implementation of `EmailStore`.
#[derive(Clone)]
pub struct PgEmailStore {
    pool: PgPool,
    metric: DistanceMetric,
    dimension: usize,
}

impl PgEmailStore {
    pub fn new(pool: PgPool, metric: DistanceMetric, dimension: usize) -> Self {
        Self {
            pool,
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

// ---------------------------------------------------------------------------
// SQL
// ---------------------------------------------------------------------------

/// pgvector distance operator for a metric.
fn distance_operator(metric: DistanceMetric) -> &'static str {
    match metric {
        DistanceMetric::InnerProduct => "<#>",
        DistanceMetric::Cosine => "<=>",
        DistanceMetric::L2 => "<->",
    }
}

/// HNSW operator class for a metric.
fn operator_class(metric: DistanceMetric) -> &'static str {
    match metric {
        DistanceMetric::InnerProduct => "vector_ip_ops",
        DistanceMetric::Cosine => "vector_cosine_ops",
        DistanceMetric::L2 => "vector_l2_ops",
    }
}

fn schema_statements(metric: DistanceMetric, dimension: usize) -> [String; 3] {
    [
        "CREATE EXTENSION IF NOT EXISTS vector".to_string(),
        format!(
            r#"CREATE TABLE IF NOT EXISTS emails (
                id          BIGINT PRIMARY KEY,
                subject     TEXT,
                body        TEXT,
                summary     TEXT,
                actions     TEXT[],
                priority    TEXT,
                created_at  TIMESTAMP,
                embedding   vector({dimension}) NOT NULL
            )"#
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS emails_embedding_{metric}_idx ON emails USING hnsw (embedding {})",
            operator_class(metric)
        ),
    ]
}

fn similarity_query(metric: DistanceMetric) -> String {
    format!(
        r#"SELECT id, subject, body, summary, actions, priority, created_at, embedding,
                  (embedding {op} $1)::REAL AS distance
           FROM emails
           ORDER BY embedding {op} $1, id
           LIMIT $2"#,
        op = distance_operator(metric)
    )
}

const UPSERT_SQL: &str = r#"INSERT INTO emails (id, subject, body, summary, actions, priority, created_at, embedding)
   VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
   ON CONFLICT (id) DO NOTHING"#;

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn ranked_from_row(row: &PgRow) -> Result<RankedEmail, sqlx::Error> {
    let embedding: Vector = row.try_get("embedding")?;
    let created_at: Option<NaiveDateTime> = row.try_get("created_at")?;
    let email = EmailRecord {
        id: row.try_get("id")?,
        subject: row.try_get::<Option<String>, _>("subject")?.unwrap_or_default(),
        body: row.try_get::<Option<String>, _>("body")?.unwrap_or_default(),
        summary: row.try_get::<Option<String>, _>("summary")?.unwrap_or_default(),
        actions: row.try_get::<Option<Vec<String>>, _>("actions")?.unwrap_or_default(),
        priority: row.try_get::<Option<String>, _>("priority")?.unwrap_or_default(),
        created_at: created_at.map(|naive| naive.and_utc()),
        embedding: embedding.to_vec(),
    };
    Ok(RankedEmail {
        email,
        distance: row.try_get("distance")?,
    })
}

// ---------------------------------------------------------------------------
// EmailStore implementation
// ---------------------------------------------------------------------------

impl EmailStore for PgEmailStore {
    async fn find_similar(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RankedEmail>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        self.check_dimension(query_embedding.len())?;

        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        let rows = sqlx::query(&similarity_query(self.metric))
            .bind(Vector::from(query_embedding.to_vec()))
            .bind(i64::try_from(k).unwrap_or(i64::MAX))
            .fetch_all(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| ranked_from_row(row).map_err(|e| StoreError::Decode(e.to_string())))
            .collect()
    }

    async fn upsert(&self, record: &EmailRecord) -> Result<UpsertOutcome, StoreError> {
        self.check_dimension(record.embedding.len())?;

        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        let result = sqlx::query(UPSERT_SQL)
            .bind(record.id)
            .bind(&record.subject)
            .bind(&record.body)
            .bind(&record.summary)
            .bind(&record.actions)
            .bind(&record.priority)
            .bind(record.created_at.map(|dt| dt.naive_utc()))
            .bind(Vector::from(record.embedding.clone()))
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

        Ok(if result.rows_affected() == 0 {
            UpsertOutcome::AlreadyPresent
        } else {
            UpsertOutcome::Inserted
        })
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM emails")
            .fetch_one(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
        Ok(count.max(0) as u64)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        for statement in schema_statements(self.metric, self.dimension) {
            sqlx::query(&statement)
                .execute(&mut *conn)
                .await
                .map_err(map_sqlx_error)?;
        }
        tracing::info!(
            dimension = self.dimension,
            metric = %self.metric,
            "email schema ready"
        );
        Ok(())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_match_metric() {
        assert_eq!(distance_operator(DistanceMetric::InnerProduct), "<#>");
        assert_eq!(distance_operator(DistanceMetric::Cosine), "<=>");
        assert_eq!(distance_operator(DistanceMetric::L2), "<->");
        assert_eq!(operator_class(DistanceMetric::Cosine), "vector_cosine_ops");
    }

    #[test]
    fn test_schema_statements() {
        let [extension, table, index] = schema_statements(DistanceMetric::InnerProduct, 1536);
        assert_eq!(extension, "CREATE EXTENSION IF NOT EXISTS vector");
        assert!(table.contains("vector(1536)"));
        assert!(table.contains("id          BIGINT PRIMARY KEY"));
        assert!(index.contains("emails_embedding_inner_product_idx"));
        assert!(index.contains("USING hnsw (embedding vector_ip_ops)"));
    }

    #[test]
    fn test_similarity_query_orders_by_distance_then_id() {
        let sql = similarity_query(DistanceMetric::L2);
        assert!(sql.contains("ORDER BY embedding <-> $1, id"));
        assert!(sql.contains("LIMIT $2"));
    }

    // -----------------------------------------------------------------------
    // Integration tests against a live pgvector database:
    //   MAILRAG_TEST_DATABASE_URL=postgresql://... cargo test -- --ignored --test-threads=1
    // Each test drops and recreates the `emails` table.
    // -----------------------------------------------------------------------

    async fn live_store(dimension: usize) -> PgEmailStore {
        let url = std::env::var("MAILRAG_TEST_DATABASE_URL")
            .expect("MAILRAG_TEST_DATABASE_URL must be set for ignored tests");
        let pool = PgPool::connect(&url).await.unwrap();
        sqlx::query("DROP TABLE IF EXISTS emails")
            .execute(&pool)
            .await
            .unwrap();
        let store = PgEmailStore::new(pool, DistanceMetric::InnerProduct, dimension);
        store.ensure_schema().await.unwrap();
        store
    }

    fn record(id: i64, embedding: Vec<f32>) -> EmailRecord {
        EmailRecord {
            id,
            subject: format!("Subject {id}"),
            body: format!("Body {id}"),
            summary: format!("Summary {id}"),
            actions: vec![format!("Action {id}")],
            priority: "high".to_string(),
            created_at: None,
            embedding,
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_upsert_is_insert_or_ignore() {
        let store = live_store(3).await;
        assert_eq!(
            store.upsert(&record(42, vec![1.0, 0.0, 0.0])).await.unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert(&record(42, vec![0.0, 1.0, 0.0])).await.unwrap(),
            UpsertOutcome::AlreadyPresent
        );
        assert_eq!(store.count().await.unwrap(), 1);

        let hits = store.find_similar(&[1.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(hits[0].email.embedding, vec![1.0, 0.0, 0.0]);
        assert_eq!(hits[0].email.actions, vec!["Action 42"]);
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_find_similar_orders_by_inner_product() {
        let store = live_store(2).await;
        store.upsert(&record(1, vec![0.1, 0.0])).await.unwrap();
        store.upsert(&record(2, vec![0.9, 0.0])).await.unwrap();
        store.upsert(&record(3, vec![0.5, 0.0])).await.unwrap();

        let hits = store.find_similar(&[1.0, 0.0], 2).await.unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.email.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(hits[0].distance <= hits[1].distance);

        // Schema setup is idempotent.
        store.ensure_schema().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_dimension_mismatch() {
        let store = live_store(3).await;
        let err = store.find_similar(&[1.0], 1).await.unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { expected: 3, actual: 1 }));
    }
}
