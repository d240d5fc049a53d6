//! Email domain types for mailrag.
//!
//! These types model the historical emails stored in the vector store, the
//! batch-file lines they are ingested from, and the transient request/result
//! shapes of the summarization endpoint.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A historical email with its embedding, as persisted in the store.
///
/// Rows are created once during ingestion and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailRecord {
    /// Unique, immutable primary key.
    pub id: i64,
    pub subject: String,
    pub body: String,
    /// Prior summary written for this email.
    pub summary: String,
    /// Prior action items, in order.
    pub actions: Vec<String>,
    pub priority: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Fixed-dimension embedding of `subject + "\n" + body`.
    pub embedding: Vec<f32>,
}

/// One line of the ingestion batch file: an [`EmailRecord`] minus its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailInput {
    pub id: i64,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub priority: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl EmailInput {
    /// The text that gets embedded for this email.
    pub fn embedding_text(&self) -> String {
        format!("{}\n{}", self.subject, self.body)
    }

    /// Attach an embedding, producing a storable record.
    pub fn into_record(self, embedding: Vec<f32>) -> EmailRecord {
        EmailRecord {
            id: self.id,
            subject: self.subject,
            body: self.body,
            summary: self.summary,
            actions: self.actions,
            priority: self.priority,
            created_at: self.created_at,
            embedding,
        }
    }
}

/// A retrieved email together with its distance to the query vector.
///
/// Lower distance means more similar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEmail {
    pub email: EmailRecord,
    pub distance: f32,
}

/// Result of an insert-or-ignore upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    /// A row with the same id already existed and was left untouched.
    AlreadyPresent,
}

/// Body of `POST /summarize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizationRequest {
    pub subject: String,
    pub body: String,
    /// Number of similar emails to use as examples. Defaults to the
    /// configured `retrieval.default_top_k` when absent.
    #[serde(default)]
    pub top_k: Option<u32>,
}

/// Summary and action items extracted for one email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizationResult {
    pub summary: String,
    pub actions: Vec<String>,
}

/// Counters produced by one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Lines read from the batch file, blank ones included.
    pub lines_read: u64,
    pub inserted: u64,
    /// Records whose id already existed in the store.
    pub already_present: u64,
    pub skipped_blank: u64,
    /// Records that failed and were skipped (only under the `skip` policy).
    pub failed: u64,
}

impl IngestReport {
    /// Records that reached the store, whether inserted or already present.
    pub fn processed(&self) -> u64 {
        self.inserted + self.already_present
    }
}

/// Parse a batch-file timestamp.
///
/// Accepts RFC 3339 (`2024-03-01T09:30:00Z`), naive ISO-8601 with a `T` or a
/// space separator and optional fractional seconds, and bare dates. Naive
/// values are interpreted as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("invalid timestamp: '{s}'"))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_email_input_minimal_line_uses_defaults() {
        let line = r#"{"id": 7, "subject": "Hello", "body": "World"}"#;
        let input: EmailInput = serde_json::from_str(line).unwrap();
        assert_eq!(input.id, 7);
        assert_eq!(input.summary, "");
        assert!(input.actions.is_empty());
        assert_eq!(input.priority, "");
        assert!(input.created_at.is_none());
    }

    #[test]
    fn test_email_input_full_line() {
        let line = r#"{
            "id": 42,
            "subject": "Q3 budget",
            "body": "Please approve by Friday",
            "summary": "Budget approval needed",
            "actions": ["Approve budget", "Reply to finance"],
            "priority": "high",
            "created_at": "2024-07-01T09:15:00",
            "thread": "ignored"
        }"#;
        let input: EmailInput = serde_json::from_str(line).unwrap();
        assert_eq!(input.actions, vec!["Approve budget", "Reply to finance"]);
        assert_eq!(input.priority, "high");
        let created = input.created_at.unwrap();
        assert_eq!(created.year(), 2024);
        assert_eq!(created.hour(), 9);
    }

    #[test]
    fn test_email_input_missing_body_is_rejected() {
        let line = r#"{"id": 1, "subject": "No body"}"#;
        assert!(serde_json::from_str::<EmailInput>(line).is_err());
    }

    #[test]
    fn test_email_input_invalid_timestamp_is_rejected() {
        let line = r#"{"id": 1, "subject": "s", "body": "b", "created_at": "yesterday"}"#;
        let err = serde_json::from_str::<EmailInput>(line).unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn test_email_input_null_timestamp_is_absent() {
        let line = r#"{"id": 1, "subject": "s", "body": "b", "created_at": null}"#;
        let input: EmailInput = serde_json::from_str(line).unwrap();
        assert!(input.created_at.is_none());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2024-03-01T09:30:00+02:00").unwrap();
        assert_eq!(rfc.hour(), 7);

        let spaced = parse_timestamp("2024-03-01 09:30:00.250").unwrap();
        assert_eq!(spaced.minute(), 30);

        let date = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(date.hour(), 0);

        assert!(parse_timestamp("03/01/2024").is_err());
    }

    #[test]
    fn test_embedding_text_joins_subject_and_body() {
        let input = EmailInput {
            id: 1,
            subject: "Subject".to_string(),
            body: "Body".to_string(),
            summary: String::new(),
            actions: Vec::new(),
            priority: String::new(),
            created_at: None,
        };
        assert_eq!(input.embedding_text(), "Subject\nBody");
        let record = input.into_record(vec![0.5, 0.25]);
        assert_eq!(record.embedding, vec![0.5, 0.25]);
        assert_eq!(record.subject, "Subject");
    }

    #[test]
    fn test_summarization_request_top_k_optional() {
        let req: SummarizationRequest =
            serde_json::from_str(r#"{"subject": "s", "body": "b"}"#).unwrap();
        assert!(req.top_k.is_none());

        let req: SummarizationRequest =
            serde_json::from_str(r#"{"subject": "s", "body": "b", "top_k": 3}"#).unwrap();
        assert_eq!(req.top_k, Some(3));

        assert!(
            serde_json::from_str::<SummarizationRequest>(r#"{"subject": "s", "body": "b", "top_k": -1}"#)
                .is_err()
        );
    }

    #[test]
    fn test_ingest_report_processed() {
        let report = IngestReport {
            lines_read: 5,
            inserted: 3,
            already_present: 1,
            skipped_blank: 1,
            failed: 0,
        };
        assert_eq!(report.processed(), 4);
    }
}
