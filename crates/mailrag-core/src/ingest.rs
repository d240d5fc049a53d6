//! Batch ingestion of historical emails.
//!
//! Reads a JSON-lines batch file one record at a time, embeds each record's
//! `subject + "\n" + body` and upserts it into the store.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use mailrag_types::config::{IngestConfig, OnError};
use mailrag_types::email::{EmailInput, IngestReport, UpsertOutcome};
use mailrag_types::error::IngestError;

use crate::embedder::Embedder;
use crate::store::EmailStore;

/// Tuning knobs for one ingestion run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    /// Log progress after every this many records. `0` disables it.
    pub progress_every: u64,
    /// Pause taken after each progress report.
    pub throttle: Duration,
    pub on_error: OnError,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::from(&IngestConfig::default())
    }
}

impl From<&IngestConfig> for IngestOptions {
    fn from(config: &IngestConfig) -> Self {
        Self {
            progress_every: config.progress_every,
            throttle: Duration::from_millis(config.throttle_ms),
            on_error: config.on_error,
        }
    }
}

/// Callback invoked with the running counters after every record.
pub type ProgressFn = Box<dyn Fn(&IngestReport) + Send + Sync>;

/// Sequential embed-and-store job over a batch file.
pub struct IngestionPipeline<E: Embedder, S: EmailStore> {
    embedder: E,
    store: S,
    options: IngestOptions,
    on_progress: Option<ProgressFn>,
}

impl<E: Embedder, S: EmailStore> IngestionPipeline<E, S> {
    pub fn new(embedder: E, store: S, options: IngestOptions) -> Self {
        Self {
            embedder,
            store,
            options,
            on_progress: None,
        }
    }

    /// Register a callback that observes the counters as the run advances.
    pub fn with_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ingest every line from `reader`.
    ///
    /// Under [`OnError::Abort`] the first failing record ends the run with
    /// its line number. Under [`OnError::Skip`] the failure is logged and
    /// counted in [`IngestReport::failed`].
    pub async fn run<R>(&self, mut reader: R) -> Result<IngestReport, IngestError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut report = IngestReport::default();
        let mut buf = Vec::new();
        let mut line_no: u64 = 0;

        info!(
            model = self.embedder.model_name(),
            dimension = self.embedder.dimension(),
            on_error = %self.options.on_error,
            "ingestion started"
        );

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            line_no += 1;
            report.lines_read += 1;

            let outcome = match line_text(&buf, line_no) {
                Ok(line) if line.trim().is_empty() => {
                    report.skipped_blank += 1;
                    continue;
                }
                Ok(line) => self.ingest_line(line, line_no).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(UpsertOutcome::Inserted) => report.inserted += 1,
                Ok(UpsertOutcome::AlreadyPresent) => {
                    debug!(line = line_no, "record already present; left untouched");
                    report.already_present += 1;
                }
                Err(e) => match self.options.on_error {
                    OnError::Abort => return Err(e),
                    OnError::Skip => {
                        warn!(line = line_no, error = %e, "skipping record");
                        report.failed += 1;
                    }
                },
            }

            if let Some(on_progress) = &self.on_progress {
                on_progress(&report);
            }

            let records = report.processed() + report.failed;
            if self.options.progress_every > 0 && records % self.options.progress_every == 0 {
                info!(records, inserted = report.inserted, "ingestion progress");
                if !self.options.throttle.is_zero() {
                    tokio::time::sleep(self.options.throttle).await;
                }
            }
        }

        info!(
            lines_read = report.lines_read,
            inserted = report.inserted,
            already_present = report.already_present,
            failed = report.failed,
            "ingestion finished"
        );
        Ok(report)
    }

    async fn ingest_line(&self, line: &str, line_no: u64) -> Result<UpsertOutcome, IngestError> {
        let input: EmailInput =
            serde_json::from_str(line).map_err(|e| IngestError::MalformedRecord {
                line: line_no,
                message: e.to_string(),
            })?;

        let embedding = self
            .embedder
            .embed_one(&input.embedding_text())
            .await
            .map_err(|source| IngestError::Embedding {
                line: line_no,
                source,
            })?;

        let record = input.into_record(embedding);
        self.store
            .upsert(&record)
            .await
            .map_err(|source| IngestError::Store {
                line: line_no,
                source,
            })
    }
}

/// One raw line without its terminator. Invalid UTF-8 is a malformed record.
fn line_text(raw: &[u8], line_no: u64) -> Result<&str, IngestError> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    std::str::from_utf8(raw).map_err(|e| IngestError::MalformedRecord {
        line: line_no,
        message: format!("invalid UTF-8: {e}"),
    })
}
