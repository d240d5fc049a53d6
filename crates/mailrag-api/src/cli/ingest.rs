//! Batch ingestion command.

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use mailrag_core::box_embedder::BoxEmbedder;
use mailrag_core::ingest::{IngestOptions, IngestionPipeline};
use mailrag_core::store::EmailStore;
use mailrag_infra::openai::OpenAiEmbedder;
use mailrag_infra::store::open_store;
use mailrag_types::email::IngestReport;
use mailrag_types::error::ConfigError;

use crate::settings::Settings;

/// Embed every record of the configured batch file and store it.
///
/// Preconditions are checked before any record is read: the credential
/// first, then the data file, then the store connection and schema.
///
/// # Examples
///
/// ```bash
/// mailrag ingest data/emails_5000.jsonl --on-error skip
/// ```
pub async fn ingest(settings: &Settings, json: bool, quiet: bool) -> Result<IngestReport> {
    let config = &settings.config;
    let api_key = settings.require_api_key()?;

    let data_file = &config.ingest.data_file;
    if !tokio::fs::try_exists(data_file).await.unwrap_or(false) {
        return Err(ConfigError::InputNotFound(data_file.clone()).into());
    }

    let embedder = OpenAiEmbedder::new(api_key, &config.embedding)?;
    let store = open_store(&config.store, config.embedding.dimensions).await?;
    store.ensure_schema().await?;

    let spinner = if json || quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(format!("Ingesting {}...", data_file.display()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let progress = spinner.clone();
    let pipeline = IngestionPipeline::new(
        BoxEmbedder::new(embedder),
        store,
        IngestOptions::from(&config.ingest),
    )
    .with_progress(Box::new(move |report: &IngestReport| {
        progress.set_message(format!(
            "Ingested {} records ({} new)",
            report.processed(),
            report.inserted
        ));
    }));

    let file = tokio::fs::File::open(data_file).await?;
    let result = pipeline.run(tokio::io::BufReader::new(file)).await;
    spinner.finish_and_clear();
    let report = result?;
    let stored = pipeline.store().count().await?;

    if json {
        let mut output = serde_json::to_value(&report)?;
        output["stored_rows"] = stored.into();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !quiet {
        print_report(&report, stored);
    }

    Ok(report)
}

fn print_report(report: &IngestReport, stored: u64) {
    println!();
    println!("  {} Ingestion complete", style("✓").green().bold());
    println!();
    println!("  Lines read:      {}", style(report.lines_read).bold());
    println!("  Inserted:        {}", style(report.inserted).green());
    println!("  Already present: {}", report.already_present);
    if report.skipped_blank > 0 {
        println!("  Blank lines:     {}", style(report.skipped_blank).dim());
    }
    if report.failed > 0 {
        println!("  Failed:          {}", style(report.failed).red());
    }
    println!("  Rows in store:   {}", style(stored).cyan());
    println!();
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use mailrag_types::config::{OnError, StoreBackend};

    use super::*;
    use crate::settings::Overrides;

    async fn spawn_embeddings_api() -> String {
        let app = Router::new().route(
            "/v1/embeddings",
            post(|Json(body): Json<Value>| async move {
                let dims = body["dimensions"].as_u64().unwrap() as usize;
                let data: Vec<Value> = body["input"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .enumerate()
                    .map(|(i, _)| json!({"index": i, "embedding": vec![0.5f32; dims]}))
                    .collect();
                Json(json!({"data": data}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    #[tokio::test]
    async fn test_missing_credential_is_reported_before_anything_else() {
        let overrides = Overrides {
            // Would fail to connect if it were ever reached.
            database_url: Some("postgresql://nobody@127.0.0.1:9/none".to_string()),
            data_file: Some(PathBuf::from("/nonexistent/emails.jsonl")),
            ..Overrides::default()
        };
        let settings = Settings::resolve(overrides).await.unwrap();

        let err = ingest(&settings, true, true).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingCredential("OPENAI_API_KEY"))
        ));
    }

    #[tokio::test]
    async fn test_missing_data_file() {
        let overrides = Overrides {
            api_key: Some("sk-test".to_string()),
            data_file: Some(PathBuf::from("/nonexistent/emails.jsonl")),
            ..Overrides::default()
        };
        let settings = Settings::resolve(overrides).await.unwrap();

        let err = ingest(&settings, true, true).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InputNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ingest_into_memory_store() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("emails.jsonl");
        tokio::fs::write(
            &path,
            concat!(
                r#"{"id": 1, "subject": "Q3 budget", "body": "Please approve", "summary": "Approval", "actions": ["Approve"]}"#,
                "\n\n",
                r#"{"id": 2, "subject": "Lunch", "body": "Friday"}"#,
                "\n",
                r#"{"id": 1, "subject": "Q3 budget again", "body": "Duplicate"}"#,
                "\n",
            ),
        )
        .await
        .unwrap();

        let overrides = Overrides {
            api_key: Some("sk-test".to_string()),
            openai_base_url: Some(spawn_embeddings_api().await),
            store_backend: Some(StoreBackend::Memory),
            data_file: Some(path),
            on_error: Some(OnError::Abort),
            ..Overrides::default()
        };
        let settings = Settings::resolve(overrides).await.unwrap();

        let report = ingest(&settings, true, false).await.unwrap();
        assert_eq!(report.lines_read, 4);
        assert_eq!(report.skipped_blank, 1);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.already_present, 1);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_malformed_line_aborts_with_line_number() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("emails.jsonl");
        tokio::fs::write(
            &path,
            "{\"id\": 1, \"subject\": \"s\", \"body\": \"b\"}\n{\"id\": \"oops\"}\n",
        )
        .await
        .unwrap();

        let overrides = Overrides {
            api_key: Some("sk-test".to_string()),
            openai_base_url: Some(spawn_embeddings_api().await),
            store_backend: Some(StoreBackend::Memory),
            data_file: Some(path),
            ..Overrides::default()
        };
        let settings = Settings::resolve(overrides).await.unwrap();

        let err = ingest(&settings, true, true).await.unwrap_err();
        let ingest_err = err
            .downcast_ref::<mailrag_types::error::IngestError>()
            .unwrap();
        assert_eq!(ingest_err.line(), Some(2));
    }
}
