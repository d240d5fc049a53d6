//! Configuration types for mailrag.
//!
//! `AppConfig` is the single configuration object built once at process
//! start and passed into every component. It deserializes from an optional
//! `mailrag.toml`; every field has a default so an empty file is valid.
//! Secrets (the API key) are deliberately not part of this type.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub embedding: EmbeddingConfig,
    pub completion: CompletionConfig,
    pub store: StoreConfig,
    pub retrieval: RetrievalConfig,
    pub ingest: IngestConfig,
    pub server: ServerConfig,
}

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Embedding API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    /// Vector dimension requested from the API and enforced by the store.
    pub dimensions: usize,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-large".to_string(),
            dimensions: 1536,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Chat-completion API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            max_tokens: 512,
            temperature: 0.2,
            timeout_secs: 30,
        }
    }
}

/// Which store implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Postgres => write!(f, "postgres"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("invalid store backend: '{other}'")),
        }
    }
}

/// Distance metric used for nearest-neighbour ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Negative inner product (pgvector `<#>`).
    InnerProduct,
    /// Cosine distance (pgvector `<=>`).
    Cosine,
    /// Euclidean distance (pgvector `<->`).
    L2,
}

impl DistanceMetric {
    /// Distance between two equal-length vectors. Lower is closer.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::InnerProduct => -dot(a, b),
            DistanceMetric::Cosine => {
                let denom = dot(a, a).sqrt() * dot(b, b).sqrt();
                if denom == 0.0 {
                    1.0
                } else {
                    1.0 - dot(a, b) / denom
                }
            }
            DistanceMetric::L2 => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::InnerProduct => write!(f, "inner_product"),
            DistanceMetric::Cosine => write!(f, "cosine"),
            DistanceMetric::L2 => write!(f, "l2"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inner_product" | "ip" => Ok(DistanceMetric::InnerProduct),
            "cosine" => Ok(DistanceMetric::Cosine),
            "l2" | "euclidean" => Ok(DistanceMetric::L2),
            other => Err(format!("invalid distance metric: '{other}'")),
        }
    }
}

pub const DEFAULT_DATABASE_URL: &str = "postgresql://postgres:example@db:5432/emaildb";

/// Vector store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: String,
    pub metric: DistanceMetric,
    pub max_connections: u32,
    /// Run the idempotent schema setup when `serve` starts.
    pub ensure_schema_on_serve: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Postgres,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            metric: DistanceMetric::InnerProduct,
            max_connections: 10,
            ensure_schema_on_serve: false,
        }
    }
}

/// Which part of an incoming email is embedded as the retrieval query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryText {
    /// `subject + "\n" + body`, the same text ingestion embeds.
    SubjectAndBody,
    Body,
}

/// Retrieval settings for the summarization endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_top_k: u32,
    pub max_top_k: u32,
    pub query_text: QueryText,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            max_top_k: 50,
            query_text: QueryText::SubjectAndBody,
        }
    }
}

/// What the ingestion pipeline does when one record fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnError {
    /// Abort the whole batch on the first failure.
    Abort,
    /// Log the failure, count it, and continue with the next line.
    Skip,
}

impl fmt::Display for OnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnError::Abort => write!(f, "abort"),
            OnError::Skip => write!(f, "skip"),
        }
    }
}

impl FromStr for OnError {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(OnError::Abort),
            "skip" => Ok(OnError::Skip),
            other => Err(format!("invalid error policy: '{other}'")),
        }
    }
}

pub const DEFAULT_DATA_FILE: &str = "data/emails_5000.jsonl";

/// Batch ingestion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub data_file: PathBuf,
    /// Log progress (and pause) after every this many records.
    pub progress_every: u64,
    /// Pause after each progress report, in milliseconds.
    pub throttle_ms: u64,
    pub on_error: OnError,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            progress_every: 100,
            throttle_ms: 100,
            on_error: OnError::Abort,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory of a built front-end to serve as an SPA fallback.
    pub web_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            web_dir: None,
        }
    }
}
