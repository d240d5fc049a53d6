use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling configuration, before any work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("config file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read config file {}: {message}", .path.display())]
    FileRead { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors from the remote embedding and completion APIs.
///
/// These are propagated to the caller as-is; no retry policy is applied.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limited by upstream API")]
    RateLimited,

    #[error("upstream returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("upstream request timed out after {0}s")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors from the vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("row decode error: {0}")]
    Decode(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Stage of the summarization pipeline a request is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarizeStage {
    Received,
    Retrieving,
    Composing,
    Completing,
    Parsing,
    Responded,
}

impl fmt::Display for SummarizeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummarizeStage::Received => write!(f, "received"),
            SummarizeStage::Retrieving => write!(f, "retrieving"),
            SummarizeStage::Composing => write!(f, "composing"),
            SummarizeStage::Completing => write!(f, "completing"),
            SummarizeStage::Parsing => write!(f, "parsing"),
            SummarizeStage::Responded => write!(f, "responded"),
        }
    }
}

/// Terminal `errored` state of a summarization request.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("embedding query failed: {0}")]
    Embedding(#[source] UpstreamError),

    #[error("similarity search failed: {0}")]
    Store(#[from] StoreError),

    #[error("completion failed: {0}")]
    Completion(#[source] UpstreamError),
}

impl SummarizeError {
    /// The stage the request was in when it failed.
    pub fn stage(&self) -> SummarizeStage {
        match self {
            SummarizeError::InvalidRequest(_) => SummarizeStage::Received,
            SummarizeError::Embedding(_) | SummarizeError::Store(_) => SummarizeStage::Retrieving,
            SummarizeError::Completion(_) => SummarizeStage::Completing,
        }
    }
}

/// Errors from an ingestion run. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read batch file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: malformed record: {message}")]
    MalformedRecord { line: u64, message: String },

    #[error("line {line}: embedding failed: {source}")]
    Embedding {
        line: u64,
        #[source]
        source: UpstreamError,
    },

    #[error("line {line}: store write failed: {source}")]
    Store {
        line: u64,
        #[source]
        source: StoreError,
    },
}

impl IngestError {
    /// The batch-file line the error refers to, if any.
    pub fn line(&self) -> Option<u64> {
        match self {
            IngestError::Io(_) => None,
            IngestError::MalformedRecord { line, .. }
            | IngestError::Embedding { line, .. }
            | IngestError::Store { line, .. } => Some(*line),
        }
    }
}
