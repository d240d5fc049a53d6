//! HTTP API layer for mailrag.
//!
//! One summarization endpoint (mounted at `/summarize` and
//! `/api/summarize`), a health check, and an optional SPA fallback.

pub mod error;
pub mod handlers;
pub mod router;
