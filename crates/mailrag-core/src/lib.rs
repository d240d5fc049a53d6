//! Business logic and port trait definitions for mailrag.
//!
//! This crate defines the "ports" (embedder, store and completion traits)
//! that the infrastructure layer implements, together with the
//! retrieval-augmented summarization flow and the ingestion pipeline built
//! on top of them. It depends only on `mailrag-types` -- never on
//! `mailrag-infra` or any database/HTTP crate.

pub mod box_completion;
pub mod box_embedder;
pub mod box_store;
pub mod completion;
pub mod embedder;
pub mod ingest;
pub mod parser;
pub mod prompt;
pub mod store;
pub mod summarize;
