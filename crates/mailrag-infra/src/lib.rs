//! Infrastructure layer for mailrag.
//!
//! Contains implementations of the port traits defined in `mailrag-core`:
//! the OpenAI embeddings and chat-completion clients, the PostgreSQL +
//! pgvector email store, an in-memory email store, and the TOML
//! configuration loader.

pub mod config;
pub mod openai;
pub mod postgres;
pub mod store;
pub mod vector;
