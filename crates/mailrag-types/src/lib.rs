//! Shared domain types for mailrag.
//!
//! This crate contains the types used across the workspace: email records,
//! summarization requests and results, configuration sections, and the
//! error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod email;
pub mod error;
