//! HTTP request handlers.

pub mod summarize;
