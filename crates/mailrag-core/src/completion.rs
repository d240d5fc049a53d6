//! CompletionClient trait for chat-completion calls.
//!
//! The client returns the provider's raw JSON payload; extracting text and
//! structure from it is the job of [`crate::parser`].

use std::future::Future;

use mailrag_types::error::UpstreamError;

/// Trait for chat-completion backends.
///
/// Implementations live in mailrag-infra (e.g., `OpenAiChatClient`). A call
/// has no side effect beyond the network request: no caching, no retry.
pub trait CompletionClient: Send + Sync {
    /// Send a single-message prompt and return the raw response payload.
    fn complete(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<serde_json::Value, UpstreamError>> + Send;

    /// The model the client sends requests to.
    fn model_name(&self) -> &str;
}
