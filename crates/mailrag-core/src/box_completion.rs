//! BoxCompletionClient -- object-safe dynamic dispatch wrapper for CompletionClient.

use std::future::Future;
use std::pin::Pin;

use mailrag_types::error::UpstreamError;

use super::completion::CompletionClient;

/// Object-safe version of [`CompletionClient`] with boxed futures.
pub trait CompletionClientDyn: Send + Sync {
    fn complete_boxed<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, UpstreamError>> + Send + 'a>>;

    fn model_name_dyn(&self) -> &str;
}

impl<T: CompletionClient> CompletionClientDyn for T {
    fn complete_boxed<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, UpstreamError>> + Send + 'a>> {
        Box::pin(self.complete(prompt))
    }

    fn model_name_dyn(&self) -> &str {
        self.model_name()
    }
}

/// Type-erased completion client.
pub struct BoxCompletionClient {
    inner: Box<dyn CompletionClientDyn + Send + Sync>,
}

impl BoxCompletionClient {
    /// Wrap a concrete `CompletionClient` in a type-erased box.
    pub fn new<T: CompletionClient + 'static>(client: T) -> Self {
        Self {
            inner: Box::new(client),
        }
    }
}

impl CompletionClient for BoxCompletionClient {
    fn complete(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<serde_json::Value, UpstreamError>> + Send {
        async move { self.inner.complete_boxed(prompt).await }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name_dyn()
    }
}
