//! Application state wiring the summarization service together.
//!
//! The service is generic over its three ports; AppState pins it to the
//! boxed wrappers so the store backend can be chosen from configuration.

use std::sync::Arc;

use mailrag_core::box_completion::BoxCompletionClient;
use mailrag_core::box_embedder::BoxEmbedder;
use mailrag_core::box_store::BoxEmailStore;
use mailrag_core::store::EmailStore;
use mailrag_core::summarize::SummarizationService;
use mailrag_infra::openai::{OpenAiChatClient, OpenAiEmbedder};
use mailrag_infra::store::open_store;
use mailrag_types::config::AppConfig;

use crate::settings::Settings;

pub type ConcreteSummarizationService =
    SummarizationService<BoxEmbedder, BoxEmailStore, BoxCompletionClient>;

/// Shared state for HTTP handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub summarizer: Arc<ConcreteSummarizationService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(summarizer: ConcreteSummarizationService, config: AppConfig) -> Self {
        Self {
            summarizer: Arc::new(summarizer),
            config: Arc::new(config),
        }
    }

    /// Build the production state: OpenAI clients plus the configured store.
    ///
    /// The credential is checked before any connection is made.
    pub async fn init(settings: &Settings) -> anyhow::Result<Self> {
        let config = &settings.config;
        let embedder = OpenAiEmbedder::new(settings.require_api_key()?, &config.embedding)?;
        let completion = OpenAiChatClient::new(settings.require_api_key()?, &config.completion)?;

        let store = open_store(&config.store, config.embedding.dimensions).await?;
        if config.store.ensure_schema_on_serve {
            store.ensure_schema().await?;
        }

        let service = SummarizationService::new(
            BoxEmbedder::new(embedder),
            store,
            BoxCompletionClient::new(completion),
            config.retrieval.clone(),
        );
        Ok(Self::new(service, config.clone()))
    }
}
