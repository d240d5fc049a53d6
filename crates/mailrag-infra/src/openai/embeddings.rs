//! OpenAiEmbedder -- concrete [`Embedder`] for the OpenAI embeddings API.
//!
//! Requests a fixed output dimensionality through the `dimensions` field so
//! that vectors match the store schema regardless of the model's native size.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use mailrag_core::embedder::Embedder;
use mailrag_observe::genai_attrs::{
    GEN_AI_EMBEDDINGS_DIMENSION_COUNT, GEN_AI_OPERATION_NAME, GEN_AI_PROVIDER_NAME,
    GEN_AI_REQUEST_MODEL, GEN_AI_USAGE_INPUT_TOKENS, OP_EMBEDDINGS, PROVIDER_OPENAI, span_name,
};
use mailrag_types::config::EmbeddingConfig;
use mailrag_types::error::UpstreamError;

use super::{endpoint, http_client, post_json};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    usage: Option<EmbeddingUsage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingUsage {
    prompt_tokens: u64,
}

/// OpenAI embeddings client.
///
/// Does not derive Debug; the API key stays inside a [`SecretString`].
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: SecretString,
    url: String,
    model: String,
    dimension: usize,
    timeout_secs: u64,
}

impl OpenAiEmbedder {
    pub fn new(api_key: SecretString, config: &EmbeddingConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key,
            url: endpoint(&config.base_url, "embeddings"),
            model: config.model.clone(),
            dimension: config.dimensions,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Put vectors back in input order and check their shape.
    fn order_vectors(
        &self,
        mut data: Vec<EmbeddingData>,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>, UpstreamError> {
        if data.len() != expected {
            return Err(UpstreamError::MalformedResponse(format!(
                "expected {expected} embeddings, got {}",
                data.len()
            )));
        }
        data.sort_by_key(|d| d.index);
        if data.iter().enumerate().any(|(i, d)| d.index != i) {
            return Err(UpstreamError::MalformedResponse(
                "embedding indices are not contiguous".to_string(),
            ));
        }
        data.into_iter()
            .map(|d| {
                if d.embedding.len() == self.dimension {
                    Ok(d.embedding)
                } else {
                    Err(UpstreamError::DimensionMismatch {
                        expected: self.dimension,
                        actual: d.embedding.len(),
                    })
                }
            })
            .collect()
    }
}

impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UpstreamError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let span = tracing::info_span!(
            "gen_ai.embeddings",
            otel.name = %span_name(OP_EMBEDDINGS, &self.model),
            { GEN_AI_OPERATION_NAME } = OP_EMBEDDINGS,
            { GEN_AI_PROVIDER_NAME } = PROVIDER_OPENAI,
            { GEN_AI_REQUEST_MODEL } = %self.model,
            { GEN_AI_EMBEDDINGS_DIMENSION_COUNT } = self.dimension,
            { GEN_AI_USAGE_INPUT_TOKENS } = tracing::field::Empty,
            inputs = texts.len(),
        );

        async {
            let body = EmbeddingRequest {
                model: &self.model,
                input: texts,
                dimensions: self.dimension,
            };
            let response: EmbeddingResponse =
                post_json(&self.client, &self.url, &self.api_key, &body, self.timeout_secs).await?;

            if let Some(usage) = &response.usage {
                tracing::Span::current().record(GEN_AI_USAGE_INPUT_TOKENS, usage.prompt_tokens);
            }
            self.order_vectors(response.data, texts.len())
        }
        .instrument(span)
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
