//! OpenAiChatClient -- concrete [`CompletionClient`] for the OpenAI chat
//! completions API.
//!
//! Returns the raw response payload; text extraction happens in the parser.

use secrecy::SecretString;
use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;

use mailrag_core::completion::CompletionClient;
use mailrag_observe::genai_attrs::{
    GEN_AI_OPERATION_NAME, GEN_AI_PROVIDER_NAME, GEN_AI_REQUEST_MAX_TOKENS, GEN_AI_REQUEST_MODEL,
    GEN_AI_REQUEST_TEMPERATURE, GEN_AI_RESPONSE_FINISH_REASONS, GEN_AI_USAGE_INPUT_TOKENS,
    GEN_AI_USAGE_OUTPUT_TOKENS, OP_CHAT, PROVIDER_OPENAI, span_name,
};
use mailrag_types::config::CompletionConfig;
use mailrag_types::error::UpstreamError;

use super::{endpoint, http_client, post_json};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// OpenAI chat-completions client.
///
/// Does not derive Debug; the API key stays inside a [`SecretString`].
pub struct OpenAiChatClient {
    client: reqwest::Client,
    api_key: SecretString,
    url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout_secs: u64,
}

impl OpenAiChatClient {
    pub fn new(api_key: SecretString, config: &CompletionConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key,
            url: endpoint(&config.base_url, "chat/completions"),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
        })
    }

    fn build_request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

impl CompletionClient for OpenAiChatClient {
    async fn complete(&self, prompt: &str) -> Result<Value, UpstreamError> {
        let span = tracing::info_span!(
            "gen_ai.chat",
            otel.name = %span_name(OP_CHAT, &self.model),
            { GEN_AI_OPERATION_NAME } = OP_CHAT,
            { GEN_AI_PROVIDER_NAME } = PROVIDER_OPENAI,
            { GEN_AI_REQUEST_MODEL } = %self.model,
            { GEN_AI_REQUEST_MAX_TOKENS } = self.max_tokens,
            { GEN_AI_REQUEST_TEMPERATURE } = self.temperature,
            { GEN_AI_USAGE_INPUT_TOKENS } = tracing::field::Empty,
            { GEN_AI_USAGE_OUTPUT_TOKENS } = tracing::field::Empty,
            { GEN_AI_RESPONSE_FINISH_REASONS } = tracing::field::Empty,
        );

        async {
            let body = self.build_request(prompt);
            let payload: Value =
                post_json(&self.client, &self.url, &self.api_key, &body, self.timeout_secs).await?;
            record_usage(&payload);
            Ok(payload)
        }
        .instrument(span)
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn record_usage(payload: &Value) {
    let span = tracing::Span::current();
    if let Some(tokens) = payload.pointer("/usage/prompt_tokens").and_then(Value::as_u64) {
        span.record(GEN_AI_USAGE_INPUT_TOKENS, tokens);
    }
    if let Some(tokens) = payload.pointer("/usage/completion_tokens").and_then(Value::as_u64) {
        span.record(GEN_AI_USAGE_OUTPUT_TOKENS, tokens);
    }
    if let Some(reason) = payload.pointer("/choices/0/finish_reason").and_then(Value::as_str) {
        span.record(GEN_AI_RESPONSE_FINISH_REASONS, reason);
    }
}
