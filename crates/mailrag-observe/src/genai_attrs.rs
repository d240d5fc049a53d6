//! OpenTelemetry GenAI Semantic Convention attribute constants.
//!
//! Used as field names in `tracing::info_span!` around every remote model
//! call. Span naming convention: `"{operation} {model}"` (e.g.,
//! `"chat gpt-4o-mini"`, `"embeddings text-embedding-3-large"`).

// --- Required attributes ---

/// The name of the operation being performed (e.g., "chat", "embeddings").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g., "openai").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

// --- Recommended attributes ---

pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

pub const GEN_AI_REQUEST_TEMPERATURE: &str = "gen_ai.request.temperature";

pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

/// Requested output dimensionality of an embeddings call.
pub const GEN_AI_EMBEDDINGS_DIMENSION_COUNT: &str = "gen_ai.embeddings.dimension.count";

pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The finish reasons for the response (e.g., "stop", "length").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

// --- Operation name values ---

/// Chat completion operation.
pub const OP_CHAT: &str = "chat";

/// Embeddings operation.
pub const OP_EMBEDDINGS: &str = "embeddings";

// --- Provider name values ---

pub const PROVIDER_OPENAI: &str = "openai";

/// Span name for a remote call, following `"{operation} {model}"`.
pub fn span_name(operation: &str, model: &str) -> String {
    format!("{operation} {model}")
}
