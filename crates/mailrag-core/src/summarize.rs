//! Retrieval-augmented summarization.
//!
//! One request moves through `received -> retrieving -> composing ->
//! completing -> parsing -> responded`. Any failure ends it in the errored
//! state with the stage attached to the error.

use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use mailrag_types::config::{QueryText, RetrievalConfig};
use mailrag_types::email::{RankedEmail, SummarizationRequest, SummarizationResult};
use mailrag_types::error::{SummarizeError, SummarizeStage};

use crate::completion::CompletionClient;
use crate::embedder::Embedder;
use crate::parser::parse_completion;
use crate::prompt::compose_prompt;
use crate::store::EmailStore;

/// Orchestrates retrieval, prompt composition, completion and parsing.
///
/// Generic over the three ports so mailrag-core never depends on
/// mailrag-infra. Holds no per-request state.
pub struct SummarizationService<E: Embedder, S: EmailStore, C: CompletionClient> {
    embedder: E,
    store: S,
    completion: C,
    retrieval: RetrievalConfig,
}

impl<E: Embedder, S: EmailStore, C: CompletionClient> SummarizationService<E, S, C> {
    pub fn new(embedder: E, store: S, completion: C, retrieval: RetrievalConfig) -> Self {
        Self {
            embedder,
            store,
            completion,
            retrieval,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn retrieval(&self) -> &RetrievalConfig {
        &self.retrieval
    }

    /// The number of examples a request asks for, validated against
    /// `max_top_k`.
    pub fn resolve_top_k(&self, requested: Option<u32>) -> Result<usize, SummarizeError> {
        let k = requested.unwrap_or(self.retrieval.default_top_k);
        if k > self.retrieval.max_top_k {
            return Err(SummarizeError::InvalidRequest(format!(
                "top_k must be at most {}, got {k}",
                self.retrieval.max_top_k
            )));
        }
        Ok(k as usize)
    }

    /// Summarize one email and extract its action items.
    pub async fn summarize(
        &self,
        request: &SummarizationRequest,
    ) -> Result<SummarizationResult, SummarizeError> {
        let request_id = Uuid::now_v7();
        let span = info_span!(
            "summarize",
            %request_id,
            top_k = tracing::field::Empty,
            examples = tracing::field::Empty,
        );
        async {
            debug!(stage = %SummarizeStage::Received, "summarization request received");
            let k = self.resolve_top_k(request.top_k)?;
            tracing::Span::current().record("top_k", k);

            debug!(stage = %SummarizeStage::Retrieving, "retrieving similar emails");
            let examples = self.retrieve(request, k).await?;
            tracing::Span::current().record("examples", examples.len());

            debug!(stage = %SummarizeStage::Composing, "composing prompt");
            let prompt = compose_prompt(&examples, &request.subject, &request.body);

            debug!(
                stage = %SummarizeStage::Completing,
                model = self.completion.model_name(),
                prompt_chars = prompt.text.len(),
                "requesting completion"
            );
            let payload = self
                .completion
                .complete(&prompt.text)
                .await
                .map_err(SummarizeError::Completion)?;

            let parsed = parse_completion(&payload);
            debug!(
                stage = %SummarizeStage::Parsing,
                decoded_by = %parsed.stage,
                actions = parsed.result.actions.len(),
                "completion parsed"
            );

            debug!(stage = %SummarizeStage::Responded, "summarization complete");
            Ok(parsed.result)
        }
        .instrument(span)
        .await
        .inspect_err(|e: &SummarizeError| {
            tracing::warn!(stage = %e.stage(), error = %e, "summarization failed");
        })
    }

    /// Embed the query text and fetch the `k` nearest stored emails.
    async fn retrieve(
        &self,
        request: &SummarizationRequest,
        k: usize,
    ) -> Result<Vec<RankedEmail>, SummarizeError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query = match self.retrieval.query_text {
            QueryText::SubjectAndBody => format!("{}\n{}", request.subject, request.body),
            QueryText::Body => request.body.clone(),
        };
        let embedding = self
            .embedder
            .embed_one(&query)
            .await
            .map_err(SummarizeError::Embedding)?;
        Ok(self.store.find_similar(&embedding, k).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::{Value, json};

    use mailrag_types::email::{EmailRecord, UpsertOutcome};
    use mailrag_types::error::{StoreError, UpstreamError};

    use super::*;

    struct MockEmbedder {
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    impl MockEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    impl Embedder for MockEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().extend(texts.iter().cloned());
            if self.fail {
                return Err(UpstreamError::RateLimited);
            }
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn model_name(&self) -> &str {
            "mock-embedder"
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    /// Returns the first `k` of a fixed, pre-ranked list.
    struct MockStore {
        ranked: Vec<RankedEmail>,
        searches: AtomicUsize,
    }

    impl EmailStore for MockStore {
        async fn find_similar(&self, _q: &[f32], k: usize) -> Result<Vec<RankedEmail>, StoreError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(self.ranked.iter().take(k).cloned().collect())
        }

        async fn upsert(&self, _record: &EmailRecord) -> Result<UpsertOutcome, StoreError> {
            Ok(UpsertOutcome::Inserted)
        }

        async fn count(&self) -> Result<u64, StoreError> {
            Ok(self.ranked.len() as u64)
        }

        async fn ensure_schema(&self) -> Result<(), StoreError> {
            Ok(())
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    struct MockCompletion {
        reply: Result<Value, u16>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockCompletion {
        fn replying(content: &str) -> Self {
            Self {
                reply: Ok(json!({"choices": [{"message": {"role": "assistant", "content": content}}]})),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl CompletionClient for MockCompletion {
        async fn complete(&self, prompt: &str) -> Result<Value, UpstreamError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(v) => Ok(v.clone()),
                Err(status) => Err(UpstreamError::Http {
                    status: *status,
                    body: "upstream unavailable".to_string(),
                }),
            }
        }

        fn model_name(&self) -> &str {
            "mock-chat"
        }
    }

    fn email(id: i64, subject: &str) -> RankedEmail {
        RankedEmail {
            email: EmailRecord {
                id,
                subject: subject.to_string(),
                body: format!("{subject} body"),
                summary: format!("{subject} summary"),
                actions: vec![format!("Follow up on {subject}")],
                priority: "normal".to_string(),
                created_at: None,
                embedding: vec![1.0, 0.0],
            },
            distance: -(10 - id) as f32,
        }
    }

    fn service(
        embedder: MockEmbedder,
        ranked: Vec<RankedEmail>,
        completion: MockCompletion,
    ) -> SummarizationService<MockEmbedder, MockStore, MockCompletion> {
        let store = MockStore {
            ranked,
            searches: AtomicUsize::new(0),
        };
        SummarizationService::new(embedder, store, completion, RetrievalConfig::default())
    }

    fn request(top_k: Option<u32>) -> SummarizationRequest {
        SummarizationRequest {
            subject: "Q3 budget".to_string(),
            body: "Please approve by Friday".to_string(),
            top_k,
        }
    }

    #[tokio::test]
    async fn test_summarize_with_three_examples() {
        let ranked = vec![email(1, "Budget"), email(2, "Forecast"), email(3, "Invoice")];
        let svc = service(
            MockEmbedder::new(),
            ranked,
            MockCompletion::replying(r#"{"summary": "Budget approval needed by Friday.", "actions": ["Approve the Q3 budget"]}"#),
        );

        let result = svc.summarize(&request(Some(3))).await.unwrap();
        assert_eq!(result.summary, "Budget approval needed by Friday.");
        assert_eq!(result.actions, vec!["Approve the Q3 budget"]);

        let prompts = svc.completion.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].matches("Example subject:").count(), 3);
        assert!(prompts[0].contains("Email Subject: Q3 budget"));

        let seen = svc.embedder.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["Q3 budget\nPlease approve by Friday"]);
    }

    #[tokio::test]
    async fn test_default_top_k_is_five() {
        let ranked = (1..=8).map(|i| email(i, &format!("Email {i}"))).collect();
        let svc = service(MockEmbedder::new(), ranked, MockCompletion::replying("Short recap."));

        let result = svc.summarize(&request(None)).await.unwrap();
        assert_eq!(result.summary, "Short recap.");

        let prompts = svc.completion.prompts.lock().unwrap();
        assert_eq!(prompts[0].matches("Example subject:").count(), 5);
    }

    #[tokio::test]
    async fn test_zero_top_k_skips_retrieval() {
        let svc = service(
            MockEmbedder::new(),
            vec![email(1, "Budget")],
            MockCompletion::replying(r#"{"summary": "ok", "actions": []}"#),
        );

        svc.summarize(&request(Some(0))).await.unwrap();

        assert_eq!(svc.embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(svc.store.searches.load(Ordering::SeqCst), 0);
        let prompts = svc.completion.prompts.lock().unwrap();
        assert!(!prompts[0].contains("Example subject:"));
    }

    #[tokio::test]
    async fn test_completion_failure_reports_upstream_error() {
        let svc = service(MockEmbedder::new(), vec![email(1, "Budget")], MockCompletion::failing(502));

        let err = svc.summarize(&request(Some(1))).await.unwrap_err();
        assert!(matches!(err, SummarizeError::Completion(UpstreamError::Http { status: 502, .. })));
        assert_eq!(err.stage(), SummarizeStage::Completing);
        assert!(err.to_string().contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_embedding_failure_stops_before_completion() {
        let mut embedder = MockEmbedder::new();
        embedder.fail = true;
        let svc = service(embedder, vec![email(1, "Budget")], MockCompletion::replying("unused"));

        let err = svc.summarize(&request(None)).await.unwrap_err();
        assert!(matches!(err, SummarizeError::Embedding(UpstreamError::RateLimited)));
        assert_eq!(err.stage(), SummarizeStage::Retrieving);
        assert!(svc.completion.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_top_k_above_max_is_invalid() {
        let svc = service(MockEmbedder::new(), Vec::new(), MockCompletion::replying("unused"));

        let err = svc.summarize(&request(Some(51))).await.unwrap_err();
        assert!(matches!(err, SummarizeError::InvalidRequest(_)));
        assert_eq!(err.stage(), SummarizeStage::Received);
        assert_eq!(svc.embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_body_only_query_text() {
        let store = MockStore {
            ranked: vec![email(1, "Budget")],
            searches: AtomicUsize::new(0),
        };
        let retrieval = RetrievalConfig {
            query_text: QueryText::Body,
            ..RetrievalConfig::default()
        };
        let svc = SummarizationService::new(
            MockEmbedder::new(),
            store,
            MockCompletion::replying("ok"),
            retrieval,
        );

        svc.summarize(&request(Some(1))).await.unwrap();
        let seen = svc.embedder.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["Please approve by Friday"]);
    }
}
