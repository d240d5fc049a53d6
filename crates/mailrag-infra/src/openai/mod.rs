//! OpenAI HTTP clients.
//!
//! [`OpenAiEmbedder`] implements `Embedder` against `/embeddings` and
//! [`OpenAiChatClient`] implements `CompletionClient` against
//! `/chat/completions`. Both authenticate with a bearer token held in a
//! [`secrecy::SecretString`] and never retry.

pub mod chat;
pub mod embeddings;

use std::time::Duration;

use mailrag_types::error::UpstreamError;

pub use self::chat::OpenAiChatClient;
pub use self::embeddings::OpenAiEmbedder;

/// Build a reqwest client with a fixed per-request timeout.
fn http_client(timeout_secs: u64) -> Result<reqwest::Client, UpstreamError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| UpstreamError::Network(format!("failed to build HTTP client: {e}")))
}

/// Join a base URL and an endpoint path, tolerating a trailing slash.
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Map a transport-level failure.
fn map_transport_error(err: reqwest::Error, timeout_secs: u64) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout(timeout_secs)
    } else {
        UpstreamError::Network(err.to_string())
    }
}

/// Map a non-success HTTP status and its body.
fn map_status_error(status: reqwest::StatusCode, body: String) -> UpstreamError {
    match status.as_u16() {
        401 => UpstreamError::AuthenticationFailed,
        429 => UpstreamError::RateLimited,
        code => UpstreamError::Http { status: code, body },
    }
}

/// Send a JSON POST and return the decoded JSON body of a 2xx response.
async fn post_json<B, T>(
    client: &reqwest::Client,
    url: &str,
    api_key: &secrecy::SecretString,
    body: &B,
    timeout_secs: u64,
) -> Result<T, UpstreamError>
where
    B: serde::Serialize + ?Sized,
    T: serde::de::DeserializeOwned,
{
    use secrecy::ExposeSecret;

    let response = client
        .post(url)
        .bearer_auth(api_key.expose_secret())
        .json(body)
        .send()
        .await
        .map_err(|e| map_transport_error(e, timeout_secs))?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(map_status_error(status, error_body));
    }

    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            UpstreamError::Timeout(timeout_secs)
        } else {
            UpstreamError::MalformedResponse(format!("failed to parse response: {e}"))
        }
    })
}
