//! Ollama client: endpoint probing, completion polling, answer extraction
//!
//! The local service is not fully standardized: the generation API lives at
//! different paths depending on version and model, and responses come back in
//! several shapes. Each call probes a fixed list of candidate endpoints, then
//! normalizes whatever the first responsive endpoint returns.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::answer;
use super::classify;

/// Candidate generation endpoint shapes, probed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    NativeGenerate,
    NativeChat,
    OpenAiChat,
}

impl Endpoint {
    const PROBE_ORDER: [Endpoint; 3] = [
        Endpoint::NativeGenerate,
        Endpoint::NativeChat,
        Endpoint::OpenAiChat,
    ];

    fn path(self) -> &'static str {
        match self {
            Endpoint::NativeGenerate => "/api/generate",
            Endpoint::NativeChat => "/api/chat",
            Endpoint::OpenAiChat => "/v1/chat/completions",
        }
    }

    /// Shape-appropriate request body for this endpoint.
    fn request_body(self, config: &LlmConfig, prompt: &str) -> Value {
        match self {
            Endpoint::NativeGenerate | Endpoint::NativeChat => json!({
                "model": config.generate_model,
                "prompt": prompt,
                "max_tokens": config.max_tokens,
            }),
            Endpoint::OpenAiChat => json!({
                "model": config.generate_model,
                "messages": [{"role": "user", "content": prompt}],
                "max_tokens": config.max_tokens,
            }),
        }
    }
}

/// Client for the Ollama embedding and generation APIs.
pub struct OllamaClient {
    client: Client,
    config: LlmConfig,
}

impl OllamaClient {
    /// Create a new client
    pub fn new(config: &LlmConfig) -> Self {
        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config: config.clone(),
        }
    }

    /// Check if the service is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Request an embedding vector for `text`.
    ///
    /// One bounded network call; transport errors, timeouts, and unexpected
    /// response shapes all collapse to `EmbeddingUnavailable`. Retry policy
    /// belongs to the caller.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embed", self.config.base_url);
        let body = json!({"model": self.config.embed_model, "input": text});

        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(Duration::from_secs(self.config.embed_timeout_secs))
            .send()
            .await
            .map_err(|e| Error::embedding_unavailable(format!("embed request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::embedding_unavailable(format!(
                "embed failed: HTTP {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| Error::embedding_unavailable(format!("invalid embed response: {}", e)))?;

        classify::embedding_vector(&payload).ok_or_else(|| {
            tracing::error!("Unexpected embed response shape: {}", payload);
            Error::embedding_unavailable("unexpected embed response shape")
        })
    }

    /// Generate the final answer text for a prompt.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.is_empty() {
            return Ok(String::new());
        }
        let raw = self.generate_raw(prompt).await?;
        Ok(answer::extract_final_answer(&raw))
    }

    /// Probe candidate endpoints, poll partial completions, and return raw text.
    async fn generate_raw(&self, prompt: &str) -> Result<String> {
        for endpoint in Endpoint::PROBE_ORDER {
            tracing::debug!("Trying Ollama endpoint {}", endpoint.path());
            let deadline =
                Instant::now() + Duration::from_secs(self.config.generate_timeout_secs);

            match self.probe(endpoint, prompt, deadline).await {
                Ok(Some(text)) => return Ok(text),
                Ok(None) => {
                    tracing::info!("Endpoint {} not found, trying next", endpoint.path());
                }
                Err(e) => {
                    tracing::warn!("Error calling {}: {}", endpoint.path(), e);
                }
            }
        }

        Err(Error::NoWorkingEndpoint)
    }

    /// Try one endpoint. `Ok(None)` means the endpoint does not exist (404)
    /// and the next candidate should be tried; `Ok(Some)` carries the
    /// normalized raw text.
    async fn probe(
        &self,
        endpoint: Endpoint,
        prompt: &str,
        deadline: Instant,
    ) -> Result<Option<String>> {
        let payload = match self.post_payload(endpoint, prompt).await? {
            Some(payload) => payload,
            None => return Ok(None),
        };

        tracing::debug!("Initial response from {}: {}", endpoint.path(), payload);

        // Streaming shape: accumulate partial text until done or budget spent.
        if let Some(part) = classify::streaming_part(&payload) {
            return Ok(Some(self.poll_streaming(endpoint, prompt, part, deadline).await));
        }

        // Non-streaming shapes in priority order.
        if let Some(text) = classify::classify(&payload) {
            return Ok(Some(text));
        }

        // Suspiciously short payload: poll a few more times for a fuller one.
        let serialized = payload.to_string();
        if serialized.len() < self.config.short_payload_threshold {
            return Ok(Some(self.short_poll(endpoint, prompt, serialized, deadline).await));
        }

        // Last resort: the serialized response is the text.
        Ok(Some(serialized))
    }

    /// POST the shape-appropriate body; `Ok(None)` for a 404 status.
    async fn post_payload(&self, endpoint: Endpoint, prompt: &str) -> Result<Option<Value>> {
        let url = format!("{}{}", self.config.base_url, endpoint.path());
        let body = endpoint.request_body(&self.config, prompt);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(Duration::from_secs(self.config.generate_timeout_secs))
            .send()
            .await
            .map_err(|e| Error::internal(format!("request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::internal(format!("HTTP {}", response.status())));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| Error::internal(format!("invalid response body: {}", e)))?;
        Ok(Some(payload))
    }

    /// Re-issue the request while the service reports done=false, keeping the
    /// latest partial text. Backoff grows linearly and never outlives the
    /// request deadline.
    async fn poll_streaming(
        &self,
        endpoint: Endpoint,
        prompt: &str,
        first: classify::StreamingPart,
        deadline: Instant,
    ) -> String {
        let mut accum = first.text;
        let mut done = first.done;
        let mut poll: u64 = 0;

        while !done && poll < self.config.max_poll_attempts {
            poll += 1;
            let delay = Duration::from_millis(self.config.poll_base_ms * poll);
            if Instant::now() + delay >= deadline {
                break;
            }
            sleep(delay).await;

            let follow = match self.post_payload(endpoint, prompt).await {
                Ok(Some(payload)) => payload,
                Ok(None) | Err(_) => break,
            };
            tracing::debug!("Poll #{} response from {}: {}", poll, endpoint.path(), follow);

            if let Some(text) = follow.get("response").and_then(Value::as_str) {
                accum = text.to_string();
            }
            if let Some(flag) = follow.get("done").and_then(Value::as_bool) {
                done = flag;
            }
        }

        accum
    }

    /// The response serialized under the short-payload threshold; poll a few
    /// more times re-classifying each follow-up, stopping early once a
    /// candidate looks like a real answer.
    async fn short_poll(
        &self,
        endpoint: Endpoint,
        prompt: &str,
        serialized: String,
        deadline: Instant,
    ) -> String {
        let mut last = serialized;

        for attempt in 1..=self.config.short_poll_attempts {
            let delay = Duration::from_millis(self.config.short_poll_base_ms * attempt);
            if Instant::now() + delay >= deadline {
                break;
            }
            sleep(delay).await;

            let follow = match self.post_payload(endpoint, prompt).await {
                Ok(Some(payload)) => payload,
                Ok(None) | Err(_) => break,
            };
            tracing::debug!("Short-poll #{}: {}", attempt, follow);

            if let Some(text) = follow.get("response").and_then(Value::as_str) {
                last = text.to_string();
            } else if let Some(text) = classify::classify(&follow) {
                last = text;
            }

            if last.len() > self.config.min_answer_len {
                return last;
            }
        }

        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn test_config(base_url: String) -> LlmConfig {
        LlmConfig {
            base_url,
            embed_timeout_secs: 5,
            generate_timeout_secs: 5,
            poll_base_ms: 1,
            short_poll_base_ms: 1,
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn streaming_response_is_polled_until_done() {
        let calls = Arc::new(AtomicUsize::new(0));

        async fn handler(State(calls): State<Arc<AtomicUsize>>) -> Json<Value> {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Json(json!({"response": "Pa", "done": false}))
            } else {
                Json(json!({"response": "Paris", "done": true}))
            }
        }

        let router = Router::new()
            .route("/api/generate", post(handler))
            .with_state(Arc::clone(&calls));
        let base_url = serve(router).await;

        let client = OllamaClient::new(&test_config(base_url));
        let raw = client.generate_raw("question").await.unwrap();

        assert_eq!(raw, "Paris");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn probing_falls_through_to_openai_endpoint() {
        // Only the OpenAI-compatible route exists; the native ones 404.
        async fn handler(Json(body): Json<Value>) -> Json<Value> {
            assert_eq!(body["messages"][0]["role"], "user");
            Json(json!({
                "choices": [{"message": {"content": "Answer: Paris is the capital [1]."}}]
            }))
        }

        let router = Router::new().route("/v1/chat/completions", post(handler));
        let base_url = serve(router).await;

        let client = OllamaClient::new(&test_config(base_url));
        let answer = client.generate("question").await.unwrap();

        assert_eq!(answer, "Paris is the capital [1].");
    }

    #[tokio::test]
    async fn exhausted_endpoints_fail_terminally() {
        async fn handler() -> StatusCode {
            StatusCode::INTERNAL_SERVER_ERROR
        }

        let router = Router::new()
            .route("/api/generate", post(handler))
            .route("/api/chat", post(handler))
            .route("/v1/chat/completions", post(handler));
        let base_url = serve(router).await;

        let client = OllamaClient::new(&test_config(base_url));
        let err = client.generate("question").await.unwrap_err();

        assert!(matches!(err, Error::NoWorkingEndpoint));
    }

    #[tokio::test]
    async fn empty_prompt_short_circuits() {
        // No server needed; the call must not go out at all.
        let client = OllamaClient::new(&test_config("http://127.0.0.1:1".to_string()));
        assert_eq!(client.generate("").await.unwrap(), "");
    }

    #[tokio::test]
    async fn short_payload_triggers_extra_polls() {
        let calls = Arc::new(AtomicUsize::new(0));

        async fn handler(State(calls): State<Arc<AtomicUsize>>) -> Json<Value> {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Json(json!({"ok": 1}))
            } else {
                Json(json!({"response": "a fuller answer well over the threshold"}))
            }
        }

        let router = Router::new()
            .route("/api/generate", post(handler))
            .with_state(Arc::clone(&calls));
        let base_url = serve(router).await;

        let client = OllamaClient::new(&test_config(base_url));
        let raw = client.generate_raw("question").await.unwrap();

        assert_eq!(raw, "a fuller answer well over the threshold");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn embed_normalizes_the_direct_shape() {
        async fn handler(Json(body): Json<Value>) -> Json<Value> {
            assert!(body["input"].is_string());
            Json(json!({"embedding": [1.0, 2.0, 3.0]}))
        }

        let router = Router::new().route("/api/embed", post(handler));
        let base_url = serve(router).await;

        let client = OllamaClient::new(&test_config(base_url));
        let vector = client.embed("hello").await.unwrap();

        assert_eq!(vector, vec![1.0f32, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn unknown_embed_shape_is_unavailable() {
        async fn handler() -> Json<Value> {
            Json(json!({"vectors": [[1.0, 2.0]]}))
        }

        let router = Router::new().route("/api/embed", post(handler));
        let base_url = serve(router).await;

        let client = OllamaClient::new(&test_config(base_url));
        let err = client.embed("hello").await.unwrap_err();

        assert!(matches!(err, Error::EmbeddingUnavailable(_)));
    }
}
