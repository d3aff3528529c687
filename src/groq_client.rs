use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::config::GroqConfig;
use crate::error::CompletionError;

const PROVIDER: &str = "groq";

/// A backend that turns a rendered prompt into generated text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    fn model_name(&self) -> &str;
}

/// Client for Groq's OpenAI-compatible chat completions endpoint.
pub struct GroqClient {
    config: GroqConfig,
    client: reqwest::Client,
}

impl GroqClient {
    pub fn new(config: GroqConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.as_str().trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request_body = json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": self.config.temperature
        });

        debug!(
            "Sending request to Groq API: {}",
            serde_json::to_string_pretty(&request_body).unwrap_or_default()
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!("Groq request failed: {}", e);
                CompletionError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_text = response.text().await.unwrap_or_default();
            error!("API request failed with status {}: {}", status, error_text);

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionError::AuthFailed {
                    provider: PROVIDER.to_string(),
                },
                StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited {
                    provider: PROVIDER.to_string(),
                    retry_after,
                },
                _ => CompletionError::RequestFailed {
                    provider: PROVIDER.to_string(),
                    status: status.as_u16(),
                    body: error_text,
                },
            });
        }

        let response_text = response.text().await?;
        let response_json: Value =
            serde_json::from_str(&response_text).map_err(|e| CompletionError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: format!("JSON parse error: {}", e),
            })?;

        debug!(
            "Received response from Groq API: {}",
            serde_json::to_string_pretty(&response_json).unwrap_or_default()
        );

        let first_choice = response_json
            .get("choices")
            .and_then(|choices| choices.as_array())
            .and_then(|choices| choices.first())
            .ok_or_else(|| CompletionError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "response contained no choices".to_string(),
            })?;

        if let Some(reason) = first_choice.get("finish_reason").and_then(|r| r.as_str()) {
            if reason == "length" {
                warn!("Completion was truncated by the model's length limit");
            }
        }

        first_choice
            .get("message")
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(str::to_string)
            .ok_or_else(|| CompletionError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "choice had no message content".to_string(),
            })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};

    use super::*;

    #[derive(Clone)]
    struct MockProvider {
        status: AxumStatus,
        body: Value,
        seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn mock_completions(
        State(mock): State<MockProvider>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        mock.seen.lock().unwrap().push((auth, body));
        (
            mock.status,
            [("retry-after", "7")],
            Json(mock.body.clone()),
        )
    }

    async fn spawn_provider(mock: MockProvider) -> SocketAddr {
        let app = Router::new()
            .route("/openai/v1/chat/completions", post(mock_completions))
            .with_state(mock);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client_for(addr: SocketAddr) -> GroqClient {
        GroqClient::new(GroqConfig {
            api_key: "gsk_test".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.7,
            base_url: format!("http://{}/openai/v1", addr).parse().unwrap(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn mock(status: AxumStatus, body: Value) -> MockProvider {
        MockProvider {
            status,
            body,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let provider = mock(
            AxumStatus::OK,
            json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "Kubernetes orchestrates containers." },
                      "finish_reason": "stop" }
                ]
            }),
        );
        let seen = provider.seen.clone();
        let client = client_for(spawn_provider(provider).await);

        let text = client.complete("Tell me what is Kubernetes").await.unwrap();
        assert_eq!(text, "Kubernetes orchestrates containers.");

        let seen = seen.lock().unwrap();
        let (auth, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer gsk_test"));
        assert_eq!(body["model"], "llama-3.1-8b-instant");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Tell me what is Kubernetes");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn classifies_provider_failures() {
        let client = client_for(
            spawn_provider(mock(AxumStatus::UNAUTHORIZED, json!({"error": "bad key"}))).await,
        );
        assert!(matches!(
            client.complete("hi").await,
            Err(CompletionError::AuthFailed { .. })
        ));

        let client = client_for(
            spawn_provider(mock(AxumStatus::TOO_MANY_REQUESTS, json!({"error": "slow down"})))
                .await,
        );
        assert!(matches!(
            client.complete("hi").await,
            Err(CompletionError::RateLimited {
                retry_after: Some(7),
                ..
            })
        ));

        let client = client_for(
            spawn_provider(mock(
                AxumStatus::BAD_REQUEST,
                json!({"error": "context_length_exceeded"}),
            ))
            .await,
        );
        match client.complete("hi").await {
            Err(CompletionError::RequestFailed { status, body, .. }) => {
                assert_eq!(status, 400);
                assert!(body.contains("context_length_exceeded"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_invalid_response() {
        let client =
            client_for(spawn_provider(mock(AxumStatus::OK, json!({ "choices": [] }))).await);
        assert!(matches!(
            client.complete("hi").await,
            Err(CompletionError::InvalidResponse { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_provider_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(addr);
        assert!(matches!(
            client.complete("hi").await,
            Err(CompletionError::Transport(_))
        ));
    }
}
