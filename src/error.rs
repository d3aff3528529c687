use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failures reported by a completion backend.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Authentication with {provider} failed")]
    AuthFailed { provider: String },

    #[error("Rate limited by {provider}")]
    RateLimited {
        provider: String,
        retry_after: Option<u64>,
    },

    #[error("Request to {provider} failed: HTTP {status}: {body}")]
    RequestFailed {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Temperature must be between 0 and 2, got {0}")]
    InvalidTemperature(f32),

    #[error("API key must not be empty")]
    MissingApiKey,

    #[error("History window must hold at least one exchange (2 turns), got {0}")]
    InvalidHistoryWindow(usize),
}

/// Errors surfaced to HTTP callers.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ChatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ChatError::Completion(CompletionError::RateLimited { .. }) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            ChatError::Completion(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Chat request failed: {}", self);
        } else {
            tracing::warn!("Chat request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_map_to_gateway_statuses() {
        let limited = ChatError::from(CompletionError::RateLimited {
            provider: "groq".into(),
            retry_after: Some(3),
        });
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

        let auth = ChatError::from(CompletionError::AuthFailed {
            provider: "groq".into(),
        });
        assert_eq!(auth.status(), StatusCode::BAD_GATEWAY);

        let bad = ChatError::BadRequest("missing input".into());
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }
}
