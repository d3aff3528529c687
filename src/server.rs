//! HTTP front end for the conversation chain.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::chat::sessions::DEFAULT_SESSION;
use crate::chat::{ChainOutput, ConversationChain};
use crate::error::ChatError;

/// Longest `session_id` a client may use.
const MAX_SESSION_ID_BYTES: usize = 128;

#[derive(Debug, Deserialize)]
struct ChatRequest {
    input: Option<String>,
    /// Conversation to continue; requests without one share the default conversation.
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    model: String,
}

pub fn router(chain: Arc<ConversationChain>) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/chat/{session_id}", delete(clear_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(chain)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, chain: Arc<ConversationChain>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {}", addr))?;

    info!("Chat server listening on {}", addr);

    axum::serve(listener, router(chain))
        .with_graceful_shutdown(shutdown_signal(tokio::signal::ctrl_c()))
        .await
        .wrap_err("Chat server error")
}

/// Resolve once `signal` fires. If the handler cannot be installed the server
/// keeps running instead of stopping on the spot.
async fn shutdown_signal(signal: impl Future<Output = io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("Chat server shutting down"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

async fn chat_handler(
    State(chain): State<Arc<ConversationChain>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChainOutput>, ChatError> {
    let Json(request) = payload.map_err(|e| ChatError::BadRequest(e.body_text()))?;

    let input = match request.input {
        Some(input) if !input.trim().is_empty() => input,
        Some(_) => return Err(ChatError::BadRequest("Field `input` must not be empty".into())),
        None => return Err(ChatError::BadRequest("Missing field `input`".into())),
    };

    let session_id = match request.session_id {
        Some(id) if id.trim().is_empty() => {
            return Err(ChatError::BadRequest(
                "Field `session_id` must not be empty".into(),
            ))
        }
        Some(id) if id.len() > MAX_SESSION_ID_BYTES => {
            return Err(ChatError::BadRequest(format!(
                "Field `session_id` must be at most {} bytes",
                MAX_SESSION_ID_BYTES
            )))
        }
        Some(id) => id,
        None => DEFAULT_SESSION.to_string(),
    };

    let output = chain.invoke(&session_id, &input).await?;
    Ok(Json(output))
}

async fn clear_handler(
    State(chain): State<Arc<ConversationChain>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ChatError> {
    if chain.sessions().remove(&session_id).await {
        info!(session_id = %session_id, "Conversation cleared");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ChatError::SessionNotFound(session_id))
    }
}

async fn health_handler(State(chain): State<Arc<ConversationChain>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model: chain.model_name().to_string(),
    })
}
