pub mod conversation_state;
pub mod prompt;
pub mod sessions;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::CompletionError;
use crate::groq_client::CompletionClient;
use conversation_state::Turn;
use prompt::format_prompt;
use sessions::SessionStore;

/// Result of one exchange, shaped like the `/chat` response body.
#[derive(Debug, Clone, Serialize)]
pub struct ChainOutput {
    pub input: String,
    /// History as it stood before this exchange.
    pub history: String,
    pub response: String,
    pub session_id: String,
}

/// Runs one question through memory, the prompt template and the model.
pub struct ConversationChain {
    client: Arc<dyn CompletionClient>,
    sessions: SessionStore,
}

impl ConversationChain {
    pub fn new(client: Arc<dyn CompletionClient>, sessions: SessionStore) -> Self {
        Self { client, sessions }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Ask `input` within `session_id`.
    ///
    /// The session stays locked for the whole exchange and both turns are
    /// recorded only once the model has answered, so a failed call leaves
    /// the history untouched.
    pub async fn invoke(
        &self,
        session_id: &str,
        input: &str,
    ) -> Result<ChainOutput, CompletionError> {
        let state = self.sessions.get_or_create(session_id).await;
        let mut state = state.lock().await;

        if state.is_empty() {
            debug!(session_id, "Starting conversation");
        }

        let history = state.buffer();
        let prompt = format_prompt(input, &history);
        debug!(session_id, turns = state.len(), "Rendered prompt: {}", prompt);

        let response = self.client.complete(&prompt).await?;

        state.append(Turn::user(input));
        state.append(Turn::assistant(response.as_str()));
        info!(session_id, turns = state.len(), "Conversation updated");

        Ok(ChainOutput {
            input: input.to_string(),
            history,
            response,
            session_id: session_id.to_string(),
        })
    }
}
