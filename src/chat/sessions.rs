use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::conversation_state::ConversationState;

pub const DEFAULT_SESSION: &str = "default";

/// Conversation logs keyed by session id.
///
/// Each log sits behind its own mutex, so exchanges in one session are
/// serialized while separate sessions proceed independently.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<ConversationState>>>>,
    max_turns: Option<usize>,
}

impl SessionStore {
    pub fn new(max_turns: Option<usize>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_turns,
        }
    }

    /// Fetch the log for `session_id`, creating an empty one on first use.
    pub async fn get_or_create(&self, session_id: &str) -> Arc<Mutex<ConversationState>> {
        if let Some(state) = self.get(session_id).await {
            return state;
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session_id, "Creating conversation");
                Arc::new(Mutex::new(ConversationState::with_max_turns(self.max_turns)))
            })
            .clone()
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<Mutex<ConversationState>>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Forget a session entirely. Returns false if the session was never used.
    ///
    /// An exchange already holding the session finishes against the detached
    /// log; the next request under the same id starts empty.
    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}
