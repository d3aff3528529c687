use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Speaker label used when the history is rendered into a prompt.
    pub fn prefix(self) -> &'static str {
        match self {
            Role::User => "Human",
            Role::Assistant => "AI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role.prefix(), self.text)
    }
}

/// Ordered log of the turns exchanged in one conversation, oldest first.
#[derive(Debug, Default)]
pub struct ConversationState {
    turns: VecDeque<Turn>,
    max_turns: Option<usize>,
}

impl ConversationState {
    /// A log that drops its oldest exchanges once it holds more than `max_turns`.
    ///
    /// Eviction never leaves an assistant turn at the front, so the rendered
    /// history always opens with a question.
    pub fn with_max_turns(max_turns: Option<usize>) -> Self {
        Self {
            turns: VecDeque::new(),
            max_turns,
        }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        if let Some(max) = self.max_turns {
            while self.turns.len() > max {
                self.turns.pop_front();
                while self
                    .turns
                    .front()
                    .is_some_and(|turn| turn.role == Role::Assistant)
                {
                    self.turns.pop_front();
                }
            }
        }
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> + '_ {
        self.turns.iter()
    }

    /// Each turn formatted as `Human: ...` or `AI: ...`, in insertion order.
    pub fn render(&self) -> impl Iterator<Item = String> + '_ {
        self.turns().map(Turn::to_string)
    }

    pub fn buffer(&self) -> String {
        self.render().collect::<Vec<_>>().join("\n")
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_turns_in_insertion_order() {
        let mut state = ConversationState::default();
        state.append(Turn::user("What is Docker?"));
        state.append(Turn::assistant("A container runtime."));

        let lines: Vec<String> = state.render().collect();
        assert_eq!(lines, vec!["Human: What is Docker?", "AI: A container runtime."]);
        assert_eq!(state.buffer(), "Human: What is Docker?\nAI: A container runtime.");

        // render() can be walked again
        assert_eq!(state.render().count(), 2);
    }

    #[test]
    fn empty_log_renders_empty_buffer() {
        let state = ConversationState::default();
        assert!(state.is_empty());
        assert_eq!(state.buffer(), "");
    }

    #[test]
    fn window_drops_oldest_turns() {
        let mut state = ConversationState::with_max_turns(Some(4));
        for i in 0..3 {
            state.append(Turn::user(format!("q{}", i)));
            state.append(Turn::assistant(format!("a{}", i)));
        }

        assert_eq!(state.len(), 4);
        let texts: Vec<&str> = state.turns().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["q1", "a1", "q2", "a2"]);
    }

    #[test]
    fn odd_window_never_starts_with_an_answer() {
        let mut state = ConversationState::with_max_turns(Some(3));
        for i in 0..3 {
            state.append(Turn::user(format!("q{}", i)));
            state.append(Turn::assistant(format!("a{}", i)));
        }

        assert_eq!(state.buffer(), "Human: q2\nAI: a2");
        assert_eq!(state.turns().next().map(|t| t.role), Some(Role::User));
    }
}
