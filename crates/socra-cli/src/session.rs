//! In-memory chat session

use socra_ai::ConversationTurn;

/// Conversation history for one run of the program
#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<ConversationTurn>,
    /// Message sent but not yet answered
    pending: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed turns, oldest first
    pub fn history(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Note a message whose answer is about to be streamed
    pub fn begin(&mut self, user: impl Into<String>) {
        self.pending = Some(user.into());
    }

    /// Record a completed exchange
    pub fn record(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.pending = None;
        self.turns.push(ConversationTurn::new(user, assistant));
    }

    /// Drop the last exchange, returning it
    pub fn undo(&mut self) -> Option<ConversationTurn> {
        self.pending = None;
        self.turns.pop()
    }

    /// Message to send again.
    ///
    /// An unanswered message comes first and leaves the history alone;
    /// otherwise the last exchange is dropped and its message returned.
    pub fn retry(&mut self) -> Option<String> {
        match self.pending.take() {
            Some(message) => Some(message),
            None => self.turns.pop().map(|turn| turn.user),
        }
    }

    pub fn clear(&mut self) {
        self.pending = None;
        self.turns.clear();
    }
}
