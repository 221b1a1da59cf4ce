//! Conversation log
//!
//! Append-only, insertion-ordered list of turns. Turns are never edited or
//! removed while the session lives; the log is what the UI renders.

use crate::models::ConversationTurn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const WELCOME_MESSAGE: &str = "Hi there! I'm your AI Fitness Assistant. I can help with Weight Loss, Weight Gain, PCOD Management, or general fitness advice. What are we working on today?";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationLog {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    /// Empty log
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            updated_at: Utc::now(),
            turns: Vec::new(),
        }
    }

    /// Log opened by the assistant's welcome turn
    pub fn with_welcome() -> Self {
        let mut log = Self::new();
        log.push(ConversationTurn::assistant(WELCOME_MESSAGE));
        log
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        self.updated_at = Utc::now();
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn find(&self, turn_id: Uuid) -> Option<&ConversationTurn> {
        self.turns.iter().find(|t| t.id == turn_id)
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}
