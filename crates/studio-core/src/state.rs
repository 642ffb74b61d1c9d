//! UI-agnostic conversation state
//!
//! These types are shared by every front end and by session persistence.

use serde::{Deserialize, Serialize};

/// A chat message in the studio conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Set while the text is still being revealed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_streaming: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Up,
    Down,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            is_streaming: false,
            feedback: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            is_streaming: false,
            feedback: None,
        }
    }

    /// An assistant message whose text is about to be revealed.
    pub fn streaming() -> Self {
        Self {
            is_streaming: true,
            ..Self::assistant(String::new())
        }
    }

    /// Copy and feedback only exist for finished assistant messages.
    pub fn accepts_actions(&self) -> bool {
        self.role == ChatRole::Assistant && !self.is_streaming
    }

    /// Pressing the same rating twice clears it. Ignored while streaming.
    pub fn toggle_feedback(&mut self, rating: Feedback) -> bool {
        if !self.accepts_actions() {
            return false;
        }
        self.feedback = if self.feedback == Some(rating) {
            None
        } else {
            Some(rating)
        };
        true
    }
}
