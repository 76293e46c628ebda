use crate::core::config::data::generate_id;
use crate::core::constants::{DEFAULT_CHAT_TITLE, ERROR_MESSAGE_PREFIX};
use crate::core::selection::Selection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Set while a reply is still arriving.
    pub is_streaming: bool,
    pub timestamp: DateTime<Utc>,
    pub endpoint_id: Option<String>,
    pub model_id: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            role: Role::User,
            content: content.into(),
            is_streaming: false,
            timestamp: Utc::now(),
            endpoint_id: None,
            model_id: None,
        }
    }

    /// Empty assistant message that a streaming reply will fill in, tagged
    /// with whatever endpoint/model is selected.
    pub fn assistant_placeholder(selection: &Selection) -> Self {
        Self {
            id: generate_id(),
            role: Role::Assistant,
            content: String::new(),
            is_streaming: true,
            timestamp: Utc::now(),
            endpoint_id: selection.endpoint().map(|e| e.id.clone()),
            model_id: selection.model().map(|m| m.id.clone()),
        }
    }

    pub fn mark_failed(&mut self, error: &dyn std::fmt::Display) {
        self.content = format!("{ERROR_MESSAGE_PREFIX}{error}");
        self.is_streaming = false;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn new(title: Option<String>) -> Self {
        Self {
            id: generate_id(),
            title: title.unwrap_or_else(|| DEFAULT_CHAT_TITLE.to_string()),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn find_message_mut(&mut self, message_id: &str) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }

    pub fn user_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.role.is_user()).count()
    }
}
