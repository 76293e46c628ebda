//! Storage seam for chat transcripts.
//!
//! Persistence of chat history is left to the host; the rest of the crate
//! only needs the operations below. [`InMemoryChatStore`] backs the CLI
//! session and tests.

use crate::core::message::{Chat, ChatMessage};

pub trait ChatStore: Send {
    fn create_chat(&mut self, title: Option<String>) -> Chat;

    /// All chats, newest first.
    fn list_chats(&self) -> Vec<&Chat>;

    fn chat(&self, chat_id: &str) -> Option<&Chat>;

    /// Returns `false` when the chat does not exist.
    fn append_message(&mut self, chat_id: &str, message: ChatMessage) -> bool;

    /// Replace a message's content and streaming flag. Unknown ids are ignored.
    fn update_message(&mut self, chat_id: &str, message_id: &str, content: &str, is_streaming: bool);

    fn set_message_failed(&mut self, chat_id: &str, message_id: &str, error: &dyn std::fmt::Display);

    fn set_title(&mut self, chat_id: &str, title: &str);

    fn delete_chat(&mut self, chat_id: &str);
}

#[derive(Debug, Default)]
pub struct InMemoryChatStore {
    chats: Vec<Chat>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn chat_mut(&mut self, chat_id: &str) -> Option<&mut Chat> {
        self.chats.iter_mut().find(|c| c.id == chat_id)
    }
}

impl ChatStore for InMemoryChatStore {
    fn create_chat(&mut self, title: Option<String>) -> Chat {
        let chat = Chat::new(title);
        self.chats.push(chat.clone());
        chat
    }

    fn list_chats(&self) -> Vec<&Chat> {
        let mut chats: Vec<&Chat> = self.chats.iter().collect();
        // Later inserts win timestamp ties.
        chats.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        chats.reverse();
        chats
    }

    fn chat(&self, chat_id: &str) -> Option<&Chat> {
        self.chats.iter().find(|c| c.id == chat_id)
    }

    fn append_message(&mut self, chat_id: &str, message: ChatMessage) -> bool {
        match self.chat_mut(chat_id) {
            Some(chat) => {
                chat.messages.push(message);
                true
            }
            None => false,
        }
    }

    fn update_message(&mut self, chat_id: &str, message_id: &str, content: &str, is_streaming: bool) {
        if let Some(message) = self
            .chat_mut(chat_id)
            .and_then(|chat| chat.find_message_mut(message_id))
        {
            message.content.clear();
            message.content.push_str(content);
            message.is_streaming = is_streaming;
        }
    }

    fn set_message_failed(&mut self, chat_id: &str, message_id: &str, error: &dyn std::fmt::Display) {
        if let Some(message) = self
            .chat_mut(chat_id)
            .and_then(|chat| chat.find_message_mut(message_id))
        {
            message.mark_failed(error);
        }
    }

    fn set_title(&mut self, chat_id: &str, title: &str) {
        if let Some(chat) = self.chat_mut(chat_id) {
            chat.title = title.to_string();
        }
    }

    fn delete_chat(&mut self, chat_id: &str) {
        self.chats.retain(|c| c.id != chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_list_and_delete() {
        let mut store = InMemoryChatStore::new();
        let first = store.create_chat(None);
        let second = store.create_chat(Some("Second".to_string()));

        let listed: Vec<&str> = store.list_chats().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(listed, vec![second.id.as_str(), first.id.as_str()]);

        store.delete_chat(&first.id);
        assert!(store.chat(&first.id).is_none());
        assert_eq!(store.list_chats().len(), 1);
    }

    #[test]
    fn append_and_update_messages() {
        let mut store = InMemoryChatStore::new();
        let chat = store.create_chat(None);
        let message = ChatMessage::user("hello");
        let message_id = message.id.clone();

        assert!(store.append_message(&chat.id, message));
        assert!(!store.append_message("missing", ChatMessage::user("lost")));

        store.update_message(&chat.id, &message_id, "edited", true);
        let stored = &store.chat(&chat.id).expect("chat").messages[0];
        assert_eq!(stored.content, "edited");
        assert!(stored.is_streaming);

        store.set_message_failed(&chat.id, &message_id, &"offline");
        let stored = &store.chat(&chat.id).expect("chat").messages[0];
        assert_eq!(stored.content, "Error: offline");
        assert!(!stored.is_streaming);
    }

    #[test]
    fn set_title_ignores_unknown_chats() {
        let mut store = InMemoryChatStore::new();
        let chat = store.create_chat(None);
        store.set_title(&chat.id, "Renamed");
        store.set_title("missing", "Nope");
        assert_eq!(store.chat(&chat.id).expect("chat").title, "Renamed");
    }
}
