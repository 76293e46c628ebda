//! Drives a chat transcript through a [`ChatBackend`].

use crate::core::chat_store::ChatStore;
use crate::core::chat_stream::{ChatBackend, ChatError};
use crate::core::config::data::Configuration;
use crate::core::constants::DEFAULT_CHAT_TITLE;
use crate::core::message::ChatMessage;
use crate::core::selection::Selection;
use tracing::{debug, warn};

fn title_prompt(first_message: &str) -> String {
    format!(
        "Based on this first message, generate a very short and concise title (max 4 words) for this chat conversation: \"{first_message}\""
    )
}

fn clean_title(raw: &str) -> Option<String> {
    let cleaned = raw.trim().trim_matches('"').trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Ask the title-default model for a short chat title.
///
/// Never fails: any error, or an empty reply, yields the default title.
pub async fn generate_title<B>(backend: &B, config: &Configuration, first_message: &str) -> String
where
    B: ChatBackend + ?Sized,
{
    let selection = Selection::for_titles(config);
    let prompt = title_prompt(first_message);
    let mut latest = String::new();

    let result = backend
        .send_chat(&selection, &prompt, &mut |text: &str| {
            latest.clear();
            latest.push_str(text);
        })
        .await;

    match result {
        Ok(_) => clean_title(&latest).unwrap_or_else(|| DEFAULT_CHAT_TITLE.to_string()),
        Err(err) => {
            warn!(error = %err, "Failed to generate chat title");
            DEFAULT_CHAT_TITLE.to_string()
        }
    }
}

/// Append `text` and the assistant's reply to a chat.
///
/// Blank input is ignored. The reply is written into a streaming
/// placeholder as it arrives. On failure the placeholder holds an
/// `Error: ...` line and the error is returned. The first message of a
/// chat also produces a title.
pub async fn send_message<B, S>(
    backend: &B,
    store: &mut S,
    config: &Configuration,
    selection: &Selection,
    chat_id: &str,
    text: &str,
) -> Result<(), ChatError>
where
    B: ChatBackend + ?Sized,
    S: ChatStore,
{
    if text.trim().is_empty() {
        return Ok(());
    }

    if !store.append_message(chat_id, ChatMessage::user(text)) {
        debug!(chat_id, "Dropping message for unknown chat");
        return Ok(());
    }
    let is_first = store
        .chat(chat_id)
        .is_some_and(|chat| chat.user_message_count() == 1);

    let placeholder = ChatMessage::assistant_placeholder(selection);
    let placeholder_id = placeholder.id.clone();
    store.append_message(chat_id, placeholder);

    let result = backend
        .send_chat(selection, text, &mut |content: &str| {
            store.update_message(chat_id, &placeholder_id, content, true);
        })
        .await;

    match &result {
        Ok(completion) => {
            store.update_message(chat_id, &placeholder_id, &completion.content, false);
        }
        Err(err) => store.set_message_failed(chat_id, &placeholder_id, err),
    }

    if is_first {
        let title = generate_title(backend, config, text).await;
        store.set_title(chat_id, &title);
    }

    result.map(|_| ())
}
