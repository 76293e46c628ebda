//! Line-oriented chat session over stdin.

use std::error::Error;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::cancel_on_ctrl_c;
use crate::cli::say::ProgressPrinter;
use crate::core::chat_store::{ChatStore, InMemoryChatStore};
use crate::core::chat_stream::{ChatBackend, ChatClient, ChatCompletion, ChatError};
use crate::core::config::Configuration;
use crate::core::conversation::send_message;
use crate::core::selection::Selection;

/// [`ChatClient`] wrapper for an interactive session: each turn gets its
/// own cancellation token, and the first request of a turn (the reply, not
/// the title) is echoed to stdout as it streams.
struct TerminalBackend {
    client: ChatClient,
    cancel: Mutex<CancellationToken>,
    echo_next: AtomicBool,
}

impl TerminalBackend {
    fn new(client: ChatClient) -> Self {
        Self {
            client,
            cancel: Mutex::new(CancellationToken::new()),
            echo_next: AtomicBool::new(false),
        }
    }

    /// Arm a fresh token and echo for the next turn.
    fn begin_turn(&self) -> CancellationToken {
        let token = CancellationToken::new();
        match self.cancel.lock() {
            Ok(mut current) => *current = token.clone(),
            Err(poisoned) => *poisoned.into_inner() = token.clone(),
        }
        self.echo_next.store(true, Ordering::SeqCst);
        token
    }

    fn current_token(&self) -> CancellationToken {
        match self.cancel.lock() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ChatBackend for TerminalBackend {
    async fn send_chat(
        &self,
        selection: &Selection,
        prompt: &str,
        on_progress: &mut (dyn for<'s> FnMut(&'s str) + Send),
    ) -> Result<ChatCompletion, ChatError> {
        let cancel = self.current_token();
        let echo = self.echo_next.swap(false, Ordering::SeqCst);
        let mut printer = ProgressPrinter::new(io::stdout());

        let result = self
            .client
            .send_chat_with_cancel(selection, prompt, &cancel, |text| {
                if echo {
                    printer.update(text);
                }
                on_progress(text);
            })
            .await;

        if let Err(err) = printer.finish() {
            debug!(error = %err, "failed to echo reply");
        }
        result
    }
}

fn describe(selection: &Selection) -> String {
    match (selection.endpoint(), selection.model()) {
        (Some(endpoint), Some(model)) => format!("{} on {}", model.name, endpoint.name),
        (Some(endpoint), None) => format!("{} (no model)", endpoint.name),
        _ => "nothing (no endpoint configured)".to_string(),
    }
}

fn prompt_marker() -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()
}

pub async fn run_chat(config: &Configuration, selection: Selection) -> Result<(), Box<dyn Error>> {
    let backend = TerminalBackend::new(ChatClient::new());
    let mut chats = InMemoryChatStore::new();
    let chat_id = chats.create_chat(None).id;

    eprintln!("💬 Chatting with {}", describe(&selection));
    eprintln!("   Enter sends, Ctrl+C cancels a reply, Ctrl+D or /quit exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut titled = false;

    loop {
        prompt_marker()?;
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" {
            break;
        }

        let cancel = backend.begin_turn();
        let watcher = cancel_on_ctrl_c(cancel);
        let result = send_message(&backend, &mut chats, config, &selection, &chat_id, text).await;
        watcher.abort();

        match result {
            Ok(()) => {}
            Err(ChatError::Cancelled) => eprintln!("⏹  Cancelled"),
            Err(err) => eprintln!("❌ {err}"),
        }

        if !titled {
            if let Some(chat) = chats.chat(&chat_id) {
                eprintln!("📝 {}", chat.title);
            }
            titled = true;
        }
    }

    Ok(())
}
