//! One-shot "say" command

use std::error::Error;
use std::io::{self, Write};

use tokio_util::sync::CancellationToken;

use crate::cli::cancel_on_ctrl_c;
use crate::core::chat_stream::ChatClient;
use crate::core::selection::Selection;

/// Writes only the part of each progress snapshot not yet written, so a
/// reply that arrives as growing full-text snapshots prints like a stream.
pub struct ProgressPrinter<W: Write> {
    out: W,
    printed: usize,
    error: Option<io::Error>,
}

impl<W: Write> ProgressPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed: 0,
            error: None,
        }
    }

    pub fn update(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        let unseen = text.get(self.printed..).unwrap_or_default();
        if unseen.is_empty() {
            return;
        }
        match self
            .out
            .write_all(unseen.as_bytes())
            .and_then(|()| self.out.flush())
        {
            Ok(()) => self.printed = text.len(),
            Err(err) => self.error = Some(err),
        }
    }

    pub fn printed_any(&self) -> bool {
        self.printed > 0
    }

    /// End the line if anything was printed and report the first write
    /// error, if any.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        if self.printed_any() {
            writeln!(self.out)?;
        }
        Ok(self.out)
    }
}

pub async fn run_say(
    client: &ChatClient,
    selection: &Selection,
    prompt: &str,
) -> Result<(), Box<dyn Error>> {
    if prompt.trim().is_empty() {
        return Err("Usage: sparkle say <prompt>".into());
    }

    let cancel = CancellationToken::new();
    let watcher = cancel_on_ctrl_c(cancel.clone());
    let mut printer = ProgressPrinter::new(io::stdout());

    let result = client
        .send_chat_with_cancel(selection, prompt, &cancel, |text| printer.update(text))
        .await;
    watcher.abort();

    let finished = printer.finish();
    result?;
    finished?;
    Ok(())
}
