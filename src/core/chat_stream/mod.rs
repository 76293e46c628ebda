//! Single-prompt chat client for Azure OpenAI deployments.
//!
//! Each call resolves its endpoint/model snapshot from the caller's
//! [`Selection`], sends one POST, and reports the reply through a progress
//! callback that always receives the full text produced so far. Deployments
//! flagged as streaming are read line by line; the rest are read whole.
//! Nothing is retried.

pub mod decoder;
pub mod error;


pub use decoder::{LineBuffer, LineOutcome, StreamAccumulator};
pub use error::ChatError;

use crate::api::{ApiErrorResponse, ChatRequest, CompletionResponse};
use crate::core::constants::API_KEY_HEADER;
use crate::core::selection::{ChatTarget, Selection};
use crate::utils::url::deployment_chat_url;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Terminal result of a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCompletion {
    /// The final reply text; equal to the last value given to the callback.
    pub content: String,
    /// Streamed `data: ` lines that were dropped as undecodable.
    pub skipped_lines: usize,
}

/// Something that can answer a prompt for a selected endpoint/model.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_chat(
        &self,
        selection: &Selection,
        prompt: &str,
        on_progress: &mut (dyn for<'s> FnMut(&'s str) + Send),
    ) -> Result<ChatCompletion, ChatError>;
}

#[derive(Clone, Debug, Default)]
pub struct ChatClient {
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Send `prompt` to the selected deployment.
    ///
    /// `on_progress` runs on the calling task, in arrival order, and never
    /// after `cancel` fires. Cancelling drops the connection and fails the
    /// call with [`ChatError::Cancelled`].
    pub async fn send_chat_with_cancel<F>(
        &self,
        selection: &Selection,
        prompt: &str,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<ChatCompletion, ChatError>
    where
        F: FnMut(&str) + Send,
    {
        let target = resolve_target(selection)?;
        let ChatTarget { endpoint, model } = &target;

        let url = deployment_chat_url(&endpoint.base_url, &model.deployment_name, &model.api_version)
            .ok_or_else(|| ChatError::InvalidUrl {
                base_url: endpoint.base_url.clone(),
            })?;
        let body = ChatRequest::single_prompt(model, prompt);
        let streaming = body.params.is_streaming();

        debug!(
            endpoint = %endpoint.name,
            deployment = %model.deployment_name,
            streaming,
            "Sending chat request"
        );

        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, &endpoint.api_key)
            .json(&body);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            result = request.send() => result.map_err(ChatError::Transport)?,
        };

        if streaming {
            read_streaming(response, cancel, &mut on_progress).await
        } else {
            read_buffered(response, cancel, &mut on_progress).await
        }
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn send_chat(
        &self,
        selection: &Selection,
        prompt: &str,
        on_progress: &mut (dyn for<'s> FnMut(&'s str) + Send),
    ) -> Result<ChatCompletion, ChatError> {
        let cancel = CancellationToken::new();
        self.send_chat_with_cancel(selection, prompt, &cancel, |text| on_progress(text))
            .await
    }
}

fn resolve_target(selection: &Selection) -> Result<ChatTarget, ChatError> {
    if selection.endpoint().is_none() {
        return Err(ChatError::Configuration("endpoint"));
    }
    selection
        .target()
        .ok_or(ChatError::Configuration("model"))
}

async fn read_streaming<F>(
    response: reqwest::Response,
    cancel: &CancellationToken,
    on_progress: &mut F,
) -> Result<ChatCompletion, ChatError>
where
    F: FnMut(&str) + Send,
{
    let status = response.status();
    if !status.is_success() {
        warn!(status = status.as_u16(), "Streaming chat request failed");
        return Err(ChatError::Http {
            status: status.as_u16(),
        });
    }

    let mut stream = response.bytes_stream();
    let mut lines = LineBuffer::new();
    let mut accumulator = StreamAccumulator::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            next = stream.next() => next,
        };
        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk.map_err(ChatError::Transport)?;
        lines.push(&chunk);

        while let Some(line) = lines.next_line() {
            deliver_line(&mut accumulator, &line, cancel, on_progress)?;
        }
    }

    if let Some(line) = lines.finish() {
        deliver_line(&mut accumulator, &line, cancel, on_progress)?;
    }

    let skipped_lines = accumulator.skipped_lines();
    if skipped_lines > 0 {
        debug!(skipped_lines, "Stream finished with skipped lines");
    }
    Ok(ChatCompletion {
        content: accumulator.into_content(),
        skipped_lines,
    })
}

fn deliver_line<F>(
    accumulator: &mut StreamAccumulator,
    line: &[u8],
    cancel: &CancellationToken,
    on_progress: &mut F,
) -> Result<(), ChatError>
where
    F: FnMut(&str),
{
    if cancel.is_cancelled() {
        return Err(ChatError::Cancelled);
    }
    if accumulator.ingest_bytes(line) == LineOutcome::Appended {
        on_progress(accumulator.content());
    }
    Ok(())
}

async fn read_buffered<F>(
    response: reqwest::Response,
    cancel: &CancellationToken,
    on_progress: &mut F,
) -> Result<ChatCompletion, ChatError>
where
    F: FnMut(&str) + Send,
{
    let status = response.status();
    let body = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ChatError::Cancelled),
        body = response.bytes() => body.map_err(ChatError::Transport)?,
    };

    if !status.is_success() {
        let status = status.as_u16();
        return Err(match serde_json::from_slice::<ApiErrorResponse>(&body) {
            Ok(error_body) => {
                warn!(status, message = %error_body.error.message, "Chat request rejected");
                ChatError::Api {
                    status,
                    message: error_body.error.message,
                }
            }
            Err(_) => {
                warn!(status, "Chat request failed");
                ChatError::Http { status }
            }
        });
    }

    let content = serde_json::from_slice::<CompletionResponse>(&body)
        .map_err(ChatError::Decode)?
        .into_content()
        .ok_or(ChatError::EmptyResponse)?;

    if cancel.is_cancelled() {
        return Err(ChatError::Cancelled);
    }
    on_progress(&content);
    Ok(ChatCompletion {
        content,
        skipped_lines: 0,
    })
}
