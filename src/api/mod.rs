//! Chat-completions payloads exchanged with Azure OpenAI deployments.

use crate::core::config::data::ModelConfig;
use crate::core::constants::{MAX_RESPONSE_TOKENS, STREAMING_TEMPERATURE};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Generation parameters. Deployments without streaming support reject
/// `max_tokens`, `temperature` and `stream: true`, so each variant carries
/// exactly the fields its kind of deployment accepts.
#[derive(Clone, Debug, PartialEq)]
pub enum CompletionParams {
    Streaming { max_tokens: u32, temperature: f64 },
    Buffered { max_completion_tokens: u32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub params: CompletionParams,
}

impl CompletionParams {
    pub fn for_model(model: &ModelConfig) -> Self {
        if model.supports_streaming {
            CompletionParams::Streaming {
                max_tokens: MAX_RESPONSE_TOKENS,
                temperature: STREAMING_TEMPERATURE,
            }
        } else {
            CompletionParams::Buffered {
                max_completion_tokens: MAX_RESPONSE_TOKENS,
            }
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, CompletionParams::Streaming { .. })
    }
}

impl ChatRequest {
    /// A single user message; no earlier turns are sent.
    pub fn single_prompt(model: &ModelConfig, prompt: &str) -> Self {
        Self {
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            params: CompletionParams::for_model(model),
        }
    }
}

impl Serialize for ChatRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("messages", &self.messages)?;
        match &self.params {
            CompletionParams::Streaming {
                max_tokens,
                temperature,
            } => {
                map.serialize_entry("max_tokens", max_tokens)?;
                map.serialize_entry("temperature", temperature)?;
                map.serialize_entry("stream", &true)?;
            }
            CompletionParams::Buffered {
                max_completion_tokens,
            } => {
                map.serialize_entry("max_completion_tokens", max_completion_tokens)?;
                map.serialize_entry("stream", &false)?;
            }
        }
        map.end()
    }
}

#[derive(Deserialize, Default, Debug)]
pub struct ChatResponseDelta {
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponseChoice {
    #[serde(default)]
    pub delta: ChatResponseDelta,
}

/// One `data:` chunk of a streamed response.
#[derive(Deserialize, Debug)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatResponseChoice>,
}

impl ChatResponse {
    pub fn into_fragment(self) -> Option<String> {
        self.choices.into_iter().next()?.delta.content
    }
}

#[derive(Deserialize, Debug)]
pub struct CompletionMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Body of a successful buffered response.
#[derive(Deserialize, Debug)]
pub struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
}

impl CompletionResponse {
    pub fn into_content(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }
}

#[derive(Deserialize, Debug)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Structured error body returned with non-2xx buffered responses.
#[derive(Deserialize, Debug)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}
