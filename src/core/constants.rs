//! Shared constants used across the application

/// Header carrying the endpoint's API key on every chat request.
pub const API_KEY_HEADER: &str = "api-key";

/// Key under which the serialized configuration is stored.
pub const SETTINGS_KEY: &str = "AzureSettings";

/// API version assigned to models created without an explicit one.
pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Token ceiling sent with every completion request, under whichever
/// parameter name the deployment accepts.
pub const MAX_RESPONSE_TOKENS: u32 = 800;

/// Sampling temperature for deployments that accept it (streaming ones).
pub const STREAMING_TEMPERATURE: f64 = 0.7;

/// Prefix that marks a payload line in a streamed response body.
pub const SSE_DATA_PREFIX: &str = "data: ";

/// Terminal sentinel sent after the last streamed chunk.
pub const SSE_DONE_SENTINEL: &str = "[DONE]";

/// Title given to chats before (or instead of) a generated one.
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Prefix written into an assistant message whose request failed.
pub const ERROR_MESSAGE_PREFIX: &str = "Error: ";
