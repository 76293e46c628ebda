use std::error::Error;
use std::fmt;

/// Why a chat request produced no (or no complete) reply.
///
/// `Display` yields the message a caller shows to the user.
#[derive(Debug)]
pub enum ChatError {
    /// No endpoint or no model is selected. Nothing was sent.
    Configuration(&'static str),

    /// The endpoint's base URL and deployment do not form a usable URL.
    InvalidUrl { base_url: String },

    /// Non-2xx status without a structured error body.
    Http { status: u16 },

    /// Non-2xx status with a server-supplied error message.
    Api { status: u16, message: String },

    /// A well-formed reply that carried no content.
    EmptyResponse,

    /// A 2xx buffered reply whose body is not a completion.
    Decode(serde_json::Error),

    /// The connection failed or the body could not be read.
    Transport(reqwest::Error),

    /// The caller cancelled the request.
    Cancelled,
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Configuration(what) => {
                write!(f, "No {what} selected. Configure one in settings first.")
            }
            ChatError::InvalidUrl { base_url } => {
                write!(f, "Invalid endpoint URL: {base_url}")
            }
            ChatError::Http { status } => write!(f, "Request failed with HTTP status {status}"),
            ChatError::Api { status, message } => write!(f, "API error ({status}): {message}"),
            ChatError::EmptyResponse => write!(f, "The response contained no content"),
            ChatError::Decode(err) => write!(f, "Could not decode response: {err}"),
            ChatError::Transport(err) => write!(f, "Network error: {err}"),
            ChatError::Cancelled => write!(f, "Request cancelled"),
        }
    }
}

impl Error for ChatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ChatError::Decode(err) => Some(err),
            ChatError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_readable() {
        assert_eq!(
            ChatError::Api {
                status: 429,
                message: "rate limited".to_string()
            }
            .to_string(),
            "API error (429): rate limited"
        );
        assert_eq!(
            ChatError::Http { status: 502 }.to_string(),
            "Request failed with HTTP status 502"
        );
        assert_eq!(
            ChatError::Configuration("endpoint").to_string(),
            "No endpoint selected. Configure one in settings first."
        );
    }
}
