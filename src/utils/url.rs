//! URL utilities for consistent URL handling
//!
//! Endpoint base URLs are user-entered and routinely carry stray slashes;
//! these helpers normalize them before the deployment path is appended.

use reqwest::Url;

/// Normalize a base URL by removing leading and trailing slashes
///
/// # Examples
///
/// ```
/// use sparkle::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://res.openai.azure.com"), "https://res.openai.azure.com");
/// assert_eq!(normalize_base_url("https://res.openai.azure.com/"), "https://res.openai.azure.com");
/// assert_eq!(normalize_base_url("https://res.openai.azure.com///"), "https://res.openai.azure.com");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_matches('/').to_string()
}

/// Build the chat-completions URL for a deployment.
///
/// The deployment name is percent-encoded as a single path segment; the API
/// version becomes the `api-version` query parameter. Returns `None` when
/// the base URL cannot be parsed or cannot carry a path, and when the
/// deployment name is empty, `.` or `..`.
///
/// # Examples
///
/// ```
/// use sparkle::utils::url::deployment_chat_url;
///
/// let url = deployment_chat_url("https://res.openai.azure.com/", "gpt-4o", "2024-02-15-preview")
///     .unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://res.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-15-preview"
/// );
/// ```
pub fn deployment_chat_url(base_url: &str, deployment_name: &str, api_version: &str) -> Option<Url> {
    // Dot segments would be collapsed out of the path.
    if matches!(deployment_name, "" | "." | "..") {
        return None;
    }

    let normalized_base = normalize_base_url(base_url);
    let mut url = Url::parse(&normalized_base).ok()?;
    if url.cannot_be_a_base() {
        return None;
    }

    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(["openai", "deployments", deployment_name, "chat", "completions"]);
    url.set_query(Some(&format!("api-version={api_version}")));
    Some(url)
}
