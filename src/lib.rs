//! Sparkle is a chat client for Azure OpenAI deployments.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the endpoint/model configuration store, the current
//!   selection, the streaming chat client, and the conversation driver that
//!   records replies into a chat transcript.
//! - [`api`] defines the request and response payloads exchanged with a
//!   deployment's chat completions route.
//! - [`cli`] parses arguments and runs the settings, one-shot, and
//!   interactive commands.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod utils;
