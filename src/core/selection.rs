//! Endpoint/model selection for the next chat request.
//!
//! A [`Selection`] is a plain value owned by the caller (a session, a CLI
//! invocation) and handed to the chat client per call. It holds snapshots,
//! so later configuration edits never reach a request already in flight.

use crate::core::config::data::{Configuration, Endpoint, ModelConfig};
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionError {
    NoEndpointSelected,
    UnknownEndpoint(String),
    UnknownModel { endpoint: String, model: String },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::NoEndpointSelected => write!(f, "No endpoint selected"),
            SelectionError::UnknownEndpoint(endpoint) => {
                write!(f, "Endpoint '{endpoint}' not found")
            }
            SelectionError::UnknownModel { endpoint, model } => {
                write!(f, "Model '{model}' not found on endpoint '{endpoint}'")
            }
        }
    }
}

impl Error for SelectionError {}

/// Immutable endpoint/model pair a single request runs against.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTarget {
    pub endpoint: Endpoint,
    pub model: ModelConfig,
}

/// Currently selected endpoint and model. The model, when present, always
/// belongs to the endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    endpoint: Option<Endpoint>,
    model: Option<ModelConfig>,
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The first endpoint and its first model, or as much of that as exists.
    pub fn first_available(config: &Configuration) -> Self {
        let endpoint = config.endpoints.first().cloned();
        let model = endpoint.as_ref().and_then(|e| e.models.first().cloned());
        Self { endpoint, model }
    }

    /// Selection pointing at the model used for chat titles.
    pub fn for_titles(config: &Configuration) -> Self {
        match config.default_title_model() {
            Some((endpoint, model)) => Self {
                endpoint: Some(endpoint.clone()),
                model: Some(model.clone()),
            },
            None => Self::empty(),
        }
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub fn model(&self) -> Option<&ModelConfig> {
        self.model.as_ref()
    }

    /// Select an endpoint (by id or name) and its first model.
    pub fn select_endpoint(
        &mut self,
        config: &Configuration,
        reference: &str,
    ) -> Result<(), SelectionError> {
        let endpoint = config
            .lookup_endpoint(reference)
            .ok_or_else(|| SelectionError::UnknownEndpoint(reference.to_string()))?;
        self.model = endpoint.models.first().cloned();
        self.endpoint = Some(endpoint.clone());
        Ok(())
    }

    /// Select a model (by id or name) of the currently selected endpoint.
    pub fn select_model(&mut self, reference: &str) -> Result<(), SelectionError> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or(SelectionError::NoEndpointSelected)?;
        let model = endpoint
            .lookup_model(reference)
            .ok_or_else(|| SelectionError::UnknownModel {
                endpoint: endpoint.name.clone(),
                model: reference.to_string(),
            })?;
        self.model = Some(model.clone());
        Ok(())
    }

    /// Bring the snapshots in line with `config` after it changed.
    ///
    /// A vanished endpoint resets the selection to the first available
    /// endpoint/model. A vanished model falls back to the endpoint's first.
    pub fn reconcile(&mut self, config: &Configuration) {
        let Some(current) = self.endpoint.as_ref() else {
            *self = Self::first_available(config);
            return;
        };
        let Some(endpoint) = config.find_endpoint(&current.id) else {
            *self = Self::first_available(config);
            return;
        };

        let model = self
            .model
            .as_ref()
            .and_then(|m| endpoint.find_model(&m.id))
            .or_else(|| endpoint.models.first())
            .cloned();
        self.endpoint = Some(endpoint.clone());
        self.model = model;
    }

    /// Snapshot the pair a request should use, if both halves are selected.
    pub fn target(&self) -> Option<ChatTarget> {
        Some(ChatTarget {
            endpoint: self.endpoint.clone()?,
            model: self.model.clone()?,
        })
    }
}
