use crate::core::constants::DEFAULT_API_VERSION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A deployed-model configuration hosted by one [`Endpoint`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelConfig {
    pub id: String,
    pub name: String,
    /// Provider-side identifier substituted into the request path.
    pub deployment_name: String,
    pub supports_streaming: bool,
    /// At most one model across the whole [`Configuration`] carries this flag.
    #[serde(default)]
    pub is_default_for_titles: bool,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

/// A base URL plus credential scope that can host several deployed models.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Endpoint {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Configuration {
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// Parameters for a model about to be added to an endpoint.
#[derive(Debug, Clone)]
pub struct NewModel {
    pub name: String,
    pub deployment_name: String,
    pub supports_streaming: bool,
    pub is_default_for_titles: bool,
    pub api_version: String,
}

/// Partial endpoint update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct EndpointUpdate {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

/// Partial model update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ModelUpdate {
    pub deployment_name: Option<String>,
    pub supports_streaming: Option<bool>,
    pub is_default_for_titles: Option<bool>,
    pub api_version: Option<String>,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl NewModel {
    pub fn new(name: impl Into<String>, deployment_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deployment_name: deployment_name.into(),
            supports_streaming: true,
            is_default_for_titles: false,
            api_version: default_api_version(),
        }
    }

    pub fn streaming(mut self, supports_streaming: bool) -> Self {
        self.supports_streaming = supports_streaming;
        self
    }

    pub fn default_for_titles(mut self, is_default: bool) -> Self {
        self.is_default_for_titles = is_default;
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }
}

impl ModelConfig {
    pub fn from_new(model: NewModel) -> Self {
        Self {
            id: generate_id(),
            name: model.name,
            deployment_name: model.deployment_name,
            supports_streaming: model.supports_streaming,
            is_default_for_titles: model.is_default_for_titles,
            api_version: model.api_version,
        }
    }
}

impl Endpoint {
    pub fn new(name: String, base_url: String, api_key: String) -> Self {
        Self {
            id: generate_id(),
            name,
            base_url,
            api_key,
            models: Vec::new(),
        }
    }

    pub fn find_model(&self, model_id: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.id == model_id)
    }

    pub fn find_model_mut(&mut self, model_id: &str) -> Option<&mut ModelConfig> {
        self.models.iter_mut().find(|m| m.id == model_id)
    }

    /// Look a model up by id, falling back to a case-insensitive name match.
    pub fn lookup_model(&self, reference: &str) -> Option<&ModelConfig> {
        self.find_model(reference).or_else(|| {
            self.models
                .iter()
                .find(|m| m.name.eq_ignore_ascii_case(reference))
        })
    }
}

impl Configuration {
    pub fn find_endpoint(&self, endpoint_id: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.id == endpoint_id)
    }

    pub fn find_endpoint_mut(&mut self, endpoint_id: &str) -> Option<&mut Endpoint> {
        self.endpoints.iter_mut().find(|e| e.id == endpoint_id)
    }

    /// Look an endpoint up by id, falling back to a case-insensitive name match.
    pub fn lookup_endpoint(&self, reference: &str) -> Option<&Endpoint> {
        self.find_endpoint(reference).or_else(|| {
            self.endpoints
                .iter()
                .find(|e| e.name.eq_ignore_ascii_case(reference))
        })
    }

    pub fn first_endpoint_and_model(&self) -> Option<(&Endpoint, &ModelConfig)> {
        let endpoint = self.endpoints.first()?;
        let model = endpoint.models.first()?;
        Some((endpoint, model))
    }

    /// The model flagged for title generation; otherwise the first endpoint's
    /// first model; otherwise nothing.
    pub fn default_title_model(&self) -> Option<(&Endpoint, &ModelConfig)> {
        self.endpoints
            .iter()
            .find_map(|endpoint| {
                endpoint
                    .models
                    .iter()
                    .find(|m| m.is_default_for_titles)
                    .map(|model| (endpoint, model))
            })
            .or_else(|| self.first_endpoint_and_model())
    }

    pub(crate) fn clear_title_defaults(&mut self) {
        for model in self.endpoints.iter_mut().flat_map(|e| e.models.iter_mut()) {
            model.is_default_for_titles = false;
        }
    }

    pub fn title_default_count(&self) -> usize {
        self.endpoints
            .iter()
            .flat_map(|e| e.models.iter())
            .filter(|m| m.is_default_for_titles)
            .count()
    }
}

/// Generate a fresh identifier formatted as a version 4 UUID.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
