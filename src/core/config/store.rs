use crate::core::config::data::{
    Configuration, Endpoint, EndpointUpdate, ModelConfig, ModelUpdate, NewModel,
};
use crate::core::config::io::{ConfigError, SettingsStore};
use crate::core::constants::SETTINGS_KEY;
use tracing::{debug, warn};

/// Owns the endpoint/model configuration and writes it back through a
/// [`SettingsStore`] after every change.
///
/// Lookups by id that match nothing leave the configuration untouched and
/// write nothing, so callers holding stale ids never see an error.
pub struct ConfigStore<S: SettingsStore> {
    settings: S,
    config: Configuration,
}

impl<S: SettingsStore> ConfigStore<S> {
    /// Load the stored configuration, or start empty when nothing usable is
    /// stored.
    pub fn load(settings: S) -> Self {
        let config = match settings.read(SETTINGS_KEY) {
            Ok(Some(contents)) => match Configuration::from_toml(&contents) {
                Ok(config) => config,
                Err(err) => {
                    warn!(error = %err, "Stored settings are malformed; starting empty");
                    Configuration::default()
                }
            },
            Ok(None) => Configuration::default(),
            Err(err) => {
                warn!(error = %err, "Stored settings are unreadable; starting empty");
                Configuration::default()
            }
        };

        Self { settings, config }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.config.endpoints
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    /// Serialize the whole configuration and overwrite the stored blob.
    pub fn save(&self) -> Result<(), ConfigError> {
        Self::write(&self.settings, &self.config)
    }

    fn write(settings: &S, config: &Configuration) -> Result<(), ConfigError> {
        let contents = config.to_toml()?;
        settings.write(SETTINGS_KEY, &contents)?;
        debug!(endpoints = config.endpoints.len(), "Settings saved");
        Ok(())
    }

    /// Apply `mutator` to a working copy. When it reports a change the copy
    /// is persisted and only then becomes the live configuration.
    fn mutate<F, T>(&mut self, mutator: F) -> Result<Option<T>, ConfigError>
    where
        F: FnOnce(&mut Configuration) -> Option<T>,
    {
        let mut working = self.config.clone();
        let Some(result) = mutator(&mut working) else {
            return Ok(None);
        };
        Self::write(&self.settings, &working)?;
        self.config = working;
        Ok(Some(result))
    }

    pub fn add_endpoint(
        &mut self,
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Endpoint, ConfigError> {
        let endpoint = Endpoint::new(name.into(), base_url.into(), api_key.into());
        let added = endpoint.clone();
        self.mutate(move |config| {
            config.endpoints.push(endpoint);
            Some(())
        })?;
        Ok(added)
    }

    pub fn update_endpoint(
        &mut self,
        endpoint_id: &str,
        update: EndpointUpdate,
    ) -> Result<(), ConfigError> {
        self.mutate(|config| {
            let endpoint = config.find_endpoint_mut(endpoint_id)?;
            if let Some(name) = update.name {
                endpoint.name = name;
            }
            if let Some(base_url) = update.base_url {
                endpoint.base_url = base_url;
            }
            if let Some(api_key) = update.api_key {
                endpoint.api_key = api_key;
            }
            Some(())
        })?;
        Ok(())
    }

    pub fn rename_endpoint(
        &mut self,
        endpoint_id: &str,
        name: impl Into<String>,
    ) -> Result<(), ConfigError> {
        self.update_endpoint(
            endpoint_id,
            EndpointUpdate {
                name: Some(name.into()),
                ..Default::default()
            },
        )
    }

    /// Remove an endpoint together with every model it hosts.
    pub fn delete_endpoint(&mut self, endpoint_id: &str) -> Result<(), ConfigError> {
        self.mutate(|config| {
            let before = config.endpoints.len();
            config.endpoints.retain(|e| e.id != endpoint_id);
            (config.endpoints.len() != before).then_some(())
        })?;
        Ok(())
    }

    /// Append a model to an endpoint. Returns `None` when the endpoint does
    /// not exist.
    ///
    /// Flagging the new model as the title default first clears the flag on
    /// every other model in every endpoint.
    pub fn add_model(
        &mut self,
        endpoint_id: &str,
        model: NewModel,
    ) -> Result<Option<ModelConfig>, ConfigError> {
        let model = ModelConfig::from_new(model);
        self.mutate(move |config| {
            config.find_endpoint(endpoint_id)?;
            if model.is_default_for_titles {
                config.clear_title_defaults();
            }
            let added = model.clone();
            config.find_endpoint_mut(endpoint_id)?.models.push(model);
            Some(added)
        })
    }

    pub fn update_model(
        &mut self,
        endpoint_id: &str,
        model_id: &str,
        update: ModelUpdate,
    ) -> Result<(), ConfigError> {
        self.mutate(|config| {
            config.find_endpoint(endpoint_id)?.find_model(model_id)?;
            if update.is_default_for_titles == Some(true) {
                config.clear_title_defaults();
            }

            let model = config
                .find_endpoint_mut(endpoint_id)?
                .find_model_mut(model_id)?;
            if let Some(deployment_name) = update.deployment_name {
                model.deployment_name = deployment_name;
            }
            if let Some(supports_streaming) = update.supports_streaming {
                model.supports_streaming = supports_streaming;
            }
            if let Some(is_default) = update.is_default_for_titles {
                model.is_default_for_titles = is_default;
            }
            if let Some(api_version) = update.api_version {
                model.api_version = api_version;
            }
            Some(())
        })?;
        Ok(())
    }

    pub fn rename_model(
        &mut self,
        endpoint_id: &str,
        model_id: &str,
        name: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        self.mutate(|config| {
            let model = config
                .find_endpoint_mut(endpoint_id)?
                .find_model_mut(model_id)?;
            model.name = name;
            Some(())
        })?;
        Ok(())
    }

    pub fn delete_model(&mut self, endpoint_id: &str, model_id: &str) -> Result<(), ConfigError> {
        self.mutate(|config| {
            let endpoint = config.find_endpoint_mut(endpoint_id)?;
            let before = endpoint.models.len();
            endpoint.models.retain(|m| m.id != model_id);
            (endpoint.models.len() != before).then_some(())
        })?;
        Ok(())
    }

    /// The flagged title model if any; else the first endpoint's first
    /// model; else `None`.
    pub fn default_title_model(&self) -> Option<(&Endpoint, &ModelConfig)> {
        self.config.default_title_model()
    }
}
