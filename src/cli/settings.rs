//! Handlers for the `endpoint` and `model` subcommands.
//!
//! Each handler resolves its endpoint/model arguments against the stored
//! configuration, applies one change through [`ConfigStore`], and returns
//! the message to display.

use std::error::Error;
use std::fmt;

use crate::cli::{EndpointCommands, ModelCommands};
use crate::core::config::{
    ConfigError, ConfigStore, Configuration, EndpointUpdate, ModelUpdate, NewModel,
    SettingsStore,
};
use crate::core::selection::SelectionError;

#[derive(Debug)]
pub enum SettingsCommandError {
    Lookup(SelectionError),
    Save(ConfigError),
}

impl fmt::Display for SettingsCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsCommandError::Lookup(err) => {
                write!(f, "{err}. Run 'sparkle list' to see what is configured.")
            }
            SettingsCommandError::Save(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SettingsCommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SettingsCommandError::Lookup(err) => Some(err),
            SettingsCommandError::Save(err) => Some(err),
        }
    }
}

impl From<SelectionError> for SettingsCommandError {
    fn from(err: SelectionError) -> Self {
        SettingsCommandError::Lookup(err)
    }
}

impl From<ConfigError> for SettingsCommandError {
    fn from(err: ConfigError) -> Self {
        SettingsCommandError::Save(err)
    }
}

struct ResolvedEndpoint {
    id: String,
    name: String,
}

struct ResolvedModel {
    endpoint: ResolvedEndpoint,
    id: String,
    name: String,
}

fn resolve_endpoint(
    config: &Configuration,
    reference: &str,
) -> Result<ResolvedEndpoint, SelectionError> {
    config
        .lookup_endpoint(reference)
        .map(|endpoint| ResolvedEndpoint {
            id: endpoint.id.clone(),
            name: endpoint.name.clone(),
        })
        .ok_or_else(|| SelectionError::UnknownEndpoint(reference.to_string()))
}

fn resolve_model(
    config: &Configuration,
    endpoint_ref: &str,
    model_ref: &str,
) -> Result<ResolvedModel, SelectionError> {
    let endpoint = resolve_endpoint(config, endpoint_ref)?;
    let model = config
        .find_endpoint(&endpoint.id)
        .and_then(|e| e.lookup_model(model_ref))
        .ok_or_else(|| SelectionError::UnknownModel {
            endpoint: endpoint.name.clone(),
            model: model_ref.to_string(),
        })?;
    Ok(ResolvedModel {
        id: model.id.clone(),
        name: model.name.clone(),
        endpoint,
    })
}

pub fn run_endpoint_command<S: SettingsStore>(
    store: &mut ConfigStore<S>,
    command: EndpointCommands,
) -> Result<String, SettingsCommandError> {
    match command {
        EndpointCommands::Add {
            name,
            base_url,
            api_key,
        } => {
            let endpoint = store.add_endpoint(name, base_url, api_key)?;
            Ok(format!(
                "✅ Added endpoint '{}' ({})",
                endpoint.name, endpoint.id
            ))
        }
        EndpointCommands::Update {
            endpoint,
            name,
            base_url,
            api_key,
        } => {
            let resolved = resolve_endpoint(store.configuration(), &endpoint)?;
            if name.is_none() && base_url.is_none() && api_key.is_none() {
                return Ok(format!(
                    "⚠️  Nothing to change for endpoint '{}'. Pass --name, --base-url or --api-key.",
                    resolved.name
                ));
            }
            store.update_endpoint(
                &resolved.id,
                EndpointUpdate {
                    name,
                    base_url,
                    api_key,
                },
            )?;
            Ok(format!("✅ Updated endpoint '{}'", resolved.name))
        }
        EndpointCommands::Rename { endpoint, name } => {
            let resolved = resolve_endpoint(store.configuration(), &endpoint)?;
            store.rename_endpoint(&resolved.id, name.as_str())?;
            Ok(format!(
                "✅ Renamed endpoint '{}' to '{name}'",
                resolved.name
            ))
        }
        EndpointCommands::Remove { endpoint } => {
            let resolved = resolve_endpoint(store.configuration(), &endpoint)?;
            let model_count = store
                .configuration()
                .find_endpoint(&resolved.id)
                .map_or(0, |e| e.models.len());
            store.delete_endpoint(&resolved.id)?;
            Ok(format!(
                "✅ Removed endpoint '{}' and {model_count} model(s)",
                resolved.name
            ))
        }
    }
}

pub fn run_model_command<S: SettingsStore>(
    store: &mut ConfigStore<S>,
    command: ModelCommands,
) -> Result<String, SettingsCommandError> {
    match command {
        ModelCommands::Add {
            endpoint,
            name,
            deployment,
            no_streaming,
            title_default,
            api_version,
        } => {
            let resolved = resolve_endpoint(store.configuration(), &endpoint)?;
            let mut model = NewModel::new(name, deployment)
                .streaming(!no_streaming)
                .default_for_titles(title_default);
            if let Some(api_version) = api_version {
                model = model.api_version(api_version);
            }

            let added = store
                .add_model(&resolved.id, model)?
                .ok_or_else(|| SelectionError::UnknownEndpoint(endpoint.clone()))?;
            Ok(format!(
                "✅ Added model '{}' to '{}' ({})",
                added.name, resolved.name, added.id
            ))
        }
        ModelCommands::Update {
            endpoint,
            model,
            deployment,
            streaming,
            title_default,
            api_version,
        } => {
            let resolved = resolve_model(store.configuration(), &endpoint, &model)?;
            store.update_model(
                &resolved.endpoint.id,
                &resolved.id,
                ModelUpdate {
                    deployment_name: deployment,
                    supports_streaming: streaming,
                    is_default_for_titles: title_default,
                    api_version,
                },
            )?;
            Ok(format!(
                "✅ Updated model '{}' of '{}'",
                resolved.name, resolved.endpoint.name
            ))
        }
        ModelCommands::Rename {
            endpoint,
            model,
            name,
        } => {
            let resolved = resolve_model(store.configuration(), &endpoint, &model)?;
            store.rename_model(&resolved.endpoint.id, &resolved.id, name.as_str())?;
            Ok(format!("✅ Renamed model '{}' to '{name}'", resolved.name))
        }
        ModelCommands::Remove { endpoint, model } => {
            let resolved = resolve_model(store.configuration(), &endpoint, &model)?;
            store.delete_model(&resolved.endpoint.id, &resolved.id)?;
            Ok(format!(
                "✅ Removed model '{}' from '{}'",
                resolved.name, resolved.endpoint.name
            ))
        }
    }
}
