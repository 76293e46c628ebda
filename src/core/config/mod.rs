pub mod data;
pub mod io;
pub mod store;

pub use data::{Configuration, Endpoint, EndpointUpdate, ModelConfig, ModelUpdate, NewModel};
pub use io::{ConfigError, FileSettingsStore, MemorySettingsStore, SettingsStore};
pub use store::ConfigStore;

#[cfg(test)]
pub mod tests;
