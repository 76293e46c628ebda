use super::data::{generate_id, Configuration, EndpointUpdate, ModelUpdate, NewModel};
use super::io::{FileSettingsStore, MemorySettingsStore, SettingsStore};
use super::store::ConfigStore;
use crate::core::constants::{DEFAULT_API_VERSION, SETTINGS_KEY};
use tempfile::TempDir;

fn store_with_two_endpoints() -> ConfigStore<MemorySettingsStore> {
    let mut store = ConfigStore::load(MemorySettingsStore::new());
    let east = store
        .add_endpoint("East", "https://east.example.com", "key-east")
        .expect("add east");
    let west = store
        .add_endpoint("West", "https://west.example.com/", "key-west")
        .expect("add west");
    store
        .add_model(&east.id, NewModel::new("GPT-4o", "gpt-4o"))
        .expect("add gpt-4o");
    store
        .add_model(&east.id, NewModel::new("o1", "o1").streaming(false))
        .expect("add o1");
    store
        .add_model(&west.id, NewModel::new("Mini", "gpt-4o-mini"))
        .expect("add mini");
    store
}

fn model_id(store: &ConfigStore<MemorySettingsStore>, endpoint: usize, model: usize) -> String {
    store.endpoints()[endpoint].models[model].id.clone()
}

#[test]
fn load_from_empty_store_yields_empty_configuration() {
    let store = ConfigStore::load(MemorySettingsStore::new());
    assert!(store.endpoints().is_empty());
    assert!(store.default_title_model().is_none());
}

#[test]
fn malformed_blob_is_treated_as_absent() {
    let settings = MemorySettingsStore::with_entry(SETTINGS_KEY, "endpoints = [[[ not toml");
    let store = ConfigStore::load(settings);
    assert_eq!(store.configuration(), &Configuration::default());
}

#[test]
fn every_mutation_writes_the_whole_configuration() {
    let settings = MemorySettingsStore::new();
    let mut store = ConfigStore::load(&settings);

    let endpoint = store
        .add_endpoint("Main", "https://main.example.com", "secret")
        .expect("add endpoint");
    assert_eq!(settings.write_count(), 1);

    store
        .add_model(&endpoint.id, NewModel::new("GPT", "gpt"))
        .expect("add model");
    store.rename_endpoint(&endpoint.id, "Primary").expect("rename");
    assert_eq!(settings.write_count(), 3);

    let blob = settings.get(SETTINGS_KEY).expect("blob stored");
    let persisted = Configuration::from_toml(&blob).expect("blob parses");
    assert_eq!(&persisted, store.configuration());
    assert_eq!(persisted.endpoints[0].name, "Primary");
    assert_eq!(persisted.endpoints[0].models[0].deployment_name, "gpt");
}

#[test]
fn calls_with_unknown_ids_change_nothing_and_write_nothing() {
    let settings = MemorySettingsStore::new();
    let mut store = ConfigStore::load(&settings);
    store
        .add_endpoint("Main", "https://main.example.com", "secret")
        .expect("add endpoint");
    let snapshot = store.configuration().clone();
    let writes = settings.write_count();

    store
        .update_endpoint(
            "missing",
            EndpointUpdate {
                api_key: Some("other".to_string()),
                ..Default::default()
            },
        )
        .expect("update is a no-op");
    store.rename_endpoint("missing", "x").expect("rename no-op");
    store.delete_endpoint("missing").expect("delete no-op");
    let added = store
        .add_model("missing", NewModel::new("m", "m"))
        .expect("add_model no-op");
    assert!(added.is_none());
    store
        .update_model("missing", "missing", ModelUpdate::default())
        .expect("update_model no-op");
    store.delete_model("missing", "missing").expect("delete_model no-op");

    assert_eq!(store.configuration(), &snapshot);
    assert_eq!(settings.write_count(), writes);
}

#[test]
fn add_endpoint_generates_unique_ids_and_keeps_insertion_order() {
    let store = store_with_two_endpoints();
    let names: Vec<&str> = store.endpoints().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["East", "West"]);
    assert_ne!(store.endpoints()[0].id, store.endpoints()[1].id);
    assert_eq!(store.endpoints()[0].models.len(), 2);
    assert_eq!(store.endpoints()[0].models[0].api_version, DEFAULT_API_VERSION);
}

#[test]
fn update_endpoint_applies_only_given_fields() {
    let mut store = store_with_two_endpoints();
    let id = store.endpoints()[0].id.clone();

    store
        .update_endpoint(
            &id,
            EndpointUpdate {
                base_url: Some("https://new.example.com".to_string()),
                ..Default::default()
            },
        )
        .expect("update endpoint");

    let endpoint = &store.endpoints()[0];
    assert_eq!(endpoint.base_url, "https://new.example.com");
    assert_eq!(endpoint.api_key, "key-east");
    assert_eq!(endpoint.name, "East");
}

#[test]
fn delete_endpoint_removes_its_models_and_later_model_calls_are_noops() {
    let mut store = store_with_two_endpoints();
    let east_id = store.endpoints()[0].id.clone();
    let gpt_id = model_id(&store, 0, 0);

    store.delete_endpoint(&east_id).expect("delete endpoint");
    assert_eq!(store.endpoints().len(), 1);
    assert!(store
        .endpoints()
        .iter()
        .flat_map(|e| e.models.iter())
        .all(|m| m.id != gpt_id));

    let snapshot = store.configuration().clone();
    store
        .update_model(
            &east_id,
            &gpt_id,
            ModelUpdate {
                deployment_name: Some("changed".to_string()),
                ..Default::default()
            },
        )
        .expect("stale update is a no-op");
    store
        .delete_model(&east_id, &gpt_id)
        .expect("stale delete is a no-op");
    assert_eq!(store.configuration(), &snapshot);
}

#[test]
fn adding_a_title_default_clears_the_flag_everywhere_else() {
    let mut store = store_with_two_endpoints();
    let east_id = store.endpoints()[0].id.clone();
    let west_id = store.endpoints()[1].id.clone();

    store
        .add_model(&east_id, NewModel::new("T1", "t1").default_for_titles(true))
        .expect("add first default");
    let second = store
        .add_model(&west_id, NewModel::new("T2", "t2").default_for_titles(true))
        .expect("add second default")
        .expect("endpoint exists");

    assert_eq!(store.configuration().title_default_count(), 1);
    let (endpoint, model) = store.default_title_model().expect("title model");
    assert_eq!(endpoint.id, west_id);
    assert_eq!(model.id, second.id);
}

#[test]
fn updating_a_title_default_moves_the_flag_across_endpoints() {
    let mut store = store_with_two_endpoints();
    let east_id = store.endpoints()[0].id.clone();
    let west_id = store.endpoints()[1].id.clone();
    let o1_id = model_id(&store, 0, 1);
    let mini_id = model_id(&store, 1, 0);

    let set_default = |value| ModelUpdate {
        is_default_for_titles: Some(value),
        ..Default::default()
    };

    store
        .update_model(&east_id, &o1_id, set_default(true))
        .expect("flag o1");
    store
        .update_model(&west_id, &mini_id, set_default(true))
        .expect("flag mini");

    assert_eq!(store.configuration().title_default_count(), 1);
    assert_eq!(store.default_title_model().map(|(_, m)| m.id.clone()), Some(mini_id.clone()));

    store
        .update_model(&west_id, &mini_id, set_default(false))
        .expect("unflag mini");
    assert_eq!(store.configuration().title_default_count(), 0);
}

#[test]
fn title_flag_stays_unique_over_arbitrary_sequences() {
    let mut store = store_with_two_endpoints();
    let pairs: Vec<(String, String)> = store
        .endpoints()
        .iter()
        .flat_map(|e| e.models.iter().map(move |m| (e.id.clone(), m.id.clone())))
        .collect();

    for round in 0..3 {
        for (index, (endpoint_id, model_id)) in pairs.iter().enumerate() {
            let flag = (index + round) % 2 == 0;
            store
                .update_model(
                    endpoint_id,
                    model_id,
                    ModelUpdate {
                        is_default_for_titles: Some(flag),
                        ..Default::default()
                    },
                )
                .expect("update flag");
            assert!(store.configuration().title_default_count() <= 1);
        }
    }
}

#[test]
fn default_title_model_falls_back_to_first_endpoint_first_model() {
    let mut store = store_with_two_endpoints();
    let (endpoint, model) = store.default_title_model().expect("fallback");
    assert_eq!(endpoint.name, "East");
    assert_eq!(model.name, "GPT-4o");

    let west_id = store.endpoints()[1].id.clone();
    let mini_id = model_id(&store, 1, 0);
    store
        .update_model(
            &west_id,
            &mini_id,
            ModelUpdate {
                is_default_for_titles: Some(true),
                ..Default::default()
            },
        )
        .expect("flag mini");
    let (endpoint, model) = store.default_title_model().expect("flagged");
    assert_eq!(endpoint.name, "West");
    assert_eq!(model.name, "Mini");
}

#[test]
fn default_title_model_is_none_when_first_endpoint_has_no_models() {
    let mut store = ConfigStore::load(MemorySettingsStore::new());
    store
        .add_endpoint("Bare", "https://bare.example.com", "k")
        .expect("add endpoint");
    assert!(store.default_title_model().is_none());
}

#[test]
fn rename_and_delete_model() {
    let mut store = store_with_two_endpoints();
    let east_id = store.endpoints()[0].id.clone();
    let gpt_id = model_id(&store, 0, 0);

    store
        .rename_model(&east_id, &gpt_id, "Flagship")
        .expect("rename model");
    assert_eq!(store.endpoints()[0].models[0].name, "Flagship");

    store.delete_model(&east_id, &gpt_id).expect("delete model");
    let remaining: Vec<&str> = store.endpoints()[0]
        .models
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(remaining, vec!["o1"]);
}

#[test]
fn file_store_round_trips_through_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let settings = FileSettingsStore::new(temp_dir.path().join("nested"));

    {
        let mut store = ConfigStore::load(settings.clone());
        let endpoint = store
            .add_endpoint("Disk", "https://disk.example.com", "disk-key")
            .expect("add endpoint");
        store
            .add_model(
                &endpoint.id,
                NewModel::new("o1", "o1-preview")
                    .streaming(false)
                    .default_for_titles(true)
                    .api_version("2024-12-01-preview"),
            )
            .expect("add model");
    }

    assert!(settings.path_for(SETTINGS_KEY).exists());
    let reloaded = ConfigStore::load(settings);
    let endpoint = &reloaded.endpoints()[0];
    assert_eq!(endpoint.api_key, "disk-key");
    let model = &endpoint.models[0];
    assert!(!model.supports_streaming);
    assert!(model.is_default_for_titles);
    assert_eq!(model.api_version, "2024-12-01-preview");
}

#[test]
fn file_store_reports_missing_key_as_none() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let settings = FileSettingsStore::new(temp_dir.path());
    assert!(settings.read(SETTINGS_KEY).expect("read").is_none());
}

#[test]
fn missing_api_version_in_stored_blob_uses_default() {
    let blob = r#"
[[endpoints]]
id = "e1"
name = "Legacy"
base_url = "https://legacy.example.com"
api_key = "k"

[[endpoints.models]]
id = "m1"
name = "Old"
deployment_name = "old"
supports_streaming = true
"#;
    let store = ConfigStore::load(MemorySettingsStore::with_entry(SETTINGS_KEY, blob));
    let model = &store.endpoints()[0].models[0];
    assert_eq!(model.api_version, DEFAULT_API_VERSION);
    assert!(!model.is_default_for_titles);
}

#[test]
fn generated_ids_look_like_v4_uuids() {
    let id = generate_id();
    assert_eq!(id.len(), 36);
    let parts: Vec<&str> = id.split('-').collect();
    assert_eq!(
        parts.iter().map(|p| p.len()).collect::<Vec<_>>(),
        vec![8, 4, 4, 4, 12]
    );
    assert!(parts[2].starts_with('4'));
    let parsed = uuid::Uuid::parse_str(&id).expect("parses as a uuid");
    assert_eq!(parsed.get_version_num(), 4);
    assert_ne!(generate_id(), id);
}
