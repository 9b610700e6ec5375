//! Config and profile pack files on disk.

use std::fs;

use tempfile::TempDir;

use profile_tree::registry::ProfilePack;
use profile_tree::{ContainerRegistry, InMemoryRegistry, ProfileConfig, ProfileError, ProfileHost};

use crate::helpers::*;

#[test]
fn test_config_round_trips_through_a_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("profiles.json");

    let mut config = ProfileConfig::default();
    config.favorite_materials.insert("generic_pva".to_string());
    config.material_rebuild_debounce_ms = 50;
    config.save(&path).unwrap();

    assert_eq!(ProfileConfig::load(&path).unwrap(), config);
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = ProfileConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, ProfileConfig::default());
}

#[test]
fn test_invalid_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(ProfileConfig::load(&broken), Err(ProfileError::Json(_))));

    let bad_value = dir.path().join("bad_value.json");
    fs::write(&bad_value, r#"{"default_approximate_diameter": "wide"}"#).unwrap();
    assert!(matches!(ProfileConfig::load(&bad_value), Err(ProfileError::Config(_))));
}

#[test]
fn test_host_persists_favorites() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("profiles.json");

    let mut host = um3_host();
    host.materials_mut().add_favorite("ultimaker_pla_red");
    host.save_config(&path).unwrap();

    let config = ProfileConfig::load(&path).unwrap();
    assert!(config.favorite_materials.contains("ultimaker_pla_red"));

    let reloaded = ProfileHost::new(um3_registry(), config);
    assert!(reloaded.materials().is_favorite("ultimaker_pla_red"));
}

#[test]
fn test_profile_pack_file_loads_read_only_registry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pack.json");
    let pack = ProfilePack {
        definitions: vec![um3_definition()],
        instances: um3_instances(),
    };
    fs::write(&path, serde_json::to_string(&pack).unwrap()).unwrap();

    let mut registry = InMemoryRegistry::load_pack(&path).unwrap();
    assert_eq!(registry.instance_count(), um3_instances().len());
    assert!(registry.is_read_only("generic_pla"));
    assert!(registry.take_events().is_empty());
    assert!(matches!(
        registry.remove_instance("generic_pla"),
        Err(ProfileError::ReadOnly(_))
    ));
}

#[test]
fn test_missing_pack_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let result = InMemoryRegistry::load_pack(&dir.path().join("missing.json"));
    assert!(matches!(result, Err(ProfileError::Io(_))));
}
