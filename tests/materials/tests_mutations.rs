//! Duplicating, creating, renaming and removing materials.

use std::time::Instant;

use profile_tree::materials::FavoritesUpdated;
use profile_tree::{
    ContainerRegistry, MaterialManager, MaterialOverrides, ProfileConfig, ProfileError,
};

use crate::helpers::*;

// =============================================================================
// DUPLICATE
// =============================================================================

#[test]
fn test_duplicate_copies_the_whole_family() {
    let mut host = um3_host();
    let new_id = host
        .duplicate_material("generic_pla", None, &MaterialOverrides::default())
        .unwrap();

    assert_eq!(new_id, "generic_pla #2");
    let group = host.materials().material_group(&new_id).unwrap();
    assert!(!group.is_read_only);
    let ids: Vec<&str> = group.all_materials().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["generic_pla #2", "generic_pla #2_ultimaker3_AA_0.4"]);
    for copy in group.all_materials() {
        assert_eq!(copy.base_file.as_deref(), Some("generic_pla #2"));
        assert_eq!(copy.guid.as_deref(), Some(PLA_GUID));
        assert_eq!(copy.brand.as_deref(), Some("Generic"));
        assert_eq!(copy.color_name.as_deref(), Some("Generic"));
    }
    assert_eq!(host.materials().material_groups_by_guid(PLA_GUID).len(), 2);
}

#[test]
fn test_duplicate_applies_overrides_to_every_copy() {
    let mut host = um3_host();
    let overrides = MaterialOverrides {
        name: Some("Stiff PLA".to_string()),
        brand: Some("Workshop".to_string()),
        ..Default::default()
    };
    let new_id = host
        .duplicate_material("generic_pla", Some("workshop_pla"), &overrides)
        .unwrap();

    assert_eq!(new_id, "workshop_pla");
    let group = host.materials().material_group("workshop_pla").unwrap();
    assert!(group.all_materials().all(|m| m.name == "Stiff PLA"));
    assert!(group.all_materials().all(|m| m.brand.as_deref() == Some("Workshop")));
    assert!(group.all_materials().all(|m| m.guid.as_deref() == Some(PLA_GUID)));
}

#[test]
fn test_duplicate_carries_favorite_flag() {
    let mut host = um3_host();
    host.materials_mut().add_favorite("generic_pla");
    let new_id = host
        .duplicate_material("generic_pla", None, &MaterialOverrides::default())
        .unwrap();
    assert!(host.materials().is_favorite(&new_id));
}

#[test]
fn test_duplicate_unknown_material_fails() {
    let mut host = um3_host();
    let result = host.duplicate_material("no_such_material", None, &MaterialOverrides::default());
    assert!(matches!(result, Err(ProfileError::ContainerNotFound(id)) if id == "no_such_material"));
}

#[test]
fn test_duplicate_onto_existing_id_fails() {
    let mut host = um3_host();
    let result = host.duplicate_material("generic_pla", Some("generic_pva"), &MaterialOverrides::default());
    assert!(matches!(result, Err(ProfileError::DuplicateContainer(_))));
    assert!(host.materials().material_group("generic_pva").is_some());
}

#[test]
fn test_duplicate_reaches_the_tree_after_processing() {
    let mut host = um3_host();
    let new_id = host
        .duplicate_material("generic_pla", None, &MaterialOverrides::default())
        .unwrap();
    host.process_events(Instant::now());

    let machine = host.tree().machine(UM3).unwrap();
    assert_eq!(
        machine.material_node(AA04, &new_id).unwrap().container_id(),
        Some("generic_pla #2_ultimaker3_AA_0.4")
    );
    assert_eq!(machine.material_node(BB04, &new_id).unwrap().container_id(), Some(new_id.as_str()));
}

// =============================================================================
// CREATE
// =============================================================================

#[test]
fn test_create_material_clones_preferred_material_with_new_guid() {
    let mut host = um3_host();
    let id = host.create_material().unwrap();

    assert_eq!(id, "custom_material");
    let group = host.materials().material_group(&id).unwrap();
    let root = &group.root_material;
    assert_eq!(root.name, "Custom Material");
    assert_eq!(root.brand.as_deref(), Some("Custom"));
    assert_eq!(root.material_type.as_deref(), Some("PLA"));
    let guid = root.guid.as_deref().unwrap();
    assert_ne!(guid, PLA_GUID);
    assert!(uuid::Uuid::parse_str(guid).is_ok());

    let second = host.create_material().unwrap();
    assert_eq!(second, "custom_material #2");
}

#[test]
fn test_create_material_needs_an_active_machine() {
    let mut host = profile_tree::ProfileHost::new(um3_registry(), ProfileConfig::default());
    assert!(matches!(host.create_material(), Err(ProfileError::NoActiveMachine)));
}

// =============================================================================
// REMOVE AND RENAME
// =============================================================================

#[test]
fn test_read_only_material_cannot_be_removed() {
    let mut host = um3_host();
    let result = host.remove_material("ultimaker_pla_red");
    assert!(matches!(result, Err(ProfileError::ReadOnly(id)) if id == "ultimaker_pla_red"));
    assert!(host.registry().instance("ultimaker_pla_red").is_some());
}

#[test]
fn test_material_in_use_is_not_removed() {
    let mut host = um3_host();
    assert!(!host.materials().can_material_be_removed(host.registry(), host.stacks(), "generic_pva"));
    assert!(host.remove_material("generic_pva").unwrap().is_empty());
}

#[test]
fn test_remove_user_material_family() {
    let mut host = um3_host();
    let new_id = host
        .duplicate_material("generic_pla", None, &MaterialOverrides::default())
        .unwrap();

    let removed = host.remove_material(&new_id).unwrap();
    assert_eq!(removed, vec![new_id.clone(), format!("{new_id}_ultimaker3_AA_0.4")]);
    host.process_events(Instant::now());

    let node = host.tree().machine(UM3).unwrap().material_node(AA04, &new_id).unwrap();
    assert!(!node.is_live(), "the node stays, without a container");
}

#[test]
fn test_set_material_name() {
    let mut registry = um3_registry();
    let mut manager = MaterialManager::new(&registry, &ProfileConfig::default());
    let new_id = manager
        .duplicate_material(&mut registry, "generic_pva", Some("my_pva"), &MaterialOverrides::default())
        .unwrap();

    manager.set_material_name(&mut registry, &new_id, "Dissolvable").unwrap();
    assert_eq!(registry.instance("my_pva").unwrap().name, "Dissolvable");

    let read_only = manager.set_material_name(&mut registry, "generic_pva", "Nope");
    assert!(matches!(read_only, Err(ProfileError::ReadOnly(_))));
}

// =============================================================================
// FAVORITES
// =============================================================================

#[test]
fn test_favorites_notify_on_change_only() {
    let mut host = um3_host();
    let updates = record(&mut host.materials_mut().favorites_updated);

    host.materials_mut().add_favorite("generic_pla");
    host.materials_mut().add_favorite("generic_pla");
    host.materials_mut().add_favorite("generic_pva");
    assert!(host.materials_mut().remove_favorite("generic_pla"));
    assert!(!host.materials_mut().remove_favorite("generic_pla"));

    let seen: Vec<Vec<String>> = updates
        .borrow()
        .iter()
        .map(|FavoritesUpdated { favorites }| favorites.clone())
        .collect();
    assert_eq!(
        seen,
        vec![
            vec!["generic_pla".to_string()],
            vec!["generic_pla".to_string(), "generic_pva".to_string()],
            vec!["generic_pva".to_string()],
        ]
    );
}
