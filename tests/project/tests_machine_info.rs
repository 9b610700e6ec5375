//! Completing machine descriptions read from projects.

use profile_tree::base::constants::EMPTY_QUALITY_CHANGES;
use profile_tree::project::{ExtruderInfo, MachineInfo};
use profile_tree::{InMemoryRegistry, ProfileConfig, ProfileError, ProfileHost};

use crate::helpers::*;

fn two_extruders() -> MachineInfo {
    MachineInfo::new(UM3)
        .with_extruder(ExtruderInfo::new(0))
        .with_extruder(ExtruderInfo::new(1))
}

#[test]
fn test_empty_description_gets_machine_defaults() {
    let mut host = um3_host();
    let resolved = host.resolve_machine_info(&two_extruders()).unwrap();

    assert_eq!(resolved.quality_type.as_deref(), Some("normal"));
    assert_eq!(resolved.intent_category.as_deref(), Some("default"));
    assert_eq!(resolved.quality_changes_id.as_deref(), Some(EMPTY_QUALITY_CHANGES));
    for extruder in resolved.extruders.values() {
        assert_eq!(extruder.variant_name.as_deref(), Some(AA04));
        assert_eq!(extruder.root_material_id.as_deref(), Some("generic_pla"));
        assert_eq!(extruder.intent_category.as_deref(), Some("default"));
    }
}

#[test]
fn test_known_choices_are_kept() {
    let mut host = um3_host();
    let mut info = two_extruders();
    info.quality_type = Some("fine".to_string());
    let right = info.extruders.get_mut(&1).unwrap();
    right.variant_name = Some(BB04.to_string());
    right.root_material_id = Some("generic_pva".to_string());
    right.intent_category = Some("engineering".to_string());

    let resolved = host.resolve_machine_info(&info).unwrap();
    let right = &resolved.extruders[&1];
    assert_eq!(right.variant_name.as_deref(), Some(BB04));
    assert_eq!(right.root_material_id.as_deref(), Some("generic_pva"));
    assert_eq!(right.intent_category.as_deref(), Some("engineering"));
    assert_eq!(resolved.quality_type.as_deref(), Some("fine"));
}

#[test]
fn test_unknown_nozzle_and_material_are_replaced() {
    let mut host = um3_host();
    let mut info = two_extruders();
    let left = info.extruders.get_mut(&0).unwrap();
    left.variant_name = Some("CC 0.6".to_string());
    left.root_material_id = Some("unobtainium".to_string());

    let resolved = host.resolve_machine_info(&info).unwrap();
    assert_eq!(resolved.extruders[&0].variant_name.as_deref(), Some(AA04));
    assert_eq!(resolved.extruders[&0].root_material_id.as_deref(), Some("generic_pla"));
}

#[test]
fn test_unavailable_quality_type_falls_back_to_preferred() {
    let mut host = um3_host();
    let mut info = two_extruders();
    info.quality_type = Some("ludicrous".to_string());

    let resolved = host.resolve_machine_info(&info).unwrap();
    assert_eq!(resolved.quality_type.as_deref(), Some("normal"));
}

#[test]
fn test_custom_profile_reference_is_kept() {
    let mut host = um3_host();
    host.create_quality_changes("My Profile").unwrap();
    let mut info = two_extruders();
    info.quality_changes_id = Some("ultimaker3_my_profile".to_string());
    info.custom_quality_name = Some("My Profile".to_string());
    info.extruders.get_mut(&0).unwrap().quality_changes_id =
        Some("my_um3_left_my_profile".to_string());

    let resolved = host.resolve_machine_info(&info).unwrap();
    assert_eq!(resolved.quality_changes_id.as_deref(), Some("ultimaker3_my_profile"));
    assert_eq!(resolved.custom_quality_name.as_deref(), Some("My Profile"));
    assert_eq!(
        resolved.extruders[&0].quality_changes_id.as_deref(),
        Some("my_um3_left_my_profile")
    );
    assert_eq!(
        resolved.extruders[&1].quality_changes_id.as_deref(),
        Some(EMPTY_QUALITY_CHANGES)
    );
}

#[test]
fn test_dangling_custom_profile_reference_is_dropped() {
    let mut host = um3_host();
    let mut info = two_extruders();
    info.quality_changes_id = Some("ultimaker3_lost_profile".to_string());
    info.extruders.get_mut(&1).unwrap().quality_changes_id = Some("generic_pla".to_string());

    let resolved = host.resolve_machine_info(&info).unwrap();
    assert_eq!(resolved.quality_changes_id.as_deref(), Some(EMPTY_QUALITY_CHANGES));
    assert_eq!(
        resolved.extruders[&1].quality_changes_id.as_deref(),
        Some(EMPTY_QUALITY_CHANGES),
        "a container of another kind is not a custom profile"
    );
}

#[test]
fn test_machine_without_variants() {
    let mut host = um3_host();
    let info = MachineInfo::new(CUSTOM_FFF).with_extruder(ExtruderInfo::new(0));

    let resolved = host.resolve_machine_info(&info).unwrap();
    let extruder = &resolved.extruders[&0];
    assert_eq!(extruder.variant_name, None);
    assert_eq!(extruder.root_material_id.as_deref(), Some("generic_pla"));
    assert_eq!(resolved.quality_type.as_deref(), Some("normal"));
}

#[test]
fn test_unknown_machine_definition() {
    let mut host = um3_host();
    let result = host.resolve_machine_info(&MachineInfo::new("not_a_printer"));
    assert!(matches!(result, Err(ProfileError::UnknownDefinition(_))));
}

#[test]
fn test_machine_without_any_quality() {
    let mut registry = InMemoryRegistry::new();
    profile_tree::ContainerRegistry::add_definition(
        &mut registry,
        profile_tree::DefinitionMetadata::machine("bare"),
    )
    .unwrap();
    let mut host = ProfileHost::new(registry, ProfileConfig::default());

    let result = host.resolve_machine_info(&MachineInfo::new("bare").with_extruder(ExtruderInfo::new(0)));
    assert!(matches!(result, Err(ProfileError::NoQualityAvailable { machine }) if machine == "bare"));
}

#[test]
fn test_machine_info_reads_from_json() {
    let info: MachineInfo = serde_json::from_str(
        r#"{
            "definition_id": "ultimaker3",
            "quality_type": "fine",
            "extruders": {"1": {"position": 1, "variant_name": "BB 0.4"}, "0": {"position": 0}}
        }"#,
    )
    .unwrap();
    assert_eq!(info.extruders.len(), 2);
    assert!(info.extruders[&1].enabled);

    let mut host = um3_host();
    let resolved = host.resolve_machine_info(&info).unwrap();
    assert_eq!(resolved.extruders[&1].root_material_id.as_deref(), Some("generic_pla"));
    assert_eq!(resolved.quality_type.as_deref(), Some("fine"));
}
