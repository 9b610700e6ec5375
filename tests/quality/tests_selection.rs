//! Putting qualities and custom profiles on the stacks.

use std::time::Instant;

use profile_tree::base::constants::{EMPTY_QUALITY, EMPTY_QUALITY_CHANGES};
use profile_tree::{ContainerRegistry, ProfileConfig, QualityManager};

use crate::helpers::*;

#[test]
fn test_set_quality_group_by_type_fills_every_stack() {
    let mut host = um3_host();
    assert!(host.set_quality_group_by_quality_type("fine"));

    let machine = host.stacks().active().unwrap();
    assert_eq!(machine.quality_id, "um3_global_fine");
    assert_eq!(machine.extruders[0].quality_id, "um3_aa04_pla_fine");
    assert_eq!(machine.extruders[1].quality_id, "um3_bb04_pva_fine");
    assert_eq!(machine.quality_changes_id, EMPTY_QUALITY_CHANGES);
}

#[test]
fn test_unavailable_group_leaves_missing_extruders_empty() {
    let mut host = um3_host();
    assert!(host.set_quality_group_by_quality_type("draft"));

    let machine = host.stacks().active().unwrap();
    assert_eq!(machine.quality_id, "um3_global_draft");
    assert_eq!(machine.extruders[0].quality_id, "um3_aa04_pla_draft");
    assert_eq!(machine.extruders[1].quality_id, EMPTY_QUALITY);
}

#[test]
fn test_unknown_quality_type_is_refused() {
    let mut host = um3_host();
    assert!(!host.set_quality_group_by_quality_type("ludicrous"));
    assert_eq!(host.stacks().active().unwrap().quality_id, EMPTY_QUALITY);
}

#[test]
fn test_set_quality_changes_group_activates_profile_and_its_quality() {
    let mut host = um3_host();
    host.set_quality_group_by_quality_type("fine");
    host.create_quality_changes("Fine Tuned").unwrap();
    host.process_events(Instant::now());
    host.set_quality_group_by_quality_type("normal");
    assert_eq!(host.stacks().active().unwrap().quality_changes_id, EMPTY_QUALITY_CHANGES);

    let group = host
        .quality_changes_groups()
        .into_iter()
        .find(|group| group.name == "Fine Tuned")
        .unwrap();
    assert_eq!(group.quality_type, "fine");
    assert!(host.set_quality_changes_group(&group));

    let machine = host.stacks().active().unwrap();
    assert_eq!(machine.quality_id, "um3_global_fine");
    assert_eq!(machine.quality_changes_id, "ultimaker3_fine_tuned");
    assert_eq!(machine.extruders[0].quality_id, "um3_aa04_pla_fine");
    assert_eq!(machine.extruders[0].quality_changes_id, "my_um3_left_fine_tuned");
    assert_eq!(machine.extruders[1].quality_changes_id, "my_um3_right_fine_tuned");
}

#[test]
fn test_quality_groups_for_machine_definition() {
    let registry = um3_registry();
    let manager = QualityManager::new(&ProfileConfig::default());

    let um3 = registry.definition(UM3).unwrap();
    let groups = manager.quality_groups_for_machine_definition(&registry, um3);
    assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["draft", "normal", "fine"]);
    assert_eq!(groups["normal"].global_container_id(), Some("um3_global_normal"));
    assert!(groups.values().all(|group| group.is_available));

    let custom = registry.definition(CUSTOM_FFF).unwrap();
    let groups = manager.quality_groups_for_machine_definition(&registry, custom);
    assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["draft", "normal"]);
    assert_eq!(groups["draft"].global_container_id(), Some("generic_global_draft"));
}

#[test]
fn test_quality_search_definition() {
    let registry = um3_registry();
    let manager = QualityManager::new(&ProfileConfig::default());
    assert_eq!(
        manager.machine_definition_id_for_quality_search(registry.definition(UM3).unwrap()),
        UM3
    );
    assert_eq!(
        manager.machine_definition_id_for_quality_search(registry.definition(CUSTOM_FFF).unwrap()),
        "fdmprinter"
    );
}
