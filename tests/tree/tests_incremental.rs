//! The tree follows registry changes delivered through the host.

use std::time::Instant;

use profile_tree::tree::MaterialsChanged;
use profile_tree::{ContainerRegistry, ContainerTree, DefinitionMetadata, InstanceMetadata, ProfileHost};
use rstest::rstest;

use crate::helpers::*;

fn pva_for_aa() -> InstanceMetadata {
    InstanceMetadata::material("generic_pva_ultimaker3_aa04", "PVA")
        .with_base_file("generic_pva")
        .with_definition(UM3)
        .with_variant(AA04)
        .with_diameter("3")
}

#[test]
fn test_more_specific_material_replaces_generic_container() {
    let mut host = um3_host();
    let changes = record(&mut host.tree_mut().materials_changed);
    assert_eq!(
        host.tree().machine(UM3).unwrap().material_node(AA04, "generic_pva").unwrap().container_id(),
        Some("generic_pva")
    );

    host.registry_mut().add_instance(pva_for_aa()).unwrap();
    host.process_events(Instant::now());

    let machine = host.tree().machine(UM3).unwrap();
    assert_eq!(
        machine.material_node(AA04, "generic_pva").unwrap().container_id(),
        Some("generic_pva_ultimaker3_aa04")
    );
    assert_eq!(
        machine.material_node(BB04, "generic_pva").unwrap().container_id(),
        Some("generic_pva_ultimaker3_bb04"),
        "other nozzles keep their container"
    );
    assert_eq!(
        *changes.borrow(),
        vec![MaterialsChanged {
            definition_id: UM3.to_string(),
            variant_name: AA04.to_string(),
            base_file: "generic_pva".to_string(),
        }]
    );
}

#[test]
fn test_removed_material_falls_back_to_next_best_container() {
    let mut host = um3_host();
    host.registry_mut().add_instance(pva_for_aa()).unwrap();
    host.process_events(Instant::now());
    let changes = record(&mut host.tree_mut().materials_changed);

    host.registry_mut().remove_instance("generic_pva_ultimaker3_aa04").unwrap();
    host.process_events(Instant::now());

    let node = host.tree().machine(UM3).unwrap().material_node(AA04, "generic_pva").unwrap();
    assert_eq!(node.container_id(), Some("generic_pva"));
    assert_eq!(changes.borrow().len(), 1);
}

#[test]
fn test_less_specific_material_does_not_replace() {
    let mut host = um3_host();
    let changes = record(&mut host.tree_mut().materials_changed);

    host.registry_mut()
        .add_instance(
            InstanceMetadata::material("generic_pla_ultimaker3", "PLA")
                .with_base_file("generic_pla")
                .with_definition(UM3),
        )
        .unwrap();
    host.process_events(Instant::now());

    let node = host.tree().machine(UM3).unwrap().material_node(AA04, "generic_pla").unwrap();
    assert_eq!(node.container_id(), Some("generic_pla_ultimaker3_aa04"));
    let slots: Vec<String> = changes.borrow().iter().map(|c| c.variant_name.clone()).collect();
    assert_eq!(slots, vec![BB04.to_string()], "only the nozzle without a specific container changed");
}

#[test]
fn test_new_nozzle_gets_a_variant_node_with_materials() {
    let mut host = um3_host();
    host.registry_mut()
        .add_instance(InstanceMetadata::variant("ultimaker3_aa08", "AA 0.8").with_definition(UM3))
        .unwrap();
    host.process_events(Instant::now());

    let machine = host.tree().machine(UM3).unwrap();
    let variant = machine.variant("AA 0.8").unwrap();
    assert_eq!(variant.container_id(), Some("ultimaker3_aa08"));
    assert!(variant.material("generic_pla").is_some());
    assert_eq!(machine.variants().len(), 3);
}

#[test]
fn test_new_machine_definition_builds_node_and_extruders_are_ignored() {
    let mut host = um3_host();
    host.registry_mut()
        .add_definition(DefinitionMetadata::machine("ultimaker_s5").with_materials())
        .unwrap();
    host.registry_mut()
        .add_definition(DefinitionMetadata::extruder("ultimaker_s5_extruder_left"))
        .unwrap();
    host.process_events(Instant::now());

    assert!(host.tree().machine("ultimaker_s5").is_some());
    assert!(host.tree().machine("ultimaker_s5_extruder_left").is_none());
}

#[test]
fn test_new_global_quality_type_is_unavailable_without_material_support() {
    let mut host = um3_host();
    host.registry_mut()
        .add_instance(
            InstanceMetadata::quality("um3_global_coarse", "coarse")
                .with_name("Coarse")
                .with_definition(UM3)
                .as_global_quality(),
        )
        .unwrap();
    host.process_events(Instant::now());

    let groups = host.quality_groups();
    assert!(groups.contains_key("coarse"));
    assert!(!groups["coarse"].is_available);
}

#[test]
fn test_added_material_quality_extends_availability() {
    let mut host = um3_host();
    assert!(!host.quality_groups()["draft"].is_available);

    host.registry_mut()
        .add_instance(
            InstanceMetadata::quality("um3_bb04_pva_draft", "draft")
                .with_definition(UM3)
                .with_variant(BB04)
                .with_material("generic_pva"),
        )
        .unwrap();
    host.process_events(Instant::now());

    let groups = host.quality_groups();
    assert!(groups["draft"].is_available);
    assert_eq!(groups["draft"].extruder_container_id(1), Some("um3_bb04_pva_draft"));
}

/// Global quality types of `definition_id`, as the host's tree sees them and
/// as a tree built from scratch on the same registry sees them.
fn incremental_and_rebuilt(host: &ProfileHost, definition_id: &str) -> (Vec<String>, Vec<String>) {
    let types = |tree: &ContainerTree| -> Vec<String> {
        tree.machine(definition_id)
            .map(|machine| machine.quality_groups(&[]).into_keys().collect())
            .unwrap_or_default()
    };
    let mut rebuilt = ContainerTree::new();
    rebuilt.get_machine(host.registry(), definition_id).unwrap();
    (types(host.tree()), types(&rebuilt))
}

#[rstest]
#[case::one_type(&["fine"])]
#[case::two_types(&["fine", "extra_fine"])]
fn test_own_global_qualities_replace_generic_fallback(#[case] own_types: &[&str]) {
    let mut host = um3_host();
    host.registry_mut()
        .add_definition(DefinitionMetadata::machine("m2").with_machine_quality())
        .unwrap();
    host.process_events(Instant::now());
    assert!(host.tree().machine("m2").unwrap().uses_generic_global_qualities());
    let (incremental, rebuilt) = incremental_and_rebuilt(&host, "m2");
    assert_eq!(incremental, vec!["draft", "normal"]);
    assert_eq!(incremental, rebuilt);

    for quality_type in own_types {
        host.registry_mut()
            .add_instance(
                InstanceMetadata::quality(format!("m2_global_{quality_type}"), *quality_type)
                    .with_definition("m2")
                    .as_global_quality(),
            )
            .unwrap();
        host.process_events(Instant::now());
        let (incremental, rebuilt) = incremental_and_rebuilt(&host, "m2");
        assert_eq!(incremental, rebuilt);
    }
    assert!(!host.tree().machine("m2").unwrap().uses_generic_global_qualities());
    let (incremental, _) = incremental_and_rebuilt(&host, "m2");
    assert_eq!(incremental, own_types);

    for quality_type in own_types {
        host.registry_mut()
            .remove_instance(&format!("m2_global_{quality_type}"))
            .unwrap();
        host.process_events(Instant::now());
        let (incremental, rebuilt) = incremental_and_rebuilt(&host, "m2");
        assert_eq!(incremental, rebuilt);
    }
    assert!(host.tree().machine("m2").unwrap().uses_generic_global_qualities());
    let (incremental, _) = incremental_and_rebuilt(&host, "m2");
    assert_eq!(incremental, vec!["draft", "normal"]);
}
