//! A two-nozzle printer with shipped materials, qualities and intents.
//!
//! ```text
//! ultimaker3
//!   AA 0.4 + generic_pla        draft normal fine   intents: engineering/normal visual/fine quick/draft
//!   AA 0.4 + ultimaker_pla_red  normal fine
//!   BB 0.4 + generic_pva        normal fine         intents: engineering/normal
//!   global                      draft normal fine
//! fdmprinter (generic)
//!   global                      draft normal
//! ```

use profile_tree::{
    ContainerRegistry, DefinitionMetadata, ExtruderStack, GlobalStack, InMemoryRegistry,
    InstanceMetadata, ProfileConfig, ProfileHost,
};

pub const UM3: &str = "ultimaker3";
pub const CUSTOM_FFF: &str = "custom_fff";
pub const AA04: &str = "AA 0.4";
pub const BB04: &str = "BB 0.4";
pub const PLA_GUID: &str = "506c9f0d-e3aa-4bd4-b2d2-23e2425b1aa9";
pub const PLA_RED_GUID: &str = "9cfe5bf1-bdc5-4beb-871a-52c70777842d";

pub fn um3_definition() -> DefinitionMetadata {
    DefinitionMetadata::machine(UM3)
        .with_variants()
        .with_materials()
        .with_machine_materials()
        .with_machine_quality()
        .with_preferred_variant(AA04)
        .with_preferred_material("generic_pla")
        .with_preferred_quality_type("normal")
}

fn root_material(
    id: &str,
    name: &str,
    material_type: &str,
    brand: &str,
    color: &str,
    guid: &str,
    diameter: &str,
) -> InstanceMetadata {
    InstanceMetadata::material(id, material_type)
        .with_name(name)
        .with_brand(brand)
        .with_color(color)
        .with_guid(guid)
        .with_diameter(diameter)
}

fn nozzle_material(root: &InstanceMetadata, variant: &str) -> InstanceMetadata {
    let mut derived = root.clone();
    derived.id = format!("{}_{}_{}", root.id, UM3, variant.replace([' ', '.'], "").to_lowercase());
    derived
        .with_definition(UM3)
        .with_variant(variant)
}

fn global_quality(id: &str, name: &str, quality_type: &str, definition: &str) -> InstanceMetadata {
    InstanceMetadata::quality(id, quality_type)
        .with_name(name)
        .with_definition(definition)
        .as_global_quality()
}

fn material_quality(id: &str, quality_type: &str, variant: &str, material: &str) -> InstanceMetadata {
    InstanceMetadata::quality(id, quality_type)
        .with_definition(UM3)
        .with_variant(variant)
        .with_material(material)
}

fn intent(id: &str, category: &str, quality_type: &str, variant: &str, material: &str) -> InstanceMetadata {
    InstanceMetadata::intent(id, category, quality_type)
        .with_definition(UM3)
        .with_variant(variant)
        .with_material(material)
}

/// Every shipped container, in registration order.
pub fn um3_instances() -> Vec<InstanceMetadata> {
    let generic_pla = root_material("generic_pla", "Generic PLA", "PLA", "Generic", "Generic", PLA_GUID, "3");
    let generic_pla_175 = root_material(
        "generic_pla_175",
        "Generic PLA",
        "PLA",
        "Generic",
        "Generic",
        "0ff92885-617b-4144-a03c-9989872454bc",
        "2",
    );
    let generic_pva = root_material(
        "generic_pva",
        "Generic PVA",
        "PVA",
        "Generic",
        "Generic",
        "86a89ceb-4159-47f6-ab97-e9953803d70f",
        "3",
    );
    let pla_red = root_material(
        "ultimaker_pla_red",
        "PLA Red",
        "PLA",
        "Ultimaker",
        "Red",
        PLA_RED_GUID,
        "3",
    );

    vec![
        InstanceMetadata::variant("ultimaker3_aa04", AA04).with_definition(UM3),
        InstanceMetadata::variant("ultimaker3_bb04", BB04).with_definition(UM3),
        nozzle_material(&generic_pla, AA04),
        nozzle_material(&generic_pva, BB04),
        generic_pla,
        generic_pla_175,
        generic_pva,
        pla_red,
        global_quality("um3_global_draft", "Draft", "draft", UM3),
        global_quality("um3_global_normal", "Normal", "normal", UM3),
        global_quality("um3_global_fine", "Fine", "fine", UM3),
        global_quality("generic_global_draft", "Draft", "draft", "fdmprinter"),
        global_quality("generic_global_normal", "Normal", "normal", "fdmprinter"),
        material_quality("um3_aa04_pla_draft", "draft", AA04, "generic_pla"),
        material_quality("um3_aa04_pla_normal", "normal", AA04, "generic_pla"),
        material_quality("um3_aa04_pla_fine", "fine", AA04, "generic_pla"),
        material_quality("um3_aa04_pla_red_normal", "normal", AA04, "ultimaker_pla_red"),
        material_quality("um3_aa04_pla_red_fine", "fine", AA04, "ultimaker_pla_red"),
        material_quality("um3_bb04_pva_normal", "normal", BB04, "generic_pva"),
        material_quality("um3_bb04_pva_fine", "fine", BB04, "generic_pva"),
        intent("um3_aa04_pla_engineering_normal", "engineering", "normal", AA04, "generic_pla"),
        intent("um3_aa04_pla_visual_fine", "visual", "fine", AA04, "generic_pla"),
        intent("um3_aa04_pla_quick_draft", "quick", "draft", AA04, "generic_pla"),
        intent("um3_bb04_pva_engineering_normal", "engineering", "normal", BB04, "generic_pva"),
    ]
}

/// Registry with the printer definitions and every shipped container, all
/// read-only, with no pending events.
pub fn um3_registry() -> InMemoryRegistry {
    um3_registry_with_writable(&[])
}

/// Like [`um3_registry`], but the containers in `writable` can be removed or
/// changed.
pub fn um3_registry_with_writable(writable: &[&str]) -> InMemoryRegistry {
    let mut registry = InMemoryRegistry::new();
    registry.add_definition(um3_definition()).unwrap();
    registry
        .add_definition(
            DefinitionMetadata::machine(CUSTOM_FFF)
                .with_materials()
                .with_preferred_quality_type("normal"),
        )
        .unwrap();
    for metadata in um3_instances() {
        if writable.contains(&metadata.id.as_str()) {
            registry.add_instance(metadata).unwrap();
        } else {
            registry.add_read_only_instance(metadata).unwrap();
        }
    }
    registry.take_events();
    registry
}

/// Left: AA 0.4 with generic PLA. Right: BB 0.4 with generic PVA.
pub fn um3_stack() -> GlobalStack {
    GlobalStack::new("my_um3", UM3)
        .with_extruder(
            ExtruderStack::new("my_um3_left", 0)
                .with_variant("ultimaker3_aa04", AA04)
                .with_material("generic_pla_ultimaker3_aa04", "generic_pla"),
        )
        .with_extruder(
            ExtruderStack::new("my_um3_right", 1)
                .with_variant("ultimaker3_bb04", BB04)
                .with_material("generic_pva_ultimaker3_bb04", "generic_pva"),
        )
}

/// A host with the fixture registry and `my_um3` as the active machine.
pub fn um3_host() -> ProfileHost {
    let mut host = ProfileHost::new(um3_registry(), ProfileConfig::default());
    host.add_machine(um3_stack()).unwrap();
    host
}
