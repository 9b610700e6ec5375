//! A generated single-nozzle machine for property tests.
//!
//! Every extruder gets its own material. Each material ships qualities for a
//! chosen subset of [`X_QUALITY_TYPES`]. An empty subset means the extruder
//! draws from the machine's global qualities, which cover every type.

use profile_tree::{
    ActiveConfiguration, ContainerRegistry, DefinitionMetadata, ExtruderConfiguration,
    InMemoryRegistry, InstanceMetadata,
};

pub const MACHINE_X: &str = "machine_x";
pub const X_NOZZLE: &str = "nozzle";
pub const X_QUALITY_TYPES: [&str; 4] = ["draft", "normal", "fine", "extra_fine"];

pub fn x_material(position: usize) -> String {
    format!("x_material_{position}")
}

/// Decode a bit mask over [`X_QUALITY_TYPES`].
pub fn quality_types_from_mask(mask: u8) -> Vec<&'static str> {
    X_QUALITY_TYPES
        .iter()
        .enumerate()
        .filter(|(bit, _)| mask & (1 << bit) != 0)
        .map(|(_, quality_type)| *quality_type)
        .collect()
}

pub fn machine_x_registry(per_extruder: &[Vec<&str>]) -> InMemoryRegistry {
    let mut registry = InMemoryRegistry::new();
    registry
        .add_definition(
            DefinitionMetadata::machine(MACHINE_X)
                .with_variants()
                .with_materials()
                .with_machine_quality(),
        )
        .unwrap();
    registry
        .add_instance(InstanceMetadata::variant("machine_x_nozzle", X_NOZZLE).with_definition(MACHINE_X))
        .unwrap();
    for quality_type in X_QUALITY_TYPES {
        registry
            .add_instance(
                InstanceMetadata::quality(format!("x_global_{quality_type}"), quality_type)
                    .with_definition(MACHINE_X)
                    .as_global_quality(),
            )
            .unwrap();
    }
    for (position, quality_types) in per_extruder.iter().enumerate() {
        let material = x_material(position);
        registry
            .add_instance(InstanceMetadata::material(&material, "PLA").with_diameter("3"))
            .unwrap();
        for quality_type in quality_types {
            registry
                .add_instance(
                    InstanceMetadata::quality(format!("{material}_{quality_type}"), *quality_type)
                        .with_definition(MACHINE_X)
                        .with_variant(X_NOZZLE)
                        .with_material(&material),
                )
                .unwrap();
        }
    }
    registry.take_events();
    registry
}

/// Extruder `i` carries `x_material_i` and is enabled per `enabled[i]`.
pub fn machine_x_configuration(enabled: &[bool]) -> ActiveConfiguration {
    let extruders = enabled
        .iter()
        .enumerate()
        .map(|(position, enabled)| {
            ExtruderConfiguration::new(position, Some(X_NOZZLE), Some(&x_material(position)), *enabled)
        })
        .collect();
    ActiveConfiguration::new(MACHINE_X, extruders)
}
