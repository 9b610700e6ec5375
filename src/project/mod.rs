//! Filling the gaps in machine descriptions read from project files.
//!
//! A project may name a machine definition but leave out the nozzle, the
//! material, the quality or the custom profile of some extruders.
//! [`resolve_machine_info`] turns such a partial description into a complete
//! one using the same defaults a fresh machine would get.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::base::constants::{
    DEFAULT_INTENT_CATEGORY, EMPTY_MATERIAL, EMPTY_QUALITY_CHANGES, NO_VARIANT,
};
use crate::base::{ProfileError, ProfileResult};
use crate::metadata::ContainerKind;
use crate::registry::ContainerRegistry;
use crate::stacks::{ActiveConfiguration, ExtruderConfiguration};
use crate::tree::{ContainerTree, MachineNode};

/// One extruder of a project machine. `None` fields are unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtruderInfo {
    pub position: usize,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub variant_name: Option<String>,
    #[serde(default)]
    pub root_material_id: Option<String>,
    #[serde(default)]
    pub quality_changes_id: Option<String>,
    #[serde(default)]
    pub intent_category: Option<String>,
}

fn enabled_by_default() -> bool {
    true
}

impl ExtruderInfo {
    pub fn new(position: usize) -> Self {
        Self {
            position,
            enabled: true,
            ..Default::default()
        }
    }

    fn configuration(&self) -> ExtruderConfiguration {
        ExtruderConfiguration::new(
            self.position,
            self.variant_name.as_deref(),
            self.root_material_id.as_deref(),
            self.enabled,
        )
    }
}

/// A machine as described by a project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineInfo {
    pub definition_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quality_type: Option<String>,
    #[serde(default)]
    pub intent_category: Option<String>,
    /// Name of the custom profile the project was saved with.
    #[serde(default)]
    pub custom_quality_name: Option<String>,
    #[serde(default)]
    pub quality_changes_id: Option<String>,
    #[serde(default)]
    pub extruders: IndexMap<usize, ExtruderInfo>,
}

impl MachineInfo {
    pub fn new(definition_id: impl Into<String>) -> Self {
        Self {
            definition_id: definition_id.into(),
            ..Default::default()
        }
    }

    pub fn with_extruder(mut self, extruder: ExtruderInfo) -> Self {
        self.extruders.insert(extruder.position, extruder);
        self.extruders.sort_keys();
        self
    }

    pub fn configuration(&self) -> ActiveConfiguration {
        ActiveConfiguration::new(
            &self.definition_id,
            self.extruders.values().map(ExtruderInfo::configuration).collect(),
        )
    }
}

/// Complete `info` with defaults from the machine's tree node.
///
/// - variant: kept when the machine has it, else the preferred or first one
/// - material: kept when the variant offers it, else the variant's preferred
///   material for `approximate_diameter`
/// - quality type: kept when available, else the machine's default, else
///   the first available one
/// - quality changes: kept when the registry still has that custom profile,
///   else the empty sentinel
/// - intent: `"default"`
///
/// Fails with [`ProfileError::UnknownDefinition`] for an unknown machine and
/// [`ProfileError::NoQualityAvailable`] when no quality type fits at all.
pub fn resolve_machine_info(
    tree: &mut ContainerTree,
    registry: &dyn ContainerRegistry,
    info: &MachineInfo,
    approximate_diameter: f64,
) -> ProfileResult<MachineInfo> {
    let machine = tree.get_machine(registry, &info.definition_id)?;
    let mut resolved = info.clone();

    for extruder in resolved.extruders.values_mut() {
        resolve_extruder(machine, extruder, approximate_diameter);
        resolve_quality_changes(registry, &mut extruder.quality_changes_id);
    }

    resolved.quality_type = Some(resolve_quality_type(machine, &resolved)?);
    resolve_quality_changes(registry, &mut resolved.quality_changes_id);
    resolved
        .intent_category
        .get_or_insert_with(|| DEFAULT_INTENT_CATEGORY.to_string());

    tracing::debug!(
        machine = %resolved.definition_id,
        quality_type = resolved.quality_type.as_deref().unwrap_or_default(),
        extruders = resolved.extruders.len(),
        "Resolved project machine"
    );
    Ok(resolved)
}

fn resolve_extruder(machine: &MachineNode, extruder: &mut ExtruderInfo, approximate_diameter: f64) {
    let known_variant = extruder
        .variant_name
        .as_deref()
        .and_then(|name| machine.variant(name));
    let variant = match known_variant {
        Some(variant) => Some(variant),
        None => {
            if let Some(name) = &extruder.variant_name {
                tracing::warn!(
                    machine = %machine.definition_id(),
                    variant = %name,
                    "Project variant not available, using the preferred one"
                );
            }
            machine.preferred_variant()
        }
    };
    let Some(variant) = variant else {
        return;
    };
    extruder.variant_name = (variant.name() != NO_VARIANT).then(|| variant.name().to_string());

    let keep_material = extruder
        .root_material_id
        .as_deref()
        .is_some_and(|id| variant.material(id).is_some());
    if !keep_material {
        extruder.root_material_id = variant
            .preferred_material(approximate_diameter)
            .map(|node| node.base_file())
            .filter(|base_file| *base_file != EMPTY_MATERIAL)
            .map(str::to_string);
    }

    extruder
        .intent_category
        .get_or_insert_with(|| DEFAULT_INTENT_CATEGORY.to_string());
}

/// Keep a custom profile id only while the registry has that profile.
fn resolve_quality_changes(registry: &dyn ContainerRegistry, quality_changes_id: &mut Option<String>) {
    let known = quality_changes_id.as_deref().is_some_and(|id| {
        id == EMPTY_QUALITY_CHANGES
            || registry
                .instance(id)
                .is_some_and(|m| m.kind == ContainerKind::QualityChanges)
    });
    if known {
        return;
    }
    if let Some(id) = quality_changes_id.as_deref() {
        tracing::warn!(
            quality_changes = %id,
            "Project custom profile not available, using none"
        );
    }
    *quality_changes_id = Some(EMPTY_QUALITY_CHANGES.to_string());
}

fn resolve_quality_type(machine: &MachineNode, info: &MachineInfo) -> ProfileResult<String> {
    let configuration = info.configuration();
    let groups = machine.quality_groups(&configuration.extruders);
    let available = |quality_type: &str| groups.get(quality_type).is_some_and(|g| g.is_available);

    if let Some(quality_type) = info.quality_type.as_deref().filter(|qt| available(*qt)) {
        return Ok(quality_type.to_string());
    }
    if let Some(preferred) = machine.preferred_quality_type().filter(|qt| available(*qt)) {
        return Ok(preferred.to_string());
    }
    groups
        .values()
        .find(|group| group.is_available)
        .map(|group| group.quality_type.clone())
        .ok_or_else(|| ProfileError::NoQualityAvailable {
            machine: info.definition_id.clone(),
        })
}
