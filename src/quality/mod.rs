//! Quality resolution for a machine configuration, and custom profile
//! (quality changes) management.
//!
//! Resolution itself lives on [`MachineNode`](crate::tree::MachineNode). This
//! module looks up the right node for a configuration snapshot and
//! implements the mutations: creating, duplicating, renaming and removing
//! quality-changes groups, and pointing stacks at a quality.

use indexmap::IndexMap;

use crate::base::constants::{
    EMPTY_INTENT, EMPTY_QUALITY, EMPTY_QUALITY_CHANGES, NOT_SUPPORTED_QUALITY_TYPE,
};
use crate::base::{ProfileError, ProfileResult};
use crate::config::ProfileConfig;
use crate::metadata::{ContainerKind, DefinitionMetadata, InstanceFilter, InstanceMetadata};
use crate::registry::ContainerRegistry;
use crate::stacks::{ActiveConfiguration, GlobalStack, MachineStacks};
use crate::tree::{
    ContainerTree, QualityChangesGroup, QualityGroup, QualityNode,
    machine_definition_id_for_quality_search,
};

/// What [`QualityManager::duplicate_quality_changes`] copies from.
#[derive(Debug, Clone, Copy)]
pub enum QualitySource<'a> {
    /// A plain quality: one new global quality-changes container is created.
    Quality(&'a QualityGroup),
    /// A custom profile: every container of the group is copied.
    QualityChanges(&'a QualityChangesGroup),
}

/// `<base>_<name>` lowercased with spaces turned into underscores.
pub fn quality_changes_id(base_id: &str, name: &str) -> String {
    format!("{base_id}_{name}").to_lowercase().replace(' ', "_")
}

#[derive(Debug, Clone)]
pub struct QualityManager {
    generic_definition_id: String,
    setting_version: u32,
}

impl QualityManager {
    pub fn new(config: &ProfileConfig) -> Self {
        Self {
            generic_definition_id: config.generic_definition_id.clone(),
            setting_version: config.setting_version,
        }
    }

    pub fn machine_definition_id_for_quality_search(&self, definition: &DefinitionMetadata) -> String {
        machine_definition_id_for_quality_search(definition, &self.generic_definition_id)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Every quality group of the configuration's machine, available or not.
    pub fn quality_groups(
        &self,
        tree: &ContainerTree,
        configuration: &ActiveConfiguration,
    ) -> IndexMap<String, QualityGroup> {
        tree.current_quality_groups(Some(configuration))
    }

    /// Every custom profile of the configuration's machine.
    pub fn quality_changes_groups(
        &self,
        tree: &ContainerTree,
        configuration: &ActiveConfiguration,
    ) -> Vec<QualityChangesGroup> {
        match tree.machine(&configuration.definition_id) {
            Some(machine) => machine.quality_changes_groups(&configuration.extruders),
            None => {
                tracing::warn!(
                    machine = %configuration.definition_id,
                    "Machine not in container tree"
                );
                Vec::new()
            }
        }
    }

    /// Global qualities usable by a machine definition regardless of its
    /// extruders: its own, then generic ones for types it lacks.
    pub fn quality_groups_for_machine_definition(
        &self,
        registry: &dyn ContainerRegistry,
        definition: &DefinitionMetadata,
    ) -> IndexMap<String, QualityGroup> {
        let search_id = self.machine_definition_id_for_quality_search(definition);
        let mut groups: IndexMap<String, QualityGroup> = IndexMap::new();
        for definition_id in [search_id.as_str(), self.generic_definition_id.as_str()] {
            let filter = InstanceFilter::of_kind(ContainerKind::Quality)
                .definition(definition_id)
                .global_quality(true);
            for metadata in registry.find_instances(&filter) {
                let Some(quality_type) = metadata.quality_type.as_deref() else {
                    continue;
                };
                if groups.contains_key(quality_type) {
                    continue;
                }
                let mut group = QualityGroup::new(&metadata.name, quality_type);
                group.node_for_global =
                    Some(QualityNode::new(quality_type).with_container(metadata.clone()));
                group.is_available = true;
                groups.insert(quality_type.to_string(), group);
            }
        }
        groups
    }

    /// The group of the machine's preferred quality type, if it exists and
    /// is available. `None` leaves the choice to the caller.
    pub fn default_quality_type(
        &self,
        tree: &ContainerTree,
        configuration: &ActiveConfiguration,
    ) -> Option<QualityGroup> {
        let machine = tree.machine(&configuration.definition_id)?;
        let preferred = machine.preferred_quality_type()?;
        let mut groups = machine.quality_groups(&configuration.extruders);
        groups
            .shift_remove(preferred)
            .filter(|group| group.is_available)
    }

    // ========================================================================
    // APPLYING TO STACKS
    // ========================================================================

    /// Put a quality group on the active machine. Quality changes are cleared.
    pub fn set_quality_group(&self, stacks: &mut MachineStacks, group: &QualityGroup) -> bool {
        let Some(machine) = stacks.active_mut() else {
            return false;
        };
        apply_quality_group(machine, group);
        tracing::debug!(machine = %machine.id, quality_type = %group.quality_type, "Quality group applied");
        true
    }

    /// Apply the active machine's group for `quality_type`.
    pub fn set_quality_group_by_quality_type(
        &self,
        tree: &ContainerTree,
        stacks: &mut MachineStacks,
        quality_type: &str,
    ) -> bool {
        let Some(configuration) = stacks.active().map(GlobalStack::configuration) else {
            return false;
        };
        let mut groups = tree.current_quality_groups(Some(&configuration));
        match groups.shift_remove(quality_type) {
            Some(group) => self.set_quality_group(stacks, &group),
            None => {
                tracing::warn!(quality_type, "No quality group for quality type");
                false
            }
        }
    }

    /// Activate a custom profile: its quality type on every stack plus its
    /// quality-changes containers.
    pub fn set_quality_changes_group(
        &self,
        tree: &ContainerTree,
        stacks: &mut MachineStacks,
        group: &QualityChangesGroup,
    ) -> bool {
        let Some(configuration) = stacks.active().map(GlobalStack::configuration) else {
            return false;
        };
        let quality_group = tree
            .current_quality_groups(Some(&configuration))
            .shift_remove(&group.quality_type);
        let Some(machine) = stacks.active_mut() else {
            return false;
        };
        match &quality_group {
            Some(quality_group) => apply_quality_group(machine, quality_group),
            None => {
                machine.quality_id = EMPTY_QUALITY.to_string();
                for extruder in &mut machine.extruders {
                    extruder.quality_id = EMPTY_QUALITY.to_string();
                }
            }
        }
        machine.quality_changes_id = group
            .metadata_for_global
            .as_ref()
            .map(|m| m.id.clone())
            .unwrap_or_else(|| EMPTY_QUALITY_CHANGES.to_string());
        for extruder in &mut machine.extruders {
            extruder.quality_changes_id = group
                .metadata_per_extruder
                .get(&extruder.position)
                .map(|m| m.id.clone())
                .unwrap_or_else(|| EMPTY_QUALITY_CHANGES.to_string());
        }
        true
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Build (but do not register) a quality-changes container.
    fn new_quality_changes(
        &self,
        registry: &dyn ContainerRegistry,
        definition: &DefinitionMetadata,
        base_id: &str,
        name: &str,
        quality_type: &str,
        position: Option<usize>,
        intent_category: Option<String>,
    ) -> InstanceMetadata {
        let id = registry.unique_name(&quality_changes_id(base_id, name));
        let mut metadata = InstanceMetadata::quality_changes(id, name, quality_type)
            .with_definition(self.machine_definition_id_for_quality_search(definition));
        metadata.position = position;
        metadata.intent_category = intent_category;
        metadata.setting_version = Some(self.setting_version);
        metadata
    }

    /// Turn the active machine's current profile into a new custom profile
    /// and activate it. Returns the final (unique) name.
    pub fn create_quality_changes(
        &self,
        registry: &mut dyn ContainerRegistry,
        stacks: &mut MachineStacks,
        base_name: &str,
    ) -> ProfileResult<String> {
        let machine = stacks.active().ok_or(ProfileError::NoActiveMachine)?;
        let definition = registry
            .definition(&machine.definition_id)
            .cloned()
            .ok_or_else(|| ProfileError::unknown_definition(&machine.definition_id))?;

        let base_name = if base_name.trim().is_empty() {
            active_quality_name(&*registry, machine)
        } else {
            base_name.to_string()
        };
        let name = registry.unique_name(&base_name);

        let global_quality_type = quality_type_of(&*registry, &machine.quality_id);
        let global = self.new_quality_changes(
            &*registry,
            &definition,
            &definition.id,
            &name,
            &global_quality_type,
            None,
            None,
        );
        let global_id = global.id.clone();
        registry.add_instance(global)?;

        let mut extruder_ids = Vec::new();
        for extruder in &machine.extruders {
            let quality_type = quality_type_of(&*registry, &extruder.quality_id);
            let intent_category = (extruder.intent_id != EMPTY_INTENT)
                .then(|| registry.instance(&extruder.intent_id))
                .flatten()
                .and_then(|m| m.intent_category.clone());
            let metadata = self.new_quality_changes(
                &*registry,
                &definition,
                &extruder.id,
                &name,
                &quality_type,
                Some(extruder.position),
                intent_category,
            );
            extruder_ids.push((extruder.position, metadata.id.clone()));
            registry.add_instance(metadata)?;
        }

        if let Some(machine) = stacks.active_mut() {
            machine.quality_changes_id = global_id;
            for (position, id) in extruder_ids {
                if let Some(extruder) = machine.extruder_mut(position) {
                    extruder.quality_changes_id = id;
                }
            }
        }
        tracing::info!(name = %name, "Created quality changes");
        Ok(name)
    }

    /// Copy a quality or custom profile under a new name. Returns the final
    /// (unique) name.
    pub fn duplicate_quality_changes(
        &self,
        registry: &mut dyn ContainerRegistry,
        stacks: &MachineStacks,
        new_name: &str,
        source: QualitySource<'_>,
    ) -> ProfileResult<String> {
        let machine = stacks.active().ok_or(ProfileError::NoActiveMachine)?;
        let definition = registry
            .definition(&machine.definition_id)
            .cloned()
            .ok_or_else(|| ProfileError::unknown_definition(&machine.definition_id))?;
        let name = registry.unique_name(new_name);

        match source {
            QualitySource::Quality(group) => {
                let metadata = self.new_quality_changes(
                    &*registry,
                    &definition,
                    &definition.id,
                    &name,
                    &group.quality_type,
                    None,
                    None,
                );
                registry.add_instance(metadata)?;
            }
            QualitySource::QualityChanges(group) => {
                for original in group.all_metadata() {
                    if registry.instance(&original.id).is_none() {
                        tracing::warn!(id = %original.id, "Quality changes container vanished, not copied");
                        continue;
                    }
                    let base_id = match original.position {
                        Some(position) => machine
                            .extruder(position)
                            .map(|e| e.id.clone())
                            .unwrap_or_else(|| format!("{}_extruder_{position}", definition.id)),
                        None => definition.id.clone(),
                    };
                    let mut copy = original.clone();
                    copy.id = registry.unique_name(&quality_changes_id(&base_id, &name));
                    copy.name = name.clone();
                    registry.add_instance(copy)?;
                }
            }
        }
        tracing::info!(name = %name, "Duplicated quality changes");
        Ok(name)
    }

    /// Rename every container of a custom profile. Returns the final name.
    ///
    /// Renaming to the current name changes nothing.
    pub fn rename_quality_changes_group(
        &self,
        registry: &mut dyn ContainerRegistry,
        group: &QualityChangesGroup,
        new_name: &str,
    ) -> ProfileResult<String> {
        if group.name == new_name {
            return Ok(new_name.to_string());
        }
        if let Some(read_only) = group.all_metadata().find(|m| registry.is_read_only(&m.id)) {
            return Err(ProfileError::ReadOnly(read_only.id.clone()));
        }
        let name = registry.unique_name(new_name);

        // Extruder containers first, the global one last.
        let ordered = group
            .metadata_per_extruder
            .values()
            .chain(group.metadata_for_global.iter());
        for metadata in ordered {
            let Some(current) = registry.instance(&metadata.id).cloned() else {
                tracing::warn!(id = %metadata.id, "Quality changes container vanished, not renamed");
                continue;
            };
            registry.update_instance(current.with_name(&name))?;
        }
        tracing::info!(from = %group.name, to = %name, "Renamed quality changes");
        Ok(name)
    }

    /// Delete every container of a custom profile. Stacks using any of them
    /// fall back to the empty quality changes. Returns the removed ids.
    ///
    /// A group with a read-only member is refused before anything changes.
    pub fn remove_quality_changes_group(
        &self,
        registry: &mut dyn ContainerRegistry,
        stacks: &mut MachineStacks,
        group: &QualityChangesGroup,
    ) -> ProfileResult<Vec<String>> {
        let ids = group.container_ids();
        if let Some(read_only) = ids.iter().find(|id| registry.is_read_only(id)) {
            return Err(ProfileError::ReadOnly(read_only.clone()));
        }

        let mut removed = Vec::new();
        for id in &ids {
            match registry.remove_instance(id) {
                Ok(_) => removed.push(id.clone()),
                Err(ProfileError::ContainerNotFound(_)) => {
                    tracing::warn!(id = %id, "Quality changes container already gone");
                }
                Err(error) => return Err(error),
            }
        }
        let removed_refs: Vec<&str> = removed.iter().map(String::as_str).collect();
        let reset = stacks.reset_quality_changes(&removed_refs);
        tracing::info!(name = %group.name, containers = removed.len(), stacks_reset = reset, "Removed quality changes");
        Ok(removed)
    }
}

fn apply_quality_group(machine: &mut GlobalStack, group: &QualityGroup) {
    machine.quality_id = group
        .global_container_id()
        .unwrap_or(EMPTY_QUALITY)
        .to_string();
    machine.quality_changes_id = EMPTY_QUALITY_CHANGES.to_string();
    for extruder in &mut machine.extruders {
        extruder.quality_id = group
            .extruder_container_id(extruder.position)
            .unwrap_or(EMPTY_QUALITY)
            .to_string();
        extruder.quality_changes_id = EMPTY_QUALITY_CHANGES.to_string();
    }
}

/// Quality type of a stack's quality container, "not_supported" for the
/// empty quality or an unknown id.
fn quality_type_of(registry: &dyn ContainerRegistry, quality_id: &str) -> String {
    registry
        .instance(quality_id)
        .and_then(|m| m.quality_type.clone())
        .unwrap_or_else(|| NOT_SUPPORTED_QUALITY_TYPE.to_string())
}

/// Name of the active custom profile, or of the active quality.
fn active_quality_name(registry: &dyn ContainerRegistry, machine: &GlobalStack) -> String {
    [&machine.quality_changes_id, &machine.quality_id]
        .into_iter()
        .filter(|id| id.as_str() != EMPTY_QUALITY_CHANGES && id.as_str() != EMPTY_QUALITY)
        .find_map(|id| registry.instance(id).map(|m| m.name.clone()))
        .unwrap_or_default()
}
