//! The root of the lookup tree: one machine node per machine definition.

use std::time::Instant;

use indexmap::IndexMap;

use super::{MachineNode, QualityGroup};
use crate::base::constants::GENERIC_DEFINITION_ID;
use crate::base::{EventEmitter, ProfileError, ProfileResult};
use crate::metadata::{DefinitionFilter, DefinitionKind, DefinitionMetadata, InstanceMetadata};
use crate::registry::{ContainerEvent, ContainerRegistry};
use crate::stacks::ActiveConfiguration;

/// A material node somewhere in the tree got a different container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialsChanged {
    pub definition_id: String,
    pub variant_name: String,
    pub base_file: String,
}

/// Machine definition id -> machine node.
///
/// Nodes are created when a machine definition is first seen and are never
/// dropped. Every material change under any machine is reported on
/// [`ContainerTree::materials_changed`], so observers subscribe once here.
#[derive(Debug)]
pub struct ContainerTree {
    machines: IndexMap<String, MachineNode>,
    generic_definition_id: String,
    pub materials_changed: EventEmitter<MaterialsChanged>,
}

impl Default for ContainerTree {
    fn default() -> Self {
        Self::with_generic_definition(GENERIC_DEFINITION_ID)
    }
}

impl ContainerTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tree whose machines share `generic_definition_id` for generic
    /// materials and fallback qualities.
    pub fn with_generic_definition(generic_definition_id: impl Into<String>) -> Self {
        Self {
            machines: IndexMap::new(),
            generic_definition_id: generic_definition_id.into(),
            materials_changed: EventEmitter::new(),
        }
    }

    pub fn generic_definition_id(&self) -> &str {
        &self.generic_definition_id
    }

    /// Build machine nodes for every definition in use (startup path).
    /// Unknown ids are skipped with a warning.
    pub fn load_all(&mut self, registry: &dyn ContainerRegistry, definition_ids: &[String]) {
        tracing::info!(machines = definition_ids.len(), "Building container tree");
        let start = Instant::now();
        for definition_id in definition_ids {
            if let Err(error) = self.get_machine(registry, definition_id) {
                tracing::warn!(definition = %definition_id, %error, "Skipping machine");
            }
        }
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Building the container tree finished"
        );
    }

    /// The machine node for `definition_id`, built on first request.
    ///
    /// Asking for a definition the registry has never heard of is a caller
    /// bug and yields [`ProfileError::UnknownDefinition`]. A machine whose
    /// `quality_definition` names no machine definition is
    /// [`ProfileError::InvalidMetadata`].
    pub fn get_machine(
        &mut self,
        registry: &dyn ContainerRegistry,
        definition_id: &str,
    ) -> ProfileResult<&MachineNode> {
        if !self.machines.contains_key(definition_id) {
            let definition = registry
                .definition(definition_id)
                .filter(|d| d.is_machine())
                .ok_or_else(|| ProfileError::unknown_definition(definition_id))?;
            self.insert_machine(registry, definition)?;
        }
        self.machines
            .get(definition_id)
            .ok_or_else(|| ProfileError::unknown_definition(definition_id))
    }

    /// Read-only lookup. Never builds anything.
    pub fn machine(&self, definition_id: &str) -> Option<&MachineNode> {
        self.machines.get(definition_id)
    }

    pub fn machines(&self) -> impl Iterator<Item = &MachineNode> {
        self.machines.values()
    }

    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    /// Build the node for a newly registered definition. Returns false for
    /// extruder definitions, for definitions already present and for
    /// malformed ones.
    pub fn on_machine_definition_added(
        &mut self,
        registry: &dyn ContainerRegistry,
        definition: &DefinitionMetadata,
    ) -> bool {
        if !definition.is_machine() || self.machines.contains_key(&definition.id) {
            return false;
        }
        match self.insert_machine(registry, definition) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(machine = %definition.id, %error, "Machine definition not loaded");
                false
            }
        }
    }

    fn insert_machine(
        &mut self,
        registry: &dyn ContainerRegistry,
        definition: &DefinitionMetadata,
    ) -> ProfileResult<()> {
        check_quality_definition(registry, definition)?;
        let start = Instant::now();
        let node = MachineNode::load(registry, definition, &self.generic_definition_id);
        tracing::debug!(
            machine = %definition.id,
            variants = node.variants().len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Machine node built"
        );
        self.machines.insert(definition.id.clone(), node);
        Ok(())
    }

    /// Quality groups for a configuration snapshot. Empty without a
    /// configuration, or when its machine is not in the tree.
    pub fn current_quality_groups(
        &self,
        configuration: Option<&ActiveConfiguration>,
    ) -> IndexMap<String, QualityGroup> {
        let Some(configuration) = configuration else {
            return IndexMap::new();
        };
        match self.machines.get(&configuration.definition_id) {
            Some(machine) => machine.quality_groups(&configuration.extruders),
            None => {
                tracing::warn!(
                    machine = %configuration.definition_id,
                    "Active machine is not in the container tree"
                );
                IndexMap::new()
            }
        }
    }

    // ========================================================================
    // EVENT ROUTING
    // ========================================================================

    /// Apply one registry event to every machine node.
    pub fn handle_event(&mut self, registry: &dyn ContainerRegistry, event: &ContainerEvent) {
        match event {
            ContainerEvent::DefinitionAdded(definition) => {
                self.on_machine_definition_added(registry, definition);
            }
            ContainerEvent::InstanceAdded(metadata) => self.on_container_added(registry, metadata),
            ContainerEvent::InstanceRemoved(metadata) => {
                self.on_container_removed(registry, metadata)
            }
            ContainerEvent::MetadataChanged { previous, current } => {
                self.on_container_metadata_changed(registry, previous, current)
            }
        }
    }

    pub fn on_container_added(&mut self, registry: &dyn ContainerRegistry, metadata: &InstanceMetadata) {
        let mut changed = Vec::new();
        for machine in self.machines.values_mut() {
            for (variant_name, base_file) in machine.on_container_added(registry, metadata) {
                changed.push(MaterialsChanged {
                    definition_id: machine.definition_id().to_string(),
                    variant_name,
                    base_file,
                });
            }
        }
        self.emit_changes(changed);
    }

    pub fn on_container_removed(&mut self, registry: &dyn ContainerRegistry, metadata: &InstanceMetadata) {
        let mut changed = Vec::new();
        for machine in self.machines.values_mut() {
            for (variant_name, base_file) in machine.on_container_removed(registry, metadata) {
                changed.push(MaterialsChanged {
                    definition_id: machine.definition_id().to_string(),
                    variant_name,
                    base_file,
                });
            }
        }
        self.emit_changes(changed);
    }

    pub fn on_container_metadata_changed(
        &mut self,
        registry: &dyn ContainerRegistry,
        previous: &InstanceMetadata,
        current: &InstanceMetadata,
    ) {
        let mut changed = Vec::new();
        for machine in self.machines.values_mut() {
            for (variant_name, base_file) in
                machine.on_container_metadata_changed(registry, previous, current)
            {
                changed.push(MaterialsChanged {
                    definition_id: machine.definition_id().to_string(),
                    variant_name,
                    base_file,
                });
            }
        }
        self.emit_changes(changed);
    }

    fn emit_changes(&mut self, changed: Vec<MaterialsChanged>) {
        for change in &changed {
            tracing::trace!(
                machine = %change.definition_id,
                variant = %change.variant_name,
                material = %change.base_file,
                "Material node changed"
            );
            self.materials_changed.emit(change);
        }
    }
}

/// A declared `quality_definition` must name a registered machine
/// definition. Machines without their own qualities never read it.
fn check_quality_definition(
    registry: &dyn ContainerRegistry,
    definition: &DefinitionMetadata,
) -> ProfileResult<()> {
    let Some(quality_definition) = definition
        .quality_definition
        .as_deref()
        .filter(|id| definition.has_machine_quality && *id != definition.id)
    else {
        return Ok(());
    };
    let filter = DefinitionFilter::new()
        .id(quality_definition)
        .kind(DefinitionKind::Machine);
    if registry.find_definitions(&filter).is_empty() {
        return Err(ProfileError::invalid_definition(format!(
            "{}: quality_definition {quality_definition} is not a machine definition",
            definition.id
        )));
    }
    Ok(())
}
