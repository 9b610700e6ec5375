//! ProfileHost: one owner for the registry, the tree and the managers.
//!
//! The host replaces application-wide singletons. Everything that used to be
//! reached through a global instance is a field here, and the managers get
//! what they need passed in.
//!
//! ## Usage
//!
//! ```ignore
//! let mut host = ProfileHost::new(registry, ProfileConfig::default());
//! host.add_machine(GlobalStack::new("my_um3", "ultimaker3"))?;
//!
//! // Mutate through the managers, then deliver the queued events
//! host.create_quality_changes("My Profile")?;
//! host.process_events(Instant::now());
//!
//! let groups = host.quality_groups();
//! ```

use std::path::Path;
use std::time::Instant;

use indexmap::{IndexMap, IndexSet};

use crate::base::{EventEmitter, ProfileError, ProfileResult};
use crate::config::ProfileConfig;
use crate::intent::{IntentChoice, IntentManager};
use crate::materials::{MaterialManager, MaterialOverrides};
use crate::metadata::ContainerKind;
use crate::project::{MachineInfo, resolve_machine_info};
use crate::quality::{QualityManager, QualitySource};
use crate::registry::{ContainerEvent, ContainerRegistry, InMemoryRegistry};
use crate::stacks::{ActiveConfiguration, ActiveConfigurationProvider, GlobalStack, MachineStacks};
use crate::tree::{ContainerTree, QualityChangesGroup, QualityGroup};

/// Something the host did on its own while processing events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileEvent {
    /// A removed quality-changes container was still referenced by stacks.
    QualityChangesReset { container_id: String, slots: usize },
    /// The debounced material rebuild ran.
    MaterialsRebuilt { group_count: usize },
}

/// Owns all profile state.
pub struct ProfileHost<R: ContainerRegistry = InMemoryRegistry> {
    registry: R,
    tree: ContainerTree,
    materials: MaterialManager,
    quality: QualityManager,
    intent: IntentManager,
    stacks: MachineStacks,
    config: ProfileConfig,
    pub events: EventEmitter<ProfileEvent>,
}

impl<R: ContainerRegistry> std::fmt::Debug for ProfileHost<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileHost")
            .field("machines", &self.tree.machine_count())
            .field("materials", &self.materials)
            .field("config", &self.config)
            .finish()
    }
}

impl<R: ContainerRegistry> ProfileHost<R> {
    /// Take ownership of a populated registry.
    ///
    /// Events queued while the registry was filled are dropped: the material
    /// tables are built from the current contents, and machine nodes are
    /// built when machines are added.
    pub fn new(mut registry: R, config: ProfileConfig) -> Self {
        let stale = registry.take_events().len();
        if stale > 0 {
            tracing::debug!(events = stale, "Dropping events queued before startup");
        }
        let materials = MaterialManager::new(&registry, &config);
        Self {
            tree: ContainerTree::with_generic_definition(config.generic_definition_id.clone()),
            materials,
            quality: QualityManager::new(&config),
            intent: IntentManager::new(),
            stacks: MachineStacks::new(),
            config,
            registry,
            events: EventEmitter::new(),
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Direct registry access. Changes made here reach the tree on the next
    /// [`process_events`](Self::process_events).
    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn tree(&self) -> &ContainerTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ContainerTree {
        &mut self.tree
    }

    pub fn materials(&self) -> &MaterialManager {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialManager {
        &mut self.materials
    }

    pub fn quality(&self) -> &QualityManager {
        &self.quality
    }

    pub fn intent(&self) -> &IntentManager {
        &self.intent
    }

    pub fn stacks(&self) -> &MachineStacks {
        &self.stacks
    }

    pub fn stacks_mut(&mut self) -> &mut MachineStacks {
        &mut self.stacks
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// Register a machine. Its tree node is built if needed, and the first
    /// machine becomes active.
    pub fn add_machine(&mut self, stack: GlobalStack) -> ProfileResult<()> {
        self.tree.get_machine(&self.registry, &stack.definition_id)?;
        tracing::info!(machine = %stack.id, definition = %stack.definition_id, "Machine added");
        self.stacks.add(stack);
        Ok(())
    }

    /// Startup path: build the tree for every saved machine in one pass,
    /// then register the machines whose definition loaded. Returns how many
    /// were registered.
    pub fn restore_machines(&mut self, machines: Vec<GlobalStack>) -> usize {
        let definition_ids: IndexSet<String> =
            machines.iter().map(|m| m.definition_id.clone()).collect();
        let definition_ids: Vec<String> = definition_ids.into_iter().collect();
        self.tree.load_all(&self.registry, &definition_ids);

        let mut restored = 0;
        for stack in machines {
            if self.tree.machine(&stack.definition_id).is_none() {
                tracing::warn!(machine = %stack.id, definition = %stack.definition_id, "Machine not restored");
                continue;
            }
            self.stacks.add(stack);
            restored += 1;
        }
        tracing::info!(machines = restored, "Machines restored");
        restored
    }

    pub fn active_configuration(&self) -> Option<ActiveConfiguration> {
        self.stacks.active_configuration()
    }

    // ========================================================================
    // EVENT PROCESSING
    // ========================================================================

    /// Deliver every queued registry event, in order, to the tree, the
    /// material manager and the stale-reference check. Then rebuild the
    /// material tables if their quiet period has passed.
    ///
    /// Returns the number of events delivered.
    pub fn process_events(&mut self, now: Instant) -> usize {
        let events = self.registry.take_events();
        for event in &events {
            self.tree.handle_event(&self.registry, event);
            self.materials.on_container_event(event, now);
            if let ContainerEvent::InstanceRemoved(metadata) = event
                && metadata.kind == ContainerKind::QualityChanges
            {
                self.reset_stale_quality_changes(&metadata.id);
            }
        }
        if !events.is_empty() {
            tracing::trace!(events = events.len(), "Registry events processed");
        }
        self.poll_materials(now);
        events.len()
    }

    /// Run the debounced material rebuild if it is due.
    pub fn poll_materials(&mut self, now: Instant) -> bool {
        if !self.materials.poll(&self.registry, now) {
            return false;
        }
        let group_count = self.materials.all_material_groups().len();
        self.events.emit(&ProfileEvent::MaterialsRebuilt { group_count });
        true
    }

    fn reset_stale_quality_changes(&mut self, container_id: &str) {
        let slots = self.stacks.reset_quality_changes(&[container_id]);
        if slots == 0 {
            return;
        }
        tracing::info!(container = container_id, slots, "Reset stacks using removed quality changes");
        self.events.emit(&ProfileEvent::QualityChangesReset {
            container_id: container_id.to_string(),
            slots,
        });
    }

    // ========================================================================
    // QUALITY
    // ========================================================================

    /// Quality groups of the active machine. Empty without one.
    pub fn quality_groups(&self) -> IndexMap<String, QualityGroup> {
        match self.active_configuration() {
            Some(configuration) => self.quality.quality_groups(&self.tree, &configuration),
            None => IndexMap::new(),
        }
    }

    pub fn quality_changes_groups(&self) -> Vec<QualityChangesGroup> {
        match self.active_configuration() {
            Some(configuration) => self.quality.quality_changes_groups(&self.tree, &configuration),
            None => Vec::new(),
        }
    }

    pub fn default_quality_group(&self) -> Option<QualityGroup> {
        let configuration = self.active_configuration()?;
        self.quality.default_quality_type(&self.tree, &configuration)
    }

    pub fn set_quality_group_by_quality_type(&mut self, quality_type: &str) -> bool {
        self.quality
            .set_quality_group_by_quality_type(&self.tree, &mut self.stacks, quality_type)
    }

    pub fn set_quality_changes_group(&mut self, group: &QualityChangesGroup) -> bool {
        self.quality
            .set_quality_changes_group(&self.tree, &mut self.stacks, group)
    }

    pub fn create_quality_changes(&mut self, base_name: &str) -> ProfileResult<String> {
        self.quality
            .create_quality_changes(&mut self.registry, &mut self.stacks, base_name)
    }

    pub fn duplicate_quality_changes(
        &mut self,
        new_name: &str,
        source: QualitySource<'_>,
    ) -> ProfileResult<String> {
        self.quality
            .duplicate_quality_changes(&mut self.registry, &self.stacks, new_name, source)
    }

    pub fn rename_quality_changes_group(
        &mut self,
        group: &QualityChangesGroup,
        new_name: &str,
    ) -> ProfileResult<String> {
        self.quality
            .rename_quality_changes_group(&mut self.registry, group, new_name)
    }

    pub fn remove_quality_changes_group(
        &mut self,
        group: &QualityChangesGroup,
    ) -> ProfileResult<Vec<String>> {
        self.quality
            .remove_quality_changes_group(&mut self.registry, &mut self.stacks, group)
    }

    // ========================================================================
    // INTENT
    // ========================================================================

    pub fn current_available_intents(&self) -> IndexSet<IntentChoice> {
        let configuration = self.active_configuration();
        self.intent
            .current_available_intents(&self.tree, &self.registry, configuration.as_ref())
    }

    pub fn current_available_intent_categories(&self) -> IndexSet<String> {
        let configuration = self.active_configuration();
        self.intent
            .current_available_intent_categories(&self.registry, configuration.as_ref())
    }

    pub fn select_intent(&mut self, category: &str, quality_type: &str) -> bool {
        self.intent.select_intent(
            &self.registry,
            &self.tree,
            &self.quality,
            &mut self.stacks,
            category,
            quality_type,
        )
    }

    pub fn select_default_intent(&mut self) {
        self.intent.select_default_intent(&mut self.stacks);
    }

    // ========================================================================
    // MATERIALS
    // ========================================================================

    pub fn duplicate_material(
        &mut self,
        root_material_id: &str,
        new_base_id: Option<&str>,
        overrides: &MaterialOverrides,
    ) -> ProfileResult<String> {
        self.materials
            .duplicate_material(&mut self.registry, root_material_id, new_base_id, overrides)
    }

    /// Create a custom material for the active machine at the default
    /// diameter.
    pub fn create_material(&mut self) -> ProfileResult<String> {
        let definition_id = self
            .stacks
            .active()
            .map(|machine| machine.definition_id.clone())
            .ok_or(ProfileError::NoActiveMachine)?;
        let definition = self
            .registry
            .definition(&definition_id)
            .cloned()
            .ok_or_else(|| ProfileError::unknown_definition(&definition_id))?;
        let diameter = self.config.default_approximate_diameter.clone();
        self.materials
            .create_material(&mut self.registry, &definition, &diameter)
    }

    /// Remove a material family unless some extruder still uses it.
    /// Returns the removed ids, empty when the family is in use.
    pub fn remove_material(&mut self, root_material_id: &str) -> ProfileResult<Vec<String>> {
        if !self
            .materials
            .can_material_be_removed(&self.registry, &self.stacks, root_material_id)
        {
            tracing::warn!(material = root_material_id, "Material is in use, not removed");
            return Ok(Vec::new());
        }
        self.materials
            .remove_material_by_root_id(&mut self.registry, root_material_id)
    }

    // ========================================================================
    // PROJECTS AND CONFIG
    // ========================================================================

    /// Complete a project machine description. See
    /// [`resolve_machine_info`](crate::project::resolve_machine_info).
    pub fn resolve_machine_info(&mut self, info: &MachineInfo) -> ProfileResult<MachineInfo> {
        let diameter = self.config.default_diameter_value();
        resolve_machine_info(&mut self.tree, &self.registry, info, diameter)
    }

    /// Write the config, including the current favorite materials.
    pub fn save_config(&mut self, path: &Path) -> ProfileResult<()> {
        self.config.favorite_materials = self.materials.favorites().clone();
        self.config.save(path)
    }
}
