//! Material indices, favorites and material mutations.
//!
//! [`MaterialManager`] keeps derived lookup tables over every material in the
//! registry: groups by root id, groups by GUID, a diameter-independent id per
//! family, and one generic fallback per material type. The tables are never
//! patched. Any material change marks them stale and they are rebuilt
//! wholesale once the debounce period has passed (see [`RebuildTracker`]).

mod material_group;
mod rebuild;

pub use material_group::MaterialGroup;
pub use rebuild::RebuildTracker;

use std::time::Instant;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::base::constants::{DEFAULT_PREFERRED_MATERIAL, GENERIC_MATERIAL_BRAND};
use crate::base::{EventEmitter, ProfileError, ProfileResult};
use crate::config::ProfileConfig;
use crate::metadata::{ContainerKind, DefinitionMetadata, InstanceFilter, InstanceMetadata};
use crate::registry::{ContainerEvent, ContainerRegistry};
use crate::stacks::MachineStacks;
use crate::tree::{ContainerTree, MaterialNode};

/// Emitted after the lookup tables were rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialsUpdated {
    pub group_count: usize,
}

/// Emitted whenever the favorite set changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoritesUpdated {
    pub favorites: Vec<String>,
}

/// Metadata to force onto every copy made by
/// [`MaterialManager::duplicate_material`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialOverrides {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub guid: Option<String>,
    pub color_name: Option<String>,
    pub material_type: Option<String>,
}

impl MaterialOverrides {
    fn apply(&self, metadata: &mut InstanceMetadata) {
        if let Some(name) = &self.name {
            metadata.name = name.clone();
        }
        if let Some(brand) = &self.brand {
            metadata.brand = Some(brand.clone());
        }
        if let Some(guid) = &self.guid {
            metadata.guid = Some(guid.clone());
        }
        if let Some(color_name) = &self.color_name {
            metadata.color_name = Some(color_name.clone());
        }
        if let Some(material_type) = &self.material_type {
            metadata.material_type = Some(material_type.clone());
        }
    }
}

/// Key grouping root materials that differ only in diameter.
type DiameterKey = (String, Option<String>, Option<String>, Option<String>);

pub struct MaterialManager {
    material_groups: IndexMap<String, MaterialGroup>,
    /// GUID -> root ids sharing it.
    guid_groups: FxHashMap<String, Vec<String>>,
    /// Root id -> root id of the same family at the default diameter.
    diameter_map: FxHashMap<String, String>,
    /// Material type -> generic root id.
    fallback_materials: FxHashMap<String, String>,
    favorites: IndexSet<String>,
    generic_definition_id: String,
    default_diameter: String,
    tracker: RebuildTracker,
    pub materials_updated: EventEmitter<MaterialsUpdated>,
    pub favorites_updated: EventEmitter<FavoritesUpdated>,
}

impl std::fmt::Debug for MaterialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialManager")
            .field("groups", &self.material_groups.len())
            .field("favorites", &self.favorites)
            .field("dirty", &self.tracker.is_dirty())
            .finish()
    }
}

impl MaterialManager {
    /// Create the manager and build the tables right away.
    pub fn new(registry: &dyn ContainerRegistry, config: &ProfileConfig) -> Self {
        let mut manager = Self {
            material_groups: IndexMap::new(),
            guid_groups: FxHashMap::default(),
            diameter_map: FxHashMap::default(),
            fallback_materials: FxHashMap::default(),
            favorites: config.favorite_materials.clone(),
            generic_definition_id: config.generic_definition_id.clone(),
            default_diameter: config.default_approximate_diameter.clone(),
            tracker: RebuildTracker::from_millis(config.material_rebuild_debounce_ms),
            materials_updated: EventEmitter::new(),
            favorites_updated: EventEmitter::new(),
        };
        manager.build_maps(registry);
        manager
    }

    // ========================================================================
    // DEBOUNCED REBUILD
    // ========================================================================

    /// Note a registry event. Only material containers mark the tables stale.
    pub fn on_container_event(&mut self, event: &ContainerEvent, now: Instant) -> bool {
        let is_material = event
            .instance()
            .is_some_and(|m| m.kind == ContainerKind::Material);
        if is_material {
            self.tracker.mark_dirty(now);
        }
        is_material
    }

    /// Rebuild if the quiet period has passed. Returns true if it rebuilt.
    pub fn poll(&mut self, registry: &dyn ContainerRegistry, now: Instant) -> bool {
        if !self.tracker.is_due(now) {
            return false;
        }
        self.rebuild(registry);
        true
    }

    /// Rebuild now if anything is pending, ignoring the debounce.
    pub fn flush(&mut self, registry: &dyn ContainerRegistry) -> bool {
        if !self.tracker.is_dirty() {
            return false;
        }
        self.rebuild(registry);
        true
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    pub fn rebuild_count(&self) -> usize {
        self.tracker.rebuild_count()
    }

    /// Rebuild every table from the registry and notify observers.
    pub fn rebuild(&mut self, registry: &dyn ContainerRegistry) {
        let covered = self.tracker.complete();
        self.build_maps(registry);
        tracing::debug!(
            groups = self.material_groups.len(),
            changes = covered,
            "Material lookup tables rebuilt"
        );
        let event = MaterialsUpdated {
            group_count: self.material_groups.len(),
        };
        self.materials_updated.emit(&event);
    }

    fn build_maps(&mut self, registry: &dyn ContainerRegistry) {
        let materials = registry.find_instances(&InstanceFilter::of_kind(ContainerKind::Material));

        // Groups: roots first, then derivatives attached to their root.
        let mut groups: IndexMap<String, MaterialGroup> = IndexMap::new();
        for metadata in materials.iter().filter(|m| m.is_root_material()) {
            groups.insert(
                metadata.id.clone(),
                MaterialGroup::new((*metadata).clone(), registry.is_read_only(&metadata.id)),
            );
        }
        for metadata in materials.iter().filter(|m| !m.is_root_material()) {
            match groups.get_mut(metadata.root_material_id()) {
                Some(group) => group.derived_materials.push((*metadata).clone()),
                None => tracing::debug!(
                    id = %metadata.id,
                    base_file = metadata.root_material_id(),
                    "Material without a root container"
                ),
            }
        }

        let mut guid_groups: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for group in groups.values() {
            if let Some(guid) = group.guid() {
                guid_groups
                    .entry(guid.to_string())
                    .or_default()
                    .push(group.name.clone());
            }
        }

        // Families that differ only in diameter. The first group seen for a
        // key always registers, later ones only if they are read-only.
        let mut families: IndexMap<DiameterKey, IndexMap<String, String>> = IndexMap::new();
        for group in groups.values() {
            let root = &group.root_material;
            let key = (
                root.name.clone(),
                root.material_type.clone(),
                root.brand.clone(),
                root.color_name.clone(),
            );
            let known = families.contains_key(&key);
            if known && !group.is_read_only {
                continue;
            }
            let diameter = root.approximate_diameter.clone().unwrap_or_default();
            families
                .entry(key)
                .or_default()
                .insert(diameter, root.id.clone());
        }
        let mut diameter_map = FxHashMap::default();
        for by_diameter in families.values() {
            let canonical = by_diameter
                .get(&self.default_diameter)
                .or_else(|| by_diameter.values().next());
            if let Some(canonical) = canonical {
                for root_id in by_diameter.values() {
                    diameter_map.insert(root_id.clone(), canonical.clone());
                }
            }
        }

        // One generic fallback per material type, preferring the default
        // diameter.
        let mut fallback: FxHashMap<String, (bool, String)> = FxHashMap::default();
        for group in groups.values() {
            let root = &group.root_material;
            let is_generic = root
                .brand
                .as_deref()
                .is_some_and(|b| b.eq_ignore_ascii_case(GENERIC_MATERIAL_BRAND));
            let Some(material_type) = root.material_type.as_deref() else {
                continue;
            };
            if !is_generic || root.definition != self.generic_definition_id {
                continue;
            }
            let at_default = root.approximate_diameter.as_deref() == Some(self.default_diameter.as_str());
            let replace = match fallback.get(material_type) {
                Some((true, _)) => false,
                Some((false, _)) => at_default,
                None => true,
            };
            if replace {
                fallback.insert(material_type.to_string(), (at_default, root.id.clone()));
            }
        }

        self.material_groups = groups;
        self.guid_groups = guid_groups;
        self.diameter_map = diameter_map;
        self.fallback_materials = fallback
            .into_iter()
            .map(|(material_type, (_, id))| (material_type, id))
            .collect();
    }

    // ========================================================================
    // LOOKUPS
    // ========================================================================

    pub fn material_group(&self, root_material_id: &str) -> Option<&MaterialGroup> {
        self.material_groups.get(root_material_id)
    }

    /// Every group whose root carries `guid`. Empty when none does.
    pub fn material_groups_by_guid(&self, guid: &str) -> Vec<&MaterialGroup> {
        self.guid_groups
            .get(guid)
            .into_iter()
            .flatten()
            .filter_map(|id| self.material_groups.get(id))
            .collect()
    }

    pub fn all_material_groups(&self) -> &IndexMap<String, MaterialGroup> {
        &self.material_groups
    }

    /// Root id of the same family at `approximate_diameter`. Returns the
    /// input when no such sibling exists.
    pub fn root_material_id_for_diameter(
        &self,
        registry: &dyn ContainerRegistry,
        root_material_id: &str,
        approximate_diameter: &str,
    ) -> String {
        let Some(original) = registry.instance(root_material_id) else {
            tracing::warn!(material = root_material_id, "Unknown material");
            return root_material_id.to_string();
        };
        if original.approximate_diameter.as_deref() == Some(approximate_diameter) {
            return root_material_id.to_string();
        }

        let mut filter = InstanceFilter::of_kind(ContainerKind::Material)
            .definition(&original.definition)
            .approximate_diameter(approximate_diameter);
        filter.brand = original.brand.clone();
        filter.material_type = original.material_type.clone();
        filter.color_name = original.color_name.clone();
        registry
            .find_instances(&filter)
            .first()
            .map(|m| m.root_material_id().to_string())
            .unwrap_or_else(|| root_material_id.to_string())
    }

    /// Canonical root id (default diameter) of the family `root_material_id`
    /// belongs to.
    pub fn root_material_id_without_diameter(&self, root_material_id: &str) -> Option<&str> {
        self.diameter_map.get(root_material_id).map(String::as_str)
    }

    /// Generic root id for a material type, e.g. "PLA" -> "generic_pla".
    pub fn fallback_material_id_by_material_type(&self, material_type: &str) -> Option<String> {
        let Some(id) = self.fallback_materials.get(material_type) else {
            tracing::warn!(material_type, "Material type has no fallback material");
            return None;
        };
        Some(
            self.root_material_id_without_diameter(id)
                .unwrap_or(id)
                .to_string(),
        )
    }

    /// Candidates to replace `material`: other groups with the same GUID
    /// (read-only ones first), then the generic fallback of its type.
    pub fn fallback_material_ids(&self, material: &InstanceMetadata) -> Vec<String> {
        let mut results: Vec<String> = Vec::new();
        if let Some(guid) = material.guid.as_deref() {
            for group in self.material_groups_by_guid(guid) {
                if group.name == material.id {
                    continue;
                }
                if group.is_read_only {
                    results.insert(0, group.name.clone());
                } else {
                    results.push(group.name.clone());
                }
            }
        }
        if let Some(fallback) = material
            .material_type
            .as_deref()
            .and_then(|t| self.fallback_material_id_by_material_type(t))
        {
            results.push(fallback);
        }
        results
    }

    /// Material nodes usable with `variant_name` on `definition_id`.
    pub fn available_materials<'t>(
        &self,
        tree: &'t ContainerTree,
        definition_id: &str,
        variant_name: &str,
    ) -> Option<&'t IndexMap<String, MaterialNode>> {
        let Some(machine) = tree.machine(definition_id) else {
            tracing::warn!(machine = definition_id, "Machine not in container tree");
            return None;
        };
        match machine.variant(variant_name) {
            Some(variant) => Some(variant.materials()),
            None => {
                tracing::warn!(machine = definition_id, variant = variant_name, "Variant not in container tree");
                None
            }
        }
    }

    /// Available materials whose diameter fits an extruder taking
    /// `approximate_diameter` filament.
    pub fn available_materials_for_extruder<'t>(
        &self,
        tree: &'t ContainerTree,
        definition_id: &str,
        variant_name: &str,
        approximate_diameter: f64,
    ) -> IndexMap<String, &'t MaterialNode> {
        let Some(materials) = self.available_materials(tree, definition_id, variant_name) else {
            return IndexMap::new();
        };
        materials
            .iter()
            .filter(|(_, node)| {
                node.approximate_diameter()
                    .is_some_and(|d| d.round() == approximate_diameter.round())
            })
            .map(|(id, node)| (id.clone(), node))
            .collect()
    }

    pub fn material_node<'t>(
        &self,
        tree: &'t ContainerTree,
        definition_id: &str,
        variant_name: &str,
        root_material_id: &str,
    ) -> Option<&'t MaterialNode> {
        let node = self
            .available_materials(tree, definition_id, variant_name)?
            .get(root_material_id);
        if node.is_none() {
            tracing::warn!(
                machine = definition_id,
                variant = variant_name,
                material = root_material_id,
                "Material not in container tree"
            );
        }
        node
    }

    /// Material an extruder should start with.
    ///
    /// An unknown variant falls back to the machine's first variant.
    pub fn default_material<'t>(
        &self,
        tree: &'t ContainerTree,
        definition_id: &str,
        variant_name: Option<&str>,
        approximate_diameter: f64,
    ) -> Option<&'t MaterialNode> {
        let Some(machine) = tree.machine(definition_id) else {
            tracing::warn!(machine = definition_id, "Machine not in container tree");
            return None;
        };
        let variant = match variant_name.and_then(|name| machine.variant(name)) {
            Some(variant) => variant,
            None => {
                tracing::warn!(
                    machine = definition_id,
                    variant = variant_name,
                    "Variant not in container tree, using the first one"
                );
                machine.variants().values().next()?
            }
        };
        if !machine.has_materials() {
            return variant.materials().values().next();
        }
        variant.preferred_material(approximate_diameter.round())
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Remove a material family: the root container and every derivative.
    pub fn remove_material_by_root_id(
        &mut self,
        registry: &mut dyn ContainerRegistry,
        root_material_id: &str,
    ) -> ProfileResult<Vec<String>> {
        if registry.instance(root_material_id).is_none() {
            return Err(ProfileError::not_found(root_material_id));
        }
        if registry.is_read_only(root_material_id) {
            return Err(ProfileError::ReadOnly(root_material_id.to_string()));
        }
        let mut ids = family_ids(&*registry, root_material_id);
        if !ids.iter().any(|id| id == root_material_id) {
            ids.insert(0, root_material_id.to_string());
        }
        for id in &ids {
            registry.remove_instance(id)?;
        }
        tracing::info!(material = root_material_id, containers = ids.len(), "Removed material");
        Ok(ids)
    }

    /// False while any extruder of any machine uses a container of the family.
    pub fn can_material_be_removed(
        &self,
        registry: &dyn ContainerRegistry,
        stacks: &MachineStacks,
        root_material_id: &str,
    ) -> bool {
        !stacks.uses_material(&family_ids(registry, root_material_id))
    }

    /// Rename the root container of a material family.
    pub fn set_material_name(
        &mut self,
        registry: &mut dyn ContainerRegistry,
        root_material_id: &str,
        name: &str,
    ) -> ProfileResult<()> {
        if registry.is_read_only(root_material_id) {
            tracing::warn!(material = root_material_id, "Cannot rename a read-only material");
            return Err(ProfileError::ReadOnly(root_material_id.to_string()));
        }
        let mut metadata = registry
            .instance(root_material_id)
            .cloned()
            .ok_or_else(|| ProfileError::not_found(root_material_id))?;
        metadata.name = name.to_string();
        registry.update_instance(metadata)
    }

    /// Deep-copy a material family under a new root id.
    ///
    /// Every copy gets a fresh id derived from `new_base_id` and keeps the
    /// source GUID unless `overrides` replaces it. The tables are rebuilt
    /// before returning, so the new group can be looked up immediately.
    pub fn duplicate_material(
        &mut self,
        registry: &mut dyn ContainerRegistry,
        root_material_id: &str,
        new_base_id: Option<&str>,
        overrides: &MaterialOverrides,
    ) -> ProfileResult<String> {
        let Some(base) = registry.instance(root_material_id).cloned() else {
            tracing::info!(material = root_material_id, "Cannot duplicate a material that does not exist");
            return Err(ProfileError::not_found(root_material_id));
        };
        let new_base_id = match new_base_id {
            Some(id) => id.to_string(),
            None => registry.unique_name(&base.id),
        };
        if registry.instance(&new_base_id).is_some() {
            return Err(ProfileError::DuplicateContainer(new_base_id));
        }

        let mut copies = Vec::new();
        let mut root_copy = base.clone();
        root_copy.id = new_base_id.clone();
        root_copy.base_file = Some(new_base_id.clone());
        overrides.apply(&mut root_copy);
        copies.push(root_copy);

        let derivatives: Vec<InstanceMetadata> = registry
            .find_instances(&InstanceFilter::of_kind(ContainerKind::Material).base_file(root_material_id))
            .into_iter()
            .filter(|m| m.id != root_material_id)
            .cloned()
            .collect();
        for source in derivatives {
            let mut id = new_base_id.clone();
            if source.definition != self.generic_definition_id {
                id.push('_');
                id.push_str(&source.definition);
                if let Some(variant) = source.variant.as_deref() {
                    id.push('_');
                    id.push_str(&variant.replace(' ', "_"));
                }
            }
            let id = free_id(&*registry, &copies, id);
            let mut copy = source;
            copy.id = id;
            copy.base_file = Some(new_base_id.clone());
            overrides.apply(&mut copy);
            copies.push(copy);
        }

        let count = copies.len();
        for copy in copies {
            registry.add_instance(copy)?;
        }
        tracing::info!(
            source = root_material_id,
            material = %new_base_id,
            containers = count,
            "Duplicated material"
        );

        if self.favorites.contains(root_material_id) {
            self.add_favorite(&new_base_id);
        }
        self.rebuild(&*registry);
        Ok(new_base_id)
    }

    /// Create a custom material by cloning the machine's preferred material
    /// at the extruder's diameter, with a fresh GUID.
    pub fn create_material(
        &mut self,
        registry: &mut dyn ContainerRegistry,
        definition: &DefinitionMetadata,
        approximate_diameter: &str,
    ) -> ProfileResult<String> {
        let preferred = definition
            .preferred_material
            .as_deref()
            .unwrap_or(DEFAULT_PREFERRED_MATERIAL);
        let source = self.root_material_id_for_diameter(&*registry, preferred, approximate_diameter);
        let new_id = registry.unique_name("custom_material");
        let overrides = MaterialOverrides {
            name: Some("Custom Material".to_string()),
            brand: Some("Custom".to_string()),
            guid: Some(Uuid::new_v4().to_string()),
            ..Default::default()
        };
        self.duplicate_material(registry, &source, Some(&new_id), &overrides)
    }

    // ========================================================================
    // FAVORITES
    // ========================================================================

    pub fn favorites(&self) -> &IndexSet<String> {
        &self.favorites
    }

    pub fn is_favorite(&self, root_material_id: &str) -> bool {
        self.favorites.contains(root_material_id)
    }

    pub fn add_favorite(&mut self, root_material_id: &str) {
        if self.favorites.insert(root_material_id.to_string()) {
            self.emit_favorites();
        }
    }

    /// Returns false, with a warning, when the id was not a favorite.
    pub fn remove_favorite(&mut self, root_material_id: &str) -> bool {
        if !self.favorites.shift_remove(root_material_id) {
            tracing::warn!(material = root_material_id, "Material was not a favorite");
            return false;
        }
        self.emit_favorites();
        true
    }

    fn emit_favorites(&mut self) {
        let event = FavoritesUpdated {
            favorites: self.favorites.iter().cloned().collect(),
        };
        self.favorites_updated.emit(&event);
    }
}

/// Ids of every material container whose `base_file` is `root_material_id`.
fn family_ids(registry: &dyn ContainerRegistry, root_material_id: &str) -> Vec<String> {
    registry
        .find_instances(&InstanceFilter::of_kind(ContainerKind::Material).base_file(root_material_id))
        .into_iter()
        .map(|m| m.id.clone())
        .collect()
}

/// `id`, or `id_2`, `id_3`... if the registry or a planned copy already
/// uses it.
fn free_id(registry: &dyn ContainerRegistry, planned: &[InstanceMetadata], id: String) -> String {
    let taken = |candidate: &str| {
        registry.instance(candidate).is_some() || planned.iter().any(|m| m.id == candidate)
    };
    if !taken(&id) {
        return id;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{id}_{counter}");
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
