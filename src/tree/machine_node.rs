//! Machine level of the lookup tree, and the quality-group resolution that
//! runs against it.

use indexmap::IndexMap;
use indexmap::map::Entry;

use super::{MaterialNode, QualityChangesGroup, QualityGroup, QualityNode, VariantNode};
use crate::base::constants::{
    EMPTY_MATERIAL, NO_VARIANT, NOT_SUPPORTED_QUALITY_TYPE, NOZZLE_HARDWARE_TYPE,
};
use crate::metadata::{ContainerKind, DefinitionMetadata, InstanceFilter, InstanceMetadata};
use crate::registry::ContainerRegistry;
use crate::stacks::ExtruderConfiguration;

/// Where a changed material node lives: (variant name, root material id).
pub(crate) type MaterialSlot = (String, String);

/// The definition id whose qualities a machine uses.
///
/// Machines without their own qualities share the generic set
/// (`default_definition_id`). Machines with `has_machine_quality` use the
/// `quality_definition` they declare, or their own id when they declare none.
pub fn machine_definition_id_for_quality_search(
    definition: &DefinitionMetadata,
    default_definition_id: &str,
) -> String {
    if !definition.has_machine_quality {
        return default_definition_id.to_string();
    }
    definition
        .quality_definition
        .clone()
        .unwrap_or_else(|| definition.id.clone())
}

/// `None` for the sentinel variant, which constrains nothing.
fn variant_constraint(variant_name: &str) -> Option<&str> {
    (variant_name != NO_VARIANT).then_some(variant_name)
}

fn variant_matches(metadata: &InstanceMetadata, variant_name: &str) -> bool {
    variant_constraint(variant_name).is_none_or(|v| metadata.variant.as_deref() == Some(v))
}

/// Put `metadata` into its quality-type slot unless a live quality already
/// occupies it. Returns true when the slot changed.
fn file_quality(node: &mut QualityNode, metadata: &InstanceMetadata) -> bool {
    if node.is_live() {
        return false;
    }
    node.set_container(Some(metadata.clone()))
}

/// One printer definition with every variant, material and quality it can
/// use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineNode {
    definition_id: String,
    name: String,
    quality_definition: String,
    /// Definition shared by every machine: generic materials and the fallback
    /// global qualities.
    generic_definition_id: String,
    /// Definition the global qualities came from. The generic definition when
    /// the machine ships no global qualities of its own.
    global_quality_definition: String,
    has_variants: bool,
    has_materials: bool,
    has_machine_materials: bool,
    has_machine_quality: bool,
    preferred_variant_name: Option<String>,
    preferred_material: Option<String>,
    preferred_quality_type: Option<String>,
    exclude_materials: Vec<String>,
    variants: IndexMap<String, VariantNode>,
    global_qualities: IndexMap<String, QualityNode>,
}

impl MachineNode {
    /// Build the node and every child from the registry contents.
    /// `generic_definition_id` names the definition shared by every machine.
    pub fn load(
        registry: &dyn ContainerRegistry,
        definition: &DefinitionMetadata,
        generic_definition_id: &str,
    ) -> Self {
        let quality_definition =
            machine_definition_id_for_quality_search(definition, generic_definition_id);
        let mut node = Self {
            definition_id: definition.id.clone(),
            name: definition.name.clone(),
            global_quality_definition: quality_definition.clone(),
            quality_definition,
            generic_definition_id: generic_definition_id.to_string(),
            has_variants: definition.has_variants,
            has_materials: definition.has_materials,
            has_machine_materials: definition.has_machine_materials,
            has_machine_quality: definition.has_machine_quality,
            preferred_variant_name: definition.preferred_variant_name.clone(),
            preferred_material: definition.preferred_material.clone(),
            preferred_quality_type: definition.preferred_quality_type.clone(),
            exclude_materials: definition.exclude_materials.clone(),
            variants: IndexMap::new(),
            global_qualities: IndexMap::new(),
        };
        node.load_global_qualities(registry);
        node.load_variants(registry);
        node.load_quality_changes(registry);
        node
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn definition_id(&self) -> &str {
        &self.definition_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quality_definition(&self) -> &str {
        &self.quality_definition
    }

    /// True while the machine borrows the generic global qualities because
    /// it has none of its own.
    pub fn uses_generic_global_qualities(&self) -> bool {
        self.global_quality_definition != self.quality_definition
    }

    pub fn has_variants(&self) -> bool {
        self.has_variants
    }

    pub fn has_materials(&self) -> bool {
        self.has_materials
    }

    pub fn has_machine_materials(&self) -> bool {
        self.has_machine_materials
    }

    pub fn has_machine_quality(&self) -> bool {
        self.has_machine_quality
    }

    pub fn preferred_variant_name(&self) -> Option<&str> {
        self.preferred_variant_name.as_deref()
    }

    pub fn preferred_material(&self) -> Option<&str> {
        self.preferred_material.as_deref()
    }

    pub fn preferred_quality_type(&self) -> Option<&str> {
        self.preferred_quality_type.as_deref()
    }

    pub fn exclude_materials(&self) -> &[String] {
        &self.exclude_materials
    }

    pub fn variants(&self) -> &IndexMap<String, VariantNode> {
        &self.variants
    }

    pub fn variant(&self, name: &str) -> Option<&VariantNode> {
        self.variants.get(name)
    }

    /// The preferred variant, or the first one when it is absent.
    pub fn preferred_variant(&self) -> Option<&VariantNode> {
        self.preferred_variant_name
            .as_deref()
            .and_then(|name| self.variants.get(name))
            .or_else(|| self.variants.values().next())
    }

    pub fn global_qualities(&self) -> &IndexMap<String, QualityNode> {
        &self.global_qualities
    }

    pub fn material_node(&self, variant_name: &str, base_file: &str) -> Option<&MaterialNode> {
        self.variants
            .get(variant_name)
            .and_then(|v| v.material(base_file))
    }

    // ========================================================================
    // QUALITY RESOLUTION
    // ========================================================================

    /// The quality nodes an enabled extruder draws from: its material's own
    /// qualities when it has any live one, otherwise the machine's global
    /// qualities.
    fn effective_qualities(&self, extruder: &ExtruderConfiguration) -> &IndexMap<String, QualityNode> {
        let variant_name = extruder.variant_name.as_deref().unwrap_or(NO_VARIANT);
        let base_file = extruder
            .material_base_file
            .as_deref()
            .unwrap_or(EMPTY_MATERIAL);
        match self.material_node(variant_name, base_file) {
            Some(material) if material.has_live_qualities() => material.qualities(),
            Some(_) => &self.global_qualities,
            None => {
                if extruder.material_base_file.is_some() {
                    tracing::warn!(
                        machine = %self.definition_id,
                        variant = variant_name,
                        material = base_file,
                        "Material not in container tree, using global qualities"
                    );
                }
                &self.global_qualities
            }
        }
    }

    /// One group per live global quality type.
    ///
    /// A type is available only if every enabled extruder's effective quality
    /// source has a live node for it. Disabled extruders are left out. With
    /// no enabled extruder at all, every group is available.
    pub fn quality_groups(&self, extruders: &[ExtruderConfiguration]) -> IndexMap<String, QualityGroup> {
        let mut groups: IndexMap<String, QualityGroup> = self
            .global_qualities
            .iter()
            .filter(|(_, node)| node.is_live())
            .map(|(quality_type, node)| {
                let mut group = QualityGroup::new(node.name(), quality_type.clone());
                group.node_for_global = Some(node.clone());
                (quality_type.clone(), group)
            })
            .collect();

        let enabled: Vec<&ExtruderConfiguration> = extruders.iter().filter(|e| e.enabled).collect();

        for extruder in &enabled {
            let source = self.effective_qualities(extruder);
            for (quality_type, group) in groups.iter_mut() {
                if let Some(node) = source.get(quality_type).filter(|n| n.is_live()) {
                    group.nodes_for_extruders.insert(extruder.position, node.clone());
                }
            }
        }

        if enabled.is_empty() {
            for group in groups.values_mut() {
                group.is_available = true;
            }
        } else {
            for group in groups.values_mut() {
                group.is_available = enabled
                    .iter()
                    .all(|e| group.nodes_for_extruders.contains_key(&e.position));
            }
        }
        groups
    }

    /// Custom profiles of this machine, grouped by name. A group is available
    /// when its quality type is. Profiles based on the "not_supported" type
    /// always are.
    pub fn quality_changes_groups(&self, extruders: &[ExtruderConfiguration]) -> Vec<QualityChangesGroup> {
        let quality_groups = self.quality_groups(extruders);

        let mut by_name: IndexMap<String, QualityChangesGroup> = IndexMap::new();
        for node in self.global_qualities.values() {
            for (name, containers) in node.quality_changes() {
                let group = by_name
                    .entry(name.clone())
                    .or_insert_with(|| QualityChangesGroup::new(name.clone(), node.quality_type()));
                for metadata in containers.values() {
                    group.add_metadata(metadata.clone());
                }
            }
        }

        for group in by_name.values_mut() {
            group.is_available = match quality_groups.get(&group.quality_type) {
                Some(quality_group) => quality_group.is_available,
                None => group.quality_type == NOT_SUPPORTED_QUALITY_TYPE,
            };
        }
        by_name.into_values().collect()
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// Fill the global quality nodes from the machine's own set, or from the
    /// generic set when it has none. Nodes already present stay in place.
    fn load_global_qualities(&mut self, registry: &dyn ContainerRegistry) {
        let filter = |definition: &str| {
            InstanceFilter::of_kind(ContainerKind::Quality)
                .definition(definition)
                .global_quality(true)
        };
        self.global_quality_definition = self.quality_definition.clone();
        let mut qualities = registry.find_instances(&filter(&self.quality_definition));
        if qualities.is_empty() && self.quality_definition != self.generic_definition_id {
            tracing::debug!(
                machine = %self.definition_id,
                "No global qualities of its own, using the generic ones"
            );
            self.global_quality_definition = self.generic_definition_id.clone();
            qualities = registry.find_instances(&filter(&self.generic_definition_id));
        }
        for metadata in qualities {
            if let Some(quality_type) = metadata.quality_type.as_deref() {
                let node = self
                    .global_qualities
                    .entry(quality_type.to_string())
                    .or_insert_with(|| QualityNode::new(quality_type));
                file_quality(node, metadata);
            }
        }
    }

    fn load_variants(&mut self, registry: &dyn ContainerRegistry) {
        let filter = InstanceFilter::of_kind(ContainerKind::Variant)
            .definition(&self.definition_id)
            .hardware_type(NOZZLE_HARDWARE_TYPE);
        for metadata in registry.find_instances(&filter) {
            if self.variants.contains_key(&metadata.name) {
                continue;
            }
            let mut variant = VariantNode::new(&metadata.name, self.preferred_material.clone());
            variant.set_container(Some(metadata.clone()));
            self.variants.insert(metadata.name.clone(), variant);
        }
        if self.variants.is_empty() {
            self.variants.insert(
                NO_VARIANT.to_string(),
                VariantNode::new(NO_VARIANT, self.preferred_material.clone()),
            );
        }

        let names: Vec<String> = self.variants.keys().cloned().collect();
        for name in names {
            let materials = self.build_materials(registry, &name);
            if let Some(variant) = self.variants.get_mut(&name) {
                *variant.materials_mut() = materials;
            }
        }
    }

    fn load_quality_changes(&mut self, registry: &dyn ContainerRegistry) {
        let filter = InstanceFilter::of_kind(ContainerKind::QualityChanges)
            .definition(&self.quality_definition);
        for metadata in registry.find_instances(&filter) {
            self.file_quality_changes(metadata);
        }
    }

    fn file_quality_changes(&mut self, metadata: &InstanceMetadata) -> bool {
        let Some(quality_type) = metadata.quality_type.as_deref() else {
            tracing::warn!(id = %metadata.id, "Quality changes without a quality type");
            return false;
        };
        self.global_qualities
            .entry(quality_type.to_string())
            .or_insert_with(|| QualityNode::new(quality_type))
            .insert_quality_changes(metadata.clone());
        true
    }

    /// Material nodes for one variant, each holding its most specific
    /// container.
    fn build_materials(
        &self,
        registry: &dyn ContainerRegistry,
        variant_name: &str,
    ) -> IndexMap<String, MaterialNode> {
        let mut materials = IndexMap::new();
        if !self.has_materials {
            materials.insert(EMPTY_MATERIAL.to_string(), MaterialNode::new(EMPTY_MATERIAL));
            return materials;
        }

        let mut best: IndexMap<String, (u8, &InstanceMetadata)> = IndexMap::new();
        for metadata in registry.find_instances(&InstanceFilter::of_kind(ContainerKind::Material)) {
            if self.is_excluded(metadata) {
                continue;
            }
            let Some(rank) = self.material_rank(metadata, variant_name) else {
                continue;
            };
            match best.entry(metadata.root_material_id().to_string()) {
                Entry::Occupied(mut slot) => {
                    if rank > slot.get().0 {
                        slot.insert((rank, metadata));
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert((rank, metadata));
                }
            }
        }

        for (base_file, (_, metadata)) in best {
            let mut node = MaterialNode::new(&base_file);
            node.set_container(Some(metadata.clone()));
            self.load_material_qualities(registry, variant_name, &mut node);
            materials.insert(base_file, node);
        }
        materials
    }

    fn load_material_qualities(
        &self,
        registry: &dyn ContainerRegistry,
        variant_name: &str,
        node: &mut MaterialNode,
    ) {
        let base_file = node.base_file().to_string();
        let qualities = InstanceFilter::of_kind(ContainerKind::Quality)
            .definition(&self.quality_definition)
            .material(&base_file);
        for metadata in registry.find_instances(&qualities) {
            if self.quality_applies(metadata, variant_name, &base_file)
                && let Some(quality_type) = metadata.quality_type.as_deref()
            {
                file_quality(node.quality_entry(quality_type), metadata);
            }
        }

        let intents = InstanceFilter::of_kind(ContainerKind::Intent)
            .definition(&self.definition_id)
            .material(&base_file);
        for metadata in registry.find_instances(&intents) {
            if self.intent_applies(metadata, variant_name, &base_file)
                && let Some(quality_type) = metadata.quality_type.as_deref()
            {
                node.quality_entry(quality_type).insert_intent(metadata.clone());
            }
        }
    }

    // ========================================================================
    // MATCHING RULES
    // ========================================================================

    fn is_excluded(&self, metadata: &InstanceMetadata) -> bool {
        self.exclude_materials
            .iter()
            .any(|id| *id == metadata.id || id == metadata.root_material_id())
    }

    /// How specific a material container is for `variant_name`: generic (0),
    /// machine-specific (1), variant-specific (2). `None` if it does not fit.
    fn material_rank(&self, metadata: &InstanceMetadata, variant_name: &str) -> Option<u8> {
        if metadata.kind != ContainerKind::Material {
            return None;
        }
        if metadata.definition == self.generic_definition_id {
            return metadata.variant.is_none().then_some(0);
        }
        if !self.has_machine_materials || metadata.definition != self.definition_id {
            return None;
        }
        match metadata.variant.as_deref() {
            None => Some(1),
            Some(variant) if variant_constraint(variant_name) == Some(variant) => Some(2),
            Some(_) => None,
        }
    }

    fn quality_applies(&self, metadata: &InstanceMetadata, variant_name: &str, base_file: &str) -> bool {
        metadata.kind == ContainerKind::Quality
            && !metadata.global_quality
            && metadata.definition == self.quality_definition
            && metadata.material.as_deref() == Some(base_file)
            && variant_matches(metadata, variant_name)
    }

    fn intent_applies(&self, metadata: &InstanceMetadata, variant_name: &str, base_file: &str) -> bool {
        metadata.kind == ContainerKind::Intent
            && metadata.definition == self.definition_id
            && metadata.material.as_deref() == Some(base_file)
            && variant_matches(metadata, variant_name)
    }

    fn is_global_quality(&self, metadata: &InstanceMetadata) -> bool {
        metadata.kind == ContainerKind::Quality
            && metadata.global_quality
            && metadata.definition == self.global_quality_definition
    }

    /// Best remaining material container for a slot, from the registry.
    fn resolve_material(
        &self,
        registry: &dyn ContainerRegistry,
        variant_name: &str,
        base_file: &str,
    ) -> Option<InstanceMetadata> {
        let filter = InstanceFilter::of_kind(ContainerKind::Material).base_file(base_file);
        registry
            .find_instances(&filter)
            .into_iter()
            .filter(|m| !self.is_excluded(m))
            .filter_map(|m| self.material_rank(m, variant_name).map(|rank| (rank, m)))
            .fold(None::<(u8, &InstanceMetadata)>, |best, candidate| match best {
                Some(current) if current.0 >= candidate.0 => Some(current),
                _ => Some(candidate),
            })
            .map(|(_, m)| m.clone())
    }

    // ========================================================================
    // INCREMENTAL UPDATES
    // ========================================================================

    /// Route a newly registered container into the tree. Returns the material
    /// slots whose node changed.
    pub(crate) fn on_container_added(
        &mut self,
        registry: &dyn ContainerRegistry,
        metadata: &InstanceMetadata,
    ) -> Vec<MaterialSlot> {
        match metadata.kind {
            ContainerKind::Variant => self.variant_added(registry, metadata),
            ContainerKind::Material => self.material_added(registry, metadata),
            ContainerKind::Quality => {
                self.quality_added(metadata);
                Vec::new()
            }
            ContainerKind::Intent => {
                self.intent_added(metadata);
                Vec::new()
            }
            ContainerKind::QualityChanges => {
                if metadata.definition == self.quality_definition {
                    self.file_quality_changes(metadata);
                }
                Vec::new()
            }
            ContainerKind::User | ContainerKind::DefinitionChanges => Vec::new(),
        }
    }

    /// Forget a container the registry no longer has. Nodes stay in place.
    pub(crate) fn on_container_removed(
        &mut self,
        registry: &dyn ContainerRegistry,
        metadata: &InstanceMetadata,
    ) -> Vec<MaterialSlot> {
        let id = metadata.id.as_str();
        match metadata.kind {
            ContainerKind::Variant => {
                for variant in self.variants.values_mut() {
                    if variant.container_id() == Some(id) {
                        variant.set_container(None);
                    }
                }
                Vec::new()
            }
            ContainerKind::Material => self.material_removed(registry, metadata),
            ContainerKind::Quality => {
                for node in self.all_quality_nodes_mut() {
                    node.clear_container_if(id);
                }
                if metadata.global_quality && !self.global_qualities.values().any(QualityNode::is_live) {
                    self.load_global_qualities(registry);
                }
                Vec::new()
            }
            ContainerKind::Intent => {
                for node in self.all_quality_nodes_mut() {
                    node.remove_intent(id);
                }
                Vec::new()
            }
            ContainerKind::QualityChanges => {
                for node in self.global_qualities.values_mut() {
                    node.remove_quality_changes(id);
                }
                Vec::new()
            }
            ContainerKind::User | ContainerKind::DefinitionChanges => Vec::new(),
        }
    }

    /// Metadata changes are a removal of the old record plus an addition of
    /// the new one.
    pub(crate) fn on_container_metadata_changed(
        &mut self,
        registry: &dyn ContainerRegistry,
        previous: &InstanceMetadata,
        current: &InstanceMetadata,
    ) -> Vec<MaterialSlot> {
        let mut changes = self.on_container_removed(registry, previous);
        for slot in self.on_container_added(registry, current) {
            if !changes.contains(&slot) {
                changes.push(slot);
            }
        }
        changes
    }

    fn variant_added(
        &mut self,
        registry: &dyn ContainerRegistry,
        metadata: &InstanceMetadata,
    ) -> Vec<MaterialSlot> {
        if metadata.definition != self.definition_id
            || metadata.hardware_type.as_deref() != Some(NOZZLE_HARDWARE_TYPE)
        {
            return Vec::new();
        }
        if let Some(variant) = self.variants.get_mut(&metadata.name) {
            variant.set_container(Some(metadata.clone()));
            return Vec::new();
        }

        let mut variant = VariantNode::new(&metadata.name, self.preferred_material.clone());
        variant.set_container(Some(metadata.clone()));
        *variant.materials_mut() = self.build_materials(registry, &metadata.name);
        let changes = variant
            .materials()
            .keys()
            .map(|base_file| (metadata.name.clone(), base_file.clone()))
            .collect();
        tracing::debug!(machine = %self.definition_id, variant = %metadata.name, "Variant node added");
        self.variants.insert(metadata.name.clone(), variant);
        changes
    }

    fn material_added(
        &mut self,
        registry: &dyn ContainerRegistry,
        metadata: &InstanceMetadata,
    ) -> Vec<MaterialSlot> {
        if !self.has_materials || self.is_excluded(metadata) {
            return Vec::new();
        }
        let base_file = metadata.root_material_id().to_string();
        let mut changes = Vec::new();

        let names: Vec<String> = self.variants.keys().cloned().collect();
        for name in names {
            let Some(rank) = self.material_rank(metadata, &name) else {
                continue;
            };
            let existing = self.material_node(&name, &base_file);
            let current_rank = existing
                .and_then(MaterialNode::container)
                .and_then(|c| self.material_rank(c, &name));
            if current_rank.is_some_and(|current| current >= rank) {
                continue;
            }

            if existing.is_some() {
                if let Some(node) = self
                    .variants
                    .get_mut(&name)
                    .and_then(|v| v.materials_mut().get_mut(&base_file))
                {
                    node.set_container(Some(metadata.clone()));
                }
            } else {
                let mut node = MaterialNode::new(&base_file);
                node.set_container(Some(metadata.clone()));
                self.load_material_qualities(registry, &name, &mut node);
                if let Some(variant) = self.variants.get_mut(&name) {
                    variant.materials_mut().insert(base_file.clone(), node);
                }
            }
            changes.push((name, base_file.clone()));
        }
        changes
    }

    fn material_removed(
        &mut self,
        registry: &dyn ContainerRegistry,
        metadata: &InstanceMetadata,
    ) -> Vec<MaterialSlot> {
        let base_file = metadata.root_material_id().to_string();
        let mut changes = Vec::new();

        let names: Vec<String> = self.variants.keys().cloned().collect();
        for name in names {
            let holds_removed = self
                .material_node(&name, &base_file)
                .is_some_and(|n| n.container_id() == Some(metadata.id.as_str()));
            if !holds_removed {
                continue;
            }
            let replacement = self.resolve_material(registry, &name, &base_file);
            if let Some(node) = self
                .variants
                .get_mut(&name)
                .and_then(|v| v.materials_mut().get_mut(&base_file))
            {
                node.set_container(replacement);
                changes.push((name, base_file.clone()));
            }
        }
        changes
    }

    fn quality_added(&mut self, metadata: &InstanceMetadata) {
        let Some(quality_type) = metadata.quality_type.clone() else {
            return;
        };
        if self.uses_generic_global_qualities()
            && metadata.kind == ContainerKind::Quality
            && metadata.global_quality
            && metadata.definition == self.quality_definition
        {
            self.drop_generic_global_qualities();
        }
        if self.is_global_quality(metadata) {
            let node = self
                .global_qualities
                .entry(quality_type.clone())
                .or_insert_with(|| QualityNode::new(&quality_type));
            file_quality(node, metadata);
        }

        let Some(base_file) = metadata.material.clone() else {
            return;
        };
        let names: Vec<String> = self.variants.keys().cloned().collect();
        for name in names {
            if !self.quality_applies(metadata, &name, &base_file) {
                continue;
            }
            if let Some(material) = self
                .variants
                .get_mut(&name)
                .and_then(|v| v.materials_mut().get_mut(&base_file))
            {
                file_quality(material.quality_entry(&quality_type), metadata);
            }
        }
    }

    /// The first global quality of the machine's own replaces the whole
    /// generic set. Nodes holding custom profiles stay as placeholders.
    fn drop_generic_global_qualities(&mut self) {
        tracing::debug!(
            machine = %self.definition_id,
            "Own global qualities arrived, leaving the generic ones"
        );
        self.global_quality_definition = self.quality_definition.clone();
        for node in self.global_qualities.values_mut() {
            node.set_container(None);
        }
        self.global_qualities
            .retain(|_, node| !node.quality_changes().is_empty());
    }

    fn intent_added(&mut self, metadata: &InstanceMetadata) {
        let (Some(quality_type), Some(base_file)) =
            (metadata.quality_type.clone(), metadata.material.clone())
        else {
            return;
        };
        let names: Vec<String> = self.variants.keys().cloned().collect();
        for name in names {
            if !self.intent_applies(metadata, &name, &base_file) {
                continue;
            }
            if let Some(material) = self
                .variants
                .get_mut(&name)
                .and_then(|v| v.materials_mut().get_mut(&base_file))
            {
                material.quality_entry(&quality_type).insert_intent(metadata.clone());
            }
        }
    }

    fn all_quality_nodes_mut(&mut self) -> impl Iterator<Item = &mut QualityNode> {
        self.global_qualities.values_mut().chain(
            self.variants
                .values_mut()
                .flat_map(|v| v.materials_mut().values_mut())
                .flat_map(MaterialNode::qualities_mut),
        )
    }
}
