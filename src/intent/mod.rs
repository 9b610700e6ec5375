//! Intent profiles: print-style presets layered above quality.
//!
//! Intent availability is a union over the used extruders, unlike quality
//! availability, which is an intersection. Selecting an intent never fails:
//! an extruder without a matching profile gets [`EMPTY_INTENT`].

use indexmap::IndexSet;

use crate::base::constants::{
    DEFAULT_INTENT_CATEGORY, DEFAULT_QUALITY_TYPE, EMPTY_INTENT,
};
use crate::metadata::{ContainerKind, InstanceFilter, InstanceMetadata};
use crate::quality::QualityManager;
use crate::registry::ContainerRegistry;
use crate::stacks::{ActiveConfiguration, ExtruderConfiguration, MachineStacks};
use crate::tree::ContainerTree;

/// An (intent category, quality type) pair offered to the user.
pub type IntentChoice = (String, String);

#[derive(Debug, Clone, Copy, Default)]
pub struct IntentManager;

impl IntentManager {
    pub fn new() -> Self {
        Self
    }

    /// The sentinel every extruder falls back to.
    pub fn default_intent(&self) -> &'static str {
        EMPTY_INTENT
    }

    /// Intent containers for one machine, nozzle and material. A `None`
    /// variant only matches intents without a variant.
    pub fn intent_metadatas<'r>(
        &self,
        registry: &'r dyn ContainerRegistry,
        definition_id: &str,
        variant_name: Option<&str>,
        material_base_file: &str,
    ) -> Vec<&'r InstanceMetadata> {
        let filter = InstanceFilter::of_kind(ContainerKind::Intent)
            .definition(definition_id)
            .variant_opt(variant_name)
            .material(material_base_file);
        registry.find_instances(&filter)
    }

    /// Categories available for one configuration. `"default"` is always
    /// present and listed first.
    pub fn intent_categories(
        &self,
        registry: &dyn ContainerRegistry,
        definition_id: &str,
        variant_name: Option<&str>,
        material_base_file: &str,
    ) -> IndexSet<String> {
        let mut categories = IndexSet::new();
        categories.insert(DEFAULT_INTENT_CATEGORY.to_string());
        for metadata in self.intent_metadatas(registry, definition_id, variant_name, material_base_file) {
            if let Some(category) = &metadata.intent_category {
                categories.insert(category.clone());
            }
        }
        categories
    }

    /// Every (category, quality type) some used extruder can print, limited
    /// to quality types available on the machine.
    ///
    /// Without a configuration the answer is `("default", "normal")`.
    pub fn current_available_intents(
        &self,
        tree: &ContainerTree,
        registry: &dyn ContainerRegistry,
        configuration: Option<&ActiveConfiguration>,
    ) -> IndexSet<IntentChoice> {
        let Some(configuration) = configuration else {
            return IndexSet::from([(
                DEFAULT_INTENT_CATEGORY.to_string(),
                DEFAULT_QUALITY_TYPE.to_string(),
            )]);
        };
        let available_quality_types: IndexSet<String> = tree
            .current_quality_groups(Some(configuration))
            .into_iter()
            .filter(|(_, group)| group.is_available)
            .map(|(quality_type, _)| quality_type)
            .collect();

        let mut result = IndexSet::new();
        for extruder in configuration.enabled_extruders() {
            let Some(base_file) = extruder.material_base_file.as_deref() else {
                continue;
            };
            for metadata in self.intent_metadatas(
                registry,
                &configuration.definition_id,
                extruder.variant_name.as_deref(),
                base_file,
            ) {
                let (Some(category), Some(quality_type)) =
                    (&metadata.intent_category, &metadata.quality_type)
                else {
                    continue;
                };
                if available_quality_types.contains(quality_type) {
                    result.insert((category.clone(), quality_type.clone()));
                }
            }
        }
        result
    }

    /// Union of the categories of every used extruder. Unlike quality types,
    /// only the current configuration counts.
    pub fn current_available_intent_categories(
        &self,
        registry: &dyn ContainerRegistry,
        configuration: Option<&ActiveConfiguration>,
    ) -> IndexSet<String> {
        let mut categories = IndexSet::from([DEFAULT_INTENT_CATEGORY.to_string()]);
        let Some(configuration) = configuration else {
            return categories;
        };
        for extruder in configuration.enabled_extruders() {
            let Some(base_file) = extruder.material_base_file.as_deref() else {
                continue;
            };
            categories.extend(self.intent_categories(
                registry,
                &configuration.definition_id,
                extruder.variant_name.as_deref(),
                base_file,
            ));
        }
        categories
    }

    /// The intent container an extruder gets for a category and quality type.
    fn matching_intent(
        &self,
        registry: &dyn ContainerRegistry,
        definition_id: &str,
        extruder: &ExtruderConfiguration,
        category: &str,
        quality_type: &str,
    ) -> String {
        let Some(base_file) = extruder.material_base_file.as_deref() else {
            return EMPTY_INTENT.to_string();
        };
        let filter = InstanceFilter::of_kind(ContainerKind::Intent)
            .definition(definition_id)
            .variant_opt(extruder.variant_name.as_deref())
            .material(base_file)
            .quality_type(quality_type)
            .intent_category(category);
        registry
            .find_instances(&filter)
            .first()
            .map(|m| m.id.clone())
            .unwrap_or_else(|| EMPTY_INTENT.to_string())
    }

    /// Put the best intent for (category, quality type) on every used
    /// extruder of the active machine, then apply the quality group of that
    /// type. Returns false only without an active machine.
    pub fn select_intent(
        &self,
        registry: &dyn ContainerRegistry,
        tree: &ContainerTree,
        quality: &QualityManager,
        stacks: &mut MachineStacks,
        category: &str,
        quality_type: &str,
    ) -> bool {
        let Some(machine) = stacks.active_mut() else {
            return false;
        };
        let definition_id = machine.definition_id.clone();
        for extruder in machine.used_extruders_mut() {
            let intent_id = self.matching_intent(
                registry,
                &definition_id,
                &extruder.configuration(),
                category,
                quality_type,
            );
            if intent_id == EMPTY_INTENT && category != DEFAULT_INTENT_CATEGORY {
                tracing::debug!(
                    extruder = extruder.position,
                    category,
                    quality_type,
                    "No matching intent, using the empty intent"
                );
            }
            extruder.intent_id = intent_id;
        }
        quality.set_quality_group_by_quality_type(tree, stacks, quality_type);
        true
    }

    /// Reset every used extruder of the active machine to the empty intent.
    pub fn select_default_intent(&self, stacks: &mut MachineStacks) {
        if let Some(machine) = stacks.active_mut() {
            for extruder in machine.used_extruders_mut() {
                extruder.intent_id = EMPTY_INTENT.to_string();
            }
        }
    }
}
