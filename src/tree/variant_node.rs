//! Variant (nozzle) level of the lookup tree.

use indexmap::IndexMap;

use super::MaterialNode;
use crate::metadata::InstanceMetadata;

/// A nozzle variant of one machine. Machines without nozzle variants get a
/// single node under the `NO_VARIANT` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantNode {
    name: String,
    container: Option<InstanceMetadata>,
    /// Copied from the machine so the node can pick a default on its own.
    preferred_material: Option<String>,
    materials: IndexMap<String, MaterialNode>,
}

impl VariantNode {
    pub fn new(name: impl Into<String>, preferred_material: Option<String>) -> Self {
        Self {
            name: name.into(),
            container: None,
            preferred_material,
            materials: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container(&self) -> Option<&InstanceMetadata> {
        self.container.as_ref()
    }

    pub fn container_id(&self) -> Option<&str> {
        self.container.as_ref().map(|m| m.id.as_str())
    }

    pub fn materials(&self) -> &IndexMap<String, MaterialNode> {
        &self.materials
    }

    pub fn material(&self, base_file: &str) -> Option<&MaterialNode> {
        self.materials.get(base_file)
    }

    /// Default material for an extruder taking filament of
    /// `approximate_diameter`.
    ///
    /// Tries the machine's preferred material at that diameter, then any
    /// material at that diameter, then the preferred material, then the first
    /// material in insertion order.
    pub fn preferred_material(&self, approximate_diameter: f64) -> Option<&MaterialNode> {
        let diameter_matches = |node: &MaterialNode| {
            node.approximate_diameter()
                .is_some_and(|d| d.round() == approximate_diameter.round())
        };
        let preferred = self
            .preferred_material
            .as_deref()
            .and_then(|id| self.materials.get(id));

        if let Some(node) = preferred.filter(|n| diameter_matches(n)) {
            return Some(node);
        }
        if let Some(node) = self.materials.values().find(|n| diameter_matches(n)) {
            return Some(node);
        }
        tracing::debug!(
            variant = %self.name,
            approximate_diameter,
            "No material matches the diameter, using a fallback"
        );
        preferred.or_else(|| self.materials.values().next())
    }

    pub(crate) fn set_container(&mut self, metadata: Option<InstanceMetadata>) {
        self.container = metadata;
    }

    pub(crate) fn materials_mut(&mut self) -> &mut IndexMap<String, MaterialNode> {
        &mut self.materials
    }
}
