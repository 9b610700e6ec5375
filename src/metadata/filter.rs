//! Metadata filters used to query the container registry.
//!
//! A filter is a conjunction of field constraints. Unset fields match
//! anything. Fields that can legitimately be absent on a container
//! (`variant`, `position`) distinguish "don't care" (`None`) from "must be
//! absent" (`Some(None)`).

use super::{ContainerKind, DefinitionKind, DefinitionMetadata, InstanceMetadata};

/// Filter over [`InstanceMetadata`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceFilter {
    pub id: Option<String>,
    pub name: Option<String>,
    pub kind: Option<ContainerKind>,
    pub definition: Option<String>,
    pub base_file: Option<String>,
    pub guid: Option<String>,
    pub material_type: Option<String>,
    pub material: Option<String>,
    pub brand: Option<String>,
    pub color_name: Option<String>,
    pub approximate_diameter: Option<String>,
    pub variant: Option<Option<String>>,
    pub hardware_type: Option<String>,
    pub quality_type: Option<String>,
    pub intent_category: Option<String>,
    pub position: Option<Option<usize>>,
    pub global_quality: Option<bool>,
}

fn field_matches(expected: &Option<String>, actual: &str) -> bool {
    expected.as_deref().is_none_or(|e| e == actual)
}

fn optional_matches(expected: &Option<String>, actual: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(e) => actual == Some(e.as_str()),
    }
}

impl InstanceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a filter on kind only.
    pub fn of_kind(kind: ContainerKind) -> Self {
        Self::default().kind(kind)
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn kind(mut self, kind: ContainerKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    pub fn base_file(mut self, base_file: impl Into<String>) -> Self {
        self.base_file = Some(base_file.into());
        self
    }

    pub fn guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    pub fn material_type(mut self, material_type: impl Into<String>) -> Self {
        self.material_type = Some(material_type.into());
        self
    }

    pub fn material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn color_name(mut self, color_name: impl Into<String>) -> Self {
        self.color_name = Some(color_name.into());
        self
    }

    pub fn approximate_diameter(mut self, diameter: impl Into<String>) -> Self {
        self.approximate_diameter = Some(diameter.into());
        self
    }

    pub fn variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(Some(variant.into()));
        self
    }

    /// Match only containers that are not specific to any variant.
    pub fn without_variant(mut self) -> Self {
        self.variant = Some(None);
        self
    }

    /// Constrain the variant when one is given, require its absence otherwise.
    pub fn variant_opt(mut self, variant: Option<&str>) -> Self {
        self.variant = Some(variant.map(str::to_string));
        self
    }

    pub fn hardware_type(mut self, hardware_type: impl Into<String>) -> Self {
        self.hardware_type = Some(hardware_type.into());
        self
    }

    pub fn quality_type(mut self, quality_type: impl Into<String>) -> Self {
        self.quality_type = Some(quality_type.into());
        self
    }

    pub fn intent_category(mut self, category: impl Into<String>) -> Self {
        self.intent_category = Some(category.into());
        self
    }

    pub fn position(mut self, position: Option<usize>) -> Self {
        self.position = Some(position);
        self
    }

    pub fn global_quality(mut self, global: bool) -> Self {
        self.global_quality = Some(global);
        self
    }

    /// Check every constraint against `metadata`.
    pub fn matches(&self, metadata: &InstanceMetadata) -> bool {
        field_matches(&self.id, &metadata.id)
            && field_matches(&self.name, &metadata.name)
            && self.kind.is_none_or(|k| k == metadata.kind)
            && field_matches(&self.definition, &metadata.definition)
            && optional_matches(&self.base_file, metadata.base_file.as_deref())
            && optional_matches(&self.guid, metadata.guid.as_deref())
            && optional_matches(&self.material_type, metadata.material_type.as_deref())
            && optional_matches(&self.material, metadata.material.as_deref())
            && optional_matches(&self.brand, metadata.brand.as_deref())
            && optional_matches(&self.color_name, metadata.color_name.as_deref())
            && optional_matches(
                &self.approximate_diameter,
                metadata.approximate_diameter.as_deref(),
            )
            && self
                .variant
                .as_ref()
                .is_none_or(|v| v.as_deref() == metadata.variant.as_deref())
            && optional_matches(&self.hardware_type, metadata.hardware_type.as_deref())
            && optional_matches(&self.quality_type, metadata.quality_type.as_deref())
            && optional_matches(&self.intent_category, metadata.intent_category.as_deref())
            && self.position.is_none_or(|p| p == metadata.position)
            && self
                .global_quality
                .is_none_or(|g| g == metadata.global_quality)
    }
}

/// Filter over [`DefinitionMetadata`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionFilter {
    pub id: Option<String>,
    pub kind: Option<DefinitionKind>,
    pub inherits: Option<String>,
}

impl DefinitionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn kind(mut self, kind: DefinitionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn inherits(mut self, parent: impl Into<String>) -> Self {
        self.inherits = Some(parent.into());
        self
    }

    pub fn matches(&self, metadata: &DefinitionMetadata) -> bool {
        field_matches(&self.id, &metadata.id)
            && self.kind.is_none_or(|k| k == metadata.kind)
            && optional_matches(&self.inherits, metadata.inherits.as_deref())
    }
}
