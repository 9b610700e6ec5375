//! Typed container metadata.
//!
//! Every profile container in the registry carries one of two metadata
//! records: [`DefinitionMetadata`] for machine and extruder definitions, and
//! [`InstanceMetadata`] for everything layered on top of a definition
//! (variants, materials, qualities, quality changes, intents). Known keys are
//! named fields. Anything vendor-specific lands in the residual `extra` map.

mod filter;

pub use filter::{DefinitionFilter, InstanceFilter};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::base::constants::GENERIC_DEFINITION_ID;

// ============================================================================
// CONTAINER KINDS
// ============================================================================

/// The kind of an instance container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Variant,
    Material,
    Quality,
    QualityChanges,
    Intent,
    User,
    DefinitionChanges,
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Variant => "variant",
            ContainerKind::Material => "material",
            ContainerKind::Quality => "quality",
            ContainerKind::QualityChanges => "quality_changes",
            ContainerKind::Intent => "intent",
            ContainerKind::User => "user",
            ContainerKind::DefinitionChanges => "definition_changes",
        }
    }
}

/// Whether a definition describes a whole printer or one of its extruders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    #[default]
    Machine,
    Extruder,
}

// ============================================================================
// INSTANCE METADATA
// ============================================================================

/// Metadata of a variant, material, quality, quality-changes or intent
/// container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMetadata {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub kind: ContainerKind,
    /// The definition this container is made for.
    #[serde(default = "generic_definition")]
    pub definition: String,
    /// Root material id (materials only). Equal to `id` on the root container.
    #[serde(default)]
    pub base_file: Option<String>,
    #[serde(default)]
    pub guid: Option<String>,
    /// Material family ("PLA", "ABS"). Materials only.
    #[serde(default)]
    pub material_type: Option<String>,
    /// Root material id a quality or intent applies to.
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub color_name: Option<String>,
    #[serde(default)]
    pub approximate_diameter: Option<String>,
    /// Variant (nozzle) name this container is specific to.
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub hardware_type: Option<String>,
    #[serde(default)]
    pub quality_type: Option<String>,
    #[serde(default)]
    pub intent_category: Option<String>,
    /// Extruder position for per-extruder quality changes.
    #[serde(default)]
    pub position: Option<usize>,
    /// True for qualities that apply to the whole machine.
    #[serde(default)]
    pub global_quality: bool,
    #[serde(default)]
    pub setting_version: Option<u32>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

fn generic_definition() -> String {
    GENERIC_DEFINITION_ID.to_string()
}

impl InstanceMetadata {
    /// Create metadata with only an id and kind. The name defaults to the id
    /// and the definition to the generic machine.
    pub fn new(id: impl Into<String>, kind: ContainerKind) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            definition: generic_definition(),
            base_file: None,
            guid: None,
            material_type: None,
            material: None,
            brand: None,
            color_name: None,
            approximate_diameter: None,
            variant: None,
            hardware_type: None,
            quality_type: None,
            intent_category: None,
            position: None,
            global_quality: false,
            setting_version: None,
            extra: BTreeMap::new(),
        }
    }

    /// A root material container: `base_file` is its own id.
    pub fn material(id: impl Into<String>, material_type: impl Into<String>) -> Self {
        let mut metadata = Self::new(id, ContainerKind::Material);
        metadata.base_file = Some(metadata.id.clone());
        metadata.material_type = Some(material_type.into());
        metadata
    }

    pub fn quality(id: impl Into<String>, quality_type: impl Into<String>) -> Self {
        let mut metadata = Self::new(id, ContainerKind::Quality);
        metadata.quality_type = Some(quality_type.into());
        metadata
    }

    pub fn variant(id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut metadata = Self::new(id, ContainerKind::Variant);
        metadata.name = name.into();
        metadata.hardware_type = Some(crate::base::constants::NOZZLE_HARDWARE_TYPE.to_string());
        metadata
    }

    pub fn intent(
        id: impl Into<String>,
        intent_category: impl Into<String>,
        quality_type: impl Into<String>,
    ) -> Self {
        let mut metadata = Self::new(id, ContainerKind::Intent);
        metadata.intent_category = Some(intent_category.into());
        metadata.quality_type = Some(quality_type.into());
        metadata
    }

    pub fn quality_changes(
        id: impl Into<String>,
        name: impl Into<String>,
        quality_type: impl Into<String>,
    ) -> Self {
        let mut metadata = Self::new(id, ContainerKind::QualityChanges);
        metadata.name = name.into();
        metadata.quality_type = Some(quality_type.into());
        metadata
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    pub fn with_base_file(mut self, base_file: impl Into<String>) -> Self {
        self.base_file = Some(base_file.into());
        self
    }

    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_color(mut self, color_name: impl Into<String>) -> Self {
        self.color_name = Some(color_name.into());
        self
    }

    pub fn with_diameter(mut self, approximate_diameter: impl Into<String>) -> Self {
        self.approximate_diameter = Some(approximate_diameter.into());
        self
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_intent_category(mut self, category: impl Into<String>) -> Self {
        self.intent_category = Some(category.into());
        self
    }

    pub fn as_global_quality(mut self) -> Self {
        self.global_quality = true;
        self
    }

    /// The diameter-independent family id. Falls back to the container id for
    /// containers that carry no `base_file`.
    pub fn root_material_id(&self) -> &str {
        self.base_file.as_deref().unwrap_or(&self.id)
    }

    /// True for the root container of a material family.
    pub fn is_root_material(&self) -> bool {
        self.kind == ContainerKind::Material && self.base_file.as_deref() == Some(self.id.as_str())
    }

    /// Approximate diameter parsed as a number, if present and numeric.
    pub fn approximate_diameter_value(&self) -> Option<f64> {
        self.approximate_diameter
            .as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok())
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

// ============================================================================
// DEFINITION METADATA
// ============================================================================

/// Metadata of a machine or extruder definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionMetadata {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: DefinitionKind,
    #[serde(default)]
    pub inherits: Option<String>,
    #[serde(default)]
    pub has_variants: bool,
    #[serde(default)]
    pub has_materials: bool,
    #[serde(default)]
    pub has_machine_materials: bool,
    #[serde(default)]
    pub has_machine_quality: bool,
    /// Definition whose qualities this machine shares.
    #[serde(default)]
    pub quality_definition: Option<String>,
    #[serde(default)]
    pub preferred_variant_name: Option<String>,
    #[serde(default)]
    pub preferred_material: Option<String>,
    #[serde(default)]
    pub preferred_quality_type: Option<String>,
    /// Root material ids this machine cannot print.
    #[serde(default)]
    pub exclude_materials: Vec<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl DefinitionMetadata {
    /// A machine definition with every capability flag off.
    pub fn machine(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind: DefinitionKind::Machine,
            inherits: Some(GENERIC_DEFINITION_ID.to_string()),
            has_variants: false,
            has_materials: false,
            has_machine_materials: false,
            has_machine_quality: false,
            quality_definition: None,
            preferred_variant_name: None,
            preferred_material: None,
            preferred_quality_type: None,
            exclude_materials: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn extruder(id: impl Into<String>) -> Self {
        let mut metadata = Self::machine(id);
        metadata.kind = DefinitionKind::Extruder;
        metadata.inherits = Some("fdmextruder".to_string());
        metadata
    }

    pub fn with_variants(mut self) -> Self {
        self.has_variants = true;
        self
    }

    pub fn with_materials(mut self) -> Self {
        self.has_materials = true;
        self
    }

    pub fn with_machine_materials(mut self) -> Self {
        self.has_machine_materials = true;
        self
    }

    pub fn with_machine_quality(mut self) -> Self {
        self.has_machine_quality = true;
        self
    }

    pub fn with_quality_definition(mut self, definition: impl Into<String>) -> Self {
        self.quality_definition = Some(definition.into());
        self
    }

    pub fn with_preferred_variant(mut self, name: impl Into<String>) -> Self {
        self.preferred_variant_name = Some(name.into());
        self
    }

    pub fn with_preferred_material(mut self, material: impl Into<String>) -> Self {
        self.preferred_material = Some(material.into());
        self
    }

    pub fn with_preferred_quality_type(mut self, quality_type: impl Into<String>) -> Self {
        self.preferred_quality_type = Some(quality_type.into());
        self
    }

    pub fn is_machine(&self) -> bool {
        self.kind == DefinitionKind::Machine
    }
}
