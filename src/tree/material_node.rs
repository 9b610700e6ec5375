//! Material level of the lookup tree.

use indexmap::IndexMap;

use super::QualityNode;
use crate::metadata::InstanceMetadata;

/// One material family (root material id) as seen by one machine and variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialNode {
    base_file: String,
    /// The most specific material container for this machine and variant.
    container: Option<InstanceMetadata>,
    qualities: IndexMap<String, QualityNode>,
}

impl MaterialNode {
    pub fn new(base_file: impl Into<String>) -> Self {
        Self {
            base_file: base_file.into(),
            container: None,
            qualities: IndexMap::new(),
        }
    }

    pub fn base_file(&self) -> &str {
        &self.base_file
    }

    pub fn container(&self) -> Option<&InstanceMetadata> {
        self.container.as_ref()
    }

    pub fn container_id(&self) -> Option<&str> {
        self.container.as_ref().map(|m| m.id.as_str())
    }

    pub fn is_live(&self) -> bool {
        self.container.is_some()
    }

    pub fn qualities(&self) -> &IndexMap<String, QualityNode> {
        &self.qualities
    }

    pub fn quality(&self, quality_type: &str) -> Option<&QualityNode> {
        self.qualities.get(quality_type)
    }

    pub fn live_qualities(&self) -> impl Iterator<Item = &QualityNode> {
        self.qualities.values().filter(|q| q.is_live())
    }

    /// A material with no live quality of its own takes the machine's global
    /// qualities instead.
    pub fn has_live_qualities(&self) -> bool {
        self.live_qualities().next().is_some()
    }

    pub fn approximate_diameter(&self) -> Option<f64> {
        self.container
            .as_ref()
            .and_then(InstanceMetadata::approximate_diameter_value)
    }

    pub fn material_type(&self) -> Option<&str> {
        self.container
            .as_ref()
            .and_then(|m| m.material_type.as_deref())
    }

    pub(crate) fn set_container(&mut self, metadata: Option<InstanceMetadata>) -> bool {
        let changed =
            self.container.as_ref().map(|m| &m.id) != metadata.as_ref().map(|m| &m.id);
        self.container = metadata;
        changed
    }

    pub(crate) fn quality_entry(&mut self, quality_type: &str) -> &mut QualityNode {
        self.qualities
            .entry(quality_type.to_string())
            .or_insert_with(|| QualityNode::new(quality_type))
    }

    pub(crate) fn qualities_mut(&mut self) -> impl Iterator<Item = &mut QualityNode> {
        self.qualities.values_mut()
    }
}
