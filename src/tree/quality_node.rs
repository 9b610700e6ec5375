//! Leaf of the lookup tree: one quality type.

use indexmap::IndexMap;

use crate::metadata::InstanceMetadata;

/// A quality type under a material node, or directly under a machine as one
/// of its global qualities.
///
/// The node outlives its container. When the quality profile is removed,
/// `container` goes back to `None` and the node stays as a placeholder.
/// Intents refining this quality, and custom profiles (quality changes)
/// derived from it, hang off the node keyed by id and by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityNode {
    quality_type: String,
    container: Option<InstanceMetadata>,
    intents: IndexMap<String, InstanceMetadata>,
    /// Quality-changes name -> container id -> metadata.
    quality_changes: IndexMap<String, IndexMap<String, InstanceMetadata>>,
}

impl QualityNode {
    /// A placeholder with no container yet.
    pub fn new(quality_type: impl Into<String>) -> Self {
        Self {
            quality_type: quality_type.into(),
            container: None,
            intents: IndexMap::new(),
            quality_changes: IndexMap::new(),
        }
    }

    pub fn with_container(mut self, metadata: InstanceMetadata) -> Self {
        self.container = Some(metadata);
        self
    }

    pub fn quality_type(&self) -> &str {
        &self.quality_type
    }

    pub fn container(&self) -> Option<&InstanceMetadata> {
        self.container.as_ref()
    }

    pub fn container_id(&self) -> Option<&str> {
        self.container.as_ref().map(|m| m.id.as_str())
    }

    /// Display name of the quality profile, or the quality type for a
    /// placeholder.
    pub fn name(&self) -> &str {
        self.container
            .as_ref()
            .map(|m| m.name.as_str())
            .unwrap_or(&self.quality_type)
    }

    /// Only nodes backed by a container count toward availability.
    pub fn is_live(&self) -> bool {
        self.container.is_some()
    }

    pub fn intents(&self) -> impl Iterator<Item = &InstanceMetadata> {
        self.intents.values()
    }

    /// First intent of `category` refining this quality.
    pub fn intent(&self, category: &str) -> Option<&InstanceMetadata> {
        self.intents
            .values()
            .find(|m| m.intent_category.as_deref() == Some(category))
    }

    pub fn quality_changes(&self) -> &IndexMap<String, IndexMap<String, InstanceMetadata>> {
        &self.quality_changes
    }

    /// Replace the container. Returns true when the id changed.
    pub(crate) fn set_container(&mut self, metadata: Option<InstanceMetadata>) -> bool {
        let changed =
            self.container.as_ref().map(|m| &m.id) != metadata.as_ref().map(|m| &m.id);
        self.container = metadata;
        changed
    }

    /// Clear the container if it is `id`.
    pub(crate) fn clear_container_if(&mut self, id: &str) -> bool {
        if self.container_id() == Some(id) {
            self.container = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn insert_intent(&mut self, metadata: InstanceMetadata) {
        self.intents.insert(metadata.id.clone(), metadata);
    }

    pub(crate) fn remove_intent(&mut self, id: &str) -> bool {
        self.intents.shift_remove(id).is_some()
    }

    pub(crate) fn insert_quality_changes(&mut self, metadata: InstanceMetadata) {
        self.quality_changes
            .entry(metadata.name.clone())
            .or_default()
            .insert(metadata.id.clone(), metadata);
    }

    /// Forget the quality-changes container `id`, wherever it is filed.
    pub(crate) fn remove_quality_changes(&mut self, id: &str) -> bool {
        let mut removed = false;
        for containers in self.quality_changes.values_mut() {
            removed |= containers.shift_remove(id).is_some();
        }
        self.quality_changes.retain(|_, containers| !containers.is_empty());
        removed
    }
}
