//! Request-scoped aggregates returned by quality queries.
//!
//! Neither type is stored in the tree. Both are rebuilt on every query from
//! the current node contents and the active configuration.

use indexmap::IndexMap;

use super::QualityNode;
use crate::base::constants::DEFAULT_INTENT_CATEGORY;
use crate::metadata::InstanceMetadata;

/// Everything needed to apply one quality type to a machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityGroup {
    pub name: String,
    pub quality_type: String,
    pub node_for_global: Option<QualityNode>,
    /// Keyed by extruder position. Only enabled extruders appear.
    pub nodes_for_extruders: IndexMap<usize, QualityNode>,
    pub is_available: bool,
}

impl QualityGroup {
    pub fn new(name: impl Into<String>, quality_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quality_type: quality_type.into(),
            node_for_global: None,
            nodes_for_extruders: IndexMap::new(),
            is_available: false,
        }
    }

    /// Quality container for the extruder at `position`, if the group has one.
    pub fn extruder_container_id(&self, position: usize) -> Option<&str> {
        self.nodes_for_extruders
            .get(&position)
            .and_then(QualityNode::container_id)
    }

    pub fn global_container_id(&self) -> Option<&str> {
        self.node_for_global
            .as_ref()
            .and_then(QualityNode::container_id)
    }

    /// Ids of every container the group would put on the stacks.
    pub fn container_ids(&self) -> Vec<&str> {
        self.node_for_global
            .iter()
            .chain(self.nodes_for_extruders.values())
            .filter_map(QualityNode::container_id)
            .collect()
    }
}

/// A custom profile: one global quality-changes container plus one per
/// extruder, all sharing a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityChangesGroup {
    pub name: String,
    pub quality_type: String,
    pub intent_category: String,
    pub metadata_for_global: Option<InstanceMetadata>,
    pub metadata_per_extruder: IndexMap<usize, InstanceMetadata>,
    pub is_available: bool,
}

impl QualityChangesGroup {
    pub fn new(name: impl Into<String>, quality_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quality_type: quality_type.into(),
            intent_category: DEFAULT_INTENT_CATEGORY.to_string(),
            metadata_for_global: None,
            metadata_per_extruder: IndexMap::new(),
            is_available: false,
        }
    }

    /// File a container into the group by its `position`.
    ///
    /// The group's intent category stays "default" only while every member
    /// is default.
    pub fn add_metadata(&mut self, metadata: InstanceMetadata) {
        if self.intent_category == DEFAULT_INTENT_CATEGORY
            && let Some(category) = metadata.intent_category.as_deref()
        {
            self.intent_category = category.to_string();
        }
        match metadata.position {
            Some(position) => {
                self.metadata_per_extruder.insert(position, metadata);
            }
            None => self.metadata_for_global = Some(metadata),
        }
    }

    pub fn all_metadata(&self) -> impl Iterator<Item = &InstanceMetadata> {
        self.metadata_for_global
            .iter()
            .chain(self.metadata_per_extruder.values())
    }

    pub fn container_ids(&self) -> Vec<String> {
        self.all_metadata().map(|m| m.id.clone()).collect()
    }
}
