//! In-process container registry.

use std::collections::VecDeque;
use std::path::Path;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::{ContainerEvent, ContainerRegistry, UniqueNames};
use crate::base::{ProfileError, ProfileResult};
use crate::metadata::{
    ContainerKind, DefinitionFilter, DefinitionMetadata, InstanceFilter, InstanceMetadata,
};

/// A bundle of definitions and instance containers, as shipped with the
/// application or exported by a vendor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePack {
    #[serde(default)]
    pub definitions: Vec<DefinitionMetadata>,
    #[serde(default)]
    pub instances: Vec<InstanceMetadata>,
}

/// Registry holding every container in memory, in registration order.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    definitions: IndexMap<String, DefinitionMetadata>,
    instances: IndexMap<String, InstanceMetadata>,
    read_only: FxHashSet<String>,
    events: VecDeque<ContainerEvent>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a pack. Pack containers are bundled, so they are
    /// read-only. No events are queued for them.
    pub fn from_pack(pack: ProfilePack) -> ProfileResult<Self> {
        let mut registry = Self::new();
        registry.install_pack(pack)?;
        Ok(registry)
    }

    /// Parse a pack from JSON and build a registry from it.
    pub fn from_pack_json(json: &str) -> ProfileResult<Self> {
        let pack: ProfilePack = serde_json::from_str(json)?;
        Self::from_pack(pack)
    }

    /// Read a JSON pack file and build a registry from it.
    pub fn load_pack(path: &Path) -> ProfileResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let registry = Self::from_pack_json(&json)?;
        tracing::info!(
            path = %path.display(),
            definitions = registry.definitions.len(),
            instances = registry.instances.len(),
            "Loaded profile pack"
        );
        Ok(registry)
    }

    fn install_pack(&mut self, pack: ProfilePack) -> ProfileResult<()> {
        for definition in pack.definitions {
            validate_definition(&definition)?;
            if self.definitions.contains_key(&definition.id) {
                return Err(ProfileError::DuplicateContainer(definition.id));
            }
            self.read_only.insert(definition.id.clone());
            self.definitions.insert(definition.id.clone(), definition);
        }
        for instance in pack.instances {
            validate_instance(&instance)?;
            if self.instances.contains_key(&instance.id) {
                return Err(ProfileError::DuplicateContainer(instance.id));
            }
            self.read_only.insert(instance.id.clone());
            self.instances.insert(instance.id.clone(), instance);
        }
        Ok(())
    }

    /// Register a bundled (read-only) instance container. Queues an added
    /// event like any other addition.
    pub fn add_read_only_instance(&mut self, metadata: InstanceMetadata) -> ProfileResult<()> {
        let id = metadata.id.clone();
        self.add_instance(metadata)?;
        self.read_only.insert(id);
        Ok(())
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn pending_event_count(&self) -> usize {
        self.events.len()
    }
}

fn validate_definition(definition: &DefinitionMetadata) -> ProfileResult<()> {
    if definition.id.trim().is_empty() {
        return Err(ProfileError::invalid_definition("definition without an id"));
    }
    Ok(())
}

/// Ids are required everywhere. Qualities, custom profiles and intents are
/// filed by quality type, so they need one.
fn validate_instance(metadata: &InstanceMetadata) -> ProfileResult<()> {
    if metadata.id.trim().is_empty() {
        return Err(ProfileError::invalid_instance(format!(
            "{} container without an id",
            metadata.kind.as_str()
        )));
    }
    let needs_quality_type = matches!(
        metadata.kind,
        ContainerKind::Quality | ContainerKind::QualityChanges | ContainerKind::Intent
    );
    if needs_quality_type && metadata.quality_type.as_deref().is_none_or(str::is_empty) {
        return Err(ProfileError::invalid_instance(format!(
            "{} has no quality_type",
            metadata.id
        )));
    }
    Ok(())
}

impl UniqueNames for InMemoryRegistry {
    fn is_name_taken(&self, candidate: &str) -> bool {
        self.instances.contains_key(candidate)
            || self.definitions.contains_key(candidate)
            || self.instances.values().any(|m| m.name == candidate)
    }
}

impl ContainerRegistry for InMemoryRegistry {
    fn find_instances(&self, filter: &InstanceFilter) -> Vec<&InstanceMetadata> {
        if let Some(id) = &filter.id {
            return self
                .instances
                .get(id)
                .filter(|m| filter.matches(m))
                .into_iter()
                .collect();
        }
        self.instances
            .values()
            .filter(|m| filter.matches(m))
            .collect()
    }

    fn find_definitions(&self, filter: &DefinitionFilter) -> Vec<&DefinitionMetadata> {
        self.definitions
            .values()
            .filter(|d| filter.matches(d))
            .collect()
    }

    fn instance(&self, id: &str) -> Option<&InstanceMetadata> {
        self.instances.get(id)
    }

    fn definition(&self, id: &str) -> Option<&DefinitionMetadata> {
        self.definitions.get(id)
    }

    fn add_definition(&mut self, definition: DefinitionMetadata) -> ProfileResult<()> {
        validate_definition(&definition)?;
        if self.definitions.contains_key(&definition.id) {
            return Err(ProfileError::DuplicateContainer(definition.id));
        }
        tracing::debug!(id = %definition.id, "Definition added");
        self.definitions
            .insert(definition.id.clone(), definition.clone());
        self.events
            .push_back(ContainerEvent::DefinitionAdded(definition));
        Ok(())
    }

    fn add_instance(&mut self, metadata: InstanceMetadata) -> ProfileResult<()> {
        validate_instance(&metadata)?;
        if self.instances.contains_key(&metadata.id) {
            return Err(ProfileError::DuplicateContainer(metadata.id));
        }
        tracing::debug!(id = %metadata.id, kind = metadata.kind.as_str(), "Container added");
        self.instances.insert(metadata.id.clone(), metadata.clone());
        self.events.push_back(ContainerEvent::InstanceAdded(metadata));
        Ok(())
    }

    fn remove_instance(&mut self, id: &str) -> ProfileResult<InstanceMetadata> {
        if self.read_only.contains(id) {
            return Err(ProfileError::ReadOnly(id.to_string()));
        }
        let removed = self
            .instances
            .shift_remove(id)
            .ok_or_else(|| ProfileError::not_found(id))?;
        tracing::debug!(id, kind = removed.kind.as_str(), "Container removed");
        self.events
            .push_back(ContainerEvent::InstanceRemoved(removed.clone()));
        Ok(removed)
    }

    fn update_instance(&mut self, metadata: InstanceMetadata) -> ProfileResult<()> {
        validate_instance(&metadata)?;
        if self.read_only.contains(&metadata.id) {
            return Err(ProfileError::ReadOnly(metadata.id));
        }
        let slot = self
            .instances
            .get_mut(&metadata.id)
            .ok_or_else(|| ProfileError::not_found(metadata.id.clone()))?;
        if *slot == metadata {
            return Ok(());
        }
        let previous = std::mem::replace(slot, metadata.clone());
        self.events.push_back(ContainerEvent::MetadataChanged {
            previous,
            current: metadata,
        });
        Ok(())
    }

    fn is_read_only(&self, id: &str) -> bool {
        self.read_only.contains(id)
    }

    fn take_events(&mut self) -> Vec<ContainerEvent> {
        self.events.drain(..).collect()
    }
}
