//! The container registry boundary.
//!
//! The tree and its managers never own profile containers. They read them
//! through [`ContainerRegistry`] and learn about changes by draining the
//! registry's queue of [`ContainerEvent`]s. Events come out in the order the
//! mutations happened, and the host delivers them one at a time.
//!
//! [`InMemoryRegistry`] is the in-process implementation used by the host by
//! default and by every test.

mod memory;
mod unique_name;

pub use memory::{InMemoryRegistry, ProfilePack};
pub use unique_name::{UniqueNames, strip_number_suffix};

use crate::base::ProfileResult;
use crate::metadata::{DefinitionFilter, DefinitionMetadata, InstanceFilter, InstanceMetadata};

/// A change to the registry contents, queued until the host drains it.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerEvent {
    DefinitionAdded(DefinitionMetadata),
    InstanceAdded(InstanceMetadata),
    InstanceRemoved(InstanceMetadata),
    MetadataChanged {
        previous: InstanceMetadata,
        current: InstanceMetadata,
    },
}

impl ContainerEvent {
    /// Id of the container the event is about.
    pub fn container_id(&self) -> &str {
        match self {
            ContainerEvent::DefinitionAdded(definition) => &definition.id,
            ContainerEvent::InstanceAdded(metadata) | ContainerEvent::InstanceRemoved(metadata) => {
                &metadata.id
            }
            ContainerEvent::MetadataChanged { current, .. } => &current.id,
        }
    }

    /// Instance metadata carried by the event, if it concerns an instance.
    pub fn instance(&self) -> Option<&InstanceMetadata> {
        match self {
            ContainerEvent::DefinitionAdded(_) => None,
            ContainerEvent::InstanceAdded(metadata) | ContainerEvent::InstanceRemoved(metadata) => {
                Some(metadata)
            }
            ContainerEvent::MetadataChanged { current, .. } => Some(current),
        }
    }
}

/// Read/write access to every installed profile container.
pub trait ContainerRegistry: UniqueNames {
    /// All instance containers matching `filter`, in registration order.
    fn find_instances(&self, filter: &InstanceFilter) -> Vec<&InstanceMetadata>;

    /// All definitions matching `filter`, in registration order.
    fn find_definitions(&self, filter: &DefinitionFilter) -> Vec<&DefinitionMetadata>;

    fn instance(&self, id: &str) -> Option<&InstanceMetadata>;

    fn definition(&self, id: &str) -> Option<&DefinitionMetadata>;

    fn add_definition(&mut self, definition: DefinitionMetadata) -> ProfileResult<()>;

    fn add_instance(&mut self, metadata: InstanceMetadata) -> ProfileResult<()>;

    /// Remove an instance container, returning its last metadata.
    fn remove_instance(&mut self, id: &str) -> ProfileResult<InstanceMetadata>;

    /// Replace the metadata of an existing instance container with the same id.
    fn update_instance(&mut self, metadata: InstanceMetadata) -> ProfileResult<()>;

    /// Containers that ship with the application cannot be renamed or removed.
    fn is_read_only(&self, id: &str) -> bool;

    /// Drain queued change events in the order they happened.
    fn take_events(&mut self) -> Vec<ContainerEvent>;
}
