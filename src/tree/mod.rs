//! The container lookup tree.
//!
//! ```text
//! ContainerTree
//!   └── MachineNode          (machine definition id)
//!         ├── global_qualities: QualityNode   (quality type)
//!         └── VariantNode    (nozzle name, or NO_VARIANT)
//!               └── MaterialNode   (root material id)
//!                     └── QualityNode   (quality type)
//!                           ├── intents
//!                           └── quality changes (global nodes only)
//! ```
//!
//! Nodes track *possible* configurations. They appear the first time a
//! definition, variant, material or quality is seen and are never removed.
//! Removing a container only clears the node's `container`, and such a node
//! no longer counts toward availability.

mod container_tree;
mod machine_node;
mod material_node;
mod quality_group;
mod quality_node;
mod variant_node;

pub use container_tree::{ContainerTree, MaterialsChanged};
pub use machine_node::{MachineNode, machine_definition_id_for_quality_search};
pub use material_node::MaterialNode;
pub use quality_group::{QualityChangesGroup, QualityGroup};
pub use quality_node::QualityNode;
pub use variant_node::VariantNode;
