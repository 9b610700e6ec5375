//! # profile-tree
//!
//! Profile resolution for a 3D-printing slicer: given a printer, its nozzles
//! and its loaded materials, work out which print profiles are legal and
//! which one to prefer, and manage custom profiles on top of them.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! host       → ProfileHost: owns everything, routes registry events
//!   ↓
//! project    → Completing partial machine descriptions
//!   ↓
//! materials / quality / intent → Managers over the tree
//!   ↓
//! tree       → ContainerTree: machine → variant → material → quality
//!   ↓
//! stacks     → Live machine/extruder stacks, configuration snapshots
//!   ↓
//! registry   → ContainerRegistry boundary, event queue, unique names
//!   ↓
//! metadata   → Typed container metadata and filters
//!   ↓
//! base       → Errors, events, constants   (config sits beside it)
//! ```

// ============================================================================
// MODULES (dependency order: base → metadata → registry → stacks → tree → ...)
// ============================================================================

/// Foundation types: errors, event emitters, sentinel ids
pub mod base;

/// Session configuration persisted as JSON
pub mod config;

/// Typed metadata for definitions and instance containers
pub mod metadata;

/// Registry trait, in-memory registry, unique naming
pub mod registry;

/// Global and extruder stacks
pub mod stacks;

/// The container lookup tree and quality resolution
pub mod tree;

/// Material lookup tables, favorites, material mutations
pub mod materials;

/// Quality queries and custom profile management
pub mod quality;

/// Intent availability and selection
pub mod intent;

/// Defaults for partially described project machines
pub mod project;

/// The owner of all profile state
pub mod host;

// Re-export the types most callers need
pub use base::{EventEmitter, ProfileError, ProfileResult};
pub use config::ProfileConfig;
pub use host::{ProfileEvent, ProfileHost};
pub use intent::IntentManager;
pub use materials::{MaterialGroup, MaterialManager, MaterialOverrides};
pub use metadata::{ContainerKind, DefinitionMetadata, InstanceFilter, InstanceMetadata};
pub use quality::{QualityManager, QualitySource};
pub use registry::{ContainerEvent, ContainerRegistry, InMemoryRegistry, UniqueNames};
pub use stacks::{ActiveConfiguration, ExtruderConfiguration, ExtruderStack, GlobalStack, MachineStacks};
pub use tree::{ContainerTree, QualityChangesGroup, QualityGroup};
