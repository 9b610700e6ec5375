//! Well-known container ids, sentinel keys and default values.

/// The generic machine definition every printer ultimately inherits from.
///
/// Quality and material lookups fall back to this id when a machine carries
/// no machine-specific profiles.
pub const GENERIC_DEFINITION_ID: &str = "fdmprinter";

/// Variant key used for machines that have no swappable nozzles.
pub const NO_VARIANT: &str = "empty";

/// Material key used for machines that do not support materials.
pub const EMPTY_MATERIAL: &str = "empty_material";

/// Sentinel container ids. A stack slot pointing at one of these is "unset".
pub const EMPTY_VARIANT: &str = "empty_variant";
pub const EMPTY_QUALITY: &str = "empty_quality";
pub const EMPTY_QUALITY_CHANGES: &str = "empty_quality_changes";
pub const EMPTY_INTENT: &str = "empty_intent";

/// Intent category that is always available, backed by [`EMPTY_INTENT`].
pub const DEFAULT_INTENT_CATEGORY: &str = "default";

/// Quality type given to configurations that no quality profile supports.
pub const NOT_SUPPORTED_QUALITY_TYPE: &str = "not_supported";

/// Quality type reported when no machine is active.
pub const DEFAULT_QUALITY_TYPE: &str = "normal";

/// Only nozzles are treated as variants in the tree.
pub const NOZZLE_HARDWARE_TYPE: &str = "nozzle";

/// Approximate diameter (mm, rounded) used when picking the canonical root id
/// for a material family.
pub const DEFAULT_APPROXIMATE_DIAMETER: &str = "3";

/// Quiet period before a burst of material changes triggers a rebuild.
pub const MATERIAL_REBUILD_DEBOUNCE_MS: u64 = 300;

/// Fallback name used by [`crate::registry::UniqueNames`] for blank input.
pub const FALLBACK_PROFILE_NAME: &str = "Profile";

/// Current setting version written into newly created profiles.
pub const SETTING_VERSION: u32 = 11;

/// Material cloned by "create material" when the machine prefers none.
pub const DEFAULT_PREFERRED_MATERIAL: &str = "generic_pla";

/// Brand marking the generic fallback of each material family.
pub const GENERIC_MATERIAL_BRAND: &str = "generic";
