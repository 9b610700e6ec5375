//! Session configuration.
//!
//! Persisted as JSON. Every field has a default, so a partial or empty file
//! loads fine.

use std::path::Path;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::base::constants::{
    DEFAULT_APPROXIMATE_DIAMETER, GENERIC_DEFINITION_ID, MATERIAL_REBUILD_DEBOUNCE_MS,
    SETTING_VERSION,
};
use crate::base::{ProfileError, ProfileResult};

/// Settings shared by the tree and its managers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Definition every machine falls back to for qualities and materials.
    pub generic_definition_id: String,

    /// Approximate diameter treated as canonical when mapping a material
    /// family to one root id.
    pub default_approximate_diameter: String,

    /// Quiet period before material indices are rebuilt.
    ///
    /// Each material change restarts the wait.
    pub material_rebuild_debounce_ms: u64,

    /// Written into newly created quality changes.
    pub setting_version: u32,

    /// Root material ids the user marked as favorite.
    pub favorite_materials: IndexSet<String>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            generic_definition_id: GENERIC_DEFINITION_ID.to_string(),
            default_approximate_diameter: DEFAULT_APPROXIMATE_DIAMETER.to_string(),
            material_rebuild_debounce_ms: MATERIAL_REBUILD_DEBOUNCE_MS,
            setting_version: SETTING_VERSION,
            favorite_materials: IndexSet::new(),
        }
    }
}

impl ProfileConfig {
    /// Read a config file.
    pub fn load(path: &Path) -> ProfileResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded profile config");
        Ok(config)
    }

    /// Read a config file, or use defaults when it does not exist yet.
    pub fn load_or_default(path: &Path) -> ProfileResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No profile config, using defaults");
            Ok(Self::default())
        }
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> ProfileResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "Saved profile config");
        Ok(())
    }

    fn validate(&self) -> ProfileResult<()> {
        if self.generic_definition_id.trim().is_empty() {
            return Err(ProfileError::config("generic_definition_id must not be empty"));
        }
        if self.default_approximate_diameter.trim().parse::<f64>().is_err() {
            return Err(ProfileError::config(format!(
                "default_approximate_diameter is not a number: {}",
                self.default_approximate_diameter
            )));
        }
        Ok(())
    }

    /// The default diameter as a number.
    pub fn default_diameter_value(&self) -> f64 {
        self.default_approximate_diameter
            .trim()
            .parse()
            .unwrap_or(3.0)
    }
}
