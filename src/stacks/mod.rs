//! Machine and extruder stacks: the live configuration of each printer.
//!
//! A stack is an ordered set of container references (variant, material,
//! quality, quality changes, intent) on top of a definition. The tree never
//! stores which machine is "current". Instead, queries take an
//! [`ActiveConfiguration`] snapshot produced from a [`GlobalStack`].

use crate::base::constants::{
    EMPTY_INTENT, EMPTY_MATERIAL, EMPTY_QUALITY, EMPTY_QUALITY_CHANGES, EMPTY_VARIANT,
};

// ============================================================================
// ACTIVE CONFIGURATION SNAPSHOT
// ============================================================================

/// What the resolver needs to know about one extruder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtruderConfiguration {
    pub position: usize,
    /// Variant (nozzle) name, `None` when the extruder has no variant.
    pub variant_name: Option<String>,
    /// Root material id of the loaded material, `None` when unknown.
    pub material_base_file: Option<String>,
    pub enabled: bool,
}

impl ExtruderConfiguration {
    pub fn new(
        position: usize,
        variant_name: Option<&str>,
        material_base_file: Option<&str>,
        enabled: bool,
    ) -> Self {
        Self {
            position,
            variant_name: variant_name.map(str::to_string),
            material_base_file: material_base_file.map(str::to_string),
            enabled,
        }
    }
}

/// Snapshot of a machine: its definition and ordered extruders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveConfiguration {
    pub definition_id: String,
    pub extruders: Vec<ExtruderConfiguration>,
}

impl ActiveConfiguration {
    pub fn new(definition_id: impl Into<String>, extruders: Vec<ExtruderConfiguration>) -> Self {
        Self {
            definition_id: definition_id.into(),
            extruders,
        }
    }

    pub fn enabled_extruders(&self) -> impl Iterator<Item = &ExtruderConfiguration> {
        self.extruders.iter().filter(|e| e.enabled)
    }
}

/// Source of the active configuration snapshot.
pub trait ActiveConfigurationProvider {
    fn active_configuration(&self) -> Option<ActiveConfiguration>;
}

// ============================================================================
// STACKS
// ============================================================================

/// The container references of one extruder train.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtruderStack {
    pub id: String,
    pub position: usize,
    pub definition_id: String,
    pub variant_id: String,
    pub variant_name: Option<String>,
    pub material_id: String,
    pub material_base_file: Option<String>,
    pub quality_id: String,
    pub quality_changes_id: String,
    pub intent_id: String,
    pub enabled: bool,
}

impl ExtruderStack {
    /// An enabled extruder with every container slot empty.
    pub fn new(id: impl Into<String>, position: usize) -> Self {
        Self {
            id: id.into(),
            position,
            definition_id: "fdmextruder".to_string(),
            variant_id: EMPTY_VARIANT.to_string(),
            variant_name: None,
            material_id: EMPTY_MATERIAL.to_string(),
            material_base_file: None,
            quality_id: EMPTY_QUALITY.to_string(),
            quality_changes_id: EMPTY_QUALITY_CHANGES.to_string(),
            intent_id: EMPTY_INTENT.to_string(),
            enabled: true,
        }
    }

    pub fn with_variant(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.variant_id = id.into();
        self.variant_name = Some(name.into());
        self
    }

    pub fn with_material(mut self, id: impl Into<String>, base_file: impl Into<String>) -> Self {
        self.material_id = id.into();
        self.material_base_file = Some(base_file.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn configuration(&self) -> ExtruderConfiguration {
        ExtruderConfiguration {
            position: self.position,
            variant_name: self.variant_name.clone(),
            material_base_file: self.material_base_file.clone(),
            enabled: self.enabled,
        }
    }
}

/// The global stack of a printer plus its extruder trains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalStack {
    pub id: String,
    pub name: String,
    pub definition_id: String,
    pub quality_id: String,
    pub quality_changes_id: String,
    pub intent_id: String,
    pub extruders: Vec<ExtruderStack>,
}

impl GlobalStack {
    pub fn new(id: impl Into<String>, definition_id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            definition_id: definition_id.into(),
            quality_id: EMPTY_QUALITY.to_string(),
            quality_changes_id: EMPTY_QUALITY_CHANGES.to_string(),
            intent_id: EMPTY_INTENT.to_string(),
            extruders: Vec::new(),
        }
    }

    pub fn with_extruder(mut self, extruder: ExtruderStack) -> Self {
        self.extruders.push(extruder);
        self.extruders.sort_by_key(|e| e.position);
        self
    }

    pub fn configuration(&self) -> ActiveConfiguration {
        ActiveConfiguration {
            definition_id: self.definition_id.clone(),
            extruders: self.extruders.iter().map(ExtruderStack::configuration).collect(),
        }
    }

    pub fn extruder(&self, position: usize) -> Option<&ExtruderStack> {
        self.extruders.iter().find(|e| e.position == position)
    }

    pub fn extruder_mut(&mut self, position: usize) -> Option<&mut ExtruderStack> {
        self.extruders.iter_mut().find(|e| e.position == position)
    }

    /// Extruders that take part in printing. Scene usage is not tracked, so
    /// this is every enabled extruder.
    pub fn used_extruders(&self) -> impl Iterator<Item = &ExtruderStack> {
        self.extruders.iter().filter(|e| e.enabled)
    }

    pub fn used_extruders_mut(&mut self) -> impl Iterator<Item = &mut ExtruderStack> {
        self.extruders.iter_mut().filter(|e| e.enabled)
    }

    /// Point every quality-changes slot referencing one of `ids` at the empty
    /// sentinel. Returns the number of slots reset.
    pub fn reset_quality_changes(&mut self, ids: &[&str]) -> usize {
        let mut reset = 0;
        if ids.contains(&self.quality_changes_id.as_str()) {
            self.quality_changes_id = EMPTY_QUALITY_CHANGES.to_string();
            reset += 1;
        }
        for extruder in &mut self.extruders {
            if ids.contains(&extruder.quality_changes_id.as_str()) {
                extruder.quality_changes_id = EMPTY_QUALITY_CHANGES.to_string();
                reset += 1;
            }
        }
        reset
    }
}

/// Every machine the user has set up, plus which one is active.
#[derive(Debug, Clone, Default)]
pub struct MachineStacks {
    machines: Vec<GlobalStack>,
    active: Option<usize>,
}

impl MachineStacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a machine. The first machine added becomes active.
    pub fn add(&mut self, stack: GlobalStack) {
        self.machines.push(stack);
        if self.active.is_none() {
            self.active = Some(self.machines.len() - 1);
        }
    }

    /// Make the machine with `id` active. Returns false if no such machine.
    pub fn set_active(&mut self, id: &str) -> bool {
        match self.machines.iter().position(|m| m.id == id) {
            Some(index) => {
                self.active = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn active(&self) -> Option<&GlobalStack> {
        self.active.and_then(|i| self.machines.get(i))
    }

    pub fn active_mut(&mut self) -> Option<&mut GlobalStack> {
        self.active.and_then(|i| self.machines.get_mut(i))
    }

    pub fn get(&self, id: &str) -> Option<&GlobalStack> {
        self.machines.iter().find(|m| m.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlobalStack> {
        self.machines.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GlobalStack> {
        self.machines.iter_mut()
    }

    /// Definition ids of every machine, without duplicates.
    pub fn definition_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for machine in &self.machines {
            if !ids.contains(&machine.definition_id) {
                ids.push(machine.definition_id.clone());
            }
        }
        ids
    }

    /// Reset quality-changes references to `ids` on every machine.
    pub fn reset_quality_changes(&mut self, ids: &[&str]) -> usize {
        self.machines
            .iter_mut()
            .map(|m| m.reset_quality_changes(ids))
            .sum()
    }

    /// True if any extruder of any machine has a material from `material_ids`.
    pub fn uses_material(&self, material_ids: &[String]) -> bool {
        self.machines
            .iter()
            .flat_map(|m| m.extruders.iter())
            .any(|e| material_ids.contains(&e.material_id))
    }
}

impl ActiveConfigurationProvider for MachineStacks {
    fn active_configuration(&self) -> Option<ActiveConfiguration> {
        self.active().map(GlobalStack::configuration)
    }
}
