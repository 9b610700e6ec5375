use crate::metadata::InstanceMetadata;

/// A root material container plus every derivative (diameter, machine or
/// variant specific) that shares its `base_file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialGroup {
    /// The root material id.
    pub name: String,
    pub is_read_only: bool,
    pub root_material: InstanceMetadata,
    pub derived_materials: Vec<InstanceMetadata>,
}

impl MaterialGroup {
    pub fn new(root_material: InstanceMetadata, is_read_only: bool) -> Self {
        Self {
            name: root_material.id.clone(),
            is_read_only,
            root_material,
            derived_materials: Vec::new(),
        }
    }

    pub fn guid(&self) -> Option<&str> {
        self.root_material.guid.as_deref()
    }

    /// The root container first, then derivatives in registration order.
    pub fn all_materials(&self) -> impl Iterator<Item = &InstanceMetadata> {
        std::iter::once(&self.root_material).chain(self.derived_materials.iter())
    }
}
