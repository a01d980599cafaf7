//! Construction materials and how much of each a square metre of floor area contains.
use crate::id::define_id_type;
use crate::structural_system::StructuralSystemID;
use crate::units::MaterialIntensity;
use indexmap::{IndexMap, IndexSet};

define_id_type! {MaterialID}

/// Material intensity of each material used by a structural system
pub type SystemIntensities = IndexMap<MaterialID, MaterialIntensity>;

/// Material intensities for all structural systems
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialIntensityMap {
    materials: IndexSet<MaterialID>,
    intensities: IndexMap<StructuralSystemID, SystemIntensities>,
}

impl MaterialIntensityMap {
    /// Add the intensity of `material` in `system`, returning the previous value if any
    pub fn insert(
        &mut self,
        system: StructuralSystemID,
        material: MaterialID,
        intensity: MaterialIntensity,
    ) -> Option<MaterialIntensity> {
        self.materials.insert(material.clone());
        self.intensities
            .entry(system)
            .or_default()
            .insert(material, intensity)
    }

    /// All materials, in the order they were first seen
    pub fn materials(&self) -> &IndexSet<MaterialID> {
        &self.materials
    }

    /// The intensities for one structural system (empty if the system uses no listed materials)
    pub fn for_system(
        &self,
        system: &StructuralSystemID,
    ) -> impl Iterator<Item = (&MaterialID, MaterialIntensity)> {
        self.intensities
            .get(system)
            .into_iter()
            .flat_map(|intensities| intensities.iter().map(|(id, value)| (id, *value)))
    }

    /// Whether any intensities are defined for `system`
    pub fn contains_system(&self, system: &StructuralSystemID) -> bool {
        self.intensities.contains_key(system)
    }
}
