//! Material flows driven by construction and demolition of floor area.
use super::structure::StructuralFlows;
use crate::material::{MaterialID, MaterialIntensityMap};
use crate::units::Mass;
use indexmap::IndexMap;

/// Mass of a material entering and leaving the building stock in each year
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialFlow {
    /// Material embodied in new buildings
    pub inflow: Vec<Mass>,
    /// Material released by demolition
    pub outflow: Vec<Mass>,
}

impl MaterialFlow {
    fn zeros(n_years: usize) -> Self {
        Self {
            inflow: vec![Mass(0.0); n_years],
            outflow: vec![Mass(0.0); n_years],
        }
    }
}

/// Flows of every material, for the same years as the structural flows they were derived from
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialFlows {
    years: Vec<u32>,
    flows: IndexMap<MaterialID, MaterialFlow>,
}

impl MaterialFlows {
    /// Multiply the floor area flows of each structural system by its material intensities.
    ///
    /// Every material in `intensities` is included, even if no structural system uses it.
    pub fn calculate(structural: &StructuralFlows, intensities: &MaterialIntensityMap) -> Self {
        let n_years = structural.years().len();
        let mut flows: IndexMap<_, _> = intensities
            .materials()
            .iter()
            .map(|material| (material.clone(), MaterialFlow::zeros(n_years)))
            .collect();

        for (system_id, system_flows) in structural.iter() {
            for (material, intensity) in intensities.for_system(system_id) {
                let Some(flow) = flows.get_mut(material) else {
                    continue;
                };

                for (total, area) in flow.inflow.iter_mut().zip(&system_flows.inflow) {
                    *total = *total + *area * intensity;
                }
                for (total, area) in flow.outflow.iter_mut().zip(&system_flows.outflow) {
                    *total = *total + *area * intensity;
                }
            }
        }

        Self {
            years: structural.years().to_vec(),
            flows,
        }
    }

    /// The years of the flows
    pub fn years(&self) -> &[u32] {
        &self.years
    }

    /// Iterate over the flows of each material
    pub fn iter(&self) -> impl Iterator<Item = (&MaterialID, &MaterialFlow)> {
        self.flows.iter()
    }

    /// The flows of a single material
    pub fn get(&self, material: &MaterialID) -> Option<&MaterialFlow> {
        self.flows.get(material)
    }
}
